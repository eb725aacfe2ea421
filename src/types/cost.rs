use crate::types::RenderHistoryItem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// A newtype wrapper for cost values in baht
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Cost(f64);

impl Cost {
    pub const ZERO: Cost = Cost(0.0);

    /// Create a new Cost from a raw value
    #[inline]
    pub fn new(value: f64) -> Self {
        Cost(value)
    }

    /// Sum the cost of a run of history items
    pub fn from_history<'a, I>(items: I) -> Self
    where
        I: Iterator<Item = &'a RenderHistoryItem>,
    {
        items.map(|item| item.cost).sum()
    }

    /// Get the raw value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Format as currency string (e.g., "฿1.23")
    pub fn to_formatted_string(&self) -> String {
        // Handle negative zero case
        let formatted_value = if self.0.abs() < 0.005 { 0.00 } else { self.0 };
        format!("฿{:.2}", formatted_value)
    }

    /// Badge text shown on history entries: "FREE" for zero-cost renders
    pub fn to_label(&self) -> String {
        if self.is_positive() {
            self.to_formatted_string()
        } else {
            "FREE".to_string()
        }
    }

    /// Check if the cost is positive (greater than tolerance)
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0.005
    }

    /// Scale by a multiplier, e.g. the edit discount
    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        Cost(self.0 * factor)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_formatted_string())
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0 + rhs.0)
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Self {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl From<f64> for Cost {
    fn from(value: f64) -> Self {
        Cost(value)
    }
}

impl From<Cost> for f64 {
    fn from(cost: Cost) -> Self {
        cost.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_formatting() {
        assert_eq!(Cost::new(1.234).to_formatted_string(), "฿1.23");
        assert_eq!(Cost::new(0.0).to_formatted_string(), "฿0.00");
        assert_eq!(Cost::new(-0.0).to_formatted_string(), "฿0.00");
        assert_eq!(Cost::new(0.004).to_formatted_string(), "฿0.00");
        assert_eq!(Cost::new(8.5).to_formatted_string(), "฿8.50");
        assert_eq!(Cost::new(100.999).to_formatted_string(), "฿101.00");
    }

    #[test]
    fn test_cost_label() {
        assert_eq!(Cost::ZERO.to_label(), "FREE");
        assert_eq!(Cost::new(4.25).to_label(), "฿4.25");
    }

    #[test]
    fn test_cost_arithmetic() {
        let total: Cost = [Cost::new(1.45), Cost::new(0.5), Cost::new(4.25)]
            .into_iter()
            .sum();
        assert!((total.value() - 6.2).abs() < 1e-9);
        assert_eq!(Cost::new(4.25).scale(0.5), Cost::new(2.125));
    }

    #[test]
    fn test_cost_conversions() {
        let cost = Cost::from(3.14);
        assert_eq!(cost.value(), 3.14);

        let value: f64 = cost.into();
        assert_eq!(value, 3.14);
        assert_eq!(serde_json::to_string(&cost).unwrap(), "3.14");
    }
}
