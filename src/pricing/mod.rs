use crate::constants::DEFAULT_EDIT_COST_MULTIPLIER;
use crate::types::{Cost, ModelTier, OperationKind, RenderRequestSpec, SizeTier};
use serde::{Deserialize, Serialize};

/// Base price of a pro create at each size
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostTable {
    pub mini_hd: f64,
    pub full_hd: f64,
    pub one_k: f64,
    pub two_k: f64,
    pub four_k: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            mini_hd: 0.50,
            full_hd: 1.45,
            one_k: 2.15,
            two_k: 4.25,
            four_k: 8.50,
        }
    }
}

impl CostTable {
    pub fn price(&self, size: SizeTier) -> Cost {
        Cost::new(match size {
            SizeTier::MiniHd => self.mini_hd,
            SizeTier::FullHd => self.full_hd,
            SizeTier::OneK => self.one_k,
            SizeTier::TwoK => self.two_k,
            SizeTier::FourK => self.four_k,
        })
    }
}

/// Prices requests from a table and an edit multiplier
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub table: CostTable,
    pub edit_multiplier: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            table: CostTable::default(),
            edit_multiplier: DEFAULT_EDIT_COST_MULTIPLIER,
        }
    }
}

impl CostModel {
    pub fn new(table: CostTable, edit_multiplier: f64) -> Self {
        Self {
            table,
            edit_multiplier,
        }
    }

    /// Free tier is always zero; edits are discounted by `edit_multiplier`
    pub fn cost(&self, size: SizeTier, tier: ModelTier, operation: OperationKind) -> Cost {
        if tier == ModelTier::Free {
            return Cost::ZERO;
        }

        let base = self.table.price(size);
        match operation {
            OperationKind::Create => base,
            OperationKind::Edit => base.scale(self.edit_multiplier),
        }
    }

    pub fn cost_of(&self, spec: &RenderRequestSpec) -> Cost {
        self.cost(spec.size(), spec.tier(), spec.operation())
    }
}

/// Cost of one request under the default price table
pub fn cost(size: SizeTier, tier: ModelTier, operation: OperationKind) -> Cost {
    CostModel::default().cost(size, tier, operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_tier_is_always_zero() {
        for size in SizeTier::ALL {
            for operation in [OperationKind::Create, OperationKind::Edit] {
                assert_eq!(cost(size, ModelTier::Free, operation), Cost::ZERO);
            }
        }
    }

    #[test]
    fn test_pro_prices() {
        let expected = [
            (SizeTier::MiniHd, 0.50),
            (SizeTier::FullHd, 1.45),
            (SizeTier::OneK, 2.15),
            (SizeTier::TwoK, 4.25),
            (SizeTier::FourK, 8.50),
        ];
        for (size, price) in expected {
            assert_eq!(cost(size, ModelTier::Pro, OperationKind::Create).value(), price);
        }
    }

    #[test]
    fn test_pro_edit_is_half_of_create() {
        for size in SizeTier::ALL {
            let create = cost(size, ModelTier::Pro, OperationKind::Create);
            let edit = cost(size, ModelTier::Pro, OperationKind::Edit);
            assert_eq!(edit.value(), create.value() * 0.5);
        }
    }

    #[test]
    fn test_two_k_scenario() {
        assert_eq!(cost(SizeTier::TwoK, ModelTier::Pro, OperationKind::Create).value(), 4.25);
        assert_eq!(cost(SizeTier::TwoK, ModelTier::Pro, OperationKind::Edit).value(), 2.125);
    }

    #[test]
    fn test_configured_model() {
        let table = CostTable {
            full_hd: 2.0,
            ..CostTable::default()
        };
        let model = CostModel::new(table, 0.25);

        assert_eq!(
            model.cost(SizeTier::FullHd, ModelTier::Pro, OperationKind::Edit),
            Cost::new(0.5)
        );
        assert_eq!(
            model.cost(SizeTier::FullHd, ModelTier::Free, OperationKind::Create),
            Cost::ZERO
        );

        let spec = RenderRequestSpec::new(SizeTier::FourK, ModelTier::Pro, OperationKind::Create);
        assert_eq!(model.cost_of(&spec), Cost::new(8.5));
    }

    #[test]
    fn test_cost_table_partial_config() {
        let table: CostTable = serde_json::from_str(r#"{"fourK": 10.0}"#).unwrap();
        assert_eq!(table.price(SizeTier::FourK), Cost::new(10.0));
        assert_eq!(table.price(SizeTier::MiniHd), Cost::new(0.5));
    }
}
