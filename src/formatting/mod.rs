use crate::types::{Cost, ModelTier};

// Format currency
pub fn format_currency(value: f64) -> String {
    Cost::new(value).to_formatted_string()
}

// Format number with thousands separator
pub fn format_number_with_commas(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for c in s.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}

// Format free-tier usage, e.g. "3/5 free renders"
pub fn format_quota(render_count: u32, daily_limit: u32, tier: ModelTier) -> String {
    match tier {
        ModelTier::Pro => format!("{} renders (pro, unlimited)", render_count),
        ModelTier::Free => format!(
            "{}/{} free renders",
            render_count.min(daily_limit),
            daily_limit
        ),
    }
}
