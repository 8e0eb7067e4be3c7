/// Separates list items inside a rule value, e.g. blacklisted user ids.
pub const SPLIT: &str = ",";
/// Separates the head of a rule value group from its body.
pub const COLON: &str = ":";
/// Separates rule value groups.
pub const SPACE: &str = " ";
/// Joins a strategy id and a tier key into a table key.
pub const UNDERLINE: &str = "_";

/// Cache key suffixes. Adapters prepend their configured prefix.
pub mod redis_key {
    pub const STRATEGY_AWARD_KEY: &str = "strategy_award_key_";
    pub const STRATEGY_RULE_MODELS_KEY: &str = "strategy_rule_models_key_";
    pub const STRATEGY_RATE_TABLE_KEY: &str = "strategy_rate_table_key_";
    pub const STRATEGY_RATE_RANGE_KEY: &str = "strategy_rate_range_key_";
}

/// Splits `value` on `separator`, trimming items and dropping empty ones.
pub fn split_list<'a>(value: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}
