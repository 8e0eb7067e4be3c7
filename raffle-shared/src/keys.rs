use crate::constants::UNDERLINE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key of an assembled rate table: the strategy id, optionally
/// scoped to a weight tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey {
    pub strategy_id: i64,
    pub tier_key: Option<String>,
}

impl TableKey {
    pub fn strategy(strategy_id: i64) -> Self {
        Self { strategy_id, tier_key: None }
    }

    pub fn tier(strategy_id: i64, tier_key: impl Into<String>) -> Self {
        Self {
            strategy_id,
            tier_key: Some(tier_key.into()),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tier_key {
            Some(tier_key) => write!(f, "{}{}{}", self.strategy_id, UNDERLINE, tier_key),
            None => write!(f, "{}", self.strategy_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_key_rendering() {
        assert_eq!(TableKey::strategy(100001).to_string(), "100001");
        assert_eq!(TableKey::tier(100001, "tierA").to_string(), "100001_tierA");
        assert_eq!(TableKey::tier(100001, "102,103").to_string(), "100001_102,103");
    }
}
