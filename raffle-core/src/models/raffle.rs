use serde::{Deserialize, Serialize};

/// Incoming raffle request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleRequest {
    pub user_id: String,
    pub strategy_id: Option<i64>,
}

impl RaffleRequest {
    pub fn new(user_id: impl Into<String>, strategy_id: i64) -> Self {
        Self {
            user_id: user_id.into(),
            strategy_id: Some(strategy_id),
        }
    }
}

/// Facts a rule is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleFactor {
    pub user_id: String,
    pub strategy_id: i64,
    pub award_id: Option<i32>,
}

impl RaffleFactor {
    pub fn new(user_id: impl Into<String>, strategy_id: i64) -> Self {
        Self {
            user_id: user_id.into(),
            strategy_id,
            award_id: None,
        }
    }

    pub fn with_award(mut self, award_id: i32) -> Self {
        self.award_id = Some(award_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleResult {
    pub award_id: Option<i32>,
    pub award_desc: Option<String>,
}

impl RaffleResult {
    pub fn award(award_id: i32) -> Self {
        Self {
            award_id: Some(award_id),
            award_desc: None,
        }
    }

    /// Marker for a vetoed draw that must be settled by the luck-award rule.
    pub fn fallback(award_desc: impl Into<String>) -> Self {
        Self {
            award_id: None,
            award_desc: Some(award_desc.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.award_id.is_none()
    }
}
