pub mod models;
pub mod repository;

use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("Illegal parameter: {0}")]
    IllegalParameter(String),
    #[error("Award set is empty for rate table {key}")]
    EmptyAwardSet { key: String },
    #[error("No award is eligible for tier {tier_key}")]
    EmptyTier { tier_key: String },
    #[error("Invalid rate {rate} for award {award_id}")]
    InvalidAwardRate { award_id: i32, rate: Decimal },
    #[error("Rate table {key} needs {slots} slots, limit is {max_slots}")]
    TableTooLarge { key: String, slots: u64, max_slots: u64 },
    #[error("Rate table not assembled: {key}")]
    TableNotAssembled { key: String },
    #[error("Invalid {rule_model} rule value {value:?}: {reason}")]
    InvalidRuleFormat {
        rule_model: String,
        value: String,
        reason: String,
    },
    #[error("Unknown rule model: {0}")]
    UnknownRuleModel(String),
    #[error("Rule value missing: strategy {strategy_id} award {award_id:?} rule {rule_model}")]
    RuleValueMissing {
        strategy_id: i64,
        award_id: Option<i32>,
        rule_model: String,
    },
    #[error("Repository error: {0}")]
    Repository(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// How a failure should be surfaced by the host service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request input. Never retried.
    Validation,
    /// Broken strategy or rule data. Retrying repeats the failure.
    Configuration,
    /// A collaborator failed; passed through unchanged.
    Collaborator,
}

impl StrategyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StrategyError::IllegalParameter(_) => ErrorKind::Validation,
            StrategyError::Repository(_) => ErrorKind::Collaborator,
            _ => ErrorKind::Configuration,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    pub fn invalid_rule_format(
        rule_model: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        StrategyError::InvalidRuleFormat {
            rule_model: rule_model.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type StrategyResult<T> = Result<T, StrategyError>;
