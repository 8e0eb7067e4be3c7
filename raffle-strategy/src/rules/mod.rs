pub mod blacklist;
pub mod chain;
pub mod filter;
pub mod lock;
pub mod luck_award;
pub mod weight;

pub use blacklist::BlackListLogicChain;
pub use chain::{ChainFactory, DefaultLogicChain, LogicChain, LogicChainNode};
pub use filter::{LogicFilter, RuleFilterPipeline};
pub use lock::RuleLockLogicFilter;
pub use luck_award::RuleLuckAwardLogicFilter;
pub use weight::RuleWeightLogicChain;

use raffle_core::models::RuleModel;
use raffle_core::repository::StrategyRepository;
use raffle_core::{StrategyError, StrategyResult};
use tracing::error;

/// Loads the raw value of a rule, failing when it is not configured.
pub(crate) async fn load_rule_value(
    repository: &dyn StrategyRepository,
    strategy_id: i64,
    award_id: Option<i32>,
    rule_model: RuleModel,
) -> StrategyResult<String> {
    match repository
        .query_strategy_rule_value(strategy_id, award_id, rule_model.code())
        .await?
    {
        Some(value) => Ok(value),
        None => {
            error!(strategy_id, ?award_id, rule_model = %rule_model, "rule value not configured");
            Err(StrategyError::RuleValueMissing {
                strategy_id,
                award_id,
                rule_model: rule_model.code().to_string(),
            })
        }
    }
}

/// Logs a malformed rule value where it is detected and hands the error back.
pub(crate) fn invalid_rule_value(
    rule_model: RuleModel,
    value: &str,
    reason: impl Into<String>,
) -> StrategyError {
    let err = StrategyError::invalid_rule_format(rule_model.code(), value, reason);
    error!(rule_model = %rule_model, error = %err, "invalid rule value");
    err
}
