use super::filter::LogicFilter;
use super::{invalid_rule_value, load_rule_value};
use async_trait::async_trait;
use raffle_core::models::{RaffleFactor, RuleDecision, RuleModel};
use raffle_core::repository::{StrategyRepository, UserStateRepository};
use raffle_core::{StrategyError, StrategyResult};
use std::sync::Arc;
use tracing::info;

/// Keeps an award locked until the user has drawn the configured number of
/// times in the strategy.
pub struct RuleLockLogicFilter {
    repository: Arc<dyn StrategyRepository>,
    user_state: Arc<dyn UserStateRepository>,
}

impl RuleLockLogicFilter {
    pub fn new(
        repository: Arc<dyn StrategyRepository>,
        user_state: Arc<dyn UserStateRepository>,
    ) -> Self {
        Self {
            repository,
            user_state,
        }
    }
}

#[async_trait]
impl LogicFilter for RuleLockLogicFilter {
    fn rule_model(&self) -> RuleModel {
        RuleModel::Lock
    }

    async fn filter(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision> {
        let user_id = factor.user_id.as_str();
        let strategy_id = factor.strategy_id;
        let award_id = factor
            .award_id
            .ok_or_else(|| StrategyError::IllegalParameter("rule_lock needs an award id".into()))?;
        info!(user_id, strategy_id, award_id, rule_model = %RuleModel::Lock, "rule filter: lock");

        let rule_value =
            load_rule_value(self.repository.as_ref(), strategy_id, Some(award_id), RuleModel::Lock).await?;
        let threshold = rule_value.trim().parse::<i64>().map_err(|e| {
            invalid_rule_value(RuleModel::Lock, &rule_value, format!("draw count: {}", e))
        })?;

        let draw_count = self
            .user_state
            .current_user_draw_count(user_id, strategy_id)
            .await?;
        if draw_count >= threshold {
            return Ok(RuleDecision::allow_by(RuleModel::Lock));
        }

        info!(user_id, strategy_id, award_id, draw_count, threshold, "rule filter: award locked");
        Ok(RuleDecision::take_over(RuleModel::Lock, None))
    }
}
