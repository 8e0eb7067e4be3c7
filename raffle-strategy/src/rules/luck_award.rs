use super::filter::LogicFilter;
use super::{invalid_rule_value, load_rule_value};
use async_trait::async_trait;
use raffle_core::models::{RaffleFactor, RuleDecision, RuleModel, RulePayload};
use raffle_core::repository::StrategyRepository;
use raffle_core::{StrategyError, StrategyResult};
use raffle_shared::constants::COLON;
use std::sync::Arc;
use tracing::info;

/// Settles a vetoed draw with the configured consolation award.
///
/// The value is `"<award_id>"` or `"<award_id>:<extra>"`; the extra part
/// belongs to the award's own handling and is ignored here.
pub struct RuleLuckAwardLogicFilter {
    repository: Arc<dyn StrategyRepository>,
}

impl RuleLuckAwardLogicFilter {
    pub fn new(repository: Arc<dyn StrategyRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl LogicFilter for RuleLuckAwardLogicFilter {
    fn rule_model(&self) -> RuleModel {
        RuleModel::LuckAward
    }

    async fn filter(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision> {
        let strategy_id = factor.strategy_id;
        let award_id = factor.award_id.ok_or_else(|| {
            StrategyError::IllegalParameter("rule_luck_award needs an award id".into())
        })?;

        let rule_value = load_rule_value(
            self.repository.as_ref(),
            strategy_id,
            Some(award_id),
            RuleModel::LuckAward,
        )
        .await?;
        let head = rule_value
            .split_once(COLON)
            .map_or(rule_value.as_str(), |(head, _)| head);
        let luck_award_id = head.trim().parse::<i32>().map_err(|e| {
            invalid_rule_value(RuleModel::LuckAward, &rule_value, format!("award id: {}", e))
        })?;

        info!(user_id = %factor.user_id, strategy_id, award_id, luck_award_id, "rule filter: luck award");
        Ok(RuleDecision::take_over(
            RuleModel::LuckAward,
            Some(RulePayload::LuckAward(luck_award_id)),
        ))
    }
}
