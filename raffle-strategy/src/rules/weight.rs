use super::chain::LogicChainNode;
use super::{invalid_rule_value, load_rule_value};
use async_trait::async_trait;
use raffle_core::models::{RaffleFactor, RuleDecision, RuleModel, RulePayload};
use raffle_core::repository::{StrategyRepository, UserStateRepository};
use raffle_core::StrategyResult;
use raffle_shared::constants::{split_list, COLON, SPACE};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Parses space separated `"<threshold>:<tier_key>"` groups into
/// threshold -> tier key.
pub fn parse_weight_value(value: &str) -> StrategyResult<BTreeMap<i64, String>> {
    let mut groups = BTreeMap::new();
    for group in split_list(value, SPACE) {
        let parts: Vec<&str> = group.split(COLON).collect();
        if parts.len() != 2 {
            return Err(invalid_rule_value(
                RuleModel::Weight,
                value,
                format!("group {:?} is not <threshold>:<tier_key>", group),
            ));
        }
        let threshold = parts[0].trim().parse::<i64>().map_err(|e| {
            invalid_rule_value(RuleModel::Weight, value, format!("threshold {:?}: {}", parts[0], e))
        })?;
        let tier_key = parts[1].trim();
        if tier_key.is_empty() {
            return Err(invalid_rule_value(
                RuleModel::Weight,
                value,
                format!("group {:?} has an empty tier key", group),
            ));
        }
        groups.insert(threshold, tier_key.to_string());
    }
    Ok(groups)
}

/// Highest threshold not above `score`.
pub fn select_tier(groups: &BTreeMap<i64, String>, score: i64) -> Option<&str> {
    groups
        .range(..=score)
        .next_back()
        .map(|(_, tier_key)| tier_key.as_str())
}

/// Users whose score reaches a threshold draw from that tier's table.
pub struct RuleWeightLogicChain {
    repository: Arc<dyn StrategyRepository>,
    user_state: Arc<dyn UserStateRepository>,
}

impl RuleWeightLogicChain {
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
impl LogicChainNode for RuleWeightLogicChain {
    fn rule_model(&self) -> &'static str {
        RuleModel::Weight.code()
    }

    async fn logic(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision> {
        let user_id = factor.user_id.as_str();
        let strategy_id = factor.strategy_id;
        info!(user_id, strategy_id, rule_model = self.rule_model(), "rule chain: weight");

        let rule_value =
            load_rule_value(self.repository.as_ref(), strategy_id, None, RuleModel::Weight).await?;
        let groups = parse_weight_value(&rule_value)?;
        if groups.is_empty() {
            return Ok(RuleDecision::allow_by(RuleModel::Weight));
        }

        let score = self.user_state.current_user_score(user_id).await?;
        if let Some(tier_key) = select_tier(&groups, score) {
            info!(user_id, strategy_id, score, tier_key, "rule chain: weight hit");
            return Ok(RuleDecision::take_over(
                RuleModel::Weight,
                Some(RulePayload::WeightTierKey(tier_key.to_string())),
            ));
        }

        info!(user_id, strategy_id, score, "rule chain: weight pass");
        Ok(RuleDecision::allow_by(RuleModel::Weight))
    }
}
