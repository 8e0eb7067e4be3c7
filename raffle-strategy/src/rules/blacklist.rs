use super::chain::LogicChainNode;
use super::{invalid_rule_value, load_rule_value};
use async_trait::async_trait;
use raffle_core::models::{RaffleFactor, RuleDecision, RuleModel, RulePayload};
use raffle_core::repository::StrategyRepository;
use raffle_core::StrategyResult;
use raffle_shared::constants::{split_list, COLON, SPLIT};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Parsed `"<award_id>:<user_id>,<user_id>,..."` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistValue {
    pub award_id: i32,
    pub user_ids: HashSet<String>,
}

impl BlacklistValue {
    pub fn parse(value: &str) -> StrategyResult<Self> {
        let parts: Vec<&str> = value.split(COLON).collect();
        if parts.len() != 2 {
            return Err(invalid_rule_value(
                RuleModel::Blacklist,
                value,
                "expected <award_id>:<user_ids>",
            ));
        }
        let award_id = parts[0].trim().parse::<i32>().map_err(|e| {
            invalid_rule_value(RuleModel::Blacklist, value, format!("award id: {}", e))
        })?;
        let user_ids = split_list(parts[1], SPLIT).map(String::from).collect();
        Ok(Self { award_id, user_ids })
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.user_ids.contains(user_id)
    }
}

/// Blacklisted users skip the draw and receive the configured award.
pub struct BlackListLogicChain {
    repository: Arc<dyn StrategyRepository>,
}

impl BlackListLogicChain {
    pub fn new(repository: Arc<dyn StrategyRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl LogicChainNode for BlackListLogicChain {
    fn rule_model(&self) -> &'static str {
        RuleModel::Blacklist.code()
    }

    async fn logic(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision> {
        let user_id = factor.user_id.as_str();
        let strategy_id = factor.strategy_id;
        info!(user_id, strategy_id, rule_model = self.rule_model(), "rule chain: blacklist");

        let rule_value =
            load_rule_value(self.repository.as_ref(), strategy_id, None, RuleModel::Blacklist).await?;
        let blacklist = BlacklistValue::parse(&rule_value)?;

        if blacklist.contains(user_id) {
            info!(user_id, strategy_id, award_id = blacklist.award_id, "rule chain: blacklist hit");
            return Ok(RuleDecision::take_over(
                RuleModel::Blacklist,
                Some(RulePayload::BlacklistAward(blacklist.award_id)),
            ));
        }

        info!(user_id, strategy_id, "rule chain: blacklist pass");
        Ok(RuleDecision::allow_by(RuleModel::Blacklist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raffle_core::StrategyError;
    use raffle_store::InMemoryStrategyRepository;

    fn node(rule_value: &str) -> BlackListLogicChain {
        let repository = InMemoryStrategyRepository::new().with_rule_value(
            100001,
            None,
            RuleModel::Blacklist.code(),
            rule_value,
        );
        BlackListLogicChain::new(Arc::new(repository))
    }

    #[test]
    fn test_parse_blacklist_value() {
        let value = BlacklistValue::parse("99:alice, bob").unwrap();
        assert_eq!(value.award_id, 99);
        assert!(value.contains("alice"));
        assert!(value.contains("bob"));
        assert!(!value.contains("carol"));
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        for value in ["99", "99:alice:bob", "x:alice"] {
            let err = BlacklistValue::parse(value).unwrap_err();
            assert!(matches!(err, StrategyError::InvalidRuleFormat { .. }), "{}", value);
        }
    }

    #[tokio::test]
    async fn test_blacklisted_user_takes_over() {
        let decision = node("99:alice,bob")
            .logic(&RaffleFactor::new("alice", 100001))
            .await
            .unwrap();
        assert!(decision.is_take_over());
        assert_eq!(decision.rule_model, Some(RuleModel::Blacklist));
        assert_eq!(decision.payload, Some(RulePayload::BlacklistAward(99)));
    }

    #[tokio::test]
    async fn test_other_user_is_forwarded() {
        let decision = node("99:alice,bob")
            .logic(&RaffleFactor::new("carol", 100001))
            .await
            .unwrap();
        assert!(!decision.is_take_over());
        assert_eq!(decision.payload, None);
    }

    #[tokio::test]
    async fn test_missing_value_is_a_configuration_error() {
        let node = BlackListLogicChain::new(Arc::new(InMemoryStrategyRepository::new()));
        let err = node.logic(&RaffleFactor::new("alice", 100001)).await.unwrap_err();
        assert!(matches!(err, StrategyError::RuleValueMissing { .. }));
    }
}
