use super::lock::RuleLockLogicFilter;
use super::luck_award::RuleLuckAwardLogicFilter;
use async_trait::async_trait;
use raffle_core::models::{RaffleFactor, RuleDecision, RuleModel, RuleStage};
use raffle_core::repository::{StrategyRepository, UserStateRepository};
use raffle_core::{StrategyError, StrategyResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// An award-level rule evaluated against an already drawn award.
#[async_trait]
pub trait LogicFilter: Send + Sync {
    fn rule_model(&self) -> RuleModel;

    fn stage(&self) -> RuleStage {
        self.rule_model().stage()
    }

    async fn filter(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision>;
}

/// Registry of award filters, evaluated one stage at a time.
pub struct RuleFilterPipeline {
    filters: HashMap<RuleModel, Arc<dyn LogicFilter>>,
}

impl RuleFilterPipeline {
    pub fn new(
        repository: Arc<dyn StrategyRepository>,
        user_state: Arc<dyn UserStateRepository>,
    ) -> Self {
        let filters: Vec<Arc<dyn LogicFilter>> = vec![
            Arc::new(RuleLockLogicFilter::new(repository.clone(), user_state)),
            Arc::new(RuleLuckAwardLogicFilter::new(repository)),
        ];
        Self::with_filters(filters)
    }

    pub fn with_filters(filters: Vec<Arc<dyn LogicFilter>>) -> Self {
        Self {
            filters: filters
                .into_iter()
                .map(|filter| (filter.rule_model(), filter))
                .collect(),
        }
    }

    pub fn open_logic_filter(&self, rule_model: RuleModel) -> Option<&Arc<dyn LogicFilter>> {
        self.filters.get(&rule_model)
    }

    /// Runs the filters of `stage` in declaration order. Models of other
    /// stages are skipped. The first `TakeOver` wins.
    pub async fn evaluate(
        &self,
        factor: &RaffleFactor,
        rule_models: &[RuleModel],
        stage: RuleStage,
    ) -> StrategyResult<RuleDecision> {
        for model in rule_models {
            let Some(filter) = self.open_logic_filter(*model) else {
                error!(rule_model = %model, "no filter registered");
                return Err(StrategyError::UnknownRuleModel(model.code().to_string()));
            };
            if filter.stage() != stage {
                debug!(rule_model = %model, ?stage, "filter belongs to another stage");
                continue;
            }

            let decision = filter.filter(factor).await?;
            if decision.is_take_over() {
                info!(
                    user_id = %factor.user_id,
                    strategy_id = factor.strategy_id,
                    award_id = ?factor.award_id,
                    rule_model = %model,
                    "rule filter took over"
                );
                return Ok(decision);
            }
        }
        Ok(RuleDecision::allow())
    }
}
