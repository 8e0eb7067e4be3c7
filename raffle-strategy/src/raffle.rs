use crate::dispatch::StrategyDispatch;
use crate::rules::{ChainFactory, RuleFilterPipeline};
use raffle_core::models::{
    RaffleFactor, RaffleRequest, RaffleResult, RulePayload, RuleStage,
};
use raffle_core::repository::{StrategyRepository, TableStore, UserStateRepository};
use raffle_core::{StrategyError, StrategyResult};
use std::sync::Arc;
use tracing::{info, warn};

pub const RULE_INTERCEPT_DESC: &str =
    "award intercepted by in-draw rules; settle through rule_luck_award";

/// End-to-end raffle: pre-draw chain, draw, in-draw filters.
pub struct RaffleStrategy {
    repository: Arc<dyn StrategyRepository>,
    dispatch: StrategyDispatch,
    chain_factory: ChainFactory,
    filter_pipeline: RuleFilterPipeline,
}

impl RaffleStrategy {
    pub fn new(
        repository: Arc<dyn StrategyRepository>,
        store: Arc<dyn TableStore>,
        user_state: Arc<dyn UserStateRepository>,
    ) -> Self {
        Self {
            dispatch: StrategyDispatch::new(store),
            chain_factory: ChainFactory::new(repository.clone(), user_state.clone()),
            filter_pipeline: RuleFilterPipeline::new(repository.clone(), user_state),
            repository,
        }
    }

    pub fn from_parts(
        repository: Arc<dyn StrategyRepository>,
        dispatch: StrategyDispatch,
        chain_factory: ChainFactory,
        filter_pipeline: RuleFilterPipeline,
    ) -> Self {
        Self {
            repository,
            dispatch,
            chain_factory,
            filter_pipeline,
        }
    }

    pub async fn perform_raffle(&self, request: &RaffleRequest) -> StrategyResult<RaffleResult> {
        let factor = validate(request)?;
        let strategy_id = factor.strategy_id;

        let chain = self.chain_factory.open_logic_chain(strategy_id).await?;
        let decision = chain.logic(&factor).await?;

        let award_id = match decision.payload {
            Some(RulePayload::BlacklistAward(award_id)) if decision.is_take_over() => {
                info!(user_id = %factor.user_id, strategy_id, award_id, "raffle settled by blacklist");
                return Ok(RaffleResult::award(award_id));
            }
            Some(RulePayload::WeightTierKey(ref tier_key)) if decision.is_take_over() => {
                self.dispatch.draw_tier(strategy_id, tier_key).await?
            }
            Some(ref payload) if decision.is_take_over() => {
                warn!(?payload, "pre-draw payload not understood, using default table");
                self.dispatch.draw_default(strategy_id).await?
            }
            _ => self.dispatch.draw_default(strategy_id).await?,
        };

        let center_models = self
            .repository
            .query_award_rule_models(strategy_id, award_id)
            .await?
            .center_models();
        let center = self
            .filter_pipeline
            .evaluate(&factor.clone().with_award(award_id), &center_models, RuleStage::Center)
            .await?;
        if center.is_take_over() {
            info!(user_id = %factor.user_id, strategy_id, award_id, "draw vetoed, falling back to luck award");
            return Ok(RaffleResult::fallback(RULE_INTERCEPT_DESC));
        }

        info!(user_id = %factor.user_id, strategy_id, award_id, "raffle completed");
        Ok(RaffleResult::award(award_id))
    }

    /// Runs the after-stage filters of `award_id` and returns the luck award
    /// they settle on, if any.
    pub async fn resolve_luck_award(
        &self,
        request: &RaffleRequest,
        award_id: i32,
    ) -> StrategyResult<Option<i32>> {
        let factor = validate(request)?.with_award(award_id);
        let after_models = self
            .repository
            .query_award_rule_models(factor.strategy_id, award_id)
            .await?
            .after_models();
        let decision = self
            .filter_pipeline
            .evaluate(&factor, &after_models, RuleStage::After)
            .await?;
        match decision.payload {
            Some(RulePayload::LuckAward(luck_award_id)) if decision.is_take_over() => Ok(Some(luck_award_id)),
            _ => Ok(None),
        }
    }
}

fn validate(request: &RaffleRequest) -> StrategyResult<RaffleFactor> {
    if request.user_id.trim().is_empty() {
        return Err(StrategyError::IllegalParameter("user_id is blank".into()));
    }
    let strategy_id = request
        .strategy_id
        .ok_or_else(|| StrategyError::IllegalParameter("strategy_id is missing".into()))?;
    Ok(RaffleFactor::new(request.user_id.clone(), strategy_id))
}
