use super::blacklist::BlackListLogicChain;
use super::weight::RuleWeightLogicChain;
use async_trait::async_trait;
use raffle_core::models::{RaffleFactor, RuleDecision, RuleModel, RuleStage};
use raffle_core::repository::{StrategyRepository, UserStateRepository};
use raffle_core::{StrategyError, StrategyResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// A pre-draw rule. Returning `TakeOver` ends the chain.
#[async_trait]
pub trait LogicChainNode: Send + Sync {
    fn rule_model(&self) -> &'static str;

    async fn logic(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision>;
}

/// Terminal node: no override, draw from the default table.
pub struct DefaultLogicChain;

#[async_trait]
impl LogicChainNode for DefaultLogicChain {
    fn rule_model(&self) -> &'static str {
        "default"
    }

    async fn logic(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision> {
        debug!(user_id = %factor.user_id, strategy_id = factor.strategy_id, "rule chain: default");
        Ok(RuleDecision::allow())
    }
}

/// An opened chain: the declared nodes in order followed by the default node.
#[derive(Clone)]
pub struct LogicChain {
    nodes: Vec<Arc<dyn LogicChainNode>>,
}

impl std::fmt::Debug for LogicChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicChain")
            .field("nodes", &self.rule_models())
            .finish()
    }
}

impl LogicChain {
    pub fn new(mut nodes: Vec<Arc<dyn LogicChainNode>>) -> Self {
        nodes.push(Arc::new(DefaultLogicChain));
        Self { nodes }
    }

    pub fn rule_models(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|node| node.rule_model()).collect()
    }

    /// First `TakeOver` wins; otherwise the default node's `Allow`.
    pub async fn logic(&self, factor: &RaffleFactor) -> StrategyResult<RuleDecision> {
        for node in &self.nodes {
            let decision = node.logic(factor).await?;
            if decision.is_take_over() {
                return Ok(decision);
            }
        }
        Ok(RuleDecision::allow())
    }
}

/// Opens a strategy's chain from its declared rule models.
pub struct ChainFactory {
    repository: Arc<dyn StrategyRepository>,
    registry: HashMap<RuleModel, Arc<dyn LogicChainNode>>,
}

impl ChainFactory {
    pub fn new(
        repository: Arc<dyn StrategyRepository>,
        user_state: Arc<dyn UserStateRepository>,
    ) -> Self {
        let blacklist: Arc<dyn LogicChainNode> = Arc::new(BlackListLogicChain::new(repository.clone()));
        let weight: Arc<dyn LogicChainNode> =
            Arc::new(RuleWeightLogicChain::new(repository.clone(), user_state));
        Self::with_nodes(
            repository,
            vec![(RuleModel::Blacklist, blacklist), (RuleModel::Weight, weight)],
        )
    }

    pub fn with_nodes(
        repository: Arc<dyn StrategyRepository>,
        nodes: Vec<(RuleModel, Arc<dyn LogicChainNode>)>,
    ) -> Self {
        Self {
            repository,
            registry: nodes.into_iter().collect(),
        }
    }

    pub fn build_chain(&self, rule_models: &[String]) -> StrategyResult<LogicChain> {
        let mut nodes = Vec::with_capacity(rule_models.len());
        for code in rule_models {
            let model = code
                .parse::<RuleModel>()
                .inspect_err(|e| error!(error = %e, "strategy declares unknown rule model"))?;
            match self.registry.get(&model) {
                Some(node) => nodes.push(node.clone()),
                None if model.stage() != RuleStage::Before => {
                    debug!(rule_model = %model, "not a pre-draw rule, left out of chain");
                }
                None => {
                    error!(rule_model = %model, "no chain node registered");
                    return Err(StrategyError::UnknownRuleModel(model.code().to_string()));
                }
            }
        }
        Ok(LogicChain::new(nodes))
    }

    pub async fn open_logic_chain(&self, strategy_id: i64) -> StrategyResult<LogicChain> {
        let rule_models = self.repository.query_strategy_rule_models(strategy_id).await?;
        self.build_chain(&rule_models)
    }
}
