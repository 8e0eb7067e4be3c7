pub mod partition;
pub mod rate_table;

pub use partition::{tier_definitions, WeightPartitioner};
pub use rate_table::{RateTableBuilder, DEFAULT_MAX_SLOTS};

use crate::rules::weight::parse_weight_value;
use raffle_core::models::RuleModel;
use raffle_core::repository::{StrategyRepository, TableStore};
use raffle_core::{StrategyError, StrategyResult};
use raffle_shared::TableKey;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of assembling one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    pub strategy_id: i64,
    /// Realized slot count of the default table.
    pub default_range: u64,
    /// `(tier_key, realized slot count)` of every stored tier table.
    pub tiers: Vec<(String, u64)>,
    /// Tiers with no eligible award; nothing was stored for them.
    pub skipped_tiers: Vec<String>,
}

/// Builds a strategy's rate tables and publishes them to the table store.
pub struct StrategyArmory {
    repository: Arc<dyn StrategyRepository>,
    store: Arc<dyn TableStore>,
    builder: RateTableBuilder,
}

impl StrategyArmory {
    pub fn new(repository: Arc<dyn StrategyRepository>, store: Arc<dyn TableStore>) -> Self {
        Self::with_builder(repository, store, RateTableBuilder::new())
    }

    pub fn with_builder(
        repository: Arc<dyn StrategyRepository>,
        store: Arc<dyn TableStore>,
        builder: RateTableBuilder,
    ) -> Self {
        Self {
            repository,
            store,
            builder,
        }
    }

    /// Full rebuild of the default table and, for strategies declaring
    /// `rule_weight`, of every tier table. Safe to re-run.
    pub async fn assemble_lottery_strategy(&self, strategy_id: i64) -> StrategyResult<AssemblyReport> {
        let entries = self.repository.query_strategy_award_list(strategy_id).await?;

        let key = TableKey::strategy(strategy_id);
        let table = self
            .builder
            .build(&key, &entries)
            .inspect_err(|e| error!(strategy_id, error = %e, "strategy assembly failed"))?;
        self.store.store_table(&key, &table).await?;
        info!(strategy_id, range = table.range(), "default rate table stored");

        let mut report = AssemblyReport {
            strategy_id,
            default_range: table.range(),
            tiers: Vec::new(),
            skipped_tiers: Vec::new(),
        };

        let rule_models = self.repository.query_strategy_rule_models(strategy_id).await?;
        let has_weight = rule_models
            .iter()
            .any(|code| RuleModel::from_code(code) == Some(RuleModel::Weight));
        if !has_weight {
            return Ok(report);
        }

        let groups = self
            .repository
            .query_strategy_rule_value(strategy_id, None, RuleModel::Weight.code())
            .await?
            .ok_or_else(|| StrategyError::RuleValueMissing {
                strategy_id,
                award_id: None,
                rule_model: RuleModel::Weight.code().to_string(),
            })
            .and_then(|value| parse_weight_value(&value))
            .inspect_err(|e| error!(strategy_id, error = %e, "rule_weight configuration invalid"))?;

        let tiers = tier_definitions(groups.values().map(String::as_str), &entries);
        let partitioner = WeightPartitioner::new(self.builder.clone());
        for (tier_key, eligible) in &tiers {
            match partitioner.partition_tier(strategy_id, tier_key, &entries, eligible) {
                Ok(table) => {
                    let key = TableKey::tier(strategy_id, tier_key.clone());
                    self.store.store_table(&key, &table).await?;
                    info!(strategy_id, tier_key = %tier_key, range = table.range(), "tier rate table stored");
                    report.tiers.push((tier_key.clone(), table.range()));
                }
                Err(StrategyError::EmptyTier { tier_key }) => {
                    warn!(strategy_id, tier_key = %tier_key, "no eligible award for tier, skipped");
                    report.skipped_tiers.push(tier_key);
                }
                Err(e) => {
                    error!(strategy_id, tier_key = %tier_key, error = %e, "tier assembly failed");
                    return Err(e);
                }
            }
        }

        Ok(report)
    }
}
