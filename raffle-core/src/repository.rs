use crate::models::{AwardWeightEntry, RateTable, StrategyAwardRuleModels};
use async_trait::async_trait;
use raffle_shared::TableKey;
use std::error::Error;

pub type RepoResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Read access to strategy, award and rule definitions.
#[async_trait]
pub trait StrategyRepository: Send + Sync {
    async fn query_strategy_award_list(&self, strategy_id: i64) -> RepoResult<Vec<AwardWeightEntry>>;

    /// Pre-draw rule models of a strategy in declaration order.
    async fn query_strategy_rule_models(&self, strategy_id: i64) -> RepoResult<Vec<String>>;

    async fn query_award_rule_models(
        &self,
        strategy_id: i64,
        award_id: i32,
    ) -> RepoResult<StrategyAwardRuleModels>;

    /// Raw rule value; the format is owned by the rule implementation.
    async fn query_strategy_rule_value(
        &self,
        strategy_id: i64,
        award_id: Option<i32>,
        rule_model: &str,
    ) -> RepoResult<Option<String>>;
}

/// Shared storage for assembled rate tables.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Replaces the range and slots stored under `key`.
    async fn store_table(&self, key: &TableKey, table: &RateTable) -> RepoResult<()>;

    async fn get_rate_range(&self, key: &TableKey) -> RepoResult<Option<u64>>;

    async fn get_award_assemble(&self, key: &TableKey, slot: u64) -> RepoResult<Option<i32>>;
}

/// Per-user counters owned by other services.
#[async_trait]
pub trait UserStateRepository: Send + Sync {
    async fn current_user_score(&self, user_id: &str) -> RepoResult<i64>;

    async fn current_user_draw_count(&self, user_id: &str, strategy_id: i64) -> RepoResult<i64>;
}
