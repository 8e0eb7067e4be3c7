use async_trait::async_trait;
use raffle_core::models::{AwardWeightEntry, RateTable, StrategyAwardRuleModels};
use raffle_core::repository::{RepoResult, StrategyRepository, TableStore, UserStateRepository};
use raffle_shared::TableKey;
use std::collections::HashMap;
use tokio::sync::RwLock;

type RuleValueKey = (i64, Option<i32>, String);

#[derive(Default)]
struct StrategyData {
    awards: HashMap<i64, Vec<AwardWeightEntry>>,
    strategy_rule_models: HashMap<i64, Vec<String>>,
    award_rule_models: HashMap<(i64, i32), String>,
    rule_values: HashMap<RuleValueKey, String>,
}

/// Strategy definitions held in process memory.
///
/// Builder methods seed the data up front; the async `insert_*` methods
/// mutate a shared instance at runtime.
#[derive(Default)]
pub struct InMemoryStrategyRepository {
    data: RwLock<StrategyData>,
}

impl InMemoryStrategyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_awards(mut self, strategy_id: i64, awards: Vec<AwardWeightEntry>) -> Self {
        self.data.get_mut().awards.insert(strategy_id, awards);
        self
    }

    pub fn with_strategy_rule_models(mut self, strategy_id: i64, rule_models: &[&str]) -> Self {
        self.data
            .get_mut()
            .strategy_rule_models
            .insert(strategy_id, rule_models.iter().map(|m| m.to_string()).collect());
        self
    }

    /// `raw` is the comma separated list stored against an award.
    pub fn with_award_rule_models(mut self, strategy_id: i64, award_id: i32, raw: &str) -> Self {
        self.data
            .get_mut()
            .award_rule_models
            .insert((strategy_id, award_id), raw.to_string());
        self
    }

    pub fn with_rule_value(
        mut self,
        strategy_id: i64,
        award_id: Option<i32>,
        rule_model: &str,
        value: &str,
    ) -> Self {
        self.data
            .get_mut()
            .rule_values
            .insert((strategy_id, award_id, rule_model.to_string()), value.to_string());
        self
    }

    pub async fn insert_awards(&self, strategy_id: i64, awards: Vec<AwardWeightEntry>) {
        self.data.write().await.awards.insert(strategy_id, awards);
    }
}

#[async_trait]
impl StrategyRepository for InMemoryStrategyRepository {
    async fn query_strategy_award_list(&self, strategy_id: i64) -> RepoResult<Vec<AwardWeightEntry>> {
        Ok(self
            .data
            .read()
            .await
            .awards
            .get(&strategy_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_strategy_rule_models(&self, strategy_id: i64) -> RepoResult<Vec<String>> {
        Ok(self
            .data
            .read()
            .await
            .strategy_rule_models
            .get(&strategy_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_award_rule_models(
        &self,
        strategy_id: i64,
        award_id: i32,
    ) -> RepoResult<StrategyAwardRuleModels> {
        let data = self.data.read().await;
        let raw = data.award_rule_models.get(&(strategy_id, award_id));
        Ok(StrategyAwardRuleModels::from_raw(raw.map(String::as_str)))
    }

    async fn query_strategy_rule_value(
        &self,
        strategy_id: i64,
        award_id: Option<i32>,
        rule_model: &str,
    ) -> RepoResult<Option<String>> {
        Ok(self
            .data
            .read()
            .await
            .rule_values
            .get(&(strategy_id, award_id, rule_model.to_string()))
            .cloned())
    }
}

/// Rate tables kept in a map, one entry per table key.
#[derive(Default)]
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<TableKey, RateTable>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn table(&self, key: &TableKey) -> Option<RateTable> {
        self.tables.read().await.get(key).cloned()
    }

    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn store_table(&self, key: &TableKey, table: &RateTable) -> RepoResult<()> {
        self.tables.write().await.insert(key.clone(), table.clone());
        Ok(())
    }

    async fn get_rate_range(&self, key: &TableKey) -> RepoResult<Option<u64>> {
        Ok(self.tables.read().await.get(key).map(RateTable::range))
    }

    async fn get_award_assemble(&self, key: &TableKey, slot: u64) -> RepoResult<Option<i32>> {
        Ok(self
            .tables
            .read()
            .await
            .get(key)
            .and_then(|table| table.award_at(slot)))
    }
}

#[derive(Default)]
struct UserData {
    scores: HashMap<String, i64>,
    draw_counts: HashMap<(String, i64), i64>,
}

/// Per-user score and draw counters. Unknown users read as zero.
#[derive(Default)]
pub struct InMemoryUserState {
    data: RwLock<UserData>,
}

impl InMemoryUserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, user_id: &str, score: i64) -> Self {
        self.data.get_mut().scores.insert(user_id.to_string(), score);
        self
    }

    pub fn with_draw_count(mut self, user_id: &str, strategy_id: i64, draw_count: i64) -> Self {
        self.data
            .get_mut()
            .draw_counts
            .insert((user_id.to_string(), strategy_id), draw_count);
        self
    }

    /// Bumps the draw counter and returns the new value.
    pub async fn record_draw(&self, user_id: &str, strategy_id: i64) -> i64 {
        let mut data = self.data.write().await;
        let count = data
            .draw_counts
            .entry((user_id.to_string(), strategy_id))
            .or_insert(0);
        *count += 1;
        *count
    }
}

#[async_trait]
impl UserStateRepository for InMemoryUserState {
    async fn current_user_score(&self, user_id: &str) -> RepoResult<i64> {
        Ok(self.data.read().await.scores.get(user_id).copied().unwrap_or(0))
    }

    async fn current_user_draw_count(&self, user_id: &str, strategy_id: i64) -> RepoResult<i64> {
        Ok(self
            .data
            .read()
            .await
            .draw_counts
            .get(&(user_id.to_string(), strategy_id))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_rule_value_lookup_is_scoped_by_award() {
        let repo = InMemoryStrategyRepository::new()
            .with_rule_value(100001, None, "rule_weight", "4000:tierA")
            .with_rule_value(100001, Some(101), "rule_lock", "2");

        let strategy_level = repo.query_strategy_rule_value(100001, None, "rule_weight").await.unwrap();
        assert_eq!(strategy_level.as_deref(), Some("4000:tierA"));
        let award_level = repo.query_strategy_rule_value(100001, None, "rule_lock").await.unwrap();
        assert_eq!(award_level, None);
        let lock = repo.query_strategy_rule_value(100001, Some(101), "rule_lock").await.unwrap();
        assert_eq!(lock.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_unknown_strategy_reads_empty() {
        let repo = InMemoryStrategyRepository::new();
        assert!(repo.query_strategy_award_list(1).await.unwrap().is_empty());
        assert!(repo.query_strategy_rule_models(1).await.unwrap().is_empty());
        let models = repo.query_award_rule_models(1, 101).await.unwrap();
        assert!(models.rule_models.is_empty());
    }

    #[tokio::test]
    async fn test_table_store_reads_back_slots() {
        let store = InMemoryTableStore::new();
        let key = TableKey::strategy(100001);
        let table = RateTable::new(2, vec![101, 102]);

        assert_eq!(store.get_rate_range(&key).await.unwrap(), None);
        store.store_table(&key, &table).await.unwrap();

        assert_eq!(store.get_rate_range(&key).await.unwrap(), Some(2));
        assert_eq!(store.get_award_assemble(&key, 1).await.unwrap(), Some(102));
        assert_eq!(store.get_award_assemble(&key, 2).await.unwrap(), None);
        assert_eq!(store.table_count().await, 1);
    }

    #[tokio::test]
    async fn test_user_state_defaults_to_zero() {
        let state = InMemoryUserState::new().with_score("alice", 4500);
        assert_eq!(state.current_user_score("alice").await.unwrap(), 4500);
        assert_eq!(state.current_user_score("bob").await.unwrap(), 0);
        assert_eq!(state.current_user_draw_count("bob", 100001).await.unwrap(), 0);

        assert_eq!(state.record_draw("bob", 100001).await, 1);
        assert_eq!(state.record_draw("bob", 100001).await, 2);
        assert_eq!(state.current_user_draw_count("bob", 100001).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_inserted_awards_replace_seeded_ones() {
        let repo = InMemoryStrategyRepository::new()
            .with_awards(100001, vec![AwardWeightEntry::new(100001, 101, Decimal::ONE)]);
        repo.insert_awards(100001, vec![]).await;
        assert!(repo.query_strategy_award_list(100001).await.unwrap().is_empty());
    }
}
