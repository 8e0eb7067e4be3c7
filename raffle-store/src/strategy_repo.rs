use crate::RedisClient;
use async_trait::async_trait;
use raffle_core::models::{AwardWeightEntry, StrategyAwardRuleModels};
use raffle_core::repository::{RepoResult, StrategyRepository};
use raffle_shared::constants::{redis_key, split_list, SPLIT};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::warn;

pub struct PostgresStrategyRepository {
    pub pool: PgPool,
    pub redis: RedisClient,
}

#[derive(sqlx::FromRow)]
struct StrategyAwardRow {
    strategy_id: i64,
    award_id: i32,
    award_title: Option<String>,
    award_rate: Decimal,
    tier_keys: Option<String>,
}

impl From<StrategyAwardRow> for AwardWeightEntry {
    fn from(row: StrategyAwardRow) -> Self {
        AwardWeightEntry {
            strategy_id: row.strategy_id,
            award_id: row.award_id,
            award_title: row.award_title,
            rate: row.award_rate,
            tier_keys: row
                .tier_keys
                .as_deref()
                .map(|keys| split_list(keys, SPLIT).map(String::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl PostgresStrategyRepository {
    pub fn new(pool: PgPool, redis: RedisClient) -> Self {
        Self { pool, redis }
    }

    /// Drops cached definitions of a strategy; call before re-assembling it.
    pub async fn evict_strategy(&self, strategy_id: i64) -> RepoResult<()> {
        self.redis
            .del_key(&self.redis.key(redis_key::STRATEGY_AWARD_KEY, strategy_id))
            .await?;
        self.redis
            .del_key(&self.redis.key(redis_key::STRATEGY_RULE_MODELS_KEY, strategy_id))
            .await
    }
}

#[async_trait]
impl StrategyRepository for PostgresStrategyRepository {
    async fn query_strategy_award_list(&self, strategy_id: i64) -> RepoResult<Vec<AwardWeightEntry>> {
        let cache_key = self.redis.key(redis_key::STRATEGY_AWARD_KEY, strategy_id);
        let cached: Option<Vec<AwardWeightEntry>> = self.redis.get_value(&cache_key).await.ok().flatten();
        if let Some(entries) = cached.filter(|entries| !entries.is_empty()) {
            return Ok(entries);
        }

        let rows = sqlx::query_as::<_, StrategyAwardRow>(
            r#"
            SELECT strategy_id, award_id, award_title, award_rate, tier_keys
            FROM strategy_award
            WHERE strategy_id = $1
            ORDER BY sort, award_id
            "#,
        )
        .bind(strategy_id)
        .fetch_all(&self.pool)
        .await?;

        let entries: Vec<AwardWeightEntry> = rows.into_iter().map(AwardWeightEntry::from).collect();
        if !entries.is_empty() {
            if let Err(e) = self.redis.set_value(&cache_key, &entries).await {
                warn!("Failed to cache award list {}: {}", cache_key, e);
            }
        }
        Ok(entries)
    }

    async fn query_strategy_rule_models(&self, strategy_id: i64) -> RepoResult<Vec<String>> {
        let cache_key = self.redis.key(redis_key::STRATEGY_RULE_MODELS_KEY, strategy_id);
        let cached: Option<Vec<String>> = self.redis.get_value(&cache_key).await.ok().flatten();
        if let Some(models) = cached {
            return Ok(models);
        }

        let raw: Option<Option<String>> =
            sqlx::query_scalar("SELECT rule_models FROM strategy WHERE strategy_id = $1")
                .bind(strategy_id)
                .fetch_optional(&self.pool)
                .await?;

        let models: Vec<String> = raw
            .flatten()
            .as_deref()
            .map(|value| split_list(value, SPLIT).map(String::from).collect())
            .unwrap_or_default();
        if let Err(e) = self.redis.set_value(&cache_key, &models).await {
            warn!("Failed to cache rule models {}: {}", cache_key, e);
        }
        Ok(models)
    }

    async fn query_award_rule_models(
        &self,
        strategy_id: i64,
        award_id: i32,
    ) -> RepoResult<StrategyAwardRuleModels> {
        let raw: Option<Option<String>> = sqlx::query_scalar(
            "SELECT rule_models FROM strategy_award WHERE strategy_id = $1 AND award_id = $2",
        )
        .bind(strategy_id)
        .bind(award_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(StrategyAwardRuleModels::from_raw(raw.flatten().as_deref()))
    }

    async fn query_strategy_rule_value(
        &self,
        strategy_id: i64,
        award_id: Option<i32>,
        rule_model: &str,
    ) -> RepoResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
            SELECT rule_value
            FROM strategy_rule
            WHERE strategy_id = $1
              AND award_id IS NOT DISTINCT FROM $2
              AND rule_model = $3
            LIMIT 1
            "#,
        )
        .bind(strategy_id)
        .bind(award_id)
        .bind(rule_model)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_tier_keys_are_split() {
        let entry = AwardWeightEntry::from(StrategyAwardRow {
            strategy_id: 100001,
            award_id: 102,
            award_title: Some("bonus".into()),
            award_rate: Decimal::new(25, 2),
            tier_keys: Some("tierA, tierB,".into()),
        });

        assert_eq!(entry.rate, Decimal::new(25, 2));
        assert_eq!(entry.tier_keys.len(), 2);
        assert!(entry.tier_keys.contains("tierA"));
        assert!(entry.tier_keys.contains("tierB"));
    }

    #[test]
    fn test_row_without_tiers() {
        let entry = AwardWeightEntry::from(StrategyAwardRow {
            strategy_id: 100001,
            award_id: 101,
            award_title: None,
            award_rate: Decimal::ONE,
            tier_keys: None,
        });
        assert!(entry.tier_keys.is_empty());
    }
}
