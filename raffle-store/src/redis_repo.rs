use crate::app_config::RedisConfig;
use async_trait::async_trait;
use raffle_core::models::RateTable;
use raffle_core::repository::{RepoResult, TableStore};
use raffle_shared::constants::redis_key;
use raffle_shared::TableKey;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use tracing::info;

// Slots per HSET in one pipeline.
const HSET_CHUNK: usize = 10_000;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    key_prefix: String,
    cache_ttl_seconds: u64,
}

impl RedisClient {
    pub async fn new(config: &RedisConfig) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Self {
            client,
            key_prefix: config.key_prefix.clone(),
            cache_ttl_seconds: config.cache_ttl_seconds,
        })
    }

    pub fn key(&self, suffix: &str, id: impl Display) -> String {
        format!("{}_{}{}", self.key_prefix, suffix, id)
    }

    /// Reads a JSON cached value.
    pub async fn get_value<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Caches a value as JSON for the configured TTL.
    pub async fn set_value<T: Serialize + Sync>(&self, key: &str, value: &T) -> RepoResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw = serde_json::to_string(value)?;
        conn.set_ex::<_, _, ()>(key, raw, self.cache_ttl_seconds).await?;
        Ok(())
    }

    pub async fn del_key(&self, key: &str) -> RepoResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[async_trait]
impl TableStore for RedisClient {
    async fn store_table(&self, key: &TableKey, table: &RateTable) -> RepoResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let range_key = self.key(redis_key::STRATEGY_RATE_RANGE_KEY, key);
        let table_key = self.key(redis_key::STRATEGY_RATE_TABLE_KEY, key);

        let slots: Vec<(u64, i32)> = table
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, award_id)| (slot as u64, *award_id))
            .collect();

        // Replace the whole table so a rebuild never leaves stale slots behind.
        let mut pipe = redis::pipe();
        pipe.atomic().del(&table_key).ignore();
        for chunk in slots.chunks(HSET_CHUNK) {
            pipe.hset_multiple(&table_key, chunk).ignore();
        }
        pipe.set(&range_key, table.range()).ignore();
        let (): () = pipe.query_async(&mut conn).await?;

        info!("Rate table stored: {} ({} slots)", key, table.range());
        Ok(())
    }

    async fn get_rate_range(&self, key: &TableKey) -> RepoResult<Option<u64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let range: Option<u64> = conn
            .get(self.key(redis_key::STRATEGY_RATE_RANGE_KEY, key))
            .await?;
        Ok(range)
    }

    async fn get_award_assemble(&self, key: &TableKey, slot: u64) -> RepoResult<Option<i32>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let award_id: Option<i32> = conn
            .hget(self.key(redis_key::STRATEGY_RATE_TABLE_KEY, key), slot)
            .await?;
        Ok(award_id)
    }
}
