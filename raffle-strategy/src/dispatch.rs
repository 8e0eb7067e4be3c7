use raffle_core::repository::TableStore;
use raffle_core::{StrategyError, StrategyResult};
use raffle_shared::TableKey;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Draws awards from assembled rate tables.
///
/// Every draw samples the OS CSPRNG independently; no generator state is
/// shared between calls.
///
/// The range and the slot are two separate store reads. A draw racing a
/// rebuild that shrinks the table can miss its slot; that surfaces as a
/// store error, not as `TableNotAssembled`.
#[derive(Clone)]
pub struct StrategyDispatch {
    store: Arc<dyn TableStore>,
}

impl StrategyDispatch {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn draw_default(&self, strategy_id: i64) -> StrategyResult<i32> {
        self.draw(&TableKey::strategy(strategy_id)).await
    }

    pub async fn draw_tier(&self, strategy_id: i64, tier_key: &str) -> StrategyResult<i32> {
        self.draw(&TableKey::tier(strategy_id, tier_key)).await
    }

    async fn draw(&self, key: &TableKey) -> StrategyResult<i32> {
        let range = match self.store.get_rate_range(key).await? {
            Some(range) if range > 0 => range,
            _ => return Err(not_assembled(key)),
        };

        let slot = OsRng.gen_range(0..range);
        let award_id = self
            .store
            .get_award_assemble(key, slot)
            .await?
            .ok_or_else(|| slot_missing(key, slot, range))?;

        debug!(key = %key, range, slot, award_id, "award drawn");
        Ok(award_id)
    }
}

fn slot_missing(key: &TableKey, slot: u64, range: u64) -> StrategyError {
    warn!(key = %key, slot, range, "slot missing from rate table");
    StrategyError::Repository(format!("slot {} missing from rate table {} of range {}", slot, key, range).into())
}

fn not_assembled(key: &TableKey) -> StrategyError {
    error!(key = %key, "rate table not assembled");
    StrategyError::TableNotAssembled { key: key.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use raffle_core::models::RateTable;
    use raffle_core::repository::RepoResult;
    use raffle_core::ErrorKind;

    /// Reports a range but has lost every slot, as after a shrinking rebuild.
    struct ShrunkStore;

    #[async_trait]
    impl TableStore for ShrunkStore {
        async fn store_table(&self, _key: &TableKey, _table: &RateTable) -> RepoResult<()> {
            Ok(())
        }

        async fn get_rate_range(&self, _key: &TableKey) -> RepoResult<Option<u64>> {
            Ok(Some(10))
        }

        async fn get_award_assemble(&self, _key: &TableKey, _slot: u64) -> RepoResult<Option<i32>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_missing_slot_is_a_store_error() {
        let dispatch = StrategyDispatch::new(Arc::new(ShrunkStore));
        let err = dispatch.draw_default(100001).await.unwrap_err();
        assert!(matches!(err, StrategyError::Repository(_)));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
    }

    #[tokio::test]
    async fn test_missing_range_is_not_assembled() {
        let dispatch = StrategyDispatch::new(Arc::new(raffle_store::InMemoryTableStore::new()));
        let err = dispatch.draw_default(100001).await.unwrap_err();
        assert!(matches!(err, StrategyError::TableNotAssembled { .. }));
    }
}
