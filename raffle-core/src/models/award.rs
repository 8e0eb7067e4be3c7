use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One award of a strategy together with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardWeightEntry {
    pub strategy_id: i64,
    pub award_id: i32,
    #[serde(default)]
    pub award_title: Option<String>,
    /// Probability in `[0, 1]`, not a count.
    pub rate: Decimal,
    /// Weight tiers this award is eligible for.
    #[serde(default)]
    pub tier_keys: BTreeSet<String>,
}

impl AwardWeightEntry {
    pub fn new(strategy_id: i64, award_id: i32, rate: Decimal) -> Self {
        Self {
            strategy_id,
            award_id,
            award_title: None,
            rate,
            tier_keys: BTreeSet::new(),
        }
    }

    pub fn with_tier(mut self, tier_key: impl Into<String>) -> Self {
        self.tier_keys.insert(tier_key.into());
        self
    }
}

/// Assembled lookup table: a random slot index resolves to an award id in O(1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    nominal_range: u64,
    slots: Vec<i32>,
}

impl RateTable {
    pub fn new(nominal_range: u64, slots: Vec<i32>) -> Self {
        Self { nominal_range, slots }
    }

    /// Realized slot count. Draws must sample `[0, range)` against this value.
    pub fn range(&self) -> u64 {
        self.slots.len() as u64
    }

    /// `ceil(total_rate / min_rate)`. Per-award ceilings may push the
    /// realized size above it.
    pub fn nominal_range(&self) -> u64 {
        self.nominal_range
    }

    pub fn slots(&self) -> &[i32] {
        &self.slots
    }

    pub fn award_at(&self, slot: u64) -> Option<i32> {
        usize::try_from(slot).ok().and_then(|i| self.slots.get(i).copied())
    }

    pub fn slot_count(&self, award_id: i32) -> usize {
        self.slots.iter().filter(|id| **id == award_id).count()
    }
}
