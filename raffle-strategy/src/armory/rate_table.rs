use raffle_core::models::{AwardWeightEntry, RateTable};
use raffle_core::{StrategyError, StrategyResult};
use raffle_shared::TableKey;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

pub const DEFAULT_MAX_SLOTS: u64 = 10_000_000;

/// Turns award rates into a shuffled lookup table.
///
/// The nominal range is `ceil(total_rate / min_rate)` and every award gets
/// `ceil(range * rate)` slots. Per-award ceilings can over-allocate by up to
/// `entries - 1` slots; the surplus is kept, so the realized table size is
/// what draws must sample against.
#[derive(Debug, Clone)]
pub struct RateTableBuilder {
    max_slots: u64,
}

impl RateTableBuilder {
    pub fn new() -> Self {
        Self::with_max_slots(DEFAULT_MAX_SLOTS)
    }

    pub fn with_max_slots(max_slots: u64) -> Self {
        Self { max_slots }
    }

    pub fn build(&self, key: &TableKey, entries: &[AwardWeightEntry]) -> StrategyResult<RateTable> {
        self.build_with_rng(key, entries, &mut rand::thread_rng())
    }

    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        key: &TableKey,
        entries: &[AwardWeightEntry],
        rng: &mut R,
    ) -> StrategyResult<RateTable> {
        let mut weighted = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.rate < Decimal::ZERO || entry.rate > Decimal::ONE {
                return Err(StrategyError::InvalidAwardRate {
                    award_id: entry.award_id,
                    rate: entry.rate,
                });
            }
            if entry.rate.is_zero() {
                debug!(key = %key, award_id = entry.award_id, "zero rate award gets no slots");
                continue;
            }
            weighted.push((entry.award_id, entry.rate));
        }

        let min_rate = weighted
            .iter()
            .map(|(_, rate)| *rate)
            .min()
            .ok_or_else(|| StrategyError::EmptyAwardSet { key: key.to_string() })?;
        let total_rate: Decimal = weighted.iter().map(|(_, rate)| *rate).sum();

        let range = total_rate
            .checked_div(min_rate)
            .map(|r| r.ceil())
            .ok_or_else(|| self.too_large(key, u64::MAX))?;
        let nominal_range = self.to_slots(key, range)?;

        let mut counts = Vec::with_capacity(weighted.len());
        let mut total: u64 = 0;
        for &(award_id, rate) in &weighted {
            let count = self.to_slots(key, (range * rate).ceil())?;
            total = total.saturating_add(count);
            counts.push((award_id, count));
        }
        if total > self.max_slots {
            return Err(self.too_large(key, total));
        }

        let mut slots = Vec::with_capacity(total as usize);
        for (award_id, count) in counts {
            slots.extend(std::iter::repeat(award_id).take(count as usize));
        }
        slots.shuffle(rng);

        debug!(key = %key, nominal_range, range = slots.len(), "rate table built");
        Ok(RateTable::new(nominal_range, slots))
    }

    fn to_slots(&self, key: &TableKey, value: Decimal) -> StrategyResult<u64> {
        match value.to_u64() {
            Some(slots) if slots <= self.max_slots => Ok(slots),
            Some(slots) => Err(self.too_large(key, slots)),
            None => Err(self.too_large(key, u64::MAX)),
        }
    }

    fn too_large(&self, key: &TableKey, slots: u64) -> StrategyError {
        StrategyError::TableTooLarge {
            key: key.to_string(),
            slots,
            max_slots: self.max_slots,
        }
    }
}

impl Default for RateTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
