use super::rate_table::RateTableBuilder;
use raffle_core::models::{AwardWeightEntry, RateTable};
use raffle_core::{StrategyError, StrategyResult};
use raffle_shared::constants::{split_list, SPLIT};
use raffle_shared::TableKey;
use std::collections::{BTreeMap, BTreeSet};

/// Builds one rate table per weight tier from the awards eligible for it.
#[derive(Debug, Clone, Default)]
pub struct WeightPartitioner {
    builder: RateTableBuilder,
}

impl WeightPartitioner {
    pub fn new(builder: RateTableBuilder) -> Self {
        Self { builder }
    }

    pub fn partition_tier(
        &self,
        strategy_id: i64,
        tier_key: &str,
        entries: &[AwardWeightEntry],
        eligible: &BTreeSet<i32>,
    ) -> StrategyResult<RateTable> {
        let tier_entries: Vec<AwardWeightEntry> = entries
            .iter()
            .filter(|entry| eligible.contains(&entry.award_id))
            .cloned()
            .collect();
        if tier_entries.is_empty() {
            return Err(StrategyError::EmptyTier {
                tier_key: tier_key.to_string(),
            });
        }
        self.builder
            .build(&TableKey::tier(strategy_id, tier_key), &tier_entries)
    }

    /// Partitions every tier. Failures are reported per tier so callers can
    /// skip an empty tier and keep the rest.
    pub fn partition(
        &self,
        strategy_id: i64,
        entries: &[AwardWeightEntry],
        tiers: &BTreeMap<String, BTreeSet<i32>>,
    ) -> BTreeMap<String, StrategyResult<RateTable>> {
        tiers
            .iter()
            .map(|(tier_key, eligible)| {
                let table = self.partition_tier(strategy_id, tier_key, entries, eligible);
                (tier_key.clone(), table)
            })
            .collect()
    }
}

/// Resolves the eligible award ids of each tier named in a weight rule.
///
/// An award is eligible when its own `tier_keys` name the tier, or when the
/// tier key itself is a comma separated award id list such as `102,103,104`.
pub fn tier_definitions<'a>(
    tier_keys: impl IntoIterator<Item = &'a str>,
    entries: &[AwardWeightEntry],
) -> BTreeMap<String, BTreeSet<i32>> {
    let mut tiers = BTreeMap::new();
    for tier_key in tier_keys {
        let mut eligible: BTreeSet<i32> = entries
            .iter()
            .filter(|entry| entry.tier_keys.contains(tier_key))
            .map(|entry| entry.award_id)
            .collect();

        let listed: Result<Vec<i32>, _> = split_list(tier_key, SPLIT).map(str::parse::<i32>).collect();
        if let Ok(listed) = listed {
            eligible.extend(listed);
        }

        tiers
            .entry(tier_key.to_string())
            .or_insert_with(BTreeSet::new)
            .extend(eligible);
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn entries() -> Vec<AwardWeightEntry> {
        vec![
            AwardWeightEntry::new(100001, 101, Decimal::new(5, 1)).with_tier("tierA"),
            AwardWeightEntry::new(100001, 102, Decimal::new(3, 1)).with_tier("tierA").with_tier("tierB"),
            AwardWeightEntry::new(100001, 103, Decimal::new(2, 1)).with_tier("tierB"),
        ]
    }

    #[test]
    fn test_tier_definitions_from_entry_tags() {
        let tiers = tier_definitions(["tierA", "tierB"], &entries());
        assert_eq!(tiers["tierA"], BTreeSet::from([101, 102]));
        assert_eq!(tiers["tierB"], BTreeSet::from([102, 103]));
    }

    #[test]
    fn test_tier_definitions_from_award_list_key() {
        let tiers = tier_definitions(["102,103"], &entries());
        assert_eq!(tiers["102,103"], BTreeSet::from([102, 103]));
    }

    #[test]
    fn test_partition_only_uses_eligible_awards() {
        let partitioner = WeightPartitioner::default();
        let tiers = tier_definitions(["tierB"], &entries());
        let tables = partitioner.partition(100001, &entries(), &tiers);

        let table = tables["tierB"].as_ref().unwrap();
        assert!(table.slots().iter().all(|id| *id == 102 || *id == 103));
        assert_eq!(table.slot_count(101), 0);
    }

    #[test]
    fn test_empty_tier_is_reported() {
        let partitioner = WeightPartitioner::default();
        let err = partitioner
            .partition_tier(100001, "tierZ", &entries(), &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, StrategyError::EmptyTier { ref tier_key } if tier_key == "tierZ"));

        let tiers = tier_definitions(["tierA", "tierZ"], &entries());
        let tables = partitioner.partition(100001, &entries(), &tiers);
        assert!(tables["tierA"].is_ok());
        assert!(tables["tierZ"].is_err());
    }
}
