use raffle_core::models::{AwardWeightEntry, RaffleRequest};
use raffle_core::StrategyError;
use raffle_store::{InMemoryStrategyRepository, InMemoryTableStore, InMemoryUserState};
use raffle_strategy::raffle::RULE_INTERCEPT_DESC;
use raffle_strategy::{RaffleStrategy, StrategyArmory};
use rust_decimal::Decimal;
use std::sync::Arc;

const STRATEGY_ID: i64 = 100001;

fn rate(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn repository() -> InMemoryStrategyRepository {
    InMemoryStrategyRepository::new()
        .with_awards(
            STRATEGY_ID,
            vec![
                AwardWeightEntry::new(STRATEGY_ID, 101, rate("0.8")),
                AwardWeightEntry::new(STRATEGY_ID, 102, rate("0.1")).with_tier("tierA"),
                AwardWeightEntry::new(STRATEGY_ID, 103, rate("0.1"))
                    .with_tier("tierA")
                    .with_tier("tierB"),
            ],
        )
        .with_strategy_rule_models(STRATEGY_ID, &["rule_blacklist", "rule_weight"])
        .with_rule_value(STRATEGY_ID, None, "rule_blacklist", "100:black1,black2")
        .with_rule_value(STRATEGY_ID, None, "rule_weight", "2000:102 4000:tierA 6000:tierB")
        .with_award_rule_models(STRATEGY_ID, 102, "rule_lock,rule_luck_award")
        .with_rule_value(STRATEGY_ID, Some(102), "rule_lock", "3")
        .with_rule_value(STRATEGY_ID, Some(102), "rule_luck_award", "100:1,100")
}

struct Fixture {
    armory: StrategyArmory,
    raffle: RaffleStrategy,
}

fn fixture(user_state: InMemoryUserState) -> Fixture {
    let repository = Arc::new(repository());
    let store = Arc::new(InMemoryTableStore::new());
    Fixture {
        armory: StrategyArmory::new(repository.clone(), store.clone()),
        raffle: RaffleStrategy::new(repository, store, Arc::new(user_state)),
    }
}

async fn assembled(user_state: InMemoryUserState) -> RaffleStrategy {
    let fixture = fixture(user_state);
    fixture.armory.assemble_lottery_strategy(STRATEGY_ID).await.unwrap();
    fixture.raffle
}

#[tokio::test]
async fn test_assembly_builds_default_and_tier_tables() {
    let fixture = fixture(InMemoryUserState::new());
    let report = fixture.armory.assemble_lottery_strategy(STRATEGY_ID).await.unwrap();

    assert_eq!(report.default_range, 10);
    assert_eq!(
        report.tiers,
        vec![("102".to_string(), 1), ("tierA".to_string(), 2), ("tierB".to_string(), 1)]
    );
    assert!(report.skipped_tiers.is_empty());
}

#[tokio::test]
async fn test_default_draw_without_score() {
    let raffle = assembled(InMemoryUserState::new()).await;
    let request = RaffleRequest::new("alice", STRATEGY_ID);

    for _ in 0..200 {
        let result = raffle.perform_raffle(&request).await.unwrap();
        match result.award_id {
            Some(award_id) => assert!(award_id == 101 || award_id == 103, "{}", award_id),
            // 102 is locked until three draws.
            None => assert_eq!(result.award_desc.as_deref(), Some(RULE_INTERCEPT_DESC)),
        }
    }
}

#[tokio::test]
async fn test_score_routes_to_tier_table() {
    let raffle = assembled(InMemoryUserState::new().with_score("alice", 7000)).await;
    let request = RaffleRequest::new("alice", STRATEGY_ID);

    for _ in 0..50 {
        let result = raffle.perform_raffle(&request).await.unwrap();
        assert_eq!(result.award_id, Some(103));
    }
}

#[tokio::test]
async fn test_tier_draw_respects_eligibility() {
    let user_state = InMemoryUserState::new()
        .with_score("alice", 5000)
        .with_draw_count("alice", STRATEGY_ID, 10);
    let raffle = assembled(user_state).await;
    let request = RaffleRequest::new("alice", STRATEGY_ID);

    for _ in 0..100 {
        let award_id = raffle.perform_raffle(&request).await.unwrap().award_id;
        assert!(matches!(award_id, Some(102) | Some(103)), "{:?}", award_id);
    }
}

#[tokio::test]
async fn test_blacklist_settles_before_any_draw() {
    // Nothing assembled: a draw would fail with TableNotAssembled.
    let fixture = fixture(InMemoryUserState::new().with_score("black1", 7000));
    let result = fixture
        .raffle
        .perform_raffle(&RaffleRequest::new("black1", STRATEGY_ID))
        .await
        .unwrap();

    assert_eq!(result.award_id, Some(100));
    assert!(!result.is_fallback());
}

#[tokio::test]
async fn test_lock_vetoes_until_enough_draws() {
    let user_state = InMemoryUserState::new()
        .with_score("alice", 3000)
        .with_draw_count("alice", STRATEGY_ID, 1)
        .with_score("bob", 3000)
        .with_draw_count("bob", STRATEGY_ID, 3);
    let raffle = assembled(user_state).await;

    let vetoed = raffle
        .perform_raffle(&RaffleRequest::new("alice", STRATEGY_ID))
        .await
        .unwrap();
    assert!(vetoed.is_fallback());
    assert_eq!(vetoed.award_desc.as_deref(), Some(RULE_INTERCEPT_DESC));

    let unlocked = raffle
        .perform_raffle(&RaffleRequest::new("bob", STRATEGY_ID))
        .await
        .unwrap();
    assert_eq!(unlocked.award_id, Some(102));
}

#[tokio::test]
async fn test_vetoed_award_resolves_to_luck_award() {
    let raffle = assembled(InMemoryUserState::new()).await;
    let request = RaffleRequest::new("alice", STRATEGY_ID);

    assert_eq!(raffle.resolve_luck_award(&request, 102).await.unwrap(), Some(100));
    assert_eq!(raffle.resolve_luck_award(&request, 101).await.unwrap(), None);
}

#[tokio::test]
async fn test_invalid_request_is_rejected() {
    let raffle = assembled(InMemoryUserState::new()).await;

    let err = raffle
        .perform_raffle(&RaffleRequest::new("", STRATEGY_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, StrategyError::IllegalParameter(_)));

    let missing_strategy = RaffleRequest {
        user_id: "alice".into(),
        strategy_id: None,
    };
    let err = raffle.perform_raffle(&missing_strategy).await.unwrap_err();
    assert!(matches!(err, StrategyError::IllegalParameter(_)));
}

#[tokio::test]
async fn test_unassembled_strategy_cannot_draw() {
    let fixture = fixture(InMemoryUserState::new());
    let err = fixture
        .raffle
        .perform_raffle(&RaffleRequest::new("alice", 999))
        .await
        .unwrap_err();

    assert!(matches!(err, StrategyError::TableNotAssembled { ref key } if key == "999"));
}

#[tokio::test]
async fn test_unknown_rule_model_is_a_configuration_error() {
    let repository = Arc::new(
        InMemoryStrategyRepository::new()
            .with_awards(100009, vec![AwardWeightEntry::new(100009, 101, Decimal::ONE)])
            .with_strategy_rule_models(100009, &["rule_vip"]),
    );
    let store = Arc::new(InMemoryTableStore::new());
    StrategyArmory::new(repository.clone(), store.clone())
        .assemble_lottery_strategy(100009)
        .await
        .unwrap();
    let raffle = RaffleStrategy::new(repository, store, Arc::new(InMemoryUserState::new()));

    let err = raffle
        .perform_raffle(&RaffleRequest::new("alice", 100009))
        .await
        .unwrap_err();
    assert!(matches!(err, StrategyError::UnknownRuleModel(ref m) if m == "rule_vip"));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_unknown_award_rule_model_does_not_block_lock() {
    let repository = Arc::new(
        InMemoryStrategyRepository::new()
            .with_awards(1, vec![AwardWeightEntry::new(1, 101, Decimal::ONE)])
            .with_award_rule_models(1, 101, "rule_lock,rule_stock")
            .with_rule_value(1, Some(101), "rule_lock", "1"),
    );
    let store = Arc::new(InMemoryTableStore::new());
    let user_state = Arc::new(InMemoryUserState::new());
    StrategyArmory::new(repository.clone(), store.clone())
        .assemble_lottery_strategy(1)
        .await
        .unwrap();
    let raffle = RaffleStrategy::new(repository, store, user_state.clone());
    let request = RaffleRequest::new("alice", 1);

    let locked = raffle.perform_raffle(&request).await.unwrap();
    assert!(locked.is_fallback());

    assert_eq!(user_state.record_draw("alice", 1).await, 1);
    let unlocked = raffle.perform_raffle(&request).await.unwrap();
    assert_eq!(unlocked.award_id, Some(101));
}
