pub mod award;
pub mod raffle;
pub mod rule;

pub use award::{AwardWeightEntry, RateTable};
pub use raffle::{RaffleFactor, RaffleRequest, RaffleResult};
pub use rule::{
    RuleDecision, RuleLogicCheckType, RuleModel, RulePayload, RuleStage, StrategyAwardRuleModels,
};
