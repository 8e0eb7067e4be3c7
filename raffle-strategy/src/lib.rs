//! Raffle strategy domain: assembles weighted rate tables, draws against
//! them and applies the pre-draw chain and in-draw filters.

pub mod armory;
pub mod dispatch;
pub mod raffle;
pub mod rules;

pub use armory::{AssemblyReport, RateTableBuilder, StrategyArmory, WeightPartitioner};
pub use dispatch::StrategyDispatch;
pub use raffle::RaffleStrategy;
