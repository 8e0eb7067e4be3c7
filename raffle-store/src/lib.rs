pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod redis_repo;
pub mod strategy_repo;

pub use database::DbClient;
pub use memory_repo::{InMemoryStrategyRepository, InMemoryTableStore, InMemoryUserState};
pub use redis_repo::RedisClient;
pub use strategy_repo::PostgresStrategyRepository;
