pub mod constants;
pub mod keys;

pub use keys::TableKey;
