pub mod engine;

pub use engine::{FundingEngine, FundingScan, DEFAULT_MIN_USD_OPEN_INTEREST};
