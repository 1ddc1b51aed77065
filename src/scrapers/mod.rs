pub mod hyperliquid;

pub use hyperliquid::{HyperliquidClient, UpstreamError};
