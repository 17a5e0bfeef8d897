//! External service integrations

pub mod rseries;

pub use rseries::{BuyOrdersSink, FallbackSink, RSeriesConnector};
