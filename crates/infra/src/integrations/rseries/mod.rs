//! Lightspeed R-Series purchase-order target

pub mod connector;
pub mod sinks;

pub use connector::RSeriesConnector;
pub use sinks::{BuyOrdersSink, FallbackSink};
