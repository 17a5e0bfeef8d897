//! Purchase-order submission: mapping, id extraction and the two-phase
//! order/lines workflow

pub mod diagnostics;
pub mod extraction;
pub mod mapping;
pub mod ports;
pub mod service;

pub use extraction::{ExtractionRule, IdMatch};
pub use mapping::OrderMapper;
pub use service::{OrderSubmissionService, SubmissionStage};
