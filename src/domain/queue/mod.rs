pub mod error;
pub mod report;
pub mod service;

pub use error::QueueServiceError;
pub use report::{GenerationReport, UnitFailure, UnitOutcome};
pub use service::{QueueService, QueueServiceApi, MAX_AMOUNT_PER_GENRE};
