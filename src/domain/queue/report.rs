use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::content::{ContentType, GeneratedQueueItem, GenerationRequest};
use crate::domain::shared::{FailureKind, GenerationStage, StageError};

/// Why one unit (or a whole content type, when `request` is `None`) was not produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub content_type: ContentType,
    pub request: Option<GenerationRequest>,
    pub stage: GenerationStage,
    pub kind: FailureKind,
    pub attempts: u32,
    pub message: String,
}

impl UnitFailure {
    pub fn from_stage(
        content_type: ContentType,
        request: Option<GenerationRequest>,
        error: &StageError,
    ) -> Self {
        Self {
            content_type,
            request,
            stage: error.stage,
            kind: error.kind(),
            attempts: error.attempts,
            message: error.to_string(),
        }
    }
}

pub type UnitOutcome = Result<GeneratedQueueItem, UnitFailure>;

/// Summary returned to the trigger after a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub total_requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub content_ids: Vec<String>,
    pub failures: Vec<UnitFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
}

impl GenerationReport {
    /// Units that never got as far as producing an outcome count as failed
    pub fn from_outcomes(
        total_requested: usize,
        outcomes: Vec<UnitOutcome>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        let mut content_ids = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(item) => content_ids.push(item.content_id),
                Err(failure) => failures.push(failure),
            }
        }

        let succeeded = content_ids.len();
        Self {
            total_requested,
            succeeded,
            failed: total_requested.saturating_sub(succeeded),
            content_ids,
            failures,
            started_at,
            finished_at,
            elapsed_seconds: (finished_at - started_at).num_milliseconds().max(0) as f64 / 1000.0,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.failures.is_empty()
    }
}
