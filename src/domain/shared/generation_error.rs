use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::content::{CefrLevel, ContentType};
use crate::domain::prompts::PromptKind;

/// Pipeline step an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Genre,
    Topics,
    Article,
    Rating,
    MultipleChoice,
    ShortAnswer,
    LongAnswer,
    WordList,
    PersistArticle,
    Audio,
    WordAudio,
    Image,
    PersistMedia,
}

impl GenerationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Genre => "genre",
            GenerationStage::Topics => "topics",
            GenerationStage::Article => "article",
            GenerationStage::Rating => "rating",
            GenerationStage::MultipleChoice => "mc",
            GenerationStage::ShortAnswer => "sa",
            GenerationStage::LongAnswer => "la",
            GenerationStage::WordList => "word_list",
            GenerationStage::PersistArticle => "persist_article",
            GenerationStage::Audio => "audio",
            GenerationStage::WordAudio => "word_audio",
            GenerationStage::Image => "image",
            GenerationStage::PersistMedia => "persist_media",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse classification reported back to the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ShapeValidation,
    Service,
    ConfigurationMissing,
    SizeConstraint,
    AggregationInvariant,
    QualityGate,
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("unexpected response shape: {0}")]
    ShapeValidation(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("no {kind} prompt configured for {content_type} at {}", level_label(.level))]
    ConfigurationMissing {
        kind: PromptKind,
        content_type: ContentType,
        level: Option<CefrLevel>,
    },

    #[error("sentence {sentence_index} renders to {bytes} bytes, over the {limit} byte limit")]
    SizeConstraint {
        sentence_index: usize,
        bytes: usize,
        limit: usize,
    },

    #[error("timeline invariant violated: {0}")]
    AggregationInvariant(String),

    #[error("best article rating was {rating}, needs more than {threshold}")]
    QualityGate { rating: u8, threshold: u8 },

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation cancelled")]
    Cancelled,
}

fn level_label(level: &Option<CefrLevel>) -> String {
    level
        .map(|l| l.to_string())
        .unwrap_or_else(|| "any level".to_string())
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::ShapeValidation(_) => FailureKind::ShapeValidation,
            GenerationError::Service(_) => FailureKind::Service,
            GenerationError::ConfigurationMissing { .. } => FailureKind::ConfigurationMissing,
            GenerationError::SizeConstraint { .. } => FailureKind::SizeConstraint,
            GenerationError::AggregationInvariant(_) => FailureKind::AggregationInvariant,
            GenerationError::QualityGate { .. } => FailureKind::QualityGate,
            GenerationError::Timeout(_) => FailureKind::Timeout,
            GenerationError::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Transient failures are worth another attempt; logic and content edge cases are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::ShapeValidation(_)
                | GenerationError::Service(_)
                | GenerationError::Timeout(_)
        )
    }
}

/// The last error of a stage, tagged with where it happened
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{stage} failed after {attempts} attempt(s): {source}")]
pub struct StageError {
    pub stage: GenerationStage,
    pub attempts: u32,
    #[source]
    pub source: GenerationError,
}

impl StageError {
    /// A failure raised before any external call was made
    pub fn immediate(stage: GenerationStage, source: GenerationError) -> Self {
        Self {
            stage,
            attempts: 0,
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.source.kind()
    }
}
