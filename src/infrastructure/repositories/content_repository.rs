use async_trait::async_trait;

use crate::domain::content::{GeneratedArticle, GenerationRequest, QuestionSet, WordListEntry};
use crate::domain::queue::GenerationReport;
use crate::domain::tts::Timepoint;
use crate::error::AppResult;

/// Storage for generated learning units, keyed by content id.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Connectivity check used by the readiness endpoint
    async fn ping(&self) -> AppResult<()>;

    async fn create_article(
        &self,
        content_id: &str,
        request: &GenerationRequest,
        article: &GeneratedArticle,
    ) -> AppResult<()>;

    async fn add_questions(&self, content_id: &str, questions: &QuestionSet) -> AppResult<()>;

    async fn add_word_list(&self, content_id: &str, words: &[WordListEntry]) -> AppResult<()>;

    async fn update_timepoints(&self, content_id: &str, timepoints: &[Timepoint]) -> AppResult<()>;

    /// Timeline of the narrated word list, one entry per vocabulary word
    async fn update_word_timepoints(
        &self,
        content_id: &str,
        timepoints: &[Timepoint],
    ) -> AppResult<()>;

    async fn update_image(&self, content_id: &str, image_key: &str) -> AppResult<()>;

    /// Keep the failures of a run for later inspection
    async fn record_error_log(&self, report: &GenerationReport) -> AppResult<()>;
}
