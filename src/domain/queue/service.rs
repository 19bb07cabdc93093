use async_trait::async_trait;
use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::QueueServiceError;
use super::report::{GenerationReport, UnitFailure, UnitOutcome};
use crate::domain::content::{
    CefrLevel, ContentType, GeneratedQueueItem, GenerationRequest, GenreSelection,
};
use crate::domain::generators::ContentGenerator;
use crate::domain::image::ImageService;
use crate::domain::shared::{GenerationError, GenerationStage, RetryPolicy, StageError};
use crate::domain::tts::{AudioService, Narration, Timepoint};
use crate::error::AppResult;
use crate::infrastructure::repositories::ContentRepository;

pub const MAX_AMOUNT_PER_GENRE: usize = 20;

pub struct QueueService {
    generator: Arc<ContentGenerator>,
    audio_service: Arc<AudioService>,
    image_service: Arc<ImageService>,
    content_repo: Arc<dyn ContentRepository>,
    retry: RetryPolicy,
    level_concurrency: usize,
}

impl QueueService {
    pub fn new(
        generator: Arc<ContentGenerator>,
        audio_service: Arc<AudioService>,
        image_service: Arc<ImageService>,
        content_repo: Arc<dyn ContentRepository>,
        retry: RetryPolicy,
        level_concurrency: usize,
    ) -> Self {
        Self {
            generator,
            audio_service,
            image_service,
            content_repo,
            retry,
            level_concurrency: level_concurrency.max(1),
        }
    }
}

#[async_trait]
pub trait QueueServiceApi: Send + Sync {
    /// Fill the queue for every content type and level
    ///
    /// This operation:
    /// - Picks a genre and brainstorms `amount_per_genre` topics per content type
    /// - Generates one unit per topic and CEFR level
    /// - Records failures in the error log without stopping sibling units
    ///
    /// Content types run one after the other; topics run concurrently.
    async fn generate_queue(
        &self,
        amount_per_genre: usize,
        token: CancellationToken,
    ) -> Result<GenerationReport, QueueServiceError>;

    /// Generate a single unit for a fully specified request
    async fn generate_single(
        &self,
        request: GenerationRequest,
        token: CancellationToken,
    ) -> Result<GenerationReport, QueueServiceError>;
}

#[async_trait]
impl QueueServiceApi for QueueService {
    async fn generate_queue(
        &self,
        amount_per_genre: usize,
        token: CancellationToken,
    ) -> Result<GenerationReport, QueueServiceError> {
        if amount_per_genre == 0 || amount_per_genre > MAX_AMOUNT_PER_GENRE {
            return Err(QueueServiceError::Invalid(format!(
                "amount_per_genre must be between 1 and {}",
                MAX_AMOUNT_PER_GENRE
            )));
        }

        let started_at = Utc::now();
        let total_requested = amount_per_genre * CefrLevel::ALL.len() * ContentType::ALL.len();

        tracing::info!(
            amount_per_genre = amount_per_genre,
            total_requested = total_requested,
            level_concurrency = self.level_concurrency,
            "Queue generation started"
        );

        let mut outcomes = Vec::with_capacity(total_requested);
        for content_type in ContentType::ALL {
            outcomes.extend(
                self.generate_for_type(content_type, amount_per_genre, &token)
                    .boxed()
                    .await,
            );
        }

        let report = GenerationReport::from_outcomes(total_requested, outcomes, started_at);
        self.finish(&report).await;

        Ok(report)
    }

    async fn generate_single(
        &self,
        request: GenerationRequest,
        token: CancellationToken,
    ) -> Result<GenerationReport, QueueServiceError> {
        if request.topic.trim().is_empty() {
            return Err(QueueServiceError::Invalid("topic cannot be empty".to_string()));
        }

        let started_at = Utc::now();
        let outcome = self
            .run_unit(&request, &token)
            .boxed()
            .await
            .map_err(|e| UnitFailure::from_stage(request.content_type, Some(request.clone()), &e));

        let report =
            GenerationReport::from_outcomes(1, vec![outcome], started_at);
        self.finish(&report).await;

        Ok(report)
    }
}

impl QueueService {
    async fn generate_for_type(
        &self,
        content_type: ContentType,
        amount: usize,
        token: &CancellationToken,
    ) -> Vec<UnitOutcome> {
        let type_failure = |e: StageError| vec![Err(UnitFailure::from_stage(content_type, None, &e))];

        let genre = match self.generator.select_genre(content_type) {
            Ok(genre) => genre,
            Err(e) => return type_failure(e),
        };

        let topics = match self
            .generator
            .brainstorm_topics(content_type, &genre, amount, token)
            .await
        {
            Ok(topics) => topics,
            Err(e) => return type_failure(e),
        };

        tracing::info!(
            content_type = %content_type,
            genre = %genre.genre,
            subgenre = %genre.subgenre,
            topics = topics.len(),
            "Topics brainstormed"
        );

        join_all(
            topics
                .iter()
                .map(|topic| self.generate_topic(content_type, &genre, topic, token).boxed()),
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// All levels of one topic, at most `level_concurrency` at a time
    async fn generate_topic(
        &self,
        content_type: ContentType,
        genre: &GenreSelection,
        topic: &str,
        token: &CancellationToken,
    ) -> Vec<UnitOutcome> {
        let semaphore = Semaphore::new(self.level_concurrency);

        join_all(CefrLevel::ALL.into_iter().map(|level| {
            let request = GenerationRequest {
                content_type,
                genre: genre.genre.clone(),
                subgenre: genre.subgenre.clone(),
                topic: topic.to_string(),
                level,
            };
            let semaphore = &semaphore;

            async move {
                let outcome = match semaphore.acquire().await {
                    Ok(_permit) => self.run_unit(&request, token).await,
                    Err(_) => Err(StageError::immediate(
                        GenerationStage::Article,
                        GenerationError::Cancelled,
                    )),
                };
                outcome.map_err(|e| UnitFailure::from_stage(content_type, Some(request), &e))
            }
            .boxed()
        }))
        .await
    }

    /// Rated article, questions, persistence, narration and image, persistence
    async fn run_unit(
        &self,
        request: &GenerationRequest,
        token: &CancellationToken,
    ) -> Result<GeneratedQueueItem, StageError> {
        let content_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        tracing::info!(content_id = %content_id, request = %request, "Unit started");

        let article = self.generator.generate_article(request, token).await?;

        let (multiple_choice, short_answer, long_answer, word_list) = tokio::try_join!(
            self.generator
                .generate_multiple_choice(request, &article, token),
            self.generator.generate_short_answer(request, &article, token),
            self.generator.generate_long_answer(request, &article, token),
            self.generator.generate_word_list(request, &article, token),
        )?;
        let questions = vec![multiple_choice, short_answer, long_answer];

        let repo = &self.content_repo;
        let (id, questions_ref, words_ref, article_ref) =
            (&content_id, &questions, &word_list, &article);
        self.persist(GenerationStage::PersistArticle, token, || {
            async move {
                repo.create_article(id, request, article_ref).await?;
                for set in questions_ref {
                    repo.add_questions(id, set).await?;
                }
                repo.add_word_list(id, words_ref).await
            }
            .boxed()
        })
        .await?;

        // Each media stage runs to completion so its own cleanup is never cut short
        let (timepoints, word_timepoints, image_key) = tokio::join!(
            self.audio_service
                .generate(&content_id, &article.passage, token),
            self.audio_service
                .generate_word_audio(&content_id, &word_list, token),
            self.image_service
                .generate(&content_id, &article.image_description, token),
        );
        if timepoints.is_err() || word_timepoints.is_err() || image_key.is_err() {
            self.discard_media(
                timepoints.as_ref().ok().map(Vec::as_slice),
                word_timepoints.as_ref().ok().map(Vec::as_slice),
                image_key.as_ref().ok().map(String::as_str),
            )
            .await;
        }
        let (timepoints, word_timepoints, image_key) = (timepoints?, word_timepoints?, image_key?);

        let (timepoints_ref, word_timepoints_ref, key_ref) =
            (&timepoints, &word_timepoints, &image_key);
        let persisted = self
            .persist(GenerationStage::PersistMedia, token, || {
                async move {
                    repo.update_timepoints(id, timepoints_ref).await?;
                    repo.update_word_timepoints(id, word_timepoints_ref).await?;
                    repo.update_image(id, key_ref).await
                }
                .boxed()
            })
            .await;
        if let Err(e) = persisted {
            self.discard_media(
                Some(timepoints.as_slice()),
                Some(word_timepoints.as_slice()),
                Some(image_key.as_str()),
            )
            .await;
            return Err(e);
        }

        tracing::info!(
            content_id = %content_id,
            request = %request,
            rating = article.average_rating,
            timepoints = timepoints.len(),
            word_timepoints = word_timepoints.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Unit completed"
        );

        Ok(GeneratedQueueItem {
            content_id,
            request: request.clone(),
            article,
            questions,
            word_list,
            timepoints,
            word_timepoints,
            image_key,
        })
    }

    /// Remove uploaded media of a unit that will not be completed
    async fn discard_media(
        &self,
        timepoints: Option<&[Timepoint]>,
        word_timepoints: Option<&[Timepoint]>,
        image_key: Option<&str>,
    ) {
        if let Some(timepoints) = timepoints {
            self.audio_service
                .discard(Narration::Passage, timepoints)
                .await;
        }
        if let Some(word_timepoints) = word_timepoints {
            self.audio_service
                .discard(Narration::WordList, word_timepoints)
                .await;
        }
        if let Some(key) = image_key {
            self.image_service.discard(key).await;
        }
    }

    async fn persist<'a, F>(
        &self,
        stage: GenerationStage,
        token: &CancellationToken,
        mut operation: F,
    ) -> Result<(), StageError>
    where
        F: FnMut() -> BoxFuture<'a, AppResult<()>>,
    {
        self.retry
            .retry(stage, token, || {
                let attempt = operation();
                async move {
                    attempt
                        .await
                        .map_err(|e| GenerationError::Service(e.to_string()))
                }
                .boxed()
            })
            .await
    }

    async fn finish(&self, report: &GenerationReport) {
        tracing::info!(
            total_requested = report.total_requested,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_seconds = report.elapsed_seconds,
            "Generation run finished"
        );

        if !report.has_failures() {
            return;
        }

        for failure in &report.failures {
            tracing::warn!(
                content_type = %failure.content_type,
                stage = %failure.stage,
                kind = ?failure.kind,
                message = %failure.message,
                "Unit failed"
            );
        }

        if let Err(e) = self.content_repo.record_error_log(report).await {
            tracing::error!(error = %e, "Failed to record error log");
        }
    }
}
