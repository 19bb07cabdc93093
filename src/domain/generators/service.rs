use futures::FutureExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::outputs::{
    ArticleOutput, LongAnswerOutput, MultipleChoiceOutput, RatingOutput, ShortAnswerOutput,
    StructuredOutput, TopicsOutput, WordListOutput,
};
use crate::domain::content::{
    calculate_level, ContentType, GeneratedArticle, GenerationRequest, GenreSelection, QuestionSet,
    WordListEntry,
};
use crate::domain::prompts::{PromptCatalog, PromptKind, PromptVars, RenderedPrompt};
use crate::domain::shared::{GenerationError, GenerationStage, RetryPolicy, StageError};
use crate::infrastructure::repositories::LlmRepository;

/// Drafts must score above this to be kept
pub const RATING_THRESHOLD: u8 = 2;
pub const MAX_ARTICLE_DRAFTS: u32 = 2;

/// Prompt-driven generators for every structured artifact of a learning unit.
///
/// Each call renders its prompt first, so a missing catalog entry fails before
/// any request is made. The request, decode and shape check then run together
/// under the retry policy.
pub struct ContentGenerator {
    llm_repo: Arc<dyn LlmRepository>,
    catalog: Arc<PromptCatalog>,
    retry: RetryPolicy,
}

impl ContentGenerator {
    pub fn new(
        llm_repo: Arc<dyn LlmRepository>,
        catalog: Arc<PromptCatalog>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            llm_repo,
            catalog,
            retry,
        }
    }

    pub fn select_genre(&self, content_type: ContentType) -> Result<GenreSelection, StageError> {
        self.catalog
            .select_genre(content_type)
            .map_err(|e| StageError::immediate(GenerationStage::Genre, e))
    }

    /// Brainstorm exactly `amount` topics for a genre
    pub async fn brainstorm_topics(
        &self,
        content_type: ContentType,
        genre: &GenreSelection,
        amount: usize,
        token: &CancellationToken,
    ) -> Result<Vec<String>, StageError> {
        let prompt = self.prompt(
            GenerationStage::Topics,
            PromptKind::Topics,
            content_type,
            None,
            &PromptVars {
                genre: Some(&genre.genre),
                subgenre: Some(&genre.subgenre),
                content_type: Some(content_type),
                amount: Some(amount),
                ..Default::default()
            },
        )?;

        self.generate_checked::<TopicsOutput, _>(GenerationStage::Topics, &prompt, token, |topics| {
            if topics.len() != amount {
                return Err(GenerationError::ShapeValidation(format!(
                    "expected {} topics, got {}",
                    amount,
                    topics.len()
                )));
            }
            Ok(())
        })
        .await
    }

    /// Draft an article and keep the first draft the model rates above `RATING_THRESHOLD`.
    ///
    /// At most `MAX_ARTICLE_DRAFTS` drafts are written; when none passes the unit
    /// fails at the rating stage with `QualityGate`.
    pub async fn generate_article(
        &self,
        request: &GenerationRequest,
        token: &CancellationToken,
    ) -> Result<GeneratedArticle, StageError> {
        let prompt = self.prompt(
            GenerationStage::Article,
            PromptKind::Article,
            request.content_type,
            Some(request.level),
            &request_vars(request),
        )?;
        self.catalog
            .lookup(PromptKind::Rating, request.content_type, Some(request.level))
            .map_err(|e| StageError::immediate(GenerationStage::Rating, e))?;

        let mut best_rating = 0;
        for draft in 1..=MAX_ARTICLE_DRAFTS {
            let output = self
                .generate::<ArticleOutput>(GenerationStage::Article, &prompt, token)
                .await?;
            let rating = self.rate_article(request, &output, token).await?;

            if rating > RATING_THRESHOLD {
                let level = calculate_level(&output.passage);
                tracing::info!(
                    title = %output.title,
                    requested_level = %request.level,
                    cefr_level = %level.cefr_level,
                    ra_level = level.ra_level,
                    rating = rating,
                    draft = draft,
                    "Article generated"
                );

                return Ok(GeneratedArticle {
                    title: output.title,
                    passage: output.passage,
                    summary: output.summary,
                    image_description: output.image_description,
                    cefr_level: level.cefr_level,
                    ra_level: level.ra_level,
                    average_rating: rating,
                });
            }

            tracing::warn!(
                title = %output.title,
                rating = rating,
                draft = draft,
                max_drafts = MAX_ARTICLE_DRAFTS,
                "Article rated too low"
            );
            best_rating = best_rating.max(rating);
        }

        Err(StageError {
            stage: GenerationStage::Rating,
            attempts: MAX_ARTICLE_DRAFTS,
            source: GenerationError::QualityGate {
                rating: best_rating,
                threshold: RATING_THRESHOLD,
            },
        })
    }

    async fn rate_article(
        &self,
        request: &GenerationRequest,
        draft: &ArticleOutput,
        token: &CancellationToken,
    ) -> Result<u8, StageError> {
        let vars = PromptVars {
            title: Some(&draft.title),
            passage: Some(&draft.passage),
            summary: Some(&draft.summary),
            image_description: Some(&draft.image_description),
            ..request_vars(request)
        };
        let prompt = self.prompt(
            GenerationStage::Rating,
            PromptKind::Rating,
            request.content_type,
            Some(request.level),
            &vars,
        )?;
        self.generate::<RatingOutput>(GenerationStage::Rating, &prompt, token)
            .await
    }

    pub async fn generate_multiple_choice(
        &self,
        request: &GenerationRequest,
        article: &GeneratedArticle,
        token: &CancellationToken,
    ) -> Result<QuestionSet, StageError> {
        let prompt = self.article_prompt(
            GenerationStage::MultipleChoice,
            PromptKind::MultipleChoice,
            request,
            article,
        )?;
        self.generate::<MultipleChoiceOutput>(GenerationStage::MultipleChoice, &prompt, token)
            .await
            .map(QuestionSet::MultipleChoice)
    }

    pub async fn generate_short_answer(
        &self,
        request: &GenerationRequest,
        article: &GeneratedArticle,
        token: &CancellationToken,
    ) -> Result<QuestionSet, StageError> {
        let prompt = self.article_prompt(
            GenerationStage::ShortAnswer,
            PromptKind::ShortAnswer,
            request,
            article,
        )?;
        self.generate::<ShortAnswerOutput>(GenerationStage::ShortAnswer, &prompt, token)
            .await
            .map(QuestionSet::ShortAnswer)
    }

    pub async fn generate_long_answer(
        &self,
        request: &GenerationRequest,
        article: &GeneratedArticle,
        token: &CancellationToken,
    ) -> Result<QuestionSet, StageError> {
        let prompt = self.article_prompt(
            GenerationStage::LongAnswer,
            PromptKind::LongAnswer,
            request,
            article,
        )?;
        self.generate::<LongAnswerOutput>(GenerationStage::LongAnswer, &prompt, token)
            .await
            .map(QuestionSet::LongAnswer)
    }

    pub async fn generate_word_list(
        &self,
        request: &GenerationRequest,
        article: &GeneratedArticle,
        token: &CancellationToken,
    ) -> Result<Vec<WordListEntry>, StageError> {
        let prompt = self.article_prompt(
            GenerationStage::WordList,
            PromptKind::WordList,
            request,
            article,
        )?;
        self.generate::<WordListOutput>(GenerationStage::WordList, &prompt, token)
            .await
    }

    fn prompt(
        &self,
        stage: GenerationStage,
        kind: PromptKind,
        content_type: ContentType,
        level: Option<crate::domain::content::CefrLevel>,
        vars: &PromptVars<'_>,
    ) -> Result<RenderedPrompt, StageError> {
        self.catalog
            .render(kind, content_type, level, vars)
            .map_err(|e| {
                tracing::error!(stage = %stage, error = %e, "Prompt lookup failed");
                StageError::immediate(stage, e)
            })
    }

    fn article_prompt(
        &self,
        stage: GenerationStage,
        kind: PromptKind,
        request: &GenerationRequest,
        article: &GeneratedArticle,
    ) -> Result<RenderedPrompt, StageError> {
        let vars = PromptVars {
            title: Some(&article.title),
            passage: Some(&article.passage),
            summary: Some(&article.summary),
            image_description: Some(&article.image_description),
            ..request_vars(request)
        };
        self.prompt(stage, kind, request.content_type, Some(request.level), &vars)
    }

    async fn generate<O>(
        &self,
        stage: GenerationStage,
        prompt: &RenderedPrompt,
        token: &CancellationToken,
    ) -> Result<O::Value, StageError>
    where
        O: StructuredOutput,
        O::Value: Send,
    {
        self.generate_checked::<O, _>(stage, prompt, token, |_| Ok(()))
            .await
    }

    async fn generate_checked<O, C>(
        &self,
        stage: GenerationStage,
        prompt: &RenderedPrompt,
        token: &CancellationToken,
        check: C,
    ) -> Result<O::Value, StageError>
    where
        O: StructuredOutput,
        O::Value: Send,
        C: Fn(&O::Value) -> Result<(), GenerationError> + Sync,
    {
        let schema = O::schema();
        let (schema, check) = (&schema, &check);

        self.retry
            .retry(stage, token, || {
                async move {
                    let raw = self
                        .llm_repo
                        .generate_object(&prompt.system, &prompt.user, schema)
                        .await
                        .map_err(GenerationError::Service)?;
                    let value = O::decode(&raw)?;
                    check(&value)?;
                    Ok(value)
                }
                .boxed()
            })
            .await
    }
}

fn request_vars(request: &GenerationRequest) -> PromptVars<'_> {
    PromptVars {
        genre: Some(&request.genre),
        subgenre: Some(&request.subgenre),
        topic: Some(&request.topic),
        level: Some(request.level),
        content_type: Some(request.content_type),
        ..Default::default()
    }
}
