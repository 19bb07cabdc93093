use super::content_repository::ContentRepository;
use crate::domain::content::{GeneratedArticle, GenerationRequest, QuestionSet, WordListEntry};
use crate::domain::queue::GenerationReport;
use crate::domain::tts::Timepoint;
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::{check_connection, DbPool};
use async_trait::async_trait;
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

pub struct PgContentRepository {
    pool: Arc<DbPool>,
}

impl PgContentRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn ping(&self) -> AppResult<()> {
        check_connection(&self.pool).await?;
        Ok(())
    }

    /// Insert the article; a retried insert overwrites the earlier attempt
    async fn create_article(
        &self,
        content_id: &str,
        request: &GenerationRequest,
        article: &GeneratedArticle,
    ) -> AppResult<()> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            INSERT INTO articles (
                id, content_type, genre, subgenre, topic, requested_level,
                title, passage, summary, image_description, cefr_level, ra_level,
                average_rating
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                passage = EXCLUDED.passage,
                summary = EXCLUDED.summary,
                image_description = EXCLUDED.image_description,
                cefr_level = EXCLUDED.cefr_level,
                ra_level = EXCLUDED.ra_level,
                average_rating = EXCLUDED.average_rating,
                updated_at = NOW()
            "#,
        )
        .bind(content_id)
        .bind(request.content_type.as_str())
        .bind(&request.genre)
        .bind(&request.subgenre)
        .bind(&request.topic)
        .bind(request.level.as_str())
        .bind(&article.title)
        .bind(&article.passage)
        .bind(&article.summary)
        .bind(&article.image_description)
        .bind(article.cefr_level.as_str())
        .bind(i16::from(article.ra_level))
        .bind(i16::from(article.average_rating))
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn add_questions(&self, content_id: &str, questions: &QuestionSet) -> AppResult<()> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            INSERT INTO article_questions (article_id, kind, items)
            VALUES ($1, $2, $3)
            ON CONFLICT (article_id, kind) DO UPDATE SET items = EXCLUDED.items
            "#,
        )
        .bind(content_id)
        .bind(questions.kind().as_str())
        .bind(Json(questions))
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn add_word_list(&self, content_id: &str, words: &[WordListEntry]) -> AppResult<()> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            INSERT INTO word_lists (article_id, words)
            VALUES ($1, $2)
            ON CONFLICT (article_id) DO UPDATE SET words = EXCLUDED.words
            "#,
        )
        .bind(content_id)
        .bind(Json(words))
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn update_timepoints(&self, content_id: &str, timepoints: &[Timepoint]) -> AppResult<()> {
        let pool = self.pool.as_ref();

        let result = sqlx::query(
            r#"
            UPDATE articles
            SET timepoints = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(content_id)
        .bind(Json(timepoints))
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("article {}", content_id)));
        }

        Ok(())
    }

    async fn update_word_timepoints(
        &self,
        content_id: &str,
        timepoints: &[Timepoint],
    ) -> AppResult<()> {
        let pool = self.pool.as_ref();

        let result = sqlx::query(
            r#"
            UPDATE word_lists
            SET timepoints = $2
            WHERE article_id = $1
            "#,
        )
        .bind(content_id)
        .bind(Json(timepoints))
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("word list {}", content_id)));
        }

        Ok(())
    }

    async fn update_image(&self, content_id: &str, image_key: &str) -> AppResult<()> {
        let pool = self.pool.as_ref();

        let result = sqlx::query(
            r#"
            UPDATE articles
            SET image_key = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(content_id)
        .bind(image_key)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("article {}", content_id)));
        }

        Ok(())
    }

    async fn record_error_log(&self, report: &GenerationReport) -> AppResult<()> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            INSERT INTO error_logs (
                id, total_requested, succeeded, failed, failures,
                started_at, finished_at, elapsed_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(report.total_requested as i32)
        .bind(report.succeeded as i32)
        .bind(report.failed as i32)
        .bind(Json(&report.failures))
        .bind(report.started_at)
        .bind(report.finished_at)
        .bind(report.elapsed_seconds)
        .execute(pool)
        .await?;

        Ok(())
    }
}
