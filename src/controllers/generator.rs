use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{
        content::GenerationRequest,
        queue::{GenerationReport, QueueServiceApi},
    },
    error::{AppError, AppResult},
    infrastructure::http::RequestId,
};

/// Request for POST /api/generator/queue
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateQueueRequest {
    pub amount_per_genre: usize,
}

pub struct GeneratorController {
    queue_service: Arc<dyn QueueServiceApi>,
    shutdown: CancellationToken,
}

impl GeneratorController {
    /// `shutdown` is the process-wide token; every run gets a child of it
    pub fn new(queue_service: Arc<dyn QueueServiceApi>, shutdown: CancellationToken) -> Self {
        Self {
            queue_service,
            shutdown,
        }
    }

    /// POST /api/generator/queue - Generate a full queue of learning units
    pub async fn generate_queue(
        State(controller): State<Arc<GeneratorController>>,
        Extension(request_id): Extension<RequestId>,
        Json(request): Json<GenerateQueueRequest>,
    ) -> AppResult<Json<GenerationReport>> {
        tracing::info!(
            request_id = %request_id.0,
            amount_per_genre = request.amount_per_genre,
            "Queue generation requested"
        );

        let report = controller
            .queue_service
            .generate_queue(request.amount_per_genre, controller.shutdown.child_token())
            .await
            .map_err(AppError::from)?;

        Ok(Json(report))
    }

    /// POST /api/generator/article - Generate one unit for an explicit request
    pub async fn generate_article(
        State(controller): State<Arc<GeneratorController>>,
        Extension(request_id): Extension<RequestId>,
        Json(request): Json<GenerationRequest>,
    ) -> AppResult<Json<GenerationReport>> {
        tracing::info!(
            request_id = %request_id.0,
            request = %request,
            "Single unit generation requested"
        );

        let report = controller
            .queue_service
            .generate_single(request, controller.shutdown.child_token())
            .await
            .map_err(AppError::from)?;

        Ok(Json(report))
    }
}
