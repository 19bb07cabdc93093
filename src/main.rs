use async_openai::{config::OpenAIConfig, Client as OpenAiClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lesson_forge::controllers::generator::GeneratorController;
use lesson_forge::domain::generators::ContentGenerator;
use lesson_forge::domain::image::ImageService;
use lesson_forge::domain::prompts::PromptCatalog;
use lesson_forge::domain::queue::QueueService;
use lesson_forge::domain::shared::AssetStager;
use lesson_forge::domain::tts::AudioService;
use lesson_forge::infrastructure::config::{Config, LogFormat, TtsProvider};
use lesson_forge::infrastructure::db::{check_connection, create_pool, run_migrations};
use lesson_forge::infrastructure::http::{create_router, start_http_server};
use lesson_forge::infrastructure::repositories::{
    ContentRepository, GoogleTtsRepository, OpenAiImageRepository, OpenAiLlmRepository,
    PgContentRepository, PollyTtsRepository, S3BlobRepository, TtsRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Lesson Forge on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    tracing::info!(region = ?aws_config.region(), "AWS configuration loaded");

    let openai_client = Arc::new(OpenAiClient::with_config(
        OpenAIConfig::new().with_api_key(config.openai_api_key.clone()),
    ));
    let http_client = reqwest::Client::new();

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let content_repo: Arc<dyn ContentRepository> =
        Arc::new(PgContentRepository::new(pool.clone()));
    let tts_repo: Arc<dyn TtsRepository> = match config.tts_provider {
        TtsProvider::Google => Arc::new(GoogleTtsRepository::new(
            http_client.clone(),
            config.google_tts_api_key.clone().unwrap_or_default(),
        )),
        TtsProvider::Polly => Arc::new(PollyTtsRepository::new(Arc::new(
            aws_sdk_polly::Client::new(&aws_config),
        ))),
    };
    tracing::info!(provider = ?config.tts_provider, "Speech provider selected");
    let llm_repo = Arc::new(OpenAiLlmRepository::new(
        openai_client.clone(),
        config.openai_model.clone(),
    ));
    let image_repo = Arc::new(OpenAiImageRepository::new(
        openai_client,
        http_client,
        config.openai_image_model.clone(),
    ));
    let blob_repo = Arc::new(S3BlobRepository::new(
        Arc::new(aws_sdk_s3::Client::new(&aws_config)),
        config.asset_bucket.clone(),
    ));

    // 2. Load prompt catalog
    let catalog = Arc::new(PromptCatalog::from_path(&config.prompt_catalog_path).await?);

    // 3. Instantiate services
    tracing::info!("Instantiating services...");
    let retry = config.retry_policy();
    let stager = Arc::new(AssetStager::new(config.staging_dir.clone(), blob_repo));
    let generator = Arc::new(ContentGenerator::new(llm_repo, catalog, retry.clone()));
    let audio_service = Arc::new(AudioService::new(
        tts_repo,
        stager.clone(),
        retry.clone(),
        config.tts_voices.clone(),
        config.tts_max_bytes,
        config.tts_concurrency,
    ));
    let image_service = Arc::new(ImageService::new(image_repo, stager, retry.clone()));
    let queue_service = Arc::new(QueueService::new(
        generator,
        audio_service,
        image_service,
        content_repo.clone(),
        retry,
        config.level_concurrency,
    ));

    // 4. Instantiate controllers
    let shutdown = CancellationToken::new();
    let generator_controller = Arc::new(GeneratorController::new(queue_service, shutdown.clone()));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received, cancelling in-flight generation");
            }
            shutdown.cancel();
        }
    });

    let router = create_router(generator_controller, content_repo);
    start_http_server(config, router, shutdown).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lesson_forge=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lesson_forge=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
