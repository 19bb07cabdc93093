use lesson_forge::controllers::generator::GeneratorController;
use lesson_forge::domain::generators::ContentGenerator;
use lesson_forge::domain::image::ImageService;
use lesson_forge::domain::prompts::PromptCatalog;
use lesson_forge::domain::queue::QueueService;
use lesson_forge::domain::shared::{AssetStager, RetryPolicy};
use lesson_forge::domain::tts::{AudioService, DEFAULT_MAX_MARKUP_BYTES};
use lesson_forge::infrastructure::http::create_router;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub mod api_client;
pub mod assertions;
pub mod fakes;
pub mod fixtures;

use api_client::TestClient;
use fakes::{FakeBlobs, FakeImages, FakeLlm, FakeTts, InMemoryContentRepository};

/// Knobs for the app under test
pub struct AppOptions {
    pub catalog: Value,
    pub passage: String,
    pub failing_topic: Option<&'static str>,
    pub failing_speech: Option<&'static str>,
    pub rating: u8,
    pub short_multiple_choice: bool,
    pub max_attempts: u32,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            catalog: fixtures::catalog_json(),
            passage: fixtures::SHORT_PASSAGE.to_string(),
            failing_topic: None,
            failing_speech: None,
            rating: 4,
            short_multiple_choice: false,
            max_attempts: 2,
        }
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub llm: Arc<FakeLlm>,
    pub tts: Arc<FakeTts>,
    pub images: Arc<FakeImages>,
    pub blobs: Arc<FakeBlobs>,
    pub store: Arc<InMemoryContentRepository>,
    pub staging: TempDir,
    pub shutdown: CancellationToken,
}

impl TestContext {
    /// Wire the real services over in-memory fakes and serve them on a random port
    pub async fn with_options(options: AppOptions) -> Self {
        let staging = TempDir::new().expect("Failed to create staging dir");
        let catalog = Arc::new(
            PromptCatalog::from_json(&options.catalog.to_string()).expect("Invalid test catalog"),
        );

        let llm = Arc::new(
            FakeLlm::new(&options.passage, options.failing_topic)
                .with_rating(options.rating)
                .with_short_multiple_choice(options.short_multiple_choice),
        );
        let tts = Arc::new(FakeTts::failing_on(options.failing_speech));
        let images = Arc::new(FakeImages::default());
        let blobs = Arc::new(FakeBlobs::default());
        let store = Arc::new(InMemoryContentRepository::default());

        let retry = RetryPolicy::immediate(options.max_attempts);
        let stager = Arc::new(AssetStager::new(staging.path(), blobs.clone()));
        let generator = Arc::new(ContentGenerator::new(llm.clone(), catalog, retry.clone()));
        let audio_service = Arc::new(AudioService::new(
            tts.clone(),
            stager.clone(),
            retry.clone(),
            vec!["en-US-Neural2-C".to_string()],
            DEFAULT_MAX_MARKUP_BYTES,
            2,
        ));
        let image_service = Arc::new(ImageService::new(images.clone(), stager, retry.clone()));
        let queue_service = Arc::new(QueueService::new(
            generator,
            audio_service,
            image_service,
            store.clone(),
            retry,
            2,
        ));

        let shutdown = CancellationToken::new();
        let controller = Arc::new(GeneratorController::new(queue_service, shutdown.clone()));
        let app = create_router(controller, store.clone());

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: TestClient::new(&base_url),
            llm,
            tts,
            images,
            blobs,
            store,
            staging,
            shutdown,
        }
    }

    /// Nothing may be left behind in the staging directory after a run
    pub fn assert_staging_empty(&self) {
        let leftovers: Vec<_> = std::fs::read_dir(self.staging.path())
            .map(|entries| entries.filter_map(Result::ok).map(|e| e.path()).collect())
            .unwrap_or_default();
        assert!(leftovers.is_empty(), "Staged files left behind: {:?}", leftovers);
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async { Self::with_options(AppOptions::default()).await }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            self.shutdown.cancel();
        }
    }
}
