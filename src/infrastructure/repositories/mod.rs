pub mod blob_repository;
pub mod content_repository;
pub mod google_tts_repository;
pub mod image_repository;
pub mod llm_repository;
pub mod openai_image_repository;
pub mod openai_llm_repository;
pub mod pg_content_repository;
pub mod polly_tts_repository;
pub mod s3_blob_repository;
pub mod tts_repository;

pub use blob_repository::BlobRepository;
pub use content_repository::ContentRepository;
pub use google_tts_repository::GoogleTtsRepository;
pub use image_repository::ImageRepository;
pub use llm_repository::{LlmRepository, OutputSchema};
pub use openai_image_repository::OpenAiImageRepository;
pub use openai_llm_repository::OpenAiLlmRepository;
pub use pg_content_repository::PgContentRepository;
pub use polly_tts_repository::PollyTtsRepository;
pub use s3_blob_repository::S3BlobRepository;
pub use tts_repository::{SpeechMark, SpeechSynthesis, TtsRepository};
