use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named marker reached at `time_seconds` into the synthesized audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechMark {
    pub mark_name: String,
    pub time_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSynthesis {
    pub audio: Vec<u8>,
    pub marks: Vec<SpeechMark>,
}

/// Repository for speech synthesis.
/// Abstracts the underlying TTS provider (Google Cloud TTS, AWS Polly, etc.)
///
/// Implementations send exactly one provider request per call; splitting the
/// passage to respect provider limits happens before this layer.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize an SSML document with one `<mark>` per sentence
    ///
    /// Returns MP3 audio plus the marks in the order they are spoken, with times
    /// relative to the start of this audio.
    ///
    /// # Arguments
    /// * `ssml` - A complete `<speak>` document
    /// * `voice` - Provider-specific voice name
    ///
    /// # Errors
    /// Returns error if synthesis fails or provider is unavailable
    async fn synthesize(&self, ssml: &str, voice: &str) -> Result<SpeechSynthesis, String>;
}
