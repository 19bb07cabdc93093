use super::tts_repository::{SpeechMark, SpeechSynthesis, TtsRepository};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, SpeechMarkType, TextType, VoiceId},
    Client as PollyClient,
};
use serde::Deserialize;
use std::sync::Arc;

/// AWS Polly implementation of TTS repository
///
/// Polly returns audio and speech marks from separate requests, so each
/// synthesis makes one MP3 call and one JSON speech-mark call for the same SSML.
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
}

impl PollyTtsRepository {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    async fn call_polly(
        &self,
        ssml: &str,
        voice: &str,
        output_format: OutputFormat,
    ) -> Result<Vec<u8>, String> {
        let voice_id = VoiceId::from(voice);
        let engine = Engine::Neural;

        tracing::info!(
            voice = voice,
            engine = ?engine,
            output_format = ?output_format,
            ssml_bytes = ssml.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let mut request = self
            .polly_client
            .synthesize_speech()
            .text(ssml)
            .text_type(TextType::Ssml)
            .voice_id(voice_id)
            .output_format(output_format.clone())
            .engine(engine.clone());

        if output_format == OutputFormat::Json {
            request = request.speech_mark_types(SpeechMarkType::Ssml);
        }

        let result = request.send().await.map_err(|e| {
            tracing::error!(
                error = ?e,
                error_display = %e,
                voice = voice,
                output_format = ?output_format,
                "AWS Polly synthesize_speech failed"
            );
            format!("AWS Polly error: {:?}", e)
        })?;

        let stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect stream from Polly response");
            format!("Failed to read audio stream: {}", e)
        })?;

        Ok(stream.into_bytes().to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct PollySpeechMark {
    /// Milliseconds from the start of the audio
    time: u64,
    #[serde(rename = "type")]
    mark_type: String,
    value: String,
}

/// Speech marks come back as one JSON object per line
fn parse_speech_marks(raw: &[u8]) -> Result<Vec<SpeechMark>, String> {
    let text = std::str::from_utf8(raw).map_err(|e| format!("Speech marks not UTF-8: {}", e))?;

    let mut marks = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let mark: PollySpeechMark = serde_json::from_str(line)
            .map_err(|e| format!("Invalid speech mark line {:?}: {}", line, e))?;
        if mark.mark_type != "ssml" {
            continue;
        }
        marks.push(SpeechMark {
            mark_name: mark.value,
            time_seconds: mark.time as f64 / 1000.0,
        });
    }

    Ok(marks)
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    async fn synthesize(&self, ssml: &str, voice: &str) -> Result<SpeechSynthesis, String> {
        let start_time = std::time::Instant::now();

        let (audio, raw_marks) = tokio::try_join!(
            self.call_polly(ssml, voice, OutputFormat::Mp3),
            self.call_polly(ssml, voice, OutputFormat::Json),
        )?;
        let marks = parse_speech_marks(&raw_marks)?;

        tracing::info!(
            provider = "polly",
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio.len(),
            marks = marks.len(),
            "TTS synthesis completed"
        );

        Ok(SpeechSynthesis { audio, marks })
    }
}
