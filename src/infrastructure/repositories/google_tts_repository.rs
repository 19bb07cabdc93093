use super::tts_repository::{SpeechMark, SpeechSynthesis, TtsRepository};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";
const LANGUAGE_CODE: &str = "en-US";

/// Google Cloud Text-to-Speech (v1beta1) implementation of TTS repository.
/// v1beta1 is the only version that returns SSML mark timepoints.
pub struct GoogleTtsRepository {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleTtsRepository {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self::with_base_url(http, api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(http: reqwest::Client, api_key: String, base_url: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
    enable_time_pointing: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    ssml: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'static str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
    #[serde(default)]
    timepoints: Vec<GoogleTimepoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTimepoint {
    mark_name: String,
    #[serde(default)]
    time_seconds: f64,
}

fn decode_response(body: &str) -> Result<SpeechSynthesis, String> {
    let response: SynthesizeResponse = serde_json::from_str(body)
        .map_err(|e| format!("Invalid Google TTS response: {}", e))?;

    let audio = base64::engine::general_purpose::STANDARD
        .decode(response.audio_content.as_bytes())
        .map_err(|e| format!("Invalid audio content encoding: {}", e))?;

    let marks = response
        .timepoints
        .into_iter()
        .map(|tp| SpeechMark {
            mark_name: tp.mark_name,
            time_seconds: tp.time_seconds,
        })
        .collect();

    Ok(SpeechSynthesis { audio, marks })
}

#[async_trait]
impl TtsRepository for GoogleTtsRepository {
    async fn synthesize(&self, ssml: &str, voice: &str) -> Result<SpeechSynthesis, String> {
        let start_time = std::time::Instant::now();
        let url = format!("{}/v1beta1/text:synthesize", self.base_url);

        let request = SynthesizeRequest {
            input: SynthesisInput { ssml },
            voice: VoiceSelection {
                language_code: LANGUAGE_CODE,
                name: voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
            enable_time_pointing: ["SSML_MARK"],
        };

        tracing::info!(
            voice = voice,
            ssml_bytes = ssml.len(),
            "Calling Google TTS synthesize"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, voice = voice, "Google TTS request failed");
                format!("Google TTS error: {}", e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read Google TTS response: {}", e))?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                body_preview = %body.chars().take(200).collect::<String>(),
                "Google TTS returned an error status"
            );
            return Err(format!("Google TTS error: HTTP {}", status));
        }

        let synthesis = decode_response(&body)?;

        tracing::info!(
            provider = "google",
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = synthesis.audio.len(),
            marks = synthesis.marks.len(),
            "TTS synthesis completed"
        );

        Ok(synthesis)
    }
}
