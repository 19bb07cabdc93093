use futures::stream::{self, StreamExt};
use futures::FutureExt;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::ssml::{chunk_passage, chunk_words, AudioChunk, Narration};
use super::timepoints::{aggregate_timepoints, ChunkSynthesis, Timepoint};
use crate::domain::content::WordListEntry;
use crate::domain::shared::{AssetStager, GenerationError, GenerationStage, RetryPolicy, StageError};
use crate::infrastructure::repositories::TtsRepository;

const FALLBACK_VOICE: &str = "en-US-Neural2-F";

pub struct AudioService {
    tts_repo: Arc<dyn TtsRepository>,
    stager: Arc<AssetStager>,
    retry: RetryPolicy,
    voices: Vec<String>,
    max_markup_bytes: usize,
    concurrency: usize,
}

impl AudioService {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        stager: Arc<AssetStager>,
        retry: RetryPolicy,
        voices: Vec<String>,
        max_markup_bytes: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            tts_repo,
            stager,
            retry,
            voices,
            max_markup_bytes,
            concurrency: concurrency.max(1),
        }
    }

    /// Narrate a passage and return its per-sentence timeline
    ///
    /// This operation:
    /// - Packs sentences into SSML chunks under the provider's byte limit
    /// - Synthesizes chunks concurrently with one voice for the whole passage
    /// - Uploads each chunk as `audios/{content_id}_{i}.mp3`
    /// - Folds the per-chunk marks into one timeline, in chunk order
    ///
    /// When any chunk fails, the chunks already uploaded are deleted again.
    pub async fn generate(
        &self,
        content_id: &str,
        passage: &str,
        token: &CancellationToken,
    ) -> Result<Vec<Timepoint>, StageError> {
        let chunks = chunk_passage(passage, self.max_markup_bytes)
            .map_err(|e| StageError::immediate(GenerationStage::Audio, e))?;
        self.narrate(GenerationStage::Audio, content_id, &chunks, token)
            .await
    }

    /// Read the word list aloud, one `word{N}` mark per vocabulary entry,
    /// uploaded as `audios-words/{content_id}_words_{i}.mp3`
    pub async fn generate_word_audio(
        &self,
        content_id: &str,
        words: &[WordListEntry],
        token: &CancellationToken,
    ) -> Result<Vec<Timepoint>, StageError> {
        let vocabulary: Vec<&str> = words.iter().map(|w| w.vocabulary.as_str()).collect();
        let chunks = chunk_words(&vocabulary, self.max_markup_bytes)
            .map_err(|e| StageError::immediate(GenerationStage::WordAudio, e))?;
        self.narrate(GenerationStage::WordAudio, content_id, &chunks, token)
            .await
    }

    /// Delete the files behind a finished timeline, e.g. when a sibling stage failed
    pub async fn discard(&self, narration: Narration, timepoints: &[Timepoint]) {
        let mut keys: Vec<String> = timepoints
            .iter()
            .map(|t| narration.remote_key(&t.source_file))
            .collect();
        keys.dedup();
        self.stager.discard(&keys).await;
    }

    async fn narrate(
        &self,
        stage: GenerationStage,
        content_id: &str,
        chunks: &[AudioChunk],
        token: &CancellationToken,
    ) -> Result<Vec<Timepoint>, StageError> {
        let sentence_count: usize = chunks.iter().map(AudioChunk::sentence_count).sum();
        let voice = self.pick_voice();

        tracing::info!(
            content_id = content_id,
            stage = %stage,
            chunk_count = chunks.len(),
            sentence_count = sentence_count,
            voice = voice,
            "Synthesizing audio"
        );

        // Every chunk runs to completion so the uploaded set is known exactly
        let pending: Vec<_> = chunks
            .iter()
            .map(|chunk| self.synthesize_chunk(stage, content_id, chunk, voice, token))
            .collect();
        let results: Vec<Result<ChunkSynthesis, StageError>> = stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut syntheses = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(synthesis) => syntheses.push(synthesis),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        let timeline = match first_error {
            Some(e) => Err(e),
            None => aggregate_timepoints(&syntheses, sentence_count)
                .map_err(|e| StageError::immediate(stage, e)),
        };

        let timepoints = match timeline {
            Ok(timepoints) => timepoints,
            Err(e) => {
                let uploaded: Vec<String> = syntheses
                    .iter()
                    .map(|s| s.narration.remote_key(&s.file_name))
                    .collect();
                tracing::warn!(
                    content_id = content_id,
                    stage = %stage,
                    discarded = uploaded.len(),
                    error = %e,
                    "Audio failed, discarding uploaded chunks"
                );
                self.stager.discard(&uploaded).await;
                return Err(e);
            }
        };

        tracing::info!(
            content_id = content_id,
            stage = %stage,
            timepoints = timepoints.len(),
            files = syntheses.len(),
            "Audio generated"
        );

        Ok(timepoints)
    }

    async fn synthesize_chunk(
        &self,
        stage: GenerationStage,
        content_id: &str,
        chunk: &AudioChunk,
        voice: &str,
        token: &CancellationToken,
    ) -> Result<ChunkSynthesis, StageError> {
        let markup = chunk.markup();
        let file_name = chunk.file_name(content_id);
        let remote_key = chunk.narration.remote_key(&file_name);
        let (markup, file_name_ref, remote_key) = (&markup, &file_name, &remote_key);

        let marks = self
            .retry
            .retry(stage, token, || {
                async move {
                    let synthesis = self
                        .tts_repo
                        .synthesize(markup, voice)
                        .await
                        .map_err(GenerationError::Service)?;
                    self.stager
                        .publish(file_name_ref, &synthesis.audio, remote_key)
                        .await?;
                    Ok(synthesis.marks)
                }
                .boxed()
            })
            .await?;

        tracing::debug!(
            chunk_index = chunk.index,
            markup_bytes = markup.len(),
            marks = marks.len(),
            "Chunk synthesized"
        );

        Ok(ChunkSynthesis {
            narration: chunk.narration,
            chunk_index: chunk.index,
            sentence_count: chunk.sentence_count(),
            file_name,
            marks,
        })
    }

    fn pick_voice(&self) -> &str {
        self.voices
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_VOICE)
    }
}
