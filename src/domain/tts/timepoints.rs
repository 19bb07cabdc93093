use serde::{Deserialize, Serialize};

use super::ssml::Narration;
use crate::domain::shared::GenerationError;
use crate::infrastructure::repositories::SpeechMark;

/// Where a sentence starts in the narrated audio.
///
/// `time_seconds` is relative to `source_file`, not to the whole passage.
/// In a word-list timeline each word counts as one sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timepoint {
    pub sentence_index: usize,
    pub time_seconds: f64,
    pub source_file: String,
}

/// Result of synthesizing one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSynthesis {
    pub narration: Narration,
    pub chunk_index: usize,
    pub sentence_count: usize,
    pub file_name: String,
    pub marks: Vec<SpeechMark>,
}

/// Fold per-chunk marks, in chunk order, into one passage-wide timeline.
///
/// The sentence counter runs across chunks and is never reset. Each chunk's
/// marks must come back named `sentence1..sentenceN` (or `word1..wordN`) in order.
pub fn aggregate_timepoints(
    chunks: &[ChunkSynthesis],
    expected_sentences: usize,
) -> Result<Vec<Timepoint>, GenerationError> {
    let mut timepoints = Vec::with_capacity(expected_sentences);

    for (position, chunk) in chunks.iter().enumerate() {
        if chunk.chunk_index != position {
            return Err(GenerationError::AggregationInvariant(format!(
                "chunk {} arrived at position {}",
                chunk.chunk_index, position
            )));
        }
        if chunk.marks.len() != chunk.sentence_count {
            return Err(GenerationError::AggregationInvariant(format!(
                "chunk {} has {} sentences but {} marks",
                chunk.chunk_index,
                chunk.sentence_count,
                chunk.marks.len()
            )));
        }

        for (position, mark) in chunk.marks.iter().enumerate() {
            let expected = chunk.narration.mark_name(position);
            if mark.mark_name != expected {
                return Err(GenerationError::AggregationInvariant(format!(
                    "chunk {} mark {} is named {:?}, expected {:?}",
                    chunk.chunk_index, position, mark.mark_name, expected
                )));
            }
        }

        timepoints.extend(chunk.marks.iter().map(|mark| Timepoint {
            sentence_index: 0,
            time_seconds: mark.time_seconds,
            source_file: chunk.file_name.clone(),
        }));
    }

    for (sentence_index, timepoint) in timepoints.iter_mut().enumerate() {
        timepoint.sentence_index = sentence_index;
    }

    verify_timeline(&timepoints, expected_sentences)?;
    Ok(timepoints)
}

/// Check that indices are exactly `0..expected` and that times never go
/// backwards within the same audio file
pub fn verify_timeline(timepoints: &[Timepoint], expected: usize) -> Result<(), GenerationError> {
    if timepoints.len() != expected {
        return Err(GenerationError::AggregationInvariant(format!(
            "expected {} timepoints, got {}",
            expected,
            timepoints.len()
        )));
    }

    for (position, timepoint) in timepoints.iter().enumerate() {
        if timepoint.sentence_index != position {
            return Err(GenerationError::AggregationInvariant(format!(
                "timepoint at position {} has index {}",
                position, timepoint.sentence_index
            )));
        }
        if !timepoint.time_seconds.is_finite() || timepoint.time_seconds < 0.0 {
            return Err(GenerationError::AggregationInvariant(format!(
                "sentence {} has invalid time {}",
                position, timepoint.time_seconds
            )));
        }
    }

    for pair in timepoints.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.source_file == next.source_file && next.time_seconds < prev.time_seconds {
            return Err(GenerationError::AggregationInvariant(format!(
                "time goes backwards within {} at sentence {}",
                next.source_file, next.sentence_index
            )));
        }
    }

    Ok(())
}
