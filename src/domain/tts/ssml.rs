use super::sentences::split_into_sentences;
use crate::domain::shared::GenerationError;

/// Google Cloud TTS rejects SSML inputs over 5000 bytes
pub const DEFAULT_MAX_MARKUP_BYTES: usize = 5000;

const SPEAK_OPEN: &str = "<speak>";
const SPEAK_CLOSE: &str = "</speak>";
const WORD_PAUSE: &str = "<break time=\"500ms\"/>";

/// What a narration reads out; decides mark names, pauses and file names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narration {
    /// The article passage, one mark per sentence
    Passage,
    /// The vocabulary of the word list, one mark per word with a pause after each
    WordList,
}

impl Narration {
    fn mark_prefix(&self) -> &'static str {
        match self {
            Narration::Passage => "sentence",
            Narration::WordList => "word",
        }
    }

    fn pause(&self) -> &'static str {
        match self {
            Narration::Passage => "",
            Narration::WordList => WORD_PAUSE,
        }
    }

    /// Mark name of the unit at `position` within its chunk, counting from 1
    pub fn mark_name(&self, position: usize) -> String {
        format!("{}{}", self.mark_prefix(), position + 1)
    }

    /// Storage key for a chunk file: `audios/...` or `audios-words/...`
    pub fn remote_key(&self, file_name: &str) -> String {
        let prefix = match self {
            Narration::Passage => "audios",
            Narration::WordList => "audios-words",
        };
        format!("{}/{}", prefix, file_name)
    }

    pub fn file_name(&self, content_id: &str, chunk_index: usize) -> String {
        match self {
            Narration::Passage => format!("{}_{}.mp3", content_id, chunk_index),
            Narration::WordList => format!("{}_words_{}.mp3", content_id, chunk_index),
        }
    }
}

/// A run of consecutive sentences (or words) synthesized by one provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub narration: Narration,
    pub index: usize,
    /// Narration-wide index of `sentences[0]`
    pub first_sentence: usize,
    pub sentences: Vec<String>,
}

impl AudioChunk {
    /// SSML for this chunk with marks numbered from 1
    pub fn markup(&self) -> String {
        render_narration(self.narration, &self.sentences)
    }

    pub fn file_name(&self, content_id: &str) -> String {
        self.narration.file_name(content_id, self.index)
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }
}

pub fn mark_name(position: usize) -> String {
    Narration::Passage.mark_name(position)
}

pub fn render_ssml<S: AsRef<str>>(sentences: &[S]) -> String {
    render_narration(Narration::Passage, sentences)
}

pub fn render_narration<S: AsRef<str>>(narration: Narration, units: &[S]) -> String {
    let mut ssml = String::from(SPEAK_OPEN);
    for (position, unit) in units.iter().enumerate() {
        ssml.push_str(&render_unit(narration, position, unit.as_ref()));
    }
    ssml.push_str(SPEAK_CLOSE);
    ssml
}

fn render_unit(narration: Narration, position: usize, text: &str) -> String {
    format!(
        "<s><mark name='{}'/>{}{}</s>",
        narration.mark_name(position),
        escape_xml(text),
        narration.pause()
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Greedily pack the passage's sentences into chunks whose SSML stays within `max_bytes`.
///
/// Sentences are never split or reordered. A sentence too large to fit in a chunk on
/// its own fails the whole passage with `SizeConstraint`.
pub fn chunk_passage(passage: &str, max_bytes: usize) -> Result<Vec<AudioChunk>, GenerationError> {
    pack_chunks(Narration::Passage, split_into_sentences(passage), max_bytes)
}

/// Same packing for a word list; blank entries are skipped
pub fn chunk_words<S: AsRef<str>>(
    words: &[S],
    max_bytes: usize,
) -> Result<Vec<AudioChunk>, GenerationError> {
    let words = words
        .iter()
        .map(|w| w.as_ref().trim())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    pack_chunks(Narration::WordList, words, max_bytes)
}

fn pack_chunks(
    narration: Narration,
    units: Vec<String>,
    max_bytes: usize,
) -> Result<Vec<AudioChunk>, GenerationError> {
    let envelope = SPEAK_OPEN.len() + SPEAK_CLOSE.len();

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_bytes = envelope;
    let mut first_sentence = 0;

    for (sentence_index, sentence) in units.into_iter().enumerate() {
        let added = render_unit(narration, current.len(), &sentence).len();

        if current_bytes + added <= max_bytes {
            current_bytes += added;
            current.push(sentence);
            continue;
        }

        // Doesn't fit; it opens the next chunk at position 0
        let alone = envelope + render_unit(narration, 0, &sentence).len();
        if alone > max_bytes {
            return Err(GenerationError::SizeConstraint {
                sentence_index,
                bytes: alone,
                limit: max_bytes,
            });
        }

        if !current.is_empty() {
            chunks.push(AudioChunk {
                narration,
                index: chunks.len(),
                first_sentence,
                sentences: std::mem::take(&mut current),
            });
        }

        first_sentence = sentence_index;
        current_bytes = alone;
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(AudioChunk {
            narration,
            index: chunks.len(),
            first_sentence,
            sentences: current,
        });
    }

    Ok(chunks)
}
