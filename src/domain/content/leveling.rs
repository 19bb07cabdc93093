use super::model::CefrLevel;
use crate::domain::tts::split_into_sentences;

const MIN_RA_LEVEL: f64 = 1.0;
const MAX_RA_LEVEL: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingLevel {
    pub ra_level: u8,
    pub cefr_level: CefrLevel,
}

/// Derive the reading level of a passage from its Automated Readability Index.
///
/// `ra_level` is the ARI rounded and clamped to 1..=18; the CEFR band is read off
/// `ra_level` with fixed cut points.
pub fn calculate_level(passage: &str) -> ReadingLevel {
    let ari = automated_readability_index(passage);
    let ra_level = ari.round().clamp(MIN_RA_LEVEL, MAX_RA_LEVEL) as u8;

    ReadingLevel {
        ra_level,
        cefr_level: cefr_for_ra_level(ra_level),
    }
}

fn automated_readability_index(passage: &str) -> f64 {
    let words: Vec<&str> = passage.split_whitespace().collect();
    if words.is_empty() {
        return MIN_RA_LEVEL;
    }

    let sentence_count = split_into_sentences(passage).len().max(1);
    let letter_count: usize = words
        .iter()
        .map(|word| word.chars().filter(|c| c.is_alphanumeric()).count())
        .sum();

    let chars_per_word = letter_count as f64 / words.len() as f64;
    let words_per_sentence = words.len() as f64 / sentence_count as f64;

    4.71 * chars_per_word + 0.5 * words_per_sentence - 21.43
}

fn cefr_for_ra_level(ra_level: u8) -> CefrLevel {
    match ra_level {
        0..=3 => CefrLevel::A1,
        4..=5 => CefrLevel::A2,
        6..=8 => CefrLevel::B1,
        9..=11 => CefrLevel::B2,
        12..=14 => CefrLevel::C1,
        _ => CefrLevel::C2,
    }
}
