use regex::Regex;
use std::sync::LazyLock;

// Terminal punctuation, optional closing quotes or brackets, then whitespace or end of text
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]+["'”’)\]]*(\s+|$)"#).expect("valid sentence regex"));

/// Split text into trimmed, non-empty sentences in reading order.
///
/// Trailing text without terminal punctuation becomes the last sentence.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last_end = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        push_trimmed(&mut sentences, &text[last_end..boundary.end()]);
        last_end = boundary.end();
    }

    if last_end < text.len() {
        push_trimmed(&mut sentences, &text[last_end..]);
    }

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
