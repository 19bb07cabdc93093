use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::tts::Timepoint;

/// Fiction or nonfiction; selects the prompt and genre tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Fiction,
    Nonfiction,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Fiction, ContentType::Nonfiction];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Fiction => "fiction",
            ContentType::Nonfiction => "nonfiction",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fiction" => Ok(ContentType::Fiction),
            "nonfiction" => Ok(ContentType::Nonfiction),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// CEFR proficiency band, ordered from A1 to C2
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CefrLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown CEFR level: {}", s))
    }
}

/// One unit of work for the pipeline. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub content_type: ContentType,
    pub genre: String,
    pub subgenre: String,
    pub topic: String,
    pub level: CefrLevel,
}

impl fmt::Display for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} / {} / {} ({})",
            self.level, self.content_type, self.genre, self.subgenre, self.topic
        )
    }
}

/// A genre picked from the catalog for one content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreSelection {
    pub genre: String,
    pub subgenre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub passage: String,
    pub summary: String,
    pub image_description: String,
    pub cefr_level: CefrLevel,
    pub ra_level: u8,
    /// Editorial score that let this draft through, 1 to 5
    pub average_rating: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub question: String,
    pub correct_answer: String,
    pub distractors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortAnswerQuestion {
    pub question: String,
    pub suggested_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongAnswerQuestion {
    pub question: String,
}

/// Question kinds generated for every article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    ShortAnswer,
    LongAnswer,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::LongAnswer => "long_answer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum QuestionSet {
    MultipleChoice(Vec<MultipleChoiceQuestion>),
    ShortAnswer(Vec<ShortAnswerQuestion>),
    LongAnswer(LongAnswerQuestion),
}

impl QuestionSet {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionSet::MultipleChoice(_) => QuestionKind::MultipleChoice,
            QuestionSet::ShortAnswer(_) => QuestionKind::ShortAnswer,
            QuestionSet::LongAnswer(_) => QuestionKind::LongAnswer,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QuestionSet::MultipleChoice(items) => items.len(),
            QuestionSet::ShortAnswer(items) => items.len(),
            QuestionSet::LongAnswer(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Definitions in the languages offered to learners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDefinition {
    pub en: String,
    pub th: String,
    pub cn: String,
    pub tw: String,
    pub vi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordListEntry {
    pub vocabulary: String,
    pub definition: WordDefinition,
}

/// Everything produced for one (topic, level) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQueueItem {
    pub content_id: String,
    pub request: GenerationRequest,
    pub article: GeneratedArticle,
    pub questions: Vec<QuestionSet>,
    pub word_list: Vec<WordListEntry>,
    pub timepoints: Vec<Timepoint>,
    pub word_timepoints: Vec<Timepoint>,
    pub image_key: String,
}
