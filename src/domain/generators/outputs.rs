use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::content::{
    LongAnswerQuestion, MultipleChoiceQuestion, ShortAnswerQuestion, WordDefinition, WordListEntry,
};
use crate::domain::shared::GenerationError;
use crate::infrastructure::repositories::OutputSchema;

pub const SHORT_ANSWER_COUNT: usize = 5;
pub const MULTIPLE_CHOICE_OPTIONS: usize = 4;
pub const MAX_RATING: u8 = 5;

/// A model response with a known JSON schema and shape rules.
///
/// `decode` parses the raw text and rejects anything outside the expected shape
/// with `ShapeValidation`.
pub trait StructuredOutput: DeserializeOwned {
    type Value;

    fn schema() -> OutputSchema;

    fn validate(self) -> Result<Self::Value, GenerationError>;

    fn decode(raw: &str) -> Result<Self::Value, GenerationError> {
        let parsed: Self = serde_json::from_str(raw).map_err(|e| {
            GenerationError::ShapeValidation(format!("{}: {}", Self::schema().name, e))
        })?;
        parsed.validate()
    }
}

fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn require_text(field: &str, value: &str) -> Result<(), GenerationError> {
    if value.trim().is_empty() {
        return Err(GenerationError::ShapeValidation(format!("{} is empty", field)));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct TopicsOutput {
    pub topics: Vec<String>,
}

impl StructuredOutput for TopicsOutput {
    type Value = Vec<String>;

    fn schema() -> OutputSchema {
        OutputSchema {
            name: "topics",
            schema: object(json!({ "topics": string_array() }), &["topics"]),
        }
    }

    fn validate(self) -> Result<Vec<String>, GenerationError> {
        let topics: Vec<String> = self.topics.into_iter().map(|t| t.trim().to_string()).collect();
        if let Some(position) = topics.iter().position(|t| t.is_empty()) {
            return Err(GenerationError::ShapeValidation(format!(
                "topic {} is empty",
                position
            )));
        }
        Ok(topics)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleOutput {
    pub title: String,
    pub passage: String,
    pub summary: String,
    pub image_description: String,
}

impl StructuredOutput for ArticleOutput {
    type Value = ArticleOutput;

    fn schema() -> OutputSchema {
        OutputSchema {
            name: "article",
            schema: object(
                json!({
                    "title": { "type": "string" },
                    "passage": { "type": "string" },
                    "summary": { "type": "string" },
                    "image_description": { "type": "string" }
                }),
                &["title", "passage", "summary", "image_description"],
            ),
        }
    }

    fn validate(self) -> Result<ArticleOutput, GenerationError> {
        require_text("title", &self.title)?;
        require_text("passage", &self.passage)?;
        require_text("summary", &self.summary)?;
        require_text("image_description", &self.image_description)?;
        Ok(self)
    }
}

/// Editorial score of a generated article, 1 to 5
#[derive(Debug, Deserialize)]
pub struct RatingOutput {
    pub rating: u8,
}

impl StructuredOutput for RatingOutput {
    type Value = u8;

    fn schema() -> OutputSchema {
        OutputSchema {
            name: "article_rating",
            schema: object(
                json!({ "rating": { "type": "integer", "minimum": 1, "maximum": MAX_RATING } }),
                &["rating"],
            ),
        }
    }

    fn validate(self) -> Result<u8, GenerationError> {
        if !(1..=MAX_RATING).contains(&self.rating) {
            return Err(GenerationError::ShapeValidation(format!(
                "rating {} is outside 1..={}",
                self.rating, MAX_RATING
            )));
        }
        Ok(self.rating)
    }
}

#[derive(Debug, Deserialize)]
pub struct MultipleChoiceItem {
    pub question: String,
    pub correct_answer: String,
    pub distractors: Vec<String>,
}

/// Models answer either with the wrapped object the schema asks for or with a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MultipleChoiceOutput {
    Wrapped { questions: Vec<MultipleChoiceItem> },
    Bare(Vec<MultipleChoiceItem>),
}

impl StructuredOutput for MultipleChoiceOutput {
    type Value = Vec<MultipleChoiceQuestion>;

    fn schema() -> OutputSchema {
        let item = object(
            json!({
                "question": { "type": "string" },
                "correct_answer": { "type": "string" },
                "distractors": string_array()
            }),
            &["question", "correct_answer", "distractors"],
        );
        OutputSchema {
            name: "multiple_choice_questions",
            schema: object(
                json!({ "questions": { "type": "array", "items": item } }),
                &["questions"],
            ),
        }
    }

    fn validate(self) -> Result<Vec<MultipleChoiceQuestion>, GenerationError> {
        let items = match self {
            MultipleChoiceOutput::Wrapped { questions } => questions,
            MultipleChoiceOutput::Bare(questions) => questions,
        };
        if items.is_empty() {
            return Err(GenerationError::ShapeValidation(
                "no multiple-choice questions".to_string(),
            ));
        }

        items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                require_text("question", &item.question)?;
                require_text("correct_answer", &item.correct_answer)?;

                let options = item.distractors.len() + 1;
                if options != MULTIPLE_CHOICE_OPTIONS {
                    return Err(GenerationError::ShapeValidation(format!(
                        "question {} has {} options, expected {}",
                        position, options, MULTIPLE_CHOICE_OPTIONS
                    )));
                }
                if item.distractors.iter().any(|d| d.trim().is_empty()) {
                    return Err(GenerationError::ShapeValidation(format!(
                        "question {} has an empty distractor",
                        position
                    )));
                }
                if item.distractors.contains(&item.correct_answer) {
                    return Err(GenerationError::ShapeValidation(format!(
                        "question {} repeats the correct answer as a distractor",
                        position
                    )));
                }

                Ok(MultipleChoiceQuestion {
                    question: item.question,
                    correct_answer: item.correct_answer,
                    distractors: item.distractors,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ShortAnswerOutput {
    pub questions: Vec<ShortAnswerQuestion>,
}

impl StructuredOutput for ShortAnswerOutput {
    type Value = Vec<ShortAnswerQuestion>;

    fn schema() -> OutputSchema {
        let item = object(
            json!({
                "question": { "type": "string" },
                "suggested_answer": { "type": "string" }
            }),
            &["question", "suggested_answer"],
        );
        OutputSchema {
            name: "short_answer_questions",
            schema: object(
                json!({ "questions": { "type": "array", "items": item } }),
                &["questions"],
            ),
        }
    }

    fn validate(self) -> Result<Vec<ShortAnswerQuestion>, GenerationError> {
        if self.questions.len() != SHORT_ANSWER_COUNT {
            return Err(GenerationError::ShapeValidation(format!(
                "expected {} short-answer questions, got {}",
                SHORT_ANSWER_COUNT,
                self.questions.len()
            )));
        }
        for question in &self.questions {
            require_text("question", &question.question)?;
            require_text("suggested_answer", &question.suggested_answer)?;
        }
        Ok(self.questions)
    }
}

#[derive(Debug, Deserialize)]
pub struct LongAnswerOutput {
    pub question: String,
}

impl StructuredOutput for LongAnswerOutput {
    type Value = LongAnswerQuestion;

    fn schema() -> OutputSchema {
        OutputSchema {
            name: "long_answer_question",
            schema: object(json!({ "question": { "type": "string" } }), &["question"]),
        }
    }

    fn validate(self) -> Result<LongAnswerQuestion, GenerationError> {
        require_text("question", &self.question)?;
        Ok(LongAnswerQuestion {
            question: self.question,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WordListOutput {
    pub word_list: Vec<WordListEntry>,
}

impl StructuredOutput for WordListOutput {
    type Value = Vec<WordListEntry>;

    fn schema() -> OutputSchema {
        let definition = object(
            json!({
                "en": { "type": "string" },
                "th": { "type": "string" },
                "cn": { "type": "string" },
                "tw": { "type": "string" },
                "vi": { "type": "string" }
            }),
            &["en", "th", "cn", "tw", "vi"],
        );
        let entry = object(
            json!({ "vocabulary": { "type": "string" }, "definition": definition }),
            &["vocabulary", "definition"],
        );
        OutputSchema {
            name: "word_list",
            schema: object(
                json!({ "word_list": { "type": "array", "items": entry } }),
                &["word_list"],
            ),
        }
    }

    fn validate(self) -> Result<Vec<WordListEntry>, GenerationError> {
        if self.word_list.is_empty() {
            return Err(GenerationError::ShapeValidation("empty word list".to_string()));
        }
        for entry in &self.word_list {
            require_text("vocabulary", &entry.vocabulary)?;
            let WordDefinition { en, .. } = &entry.definition;
            require_text("definition.en", en)?;
        }
        Ok(self.word_list)
    }
}
