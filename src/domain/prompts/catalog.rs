use rand::seq::IndexedRandom;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::domain::content::{CefrLevel, ContentType, GenreSelection};
use crate::domain::shared::GenerationError;

/// Which generator a prompt belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Topics,
    Article,
    MultipleChoice,
    ShortAnswer,
    LongAnswer,
    WordList,
    Rating,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Topics => "topics",
            PromptKind::Article => "article",
            PromptKind::MultipleChoice => "multiple_choice",
            PromptKind::ShortAnswer => "short_answer",
            PromptKind::LongAnswer => "long_answer",
            PromptKind::WordList => "word_list",
            PromptKind::Rating => "rating",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreEntry {
    pub content_type: ContentType,
    pub genre: String,
    pub subgenres: Vec<String>,
}

/// Prompt pair for one kind and content type.
///
/// An empty `levels` list applies to every level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub kind: PromptKind,
    pub content_type: ContentType,
    #[serde(default)]
    pub levels: Vec<CefrLevel>,
    pub system_prompt: String,
    pub user_prompt_template: String,
}

impl PromptEntry {
    fn matches(&self, kind: PromptKind, content_type: ContentType, level: Option<CefrLevel>) -> bool {
        if self.kind != kind || self.content_type != content_type {
            return false;
        }
        match level {
            Some(level) => self.levels.is_empty() || self.levels.contains(&level),
            None => true,
        }
    }
}

/// Values substituted into `{placeholder}`s of a user prompt template
#[derive(Debug, Clone, Default)]
pub struct PromptVars<'a> {
    pub genre: Option<&'a str>,
    pub subgenre: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub level: Option<CefrLevel>,
    pub content_type: Option<ContentType>,
    pub title: Option<&'a str>,
    pub passage: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub image_description: Option<&'a str>,
    pub amount: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Genre tables and prompt texts, loaded once from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptCatalog {
    #[serde(default)]
    pub genres: Vec<GenreEntry>,
    #[serde(default)]
    pub prompts: Vec<PromptEntry>,
}

impl PromptCatalog {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            genres = catalog.genres.len(),
            prompts = catalog.prompts.len(),
            "Prompt catalog loaded"
        );
        Ok(catalog)
    }

    /// Find the prompt for `(kind, content_type, level)`.
    ///
    /// Fails with `ConfigurationMissing` when nothing matches; callers run this
    /// before any external call so the miss is never retried.
    pub fn lookup(
        &self,
        kind: PromptKind,
        content_type: ContentType,
        level: Option<CefrLevel>,
    ) -> Result<&PromptEntry, GenerationError> {
        self.prompts
            .iter()
            .find(|entry| entry.matches(kind, content_type, level))
            .ok_or(GenerationError::ConfigurationMissing {
                kind,
                content_type,
                level,
            })
    }

    /// Render both prompts for `(kind, content_type, level)`
    pub fn render(
        &self,
        kind: PromptKind,
        content_type: ContentType,
        level: Option<CefrLevel>,
        vars: &PromptVars<'_>,
    ) -> Result<RenderedPrompt, GenerationError> {
        let entry = self.lookup(kind, content_type, level)?;
        Ok(RenderedPrompt {
            system: render_template(&entry.system_prompt, vars),
            user: render_template(&entry.user_prompt_template, vars),
        })
    }

    /// Pick a random genre and one of its subgenres
    pub fn select_genre(&self, content_type: ContentType) -> Result<GenreSelection, GenerationError> {
        let candidates: Vec<&GenreEntry> = self
            .genres
            .iter()
            .filter(|entry| entry.content_type == content_type && !entry.subgenres.is_empty())
            .collect();

        let mut rng = rand::rng();
        let entry = candidates
            .choose(&mut rng)
            .ok_or(GenerationError::ConfigurationMissing {
                kind: PromptKind::Topics,
                content_type,
                level: None,
            })?;
        let subgenre = entry
            .subgenres
            .choose(&mut rng)
            .ok_or(GenerationError::ConfigurationMissing {
                kind: PromptKind::Topics,
                content_type,
                level: None,
            })?;

        Ok(GenreSelection {
            genre: entry.genre.clone(),
            subgenre: subgenre.clone(),
        })
    }
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Replace known `{placeholder}`s in one pass; unknown ones and unset values are left as written.
///
/// Substituted values are never scanned again, so a `{passage}` written inside a title stays literal.
fn render_template(template: &str, vars: &PromptVars<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let value = match &caps[1] {
                "genre" => vars.genre.map(str::to_string),
                "subgenre" => vars.subgenre.map(str::to_string),
                "topic" => vars.topic.map(str::to_string),
                "level" => vars.level.map(|l| l.to_string()),
                "type" => vars.content_type.map(|c| c.to_string()),
                "title" => vars.title.map(str::to_string),
                "passage" => vars.passage.map(str::to_string),
                "summary" => vars.summary.map(str::to_string),
                "image_description" => vars.image_description.map(str::to_string),
                "amount" => vars.amount.map(|a| a.to_string()),
                _ => None,
            };
            value.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
