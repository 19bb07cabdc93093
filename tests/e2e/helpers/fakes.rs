//! In-memory stand-ins for every external collaborator of the pipeline

use async_trait::async_trait;
use lesson_forge::domain::content::{
    GeneratedArticle, GenerationRequest, QuestionKind, QuestionSet, WordListEntry,
};
use lesson_forge::domain::queue::GenerationReport;
use lesson_forge::domain::tts::Timepoint;
use lesson_forge::error::{AppError, AppResult};
use lesson_forge::infrastructure::repositories::{
    BlobRepository, ContentRepository, ImageRepository, LlmRepository, OutputSchema, SpeechMark,
    SpeechSynthesis, TtsRepository,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers every structured request with a valid object for its schema.
///
/// Topics prompts must render to the bare amount so the fake can echo the
/// requested number of topics back.
pub struct FakeLlm {
    passage: String,
    failing_topic: Option<String>,
    rating: u8,
    short_multiple_choice: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn new(passage: &str, failing_topic: Option<&str>) -> Self {
        Self {
            passage: passage.to_string(),
            failing_topic: failing_topic.map(str::to_string),
            rating: 4,
            short_multiple_choice: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Score every article draft with `rating`
    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    /// Answer multiple-choice requests with three options instead of four
    pub fn with_short_multiple_choice(mut self, short: bool) -> Self {
        self.short_multiple_choice = short;
        self
    }

    pub fn calls_for(&self, schema_name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|name| name.as_str() == schema_name)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LlmRepository for FakeLlm {
    async fn generate_object(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, String> {
        self.calls.lock().push(schema.name.to_string());

        let response = match schema.name {
            "topics" => {
                let amount: usize = user_prompt.trim().parse().unwrap_or(1);
                json!({ "topics": (0..amount).map(|i| format!("topic {}", i)).collect::<Vec<_>>() })
            }
            "article" => {
                if let Some(topic) = &self.failing_topic {
                    if user_prompt.contains(topic.as_str()) {
                        return Err("model overloaded".to_string());
                    }
                }
                json!({
                    "title": "The Lighthouse Keeper",
                    "passage": self.passage,
                    "summary": "A keeper tends a light through a storm.",
                    "image_description": "A lighthouse in a storm at night"
                })
            }
            "article_rating" => json!({ "rating": self.rating }),
            "multiple_choice_questions" => {
                let distractors = if self.short_multiple_choice {
                    vec!["The captain", "The cook"]
                } else {
                    vec!["The captain", "The cook", "The gull"]
                };
                json!({
                    "questions": [{
                        "question": "Who tends the light?",
                        "correct_answer": "The keeper",
                        "distractors": distractors
                    }]
                })
            }
            "short_answer_questions" => json!({
                "questions": (1..=5).map(|i| json!({
                    "question": format!("Question {}?", i),
                    "suggested_answer": format!("Answer {}", i)
                })).collect::<Vec<_>>()
            }),
            "long_answer_question" => json!({
                "question": "Why does the keeper stay through the storm?"
            }),
            "word_list" => json!({
                "word_list": [
                    {
                        "vocabulary": "keeper",
                        "definition": {
                            "en": "a person who looks after something",
                            "th": "ผู้ดูแล",
                            "cn": "看守人",
                            "tw": "看守人",
                            "vi": "người trông coi"
                        }
                    },
                    {
                        "vocabulary": "dawn",
                        "definition": {
                            "en": "the first light of the day",
                            "th": "รุ่งอรุณ",
                            "cn": "黎明",
                            "tw": "黎明",
                            "vi": "bình minh"
                        }
                    }
                ]
            }),
            other => return Err(format!("unexpected schema {}", other)),
        };

        Ok(response.to_string())
    }
}

/// Returns one mark per `<mark` in the markup, one second apart.
///
/// Markup containing `failing_text` is refused.
#[derive(Default)]
pub struct FakeTts {
    failing_text: Option<&'static str>,
    requests: Mutex<Vec<String>>,
}

impl FakeTts {
    pub fn failing_on(text: Option<&'static str>) -> Self {
        Self {
            failing_text: text,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests narrating a passage, as opposed to a word list
    pub fn passage_calls(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|ssml| ssml.contains("<mark name='sentence"))
            .count()
    }

    pub fn word_calls(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|ssml| ssml.contains("<mark name='word"))
            .count()
    }
}

#[async_trait]
impl TtsRepository for FakeTts {
    async fn synthesize(&self, ssml: &str, _voice: &str) -> Result<SpeechSynthesis, String> {
        self.requests.lock().push(ssml.to_string());
        if self.failing_text.is_some_and(|text| ssml.contains(text)) {
            return Err("voice unavailable".to_string());
        }
        let marks = ssml
            .match_indices("<mark name='")
            .enumerate()
            .map(|(position, (offset, _))| {
                let rest = &ssml[offset + "<mark name='".len()..];
                let name = rest.split('\'').next().unwrap_or_default();
                SpeechMark {
                    mark_name: name.to_string(),
                    time_seconds: position as f64,
                }
            })
            .collect();

        Ok(SpeechSynthesis {
            audio: b"ID3fake-mp3".to_vec(),
            marks,
        })
    }
}

#[derive(Default)]
pub struct FakeImages {
    generated: AtomicUsize,
}

impl FakeImages {
    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageRepository for FakeImages {
    async fn generate(&self, _description: &str) -> Result<String, String> {
        let n = self.generated.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://images.test/{}.png", n))
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, String> {
        Ok(b"\x89PNGfake".to_vec())
    }
}

/// Records uploaded and deleted keys; the staged file must exist at upload time
#[derive(Default)]
pub struct FakeBlobs {
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
}

impl FakeBlobs {
    pub fn keys(&self) -> Vec<String> {
        self.uploads.lock().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }

    /// Uploaded keys that were not deleted again
    pub fn remaining(&self) -> Vec<String> {
        let deletes = self.deletes.lock();
        self.uploads
            .lock()
            .iter()
            .filter(|key| !deletes.contains(key))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BlobRepository for FakeBlobs {
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<(), String> {
        if !local_path.exists() {
            return Err(format!("{} was not staged", local_path.display()));
        }
        self.uploads.lock().push(remote_key.to_string());
        Ok(())
    }

    async fn delete(&self, remote_key: &str) -> Result<(), String> {
        self.deletes.lock().push(remote_key.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredArticle {
    pub request: GenerationRequest,
    pub article: GeneratedArticle,
    pub questions: HashMap<QuestionKind, QuestionSet>,
    pub word_list: Vec<WordListEntry>,
    pub timepoints: Vec<Timepoint>,
    pub word_timepoints: Vec<Timepoint>,
    pub image_key: Option<String>,
}

pub struct InMemoryContentRepository {
    ready: AtomicBool,
    articles: Mutex<HashMap<String, StoredArticle>>,
    error_logs: Mutex<Vec<GenerationReport>>,
}

impl Default for InMemoryContentRepository {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(true),
            articles: Mutex::new(HashMap::new()),
            error_logs: Mutex::new(Vec::new()),
        }
    }
}

impl InMemoryContentRepository {
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn article(&self, content_id: &str) -> Option<StoredArticle> {
        self.articles.lock().get(content_id).cloned()
    }

    pub fn article_count(&self) -> usize {
        self.articles.lock().len()
    }

    pub fn error_logs(&self) -> Vec<GenerationReport> {
        self.error_logs.lock().clone()
    }

    fn update<F>(&self, content_id: &str, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut StoredArticle),
    {
        let mut articles = self.articles.lock();
        let stored = articles
            .get_mut(content_id)
            .ok_or_else(|| AppError::NotFound(format!("article {}", content_id)))?;
        apply(stored);
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn ping(&self) -> AppResult<()> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::ServiceUnavailable("store offline".to_string()))
        }
    }

    async fn create_article(
        &self,
        content_id: &str,
        request: &GenerationRequest,
        article: &GeneratedArticle,
    ) -> AppResult<()> {
        self.articles.lock().insert(
            content_id.to_string(),
            StoredArticle {
                request: request.clone(),
                article: article.clone(),
                questions: HashMap::new(),
                word_list: Vec::new(),
                timepoints: Vec::new(),
                word_timepoints: Vec::new(),
                image_key: None,
            },
        );
        Ok(())
    }

    async fn add_questions(&self, content_id: &str, questions: &QuestionSet) -> AppResult<()> {
        self.update(content_id, |stored| {
            stored.questions.insert(questions.kind(), questions.clone());
        })
    }

    async fn add_word_list(&self, content_id: &str, words: &[WordListEntry]) -> AppResult<()> {
        self.update(content_id, |stored| stored.word_list = words.to_vec())
    }

    async fn update_timepoints(&self, content_id: &str, timepoints: &[Timepoint]) -> AppResult<()> {
        self.update(content_id, |stored| stored.timepoints = timepoints.to_vec())
    }

    async fn update_word_timepoints(
        &self,
        content_id: &str,
        timepoints: &[Timepoint],
    ) -> AppResult<()> {
        self.update(content_id, |stored| {
            stored.word_timepoints = timepoints.to_vec()
        })
    }

    async fn update_image(&self, content_id: &str, image_key: &str) -> AppResult<()> {
        self.update(content_id, |stored| {
            stored.image_key = Some(image_key.to_string())
        })
    }

    async fn record_error_log(&self, report: &GenerationReport) -> AppResult<()> {
        self.error_logs.lock().push(report.clone());
        Ok(())
    }
}
