use lesson_forge::domain::content::{CefrLevel, ContentType, GenerationRequest};
use serde_json::{json, Value};

/// Three short sentences; fits in a single audio chunk
pub const SHORT_PASSAGE: &str =
    "The keeper climbed the stairs. The storm grew louder. At dawn the light was still burning.";

/// Twelve sentences of ~518 bytes each; splits into chunks of 9 and 3 at the 5000 byte limit
pub fn long_passage() -> String {
    (1..=12)
        .map(|i| format!("Sentence {:02} {}.", i, "lorem ".repeat(84)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A catalog whose topics prompt renders to the bare amount
pub fn catalog_json() -> Value {
    let mut prompts = Vec::new();
    for content_type in ["fiction", "nonfiction"] {
        prompts.push(prompt("topics", content_type, "{amount}"));
        prompts.push(prompt("article", content_type, "Write about {topic} at {level}"));
        prompts.push(prompt("rating", content_type, "Rate {title} for {level} readers"));
        prompts.push(prompt("multiple_choice", content_type, "Quiz on {title}"));
        prompts.push(prompt("short_answer", content_type, "Questions on {title}"));
        prompts.push(prompt("long_answer", content_type, "Essay on {title}"));
        prompts.push(prompt("word_list", content_type, "Words from {passage}"));
    }

    json!({
        "genres": [
            { "content_type": "fiction", "genre": "Adventure", "subgenres": ["Sea voyage"] },
            { "content_type": "nonfiction", "genre": "Science", "subgenres": ["Weather"] }
        ],
        "prompts": prompts
    })
}

/// Same catalog with the nonfiction article prompts removed
pub fn catalog_without_nonfiction_articles() -> Value {
    let mut catalog = catalog_json();
    if let Some(prompts) = catalog.get_mut("prompts").and_then(Value::as_array_mut) {
        prompts.retain(|p| !(p["kind"] == "article" && p["content_type"] == "nonfiction"));
    }
    catalog
}

fn prompt(kind: &str, content_type: &str, template: &str) -> Value {
    json!({
        "kind": kind,
        "content_type": content_type,
        "system_prompt": "You write graded readers.",
        "user_prompt_template": template
    })
}

pub fn request(content_type: ContentType, level: CefrLevel) -> GenerationRequest {
    GenerationRequest {
        content_type,
        genre: "Adventure".to_string(),
        subgenre: "Sea voyage".to_string(),
        topic: "a lighthouse in a storm".to_string(),
        level,
    }
}
