pub mod content;
pub mod generators;
pub mod image;
pub mod prompts;
pub mod queue;
pub mod shared;
pub mod tts;
