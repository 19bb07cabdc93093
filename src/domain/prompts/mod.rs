pub mod catalog;

pub use catalog::{GenreEntry, PromptCatalog, PromptEntry, PromptKind, PromptVars, RenderedPrompt};
