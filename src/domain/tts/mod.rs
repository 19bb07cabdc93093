pub mod sentences;
pub mod service;
pub mod ssml;
pub mod timepoints;

pub use sentences::split_into_sentences;
pub use service::AudioService;
pub use ssml::{
    chunk_passage, chunk_words, render_ssml, AudioChunk, Narration, DEFAULT_MAX_MARKUP_BYTES,
};
pub use timepoints::{aggregate_timepoints, verify_timeline, ChunkSynthesis, Timepoint};
