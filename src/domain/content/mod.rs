pub mod leveling;
pub mod model;

pub use leveling::{calculate_level, ReadingLevel};
pub use model::{
    CefrLevel, ContentType, GeneratedArticle, GeneratedQueueItem, GenerationRequest,
    GenreSelection, LongAnswerQuestion, MultipleChoiceQuestion, QuestionKind, QuestionSet,
    ShortAnswerQuestion, WordDefinition, WordListEntry,
};
