pub mod outputs;
pub mod service;

pub use outputs::{StructuredOutput, MULTIPLE_CHOICE_OPTIONS, SHORT_ANSWER_COUNT};
pub use service::ContentGenerator;
