pub mod assets;
pub mod generation_error;
pub mod retry;

pub use assets::AssetStager;
pub use generation_error::{FailureKind, GenerationError, GenerationStage, StageError};
pub use retry::RetryPolicy;
