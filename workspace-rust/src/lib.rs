mod errors;
pub mod history;
mod options;
mod orchestrator;
mod reference;
mod store;

pub use errors::{PersistenceError, WorkspaceError, WorkspaceResult};
pub use options::WorkspaceOptions;
pub use orchestrator::{ActionOutcome, Notice, NoticeLevel, WorkspaceOrchestrator};
pub use reference::{validate_reference_image, ACCEPTED_REFERENCE_PREFIXES};
pub use store::{
    GenerationMode, GenerationPhase, GenerationState, GenerationStore, OperationKind,
    DEFAULT_GALLERY_CAP,
};
