pub mod export;
pub mod handle;
pub mod orchestrator;
pub mod session;

pub use export::{export, ExportFormat};
pub use handle::GenerationHandle;
pub use orchestrator::GenerationSlot;
pub use session::{FeatureGroup, Mode, Progress, Session, SessionOutcome, SessionStatus};
