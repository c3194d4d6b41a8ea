//! # Caseforge - Streaming Test Case Generation Client
//!
//! Caseforge consumes a long-running generation endpoint over a single
//! streaming HTTP response, rendering partial results as they arrive:
//!
//! - **Incremental aggregation** (test cases land one event at a time,
//!   grouped by feature in batch mode)
//! - **Cancellation** (abort an in-flight run without leaking state)
//! - **Tolerant wire handling** (unknown event types and keepalive frames
//!   pass through harmlessly)
//! - **Export** (plain text, JSON and Markdown encodings of a finished run)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use caseforge::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(GeneratorClient::new("http://127.0.0.1:8000")?);
//!     let mut slot = GenerationSlot::new();
//!
//!     let handle = slot.start(
//!         client,
//!         GenerateRequest::new("uploads/spec.pdf", "Login").with_limit(10),
//!     );
//!
//!     // `handle.subscribe()` yields live snapshots for rendering;
//!     // `handle.abort()` cancels; `finished()` waits for the outcome.
//!     let session = handle.finished().await;
//!     println!("{}", export(session.items(), ExportFormat::PlainText)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Caseforge consists of two composable crates:
//!
//! - **caseforge-stream**: transport client, frame reassembly, event
//!   decoding (`FrameBuffer`, `GenerationEvent`, `GeneratorClient`)
//! - **caseforge-session**: the session aggregate and its state machine,
//!   cancellation and orchestration (`Session`, `GenerationSlot`), plus
//!   the export encoders

// Re-export crates under short names
pub use caseforge_session as session;
pub use caseforge_stream as stream;

// Most commonly used types at the top level
pub use caseforge_session::{
    export, ExportFormat, FeatureGroup, GenerationHandle, GenerationSlot, Mode, Session,
    SessionOutcome, SessionStatus,
};
pub use caseforge_stream::{
    GenerateRequest, GenerationEvent, GeneratorClient, HallucinationReport, StreamError,
    StreamingGenerator, TestCase,
};

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::session::{
        export, ExportFormat, GenerationHandle, GenerationSlot, Session, SessionOutcome,
        SessionStatus,
    };
    pub use crate::stream::{GenerateRequest, GeneratorClient, StreamingGenerator, TestCase};
    pub use anyhow::Result;
}
