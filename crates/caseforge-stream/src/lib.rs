pub mod client;
pub mod decode;
pub mod error;
pub mod events;
pub mod frame;
pub mod stream;

pub use client::{GenerateRequest, GeneratorClient, StreamingGenerator};
pub use decode::decode_frame;
pub use error::StreamError;
pub use events::{
    CompletionResult, GenerationEvent, HallucinationFlag, HallucinationReport, Steps, TestCase,
};
pub use frame::FrameBuffer;
pub use stream::{parse_event_stream, EventStream};
