use thiserror::Error;

/// Failures the streaming layer can surface to the session driver.
///
/// None of these are retried here; retry policy, if any, belongs to the
/// caller.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The network transport broke mid-stream. Distinct from a clean
    /// end-of-stream, which simply terminates the event sequence.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A frame payload could not be parsed as an event. Indicates wire
    /// corruption, so the session driver aborts on it.
    #[error("decode failure: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
