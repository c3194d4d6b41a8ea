use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::Response;
use tracing::debug;

use crate::decode::decode_frame;
use crate::error::StreamError;
use crate::events::GenerationEvent;
use crate::frame::FrameBuffer;

/// Prefix marking a frame that carries an event payload. Frames without it
/// (comments, keepalives) are dropped without being an error.
pub const DATA_PREFIX: &str = "data: ";

/// Ordered stream of decoded events for one generation run.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent, StreamError>> + Send>>;

/// Turn a streaming HTTP response into a stream of decoded events.
///
/// Events come out in exactly the order their frames completed on the wire:
/// no reordering, no batching. A transport error surfaces as a terminal
/// `StreamError::Transport` item; a clean end-of-stream simply ends the
/// sequence, discarding any unterminated trailing frame.
pub fn parse_event_stream(response: Response) -> EventStream {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = FrameBuffer::with_capacity(8192);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(&bytes);

                    // Process all complete frames in the buffer.
                    while let Some(frame_result) = buffer.next_frame() {
                        match frame_result {
                            Ok(frame) => {
                                match frame.strip_prefix(DATA_PREFIX) {
                                    Some(payload) => yield decode_frame(payload),
                                    None => debug!("dropping non-data frame"),
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
                Err(e) => yield Err(StreamError::Transport(e.to_string())),
            }
        }
    })
}
