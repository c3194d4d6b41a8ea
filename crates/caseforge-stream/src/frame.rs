use std::collections::VecDeque;

use crate::error::StreamError;

/// Blank-line frame delimiter of the event stream wire format.
pub const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Reassembles arbitrarily-chunked bytes into blank-line delimited frames.
///
/// Chunks may split a frame anywhere, including in the middle of the
/// delimiter or of a multi-byte character. A frame only exists once its
/// closing delimiter has arrived, so the segmentation of the input never
/// changes the frames produced. Trailing bytes with no delimiter are held
/// until more data arrives; at end-of-stream they are simply never yielded.
pub struct FrameBuffer {
    buffer: VecDeque<u8>,
}

impl FrameBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete frame from the buffer.
    ///
    /// Returns None while no delimiter is buffered. The delimiter is ASCII,
    /// so a multi-byte character split across chunks is always whole again
    /// by the time its frame is decoded.
    pub fn next_frame(&mut self) -> Option<Result<String, StreamError>> {
        let delim_pos = self
            .buffer
            .make_contiguous()
            .windows(FRAME_DELIMITER.len())
            .position(|window| window == FRAME_DELIMITER)?;

        let frame_bytes: Vec<u8> = self
            .buffer
            .drain(..delim_pos + FRAME_DELIMITER.len())
            .collect();

        match std::str::from_utf8(&frame_bytes[..delim_pos]) {
            Ok(frame) => Some(Ok(frame.trim().to_string())),
            Err(e) => Some(Err(StreamError::from(e))),
        }
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
