//! Incremental decoder for the `event:` / `data:` search stream.
//!
//! Chunks may end anywhere, including in the middle of a UTF-8 sequence,
//! so both the bytes and the text are buffered until a full line exists.

use std::collections::VecDeque;

use futures_util::{stream::BoxStream, StreamExt};
use serde_json::Value;

use crate::app::AppError;

use super::event::{StreamEvent, DEFAULT_EVENT_TYPE};

/// Raw response body, one item per network chunk.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, AppError>>;

#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing bytes of an unfinished UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text after the last newline.
    buffer: String,
    /// Last `event:` value of the current frame group.
    event_type: Option<String>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.decode_utf8(chunk);

        let Some(end) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(end + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .lines()
            .filter_map(|line| self.process_line(line))
            .collect()
    }

    /// Drop whatever is left without a terminating newline.
    ///
    /// Returns the number of discarded bytes.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffer.len() + self.pending.len();
        self.buffer.clear();
        self.pending.clear();
        self.event_type = None;
        discarded
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));

                    match err.error_len() {
                        // sequence continues in the next chunk
                        None => {
                            self.pending = after.to_vec();
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                    }
                }
            }
        }
    }

    fn process_line(&mut self, line: &str) -> Option<StreamEvent> {
        if line.is_empty() {
            self.event_type = None;
            return None;
        }

        if let Some(name) = line.strip_prefix("event:") {
            let name = name.trim();
            self.event_type = (!name.is_empty()).then(|| name.to_string());
            return None;
        }

        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data);
        let event_type = self.event_type.as_deref().unwrap_or(DEFAULT_EVENT_TYPE);

        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(payload)) => Some(StreamEvent::from_payload(event_type, payload)),
            Ok(other) => {
                log::debug!("dropping non-object frame: {other}");
                None
            }
            Err(err) => {
                log::debug!("dropping malformed frame: {err}. tried to parse: {data:?}");
                None
            }
        }
    }
}

/// Pulls chunks from a [`ByteStream`] only when the caller asks for the
/// next event.
pub struct EventReader {
    stream: ByteStream,
    decoder: FrameDecoder,
    ready: VecDeque<StreamEvent>,
    finished: bool,
}

impl EventReader {
    pub fn new(stream: ByteStream) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    /// Next event in arrival order, `None` once the body is exhausted.
    ///
    /// Only transport failures are returned as errors.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, AppError> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }

            match self.stream.next().await {
                Some(chunk) => {
                    let events = self.decoder.push(&chunk?);
                    self.ready.extend(events);
                }
                None => {
                    self.finished = true;
                    let discarded = self.decoder.finish();
                    if discarded > 0 {
                        log::debug!("discarding {discarded} unterminated bytes at end of stream");
                    }
                }
            }
        }
    }
}
