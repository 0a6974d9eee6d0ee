// crates/core/src/decoder.rs
//! Incremental frame decoder for the agent's text event stream.
//!
//! The transport hands us arbitrary byte chunks; chunk boundaries can split
//! lines (and multi-byte UTF-8 sequences) anywhere. The decoder buffers the
//! trailing partial line across [`feed`](FrameDecoder::feed) calls and only
//! ever interprets complete lines, so a frame decodes identically no matter
//! how the stream was chunked.

use memchr::memchr;

/// One decoded frame: the `event:` name plus the joined `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

/// Push-style decoder for `event:` / `data:` / blank-line framing.
///
/// Feed raw chunks as they arrive; completed frames come back in arrival
/// order. No state survives a connection; recreate on reconnect.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Unconsumed bytes: at most one partial line after each `feed`.
    buf: Vec<u8>,
    /// `event:` value of the frame being accumulated.
    event: String,
    /// `data:` lines seen so far, joined with `\n` on emit.
    data: Vec<String>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0usize;
        while let Some(pos) = memchr(b'\n', &self.buf[start..]) {
            let end = start + pos;
            let line = &self.buf[start..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let line = String::from_utf8_lossy(line).into_owned();
            if let Some(frame) = self.push_line(&line) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        frames
    }

    /// Process one complete line. Returns a frame when a blank line closes a
    /// well-formed one.
    fn push_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            return self.finish_frame();
        }
        if let Some(rest) = line.strip_prefix("event:") {
            self.event = rest.strip_prefix(' ').unwrap_or(rest).to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            self.data
                .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
        // Comment lines (leading ':') and unknown fields are ignored.
        None
    }

    /// Close the frame being accumulated. Both the event type and the payload
    /// must be non-empty or nothing is emitted; this swallows the trailing
    /// empty frame some servers send at stream end.
    fn finish_frame(&mut self) -> Option<Frame> {
        let event = std::mem::take(&mut self.event);
        let data = std::mem::take(&mut self.data).join("\n");
        if event.is_empty() || data.is_empty() {
            return None;
        }
        Some(Frame { event, data })
    }
}
