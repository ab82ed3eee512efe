//! JSON-lines event output.

use std::io::Write;

use td_core::events::{CoreEvent, EventSink};

/// Writes every core event as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
    written: u64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Lines successfully written.
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn publish(&mut self, event: &CoreEvent) {
        // One write per line so lines from other writers never split it
        let result = serde_json::to_vec(event)
            .map_err(std::io::Error::from)
            .and_then(|mut line| {
                line.push(b'\n');
                self.writer.write_all(&line)
            })
            .and_then(|()| self.writer.flush());
        match result {
            Ok(()) => self.written += 1,
            Err(err) => tracing::warn!(%err, "Failed to write event"),
        }
    }
}
