use serde_json::Value;

/// A decoded frame from a NetLog capture.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// The `"constants": {...}` preamble object.
    Constants(Value),
    /// One event object from inside the `"events": [ ... ]` array.
    Event(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Looking for the constants preamble or the events marker, whichever
    /// comes first.
    Preamble,
    /// Constants seen; still waiting for `"events": [`.
    AwaitingMarker,
    /// Inside the events array, decoding one object per line.
    InEvents,
    /// Saw the closing `]` or `]}` — ignore anything after.
    Done,
}

/// Turns a NetLog capture's lines into [`Frame`]s.
///
/// NetLog output is not a single JSON document: Chrome writes a constants
/// preamble, an `"events": [` marker, then one JSON object per line, each
/// terminated with a trailing comma except (sometimes) the last, and
/// closes with `]}` — which may be missing entirely if the capture was cut
/// off mid-stream. [`feed_line`](LineFramer::feed_line) is deliberately
/// line-oriented rather than reader-oriented so the same state machine
/// serves both the batch CLI (iterating a file's lines) and the streaming
/// runner (one line at a time off a FIFO).
///
/// Decode failures never abort the capture: a malformed line is logged at
/// `warn` and skipped, exactly as a truncated or corrupted log line should
/// be tolerated mid-capture.
#[derive(Debug)]
pub struct LineFramer {
    mode: Mode,
    line_no: u64,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            mode: Mode::Preamble,
            line_no: 0,
        }
    }

    /// True once the closing `]` or `]}` has been seen. Further calls to
    /// [`feed_line`](Self::feed_line) are no-ops.
    pub fn is_done(&self) -> bool {
        self.mode == Mode::Done
    }

    /// Feed one line (without its trailing newline) into the framer.
    /// Returns `Some(Frame)` when the line yielded a decoded frame.
    pub fn feed_line(&mut self, raw: &str) -> Option<Frame> {
        self.line_no += 1;
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }
        match self.mode {
            Mode::Done => None,
            Mode::Preamble => {
                if line.starts_with("{\"constants\":") {
                    let frame = self.decode(line);
                    self.mode = Mode::AwaitingMarker;
                    frame.map(Frame::Constants)
                } else if line.starts_with("\"events\": [") {
                    self.mode = Mode::InEvents;
                    None
                } else {
                    None
                }
            }
            Mode::AwaitingMarker => {
                if line.starts_with("\"events\": [") {
                    self.mode = Mode::InEvents;
                }
                None
            }
            Mode::InEvents => {
                if matches!(line, "]" | "]}" | "}") {
                    self.mode = Mode::Done;
                    return None;
                }
                self.decode(line).map(Frame::Event)
            }
        }
    }

    fn decode(&self, line: &str) -> Option<Value> {
        let trimmed = line.strip_suffix(',').unwrap_or(line);
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v) => Some(v),
            Err(err) => {
                tracing::warn!(line = self.line_no, error = %err, "skipping malformed netlog line");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framer_frames(lines: &[&str]) -> Vec<Frame> {
        let mut framer = LineFramer::new();
        lines.iter().filter_map(|l| framer.feed_line(l)).collect()
    }

    #[test]
    fn decodes_constants_preamble() {
        let frames = framer_frames(&[r#"{"constants": {"a": 1}},"#]);
        assert_eq!(frames, vec![Frame::Constants(serde_json::json!({"a": 1}))]);
    }

    #[test]
    fn decodes_events_after_marker() {
        let frames = framer_frames(&[
            r#"{"constants": {}},"#,
            r#""events": [",
            r#"{"type": 1, "time": "10"},"#,
            r#"{"type": 2, "time": "20"}"#,
            "]}",
        ]);
        assert_eq!(
            frames,
            vec![
                Frame::Constants(serde_json::json!({})),
                Frame::Event(serde_json::json!({"type": 1, "time": "10"})),
                Frame::Event(serde_json::json!({"type": 2, "time": "20"})),
            ]
        );
    }

    #[test]
    fn ignores_lines_after_closing_bracket() {
        let frames = framer_frames(&[
            "\"events\": [",
            r#"{"type": 1}"#,
            "]}",
            r#"{"type": 2}"#,
        ]);
        assert_eq!(frames, vec![Frame::Event(serde_json::json!({"type": 1}))]);
    }

    #[test]
    fn skips_malformed_event_lines_without_stopping() {
        let frames = framer_frames(&[
            "\"events\": [",
            "{not json},",
            r#"{"type": 1}"#,
        ]);
        assert_eq!(frames, vec![Frame::Event(serde_json::json!({"type": 1}))]);
    }

    #[test]
    fn missing_closing_bracket_is_tolerated() {
        let mut framer = LineFramer::new();
        framer.feed_line("\"events\": [");
        let frame = framer.feed_line(r#"{"type": 7}"#);
        assert_eq!(frame, Some(Frame::Event(serde_json::json!({"type": 7}))));
        assert!(!framer.is_done());
    }

    #[test]
    fn blank_lines_are_ignored() {
        let frames = framer_frames(&["", "  ", "\"events\": [", "", r#"{"type": 1}"#]);
        assert_eq!(frames, vec![Frame::Event(serde_json::json!({"type": 1}))]);
    }
}
