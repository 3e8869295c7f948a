//! Append-only trace output.
//!
//! Decoders describe what they find through the [`Sink`] trait and never
//! format output themselves. Two sinks are provided: [`TextSink`] renders an
//! indented, human-readable trace; [`EventSink`] records structured
//! [`TraceEvent`]s for JSON output.

use std::fmt::{self, Display, Write as _};

use serde::{Deserialize, Serialize};

/// Distinguishable end-of-decode markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Captured data ended before a required field.
    Truncated,
    /// A structural invariant was violated; carries the reason.
    Corrupt(&'static str),
    /// Bytes left over after the last record of an envelope.
    Trailing(usize),
}

impl Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Truncated => write!(f, "[|truncated]"),
            Marker::Corrupt(reason) => write!(f, "[corrupt: {reason}]"),
            Marker::Trailing(bytes) => write!(f, "[{bytes} trailing bytes]"),
        }
    }
}

/// Consumer of decode output. Emitting never fails.
pub trait Sink {
    /// Open a nested scope (a record, a header, a sub-structure).
    fn enter(&mut self, label: &str);
    /// Close the innermost scope.
    fn leave(&mut self);
    /// Named decoded value.
    fn field(&mut self, name: &str, value: &dyn Display);
    /// Free-form line.
    fn text(&mut self, text: &str);
    /// Opaque bytes.
    fn hex(&mut self, bytes: &[u8]);
    fn marker(&mut self, marker: Marker);
}

/// Run `f` inside a scope labelled `label`, closing it however `f` returns.
pub fn scoped<R>(sink: &mut dyn Sink, label: &str, f: impl FnOnce(&mut dyn Sink) -> R) -> R {
    sink.enter(label);
    let result = f(sink);
    sink.leave();
    result
}

const HEX_LINE_BYTES: usize = 16;
const INDENT: &str = "  ";

/// Indented text trace, loosely modelled on classic packet printers.
///
/// # Examples
/// ```
/// use nestscope_core::{Sink, TextSink};
///
/// let mut sink = TextSink::new();
/// sink.enter("record");
/// sink.field("type", &7);
/// sink.leave();
/// assert_eq!(sink.as_str(), "record\n  type: 7\n");
/// ```
#[derive(Debug, Default, Clone)]
pub struct TextSink {
    out: String,
    depth: usize,
    hex_limit: Option<usize>,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every opaque dump at `limit` bytes; the remainder is elided.
    pub fn with_hex_limit(limit: Option<usize>) -> Self {
        Self {
            hex_limit: limit,
            ..Self::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        // Writing into a String cannot fail.
        let _ = self.out.write_fmt(args);
        self.out.push('\n');
    }
}

impl Sink for TextSink {
    fn enter(&mut self, label: &str) {
        self.line(format_args!("{label}"));
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn field(&mut self, name: &str, value: &dyn Display) {
        self.line(format_args!("{name}: {value}"));
    }

    fn text(&mut self, text: &str) {
        self.line(format_args!("{text}"));
    }

    fn hex(&mut self, bytes: &[u8]) {
        let shown = match self.hex_limit {
            Some(limit) => &bytes[..bytes.len().min(limit)],
            None => bytes,
        };
        for (idx, chunk) in shown.chunks(HEX_LINE_BYTES).enumerate() {
            let line = hex_line(chunk);
            self.line(format_args!("0x{:04x}:  {line}", idx * HEX_LINE_BYTES));
        }
        if shown.len() < bytes.len() {
            let elided = bytes.len() - shown.len();
            self.line(format_args!("... {elided} more bytes"));
        }
    }

    fn marker(&mut self, marker: Marker) {
        self.line(format_args!("{marker}"));
    }
}

fn hex_line(chunk: &[u8]) -> String {
    let mut line = String::with_capacity(chunk.len() * 3);
    for (idx, byte) in chunk.iter().enumerate() {
        if idx > 0 && idx % 2 == 0 {
            line.push(' ');
        }
        let _ = write!(line, "{byte:02x}");
    }
    line
}

/// Lowercase contiguous hex rendering.
pub fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Structured trace event, serialized with an `event` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Enter {
        depth: usize,
        label: String,
    },
    Leave {
        depth: usize,
    },
    Field {
        depth: usize,
        name: String,
        value: String,
    },
    Text {
        depth: usize,
        text: String,
    },
    Hex {
        depth: usize,
        bytes: String,
    },
    Marker {
        depth: usize,
        marker: String,
    },
}

/// Collects [`TraceEvent`]s in emission order.
#[derive(Debug, Default, Clone)]
pub struct EventSink {
    events: Vec<TraceEvent>,
    depth: usize,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Move out everything recorded so far, keeping the current depth.
    pub fn drain(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Sink for EventSink {
    fn enter(&mut self, label: &str) {
        self.events.push(TraceEvent::Enter {
            depth: self.depth,
            label: label.to_string(),
        });
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.events.push(TraceEvent::Leave { depth: self.depth });
    }

    fn field(&mut self, name: &str, value: &dyn Display) {
        self.events.push(TraceEvent::Field {
            depth: self.depth,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn text(&mut self, text: &str) {
        self.events.push(TraceEvent::Text {
            depth: self.depth,
            text: text.to_string(),
        });
    }

    fn hex(&mut self, bytes: &[u8]) {
        self.events.push(TraceEvent::Hex {
            depth: self.depth,
            bytes: hex_string(bytes),
        });
    }

    fn marker(&mut self, marker: Marker) {
        self.events.push(TraceEvent::Marker {
            depth: self.depth,
            marker: marker.to_string(),
        });
    }
}

/// Forwards to an inner sink and counts corrupt-record markers.
pub(crate) struct CountingSink<'s> {
    inner: &'s mut dyn Sink,
    pub(crate) corrupt: usize,
}

impl<'s> CountingSink<'s> {
    pub(crate) fn new(inner: &'s mut dyn Sink) -> Self {
        Self { inner, corrupt: 0 }
    }
}

impl Sink for CountingSink<'_> {
    fn enter(&mut self, label: &str) {
        self.inner.enter(label);
    }

    fn leave(&mut self) {
        self.inner.leave();
    }

    fn field(&mut self, name: &str, value: &dyn Display) {
        self.inner.field(name, value);
    }

    fn text(&mut self, text: &str) {
        self.inner.text(text);
    }

    fn hex(&mut self, bytes: &[u8]) {
        self.inner.hex(bytes);
    }

    fn marker(&mut self, marker: Marker) {
        if matches!(marker, Marker::Corrupt(_)) {
            self.corrupt += 1;
        }
        self.inner.marker(marker);
    }
}

#[cfg(test)]
mod tests {
    use super::{EventSink, Marker, Sink, TextSink, TraceEvent, scoped};

    #[test]
    fn text_sink_indents_nested_scopes() {
        let mut sink = TextSink::new();
        scoped(&mut sink, "outer", |sink| {
            sink.field("a", &1);
            scoped(sink, "inner", |sink| sink.marker(Marker::Truncated));
        });
        sink.text("done");
        assert_eq!(
            sink.as_str(),
            "outer\n  a: 1\n  inner\n    [|truncated]\ndone\n"
        );
    }

    #[test]
    fn text_sink_hex_dump_groups_and_limits() {
        let bytes: Vec<u8> = (0u8..20).collect();
        let mut sink = TextSink::with_hex_limit(Some(18));
        sink.hex(&bytes);
        let lines: Vec<&str> = sink.as_str().lines().collect();
        assert_eq!(
            lines[0],
            "0x0000:  0001 0203 0405 0607 0809 0a0b 0c0d 0e0f"
        );
        assert_eq!(lines[1], "0x0010:  1011");
        assert_eq!(lines[2], "... 2 more bytes");
    }

    #[test]
    fn marker_rendering_is_distinguishable() {
        assert_eq!(Marker::Truncated.to_string(), "[|truncated]");
        assert_eq!(
            Marker::Corrupt("bad length").to_string(),
            "[corrupt: bad length]"
        );
        assert_eq!(Marker::Trailing(3).to_string(), "[3 trailing bytes]");
    }

    #[test]
    fn event_sink_records_depth() {
        let mut sink = EventSink::new();
        sink.enter("top");
        sink.hex(&[0xde, 0xad]);
        sink.leave();
        let events = sink.into_events();
        assert_eq!(
            events,
            vec![
                TraceEvent::Enter {
                    depth: 0,
                    label: "top".to_string()
                },
                TraceEvent::Hex {
                    depth: 1,
                    bytes: "dead".to_string()
                },
                TraceEvent::Leave { depth: 0 },
            ]
        );
        let json = serde_json::to_value(&events[1]).unwrap();
        assert_eq!(json["event"], "hex");
    }
}
