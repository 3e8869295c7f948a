//! NestScope core library: nested dissection of captured protocol messages.
//!
//! One captured message is handed over as `(buffer, captured_len,
//! claimed_len)` together with a [`ProtocolTag`]. Every byte access goes
//! through a bounded [`wire::Cursor`]; records inside the message are walked
//! by [`wire::Records`] and decoded through per-namespace
//! [`wire::DispatchTable`]s, which may open further cursors over their own
//! bodies. Output is written to a [`Sink`] as a side effect and the call
//! reports how the message ended.
//!
//! Invariants:
//! - No byte past the captured length is ever read, whatever the wire says.
//! - A nested length may never reach past its container; such lengths are
//!   `Malformed` before any byte of the child is read.
//! - Every walk consumes at least one header per step, so decoding a
//!   message of `L` claimed bytes takes at most `L` steps.
//! - Cross-message state (learned hostnames, options) lives in a
//!   caller-owned [`DecodeContext`]; there is no global mutable state.
//!
//! Capture files are read by [`PcapFileSource`], link headers are peeled off
//! by [`demux`], and [`dump_source`] drives the whole pipeline.
//!
//! # Examples
//! ```
//! use nestscope_core::{DecodeContext, DecodeOutcome, ProtocolTag, TextSink, decode};
//!
//! // RADIUS Access-Request carrying only a User-Name.
//! let mut message = vec![1, 7, 0, 25];
//! message.extend_from_slice(&[0u8; 16]);
//! message.extend_from_slice(&[1, 5, b'b', b'o', b'b']);
//!
//! let mut ctx = DecodeContext::default();
//! let mut sink = TextSink::new();
//! let decoded = decode(&message, message.len(), message.len(), ProtocolTag::Radius, &mut ctx, &mut sink);
//! assert_eq!(decoded.outcome, DecodeOutcome::Consumed(25));
//! assert!(sink.as_str().contains("value: bob"));
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod context;
mod link;
pub mod protocols;
mod sink;
mod source;
pub mod wire;

pub use analysis::{AnalysisError, DumpSummary, dump_pcap_file, dump_source};
pub use context::{DecodeContext, DecodeOptions, HostnameTable, SystemIdBytes};
pub use link::{LinkError, LinkPayload, demux};
pub use sink::{EventSink, Marker, Sink, TextSink, TraceEvent, hex_string, scoped};
pub use source::{PacketEvent, PacketSource, PcapFileSource, SourceError};

use sink::CountingSink;
use wire::{Cursor, DecodeError};

/// Top-level protocol of a message, chosen by the link demultiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolTag {
    Isis,
    /// `fcs` tells whether the frame ends in a two-byte FCS.
    Ieee802154 { fcs: bool },
    Radius,
}

impl ProtocolTag {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolTag::Isis => "isis",
            ProtocolTag::Ieee802154 { .. } => "ieee802154",
            ProtocolTag::Radius => "radius",
        }
    }

    /// Whether several messages may sit back to back in one payload.
    pub fn is_pipelined(&self) -> bool {
        matches!(self, ProtocolTag::Radius)
    }
}

/// How decoding one message ended.
///
/// # Examples
/// ```
/// use nestscope_core::DecodeOutcome;
/// use nestscope_core::wire::DecodeError;
///
/// let outcome = DecodeOutcome::from(Err::<usize, _>(DecodeError::malformed(3, "bad")));
/// assert_eq!(outcome, DecodeOutcome::Malformed);
/// assert_eq!(DecodeOutcome::from(Ok::<_, DecodeError>(12)), DecodeOutcome::Consumed(12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeOutcome {
    /// The message decoded; this many bytes belong to it.
    Consumed(usize),
    /// Captured data ended before a required field.
    Truncated,
    /// A length or structural invariant was violated.
    Malformed,
}

impl From<Result<usize, DecodeError>> for DecodeOutcome {
    fn from(result: Result<usize, DecodeError>) -> Self {
        match result {
            Ok(consumed) => DecodeOutcome::Consumed(consumed),
            Err(DecodeError::Truncated { .. }) => DecodeOutcome::Truncated,
            Err(DecodeError::Malformed { .. }) => DecodeOutcome::Malformed,
        }
    }
}

/// Result of one top-level decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub outcome: DecodeOutcome,
    /// Bytes of the buffer consumed; zero unless the outcome is `Consumed`.
    pub consumed: usize,
    /// Records inside the message that were marked corrupt and skipped.
    pub corrupt_records: usize,
}

/// Decode one top-level message.
///
/// `captured_len` is re-derived as `min(captured_len, claimed_len,
/// buffer.len())`. A failure is also written to `sink` as a marker after
/// whatever was decoded before it.
pub fn decode(
    buffer: &[u8],
    captured_len: usize,
    claimed_len: usize,
    tag: ProtocolTag,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Decoded {
    decode_cursor(Cursor::new(buffer, captured_len, claimed_len), tag, ctx, sink)
}

/// Decode back-to-back messages sharing one buffer.
///
/// Stops after the first message that does not decode, or when a message
/// consumes nothing.
pub fn decode_stream(
    buffer: &[u8],
    captured_len: usize,
    claimed_len: usize,
    tag: ProtocolTag,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Vec<Decoded> {
    let mut cursor = Cursor::new(buffer, captured_len, claimed_len);
    let mut messages = Vec::new();
    while !cursor.is_empty() {
        let decoded = decode_cursor(cursor, tag, ctx, sink);
        messages.push(decoded);
        let DecodeOutcome::Consumed(step) = decoded.outcome else {
            break;
        };
        if step == 0 {
            break;
        }
        match cursor.advance(step) {
            Ok(next) => cursor = next,
            Err(_) => break,
        }
    }
    messages
}

fn decode_cursor(
    cursor: Cursor<'_>,
    tag: ProtocolTag,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Decoded {
    let start = cursor.offset();
    let mut cursor = cursor;
    let mut counting = CountingSink::new(sink);
    let result = match tag {
        ProtocolTag::Isis => protocols::isis::decode_pdu(&mut cursor, ctx, &mut counting),
        ProtocolTag::Ieee802154 { fcs } => {
            protocols::ieee802154::decode_frame(&mut cursor, fcs, ctx, &mut counting)
        }
        ProtocolTag::Radius => protocols::radius::decode_message(&mut cursor, ctx, &mut counting),
    }
    .map(|()| cursor.offset() - start);
    let corrupt_records = counting.corrupt;

    match &result {
        Ok(_) => {}
        Err(err @ DecodeError::Truncated { .. }) => {
            log::debug!("{} message truncated: {err}", tag.name());
            sink.marker(Marker::Truncated);
        }
        Err(err @ DecodeError::Malformed { reason, .. }) => {
            log::debug!("{} message malformed: {err}", tag.name());
            sink.marker(Marker::Corrupt(*reason));
        }
    }
    let consumed = *result.as_ref().unwrap_or(&0);
    Decoded {
        outcome: DecodeOutcome::from(result),
        consumed,
        corrupt_records,
    }
}
