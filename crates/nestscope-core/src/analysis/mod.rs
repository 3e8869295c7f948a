//! Capture-level driver: read packets, strip link headers, decode payloads.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::link::demux;
use crate::sink::scoped;
use crate::source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
use crate::{DecodeContext, DecodeOutcome, Decoded, Sink, decode, decode_stream};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Per-capture tallies.
///
/// `decoded`, `truncated` and `malformed` count messages, which may exceed
/// the number of packets when a payload pipelines several of them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpSummary {
    pub packets: u64,
    pub decoded: u64,
    pub truncated: u64,
    pub malformed: u64,
    pub corrupt_records: u64,
    /// Packets with no decodable payload or an unreadable link header.
    pub skipped: u64,
    /// IS-IS hostnames known to the context once the dump ends.
    pub hostnames: u64,
}

impl DumpSummary {
    fn add(&mut self, decoded: &Decoded) {
        match decoded.outcome {
            DecodeOutcome::Consumed(_) => self.decoded += 1,
            DecodeOutcome::Truncated => self.truncated += 1,
            DecodeOutcome::Malformed => self.malformed += 1,
        }
        self.corrupt_records += decoded.corrupt_records as u64;
    }
}

pub fn dump_pcap_file(
    path: &Path,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<DumpSummary, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    dump_source(source, ctx, sink)
}

/// Decode every packet of `source` into `sink`, one scope per packet.
///
/// Only source errors abort the dump. Packets that cannot be decoded are
/// counted and reported through the sink.
pub fn dump_source<S: PacketSource>(
    mut source: S,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<DumpSummary, AnalysisError> {
    let mut summary = DumpSummary::default();

    while let Some(event) = source.next_packet()? {
        summary.packets += 1;
        let label = packet_label(summary.packets, &event);
        scoped(sink, &label, |sink| {
            dump_packet(&event, summary.packets, ctx, sink, &mut summary)
        });
    }
    summary.hostnames = ctx.hostnames.len() as u64;

    log::info!(
        "dumped {} packets: {} decoded, {} truncated, {} malformed, {} skipped, {} hostnames",
        summary.packets,
        summary.decoded,
        summary.truncated,
        summary.malformed,
        summary.skipped,
        summary.hostnames
    );
    Ok(summary)
}

fn dump_packet(
    event: &PacketEvent,
    index: u64,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
    summary: &mut DumpSummary,
) {
    let payload = match demux(event.linktype, &event.captured, event.original_len) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            log::debug!("packet {index}: no decoder for linktype {}", event.linktype.0);
            sink.text("not decoded");
            summary.skipped += 1;
            return;
        }
        Err(err) => {
            log::debug!("packet {index}: {err}");
            sink.text(&format!("link error: {err}"));
            summary.skipped += 1;
            return;
        }
    };

    if let Some(endpoints) = &payload.endpoints {
        sink.text(endpoints);
    }
    let captured = payload.payload.len();
    if payload.tag.is_pipelined() {
        let messages = decode_stream(
            payload.payload,
            captured,
            payload.claimed_len,
            payload.tag,
            ctx,
            sink,
        );
        for decoded in &messages {
            summary.add(decoded);
        }
    } else {
        let decoded = decode(
            payload.payload,
            captured,
            payload.claimed_len,
            payload.tag,
            ctx,
            sink,
        );
        summary.add(&decoded);
    }
}

fn packet_label(index: u64, event: &PacketEvent) -> String {
    let ts = ts_to_rfc3339(event.ts).unwrap_or_else(|| "no timestamp".to_string());
    format!(
        "packet {index}, {ts}, length {}/{}",
        event.captured.len(),
        event.original_len
    )
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use pcap_parser::Linktype;

    use super::{DumpSummary, dump_source, ts_to_rfc3339};
    use crate::source::{PacketEvent, PacketSource, SourceError};
    use crate::{DecodeContext, TextSink};

    struct VecSource(VecDeque<PacketEvent>);

    impl PacketSource for VecSource {
        fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
            Ok(self.0.pop_front())
        }
    }

    fn event(linktype: Linktype, captured: Vec<u8>) -> PacketEvent {
        let original_len = captured.len();
        PacketEvent {
            ts: Some(0.0),
            linktype,
            captured,
            original_len,
        }
    }

    #[test]
    fn dumps_each_packet_in_its_own_scope() {
        // 802.15.4 ack, no FCS, sequence 0x2a.
        let ack = event(Linktype(230), vec![0x02, 0x00, 0x2a]);
        let other = event(Linktype(147), vec![0; 4]);
        let source = VecSource(VecDeque::from(vec![ack, other]));

        let mut ctx = DecodeContext::default();
        let mut sink = TextSink::new();
        let summary = dump_source(source, &mut ctx, &mut sink).unwrap();

        assert_eq!(
            summary,
            DumpSummary {
                packets: 2,
                decoded: 1,
                skipped: 1,
                ..DumpSummary::default()
            }
        );
        let text = sink.as_str();
        assert!(text.starts_with("packet 1, 1970-01-01T00:00:00Z, length 3/3\n"));
        assert!(text.contains("packet 2, 1970-01-01T00:00:00Z, length 4/4\n  not decoded\n"));
    }

    #[test]
    fn truncated_packet_is_counted() {
        let ack = event(Linktype(230), vec![0x02, 0x00]);
        let source = VecSource(VecDeque::from(vec![ack]));
        let mut ctx = DecodeContext::default();
        let mut sink = TextSink::new();
        let summary = dump_source(source, &mut ctx, &mut sink).unwrap();
        assert_eq!(summary.truncated, 1);
        assert!(sink.as_str().contains("[|truncated]"));
    }

    #[test]
    fn summary_reports_hostnames_held_by_context() {
        let source = VecSource(VecDeque::new());
        let mut ctx = DecodeContext::default();
        ctx.hostnames.learn([0x19, 0x21, 0x68, 0x00, 0x10, 0x01], "core-1");
        let mut sink = TextSink::new();
        let summary = dump_source(source, &mut ctx, &mut sink).unwrap();
        assert_eq!(summary.packets, 0);
        assert_eq!(summary.hostnames, 1);
    }

    #[test]
    fn ts_formats_as_rfc3339() {
        assert_eq!(
            ts_to_rfc3339(Some(1.5)).as_deref(),
            Some("1970-01-01T00:00:01.5Z")
        );
        assert_eq!(ts_to_rfc3339(None), None);
    }
}
