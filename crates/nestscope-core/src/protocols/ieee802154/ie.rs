//! Information Elements of 2015-revision frames.
//!
//! Header IEs, payload IEs and MLME sub-IEs each pack their type and length
//! into one little-endian word, so each gets its own record format.

use super::layout;
use crate::context::DecodeContext;
use crate::protocols::common::reader::flag_names;
use crate::sink::{Sink, scoped};
use crate::wire::{
    Cursor, DecodeError, DispatchTable, Entry, Flow, RecordFormat, RecordHead, Records,
    WalkSummary, opaque, sign_extend, uint_from_le, walk, walk_until,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIeFormat;

impl RecordFormat for HeaderIeFormat {
    fn header_len(&self) -> usize {
        layout::IE_HEADER_LEN
    }

    fn decode_header(&self, header: &[u8]) -> Result<RecordHead, &'static str> {
        let word = uint_from_le(header) as u16;
        if word & layout::IE_TYPE_PAYLOAD != 0 {
            return Err("payload IE inside header IE list");
        }
        Ok(RecordHead {
            type_code: u32::from((word >> layout::HIE_ID_SHIFT) & layout::HIE_ID_MASK),
            declared_length: usize::from(word & layout::HIE_LENGTH_MASK),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadIeFormat;

impl RecordFormat for PayloadIeFormat {
    fn header_len(&self) -> usize {
        layout::IE_HEADER_LEN
    }

    fn decode_header(&self, header: &[u8]) -> Result<RecordHead, &'static str> {
        let word = uint_from_le(header) as u16;
        if word & layout::IE_TYPE_PAYLOAD == 0 {
            return Err("header IE inside payload IE list");
        }
        Ok(RecordHead {
            type_code: u32::from((word >> layout::PIE_GROUP_SHIFT) & layout::PIE_GROUP_MASK),
            declared_length: usize::from(word & layout::PIE_LENGTH_MASK),
        })
    }
}

/// MLME sub-IE: a short form with a 7-bit id and 8-bit length, or a long
/// form with a 4-bit id and 11-bit length. Long ids are reported with
/// [`layout::SUB_IE_LONG_NAMESPACE`] set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlmeSubIeFormat;

impl RecordFormat for MlmeSubIeFormat {
    fn header_len(&self) -> usize {
        layout::IE_HEADER_LEN
    }

    fn decode_header(&self, header: &[u8]) -> Result<RecordHead, &'static str> {
        let word = uint_from_le(header) as u16;
        let head = if word & layout::SUB_IE_LONG == 0 {
            RecordHead {
                type_code: u32::from(
                    (word >> layout::SUB_IE_SHORT_ID_SHIFT) & layout::SUB_IE_SHORT_ID_MASK,
                ),
                declared_length: usize::from(word & layout::SUB_IE_SHORT_LENGTH_MASK),
            }
        } else {
            RecordHead {
                type_code: layout::SUB_IE_LONG_NAMESPACE
                    | u32::from((word >> layout::SUB_IE_LONG_ID_SHIFT) & layout::SUB_IE_LONG_ID_MASK),
                declared_length: usize::from(word & layout::SUB_IE_LONG_LENGTH_MASK),
            }
        };
        Ok(head)
    }
}

pub(super) static HEADER_IES: DispatchTable<DecodeContext> = DispatchTable::new(
    "802.15.4-header-ie",
    &[
        Entry::decoded(layout::HIE_VENDOR, "Vendor Specific Header IE", vendor_specific),
        Entry::decoded(layout::HIE_CSL, "CSL IE", csl),
        Entry::decoded(layout::HIE_RIT, "RIT IE", rit),
        Entry::decoded(layout::HIE_RENDEZVOUS, "Rendezvous Time IE", rendezvous_time),
        Entry::decoded(layout::HIE_TIME_CORRECTION, "Time Correction IE", time_correction),
        Entry::decoded(layout::HIE_TERMINATION_1, "Header Termination 1 IE", termination),
        Entry::decoded(layout::HIE_TERMINATION_2, "Header Termination 2 IE", termination),
    ],
);

pub(super) static PAYLOAD_IES: DispatchTable<DecodeContext> = DispatchTable::new(
    "802.15.4-payload-ie",
    &[
        Entry::named(layout::PIE_ESDU, "ESDU IE"),
        Entry::decoded(layout::PIE_MLME, "MLME IE", mlme),
        Entry::decoded(layout::PIE_VENDOR, "Vendor Specific Nested IE", vendor_specific),
        Entry::decoded(layout::PIE_MPX, "MPX IE", mpx),
        Entry::decoded(layout::PIE_TERMINATION, "Payload Termination IE", termination),
    ],
);

pub(super) static MLME_SUB_IES: DispatchTable<DecodeContext> = DispatchTable::new(
    "802.15.4-mlme",
    &[
        Entry::decoded(layout::MLME_TSCH_SYNC, "TSCH Synchronization IE", tsch_sync),
        Entry::decoded(
            layout::MLME_TSCH_SLOTFRAME_LINK,
            "TSCH Slotframe and Link IE",
            tsch_slotframe_link,
        ),
        Entry::decoded(layout::MLME_TSCH_TIMESLOT, "TSCH Timeslot IE", tsch_timeslot),
        Entry::named(layout::MLME_HOPPING_TIMING, "Hopping Timing IE"),
        Entry::named(layout::MLME_EB_FILTER, "Enhanced Beacon Filter IE"),
        Entry::decoded(layout::MLME_CHANNEL_HOPPING, "Channel Hopping IE", channel_hopping),
    ],
);

const LINK_OPTIONS: &[(u32, &str)] = &[
    (0x01, "tx"),
    (0x02, "rx"),
    (0x04, "shared"),
    (0x08, "timekeeping"),
    (0x10, "priority"),
];

const TIMESLOT_FIELDS: &[&str] = &[
    "cca offset",
    "cca",
    "tx offset",
    "rx offset",
    "rx ack delay",
    "tx ack delay",
    "rx wait",
    "ack wait",
    "rx/tx",
    "max ack",
];

/// Walk the header IE list at the start of `body`.
///
/// The walk stops after either header termination IE and leaves `body`
/// just past it. Returns whether payload IEs follow (termination 1).
pub(super) fn header_ies(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<bool, DecodeError> {
    let mut records = Records::new(*body, HeaderIeFormat);
    let mut terminator = None;
    scoped(sink, "Header IEs", |sink| {
        walk_until(&mut records, sink, |record, sink| {
            let code = record.type_code;
            HEADER_IES.dispatch(record, ctx, sink)?;
            if code == layout::HIE_TERMINATION_1 || code == layout::HIE_TERMINATION_2 {
                terminator = Some(code);
                Ok(Flow::Stop)
            } else {
                Ok(Flow::Continue)
            }
        })
    })?;
    *body = records.remaining();
    Ok(terminator == Some(layout::HIE_TERMINATION_1))
}

/// Walk the payload IE list; `body` is left at the frame payload.
pub(super) fn payload_ies(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<WalkSummary, DecodeError> {
    let mut records = Records::new(*body, PayloadIeFormat);
    let summary = scoped(sink, "Payload IEs", |sink| {
        walk_until(&mut records, sink, |record, sink| {
            let code = record.type_code;
            PAYLOAD_IES.dispatch(record, ctx, sink)?;
            Ok(if code == layout::PIE_TERMINATION {
                Flow::Stop
            } else {
                Flow::Continue
            })
        })
    })?;
    *body = records.remaining();
    Ok(summary)
}

fn vendor_specific(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let oui = body.read_u24_le()?;
    sink.field("oui", &format!("0x{oui:06x}"));
    opaque(body, sink)
}

fn csl(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let with_rendezvous = match body.remaining_claimed() {
        4 => false,
        6 => true,
        _ => {
            return Err(DecodeError::malformed(
                body.offset(),
                "CSL IE length is neither 4 nor 6",
            ));
        }
    };
    sink.field("phase", &body.read_u16_le()?);
    sink.field("period", &body.read_u16_le()?);
    if with_rendezvous {
        sink.field("rendezvous time", &body.read_u16_le()?);
    }
    Ok(())
}

fn rit(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(4, "RIT IE length is not 4")?;
    sink.field("time to first listen", &body.read_u8()?);
    sink.field("repeat listens", &body.read_u8()?);
    sink.field("repeat listen interval", &body.read_u16_le()?);
    Ok(())
}

fn rendezvous_time(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let with_interval = match body.remaining_claimed() {
        2 => false,
        4 => true,
        _ => {
            return Err(DecodeError::malformed(
                body.offset(),
                "rendezvous time IE length is neither 2 nor 4",
            ));
        }
    };
    sink.field("rendezvous time", &body.read_u16_le()?);
    if with_interval {
        sink.field("wake-up interval", &body.read_u16_le()?);
    }
    Ok(())
}

fn time_correction(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(2, "time correction IE length is not 2")?;
    let word = body.read_u16_le()?;
    let correction = sign_extend(
        u64::from(word & layout::TIME_CORRECTION_MASK),
        layout::TIME_CORRECTION_BITS,
    );
    sink.field("time correction", &format!("{correction} us"));
    if word & layout::TIME_CORRECTION_NACK != 0 {
        sink.text("nack");
    }
    Ok(())
}

fn termination(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    _sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(0, "termination IE carries content")
}

fn mlme(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let nested = body.take_cursor(body.remaining_claimed())?;
    walk(Records::new(nested, MlmeSubIeFormat), sink, |record, sink| {
        MLME_SUB_IES.dispatch(record, ctx, sink)
    })?;
    Ok(())
}

fn mpx(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let control = body.read_u8()?;
    sink.field("transfer type", &(control & 0x07));
    sink.field("transaction id", &(control >> 3));
    opaque(body, sink)
}

fn tsch_sync(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(6, "TSCH synchronization IE length is not 6")?;
    sink.field("ASN", &body.read_u40_le()?);
    sink.field("join metric", &body.read_u8()?);
    Ok(())
}

fn tsch_slotframe_link(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let slotframes = body.read_u8()?;
    sink.field("slotframes", &slotframes);
    for _ in 0..slotframes {
        let handle = body.read_u8()?;
        let size = body.read_u16_le()?;
        let links = body.read_u8()?;
        let mut descriptors = body.take_cursor(usize::from(links) * layout::TSCH_LINK_LEN)?;
        let label = format!("slotframe {handle}, size {size}, {links} links");
        scoped(sink, &label, |sink| {
            while !descriptors.is_empty() {
                let timeslot = descriptors.read_u16_le()?;
                let channel_offset = descriptors.read_u16_le()?;
                let options = descriptors.read_u8()?;
                sink.text(&format!(
                    "timeslot {timeslot}, channel offset {channel_offset}, options: {}",
                    flag_names(u32::from(options), LINK_OPTIONS)
                ));
            }
            Ok(())
        })?;
    }
    Ok(())
}

fn tsch_timeslot(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let wide_fields = match body.remaining_claimed() {
        1 => None,
        25 => Some(false),
        27 => Some(true),
        _ => {
            return Err(DecodeError::malformed(
                body.offset(),
                "TSCH timeslot IE length is not 1, 25 or 27",
            ));
        }
    };
    sink.field("timeslot id", &body.read_u8()?);
    let Some(wide) = wide_fields else {
        return Ok(());
    };
    for name in TIMESLOT_FIELDS {
        sink.field(name, &body.read_u16_le()?);
    }
    let width = if wide { 3 } else { 2 };
    sink.field("max tx", &body.read_uint_le(width)?);
    sink.field("timeslot length", &body.read_uint_le(width)?);
    Ok(())
}

fn channel_hopping(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    sink.field("hopping sequence id", &body.read_u8()?);
    opaque(body, sink)
}

#[cfg(test)]
mod tests {
    use super::{HEADER_IES, MLME_SUB_IES, PAYLOAD_IES, header_ies, payload_ies};
    use crate::context::DecodeContext;
    use crate::sink::TextSink;
    use crate::wire::Cursor;

    #[test]
    fn tables_are_sorted() {
        assert!(HEADER_IES.is_sorted());
        assert!(PAYLOAD_IES.is_sorted());
        assert!(MLME_SUB_IES.is_sorted());
    }

    #[test]
    fn header_list_stops_at_termination() {
        // Time correction (id 0x1e, length 2): -5 us, then HT1, then payload.
        let data = [0x02, 0x0f, 0xfb, 0x8f, 0x00, 0x3f, 0xaa];
        let mut body = Cursor::from_slice(&data);
        let mut ctx = DecodeContext::default();
        let mut sink = TextSink::new();
        let payload_follows = header_ies(&mut body, &mut ctx, &mut sink).unwrap();
        let text = sink.into_string();
        assert!(payload_follows);
        assert_eq!(body.offset(), 6);
        assert!(text.contains("Time Correction IE (30), length 2"));
        assert!(text.contains("time correction: -5 us"));
        assert!(text.contains("nack"));
        assert!(text.contains("Header Termination 1 IE (126), length 0"));
    }

    #[test]
    fn mlme_nesting_reaches_tsch_sync() {
        // Payload IE group 1 (MLME), length 8, holding a TSCH sync sub-IE.
        let data = [
            0x08, 0x88, 0x06, 0x1a, 0x05, 0x04, 0x03, 0x02, 0x01, 0x07,
        ];
        let mut body = Cursor::from_slice(&data);
        let mut ctx = DecodeContext::default();
        let mut sink = TextSink::new();
        let summary = payload_ies(&mut body, &mut ctx, &mut sink).unwrap();
        let text = sink.into_string();
        assert_eq!(summary.records, 1);
        assert!(body.is_empty());
        assert!(text.contains("MLME IE (1), length 8"));
        assert!(text.contains("TSCH Synchronization IE (26), length 6"));
        assert!(text.contains("ASN: 4328719365"));
        assert!(text.contains("join metric: 7"));
    }

    #[test]
    fn slotframe_links_stay_inside_sub_ie() {
        // One slotframe claiming two links but carrying only one.
        let data = [
            0x0c, 0x88, 0x0a, 0x1b, 0x01, 0x00, 0x65, 0x00, 0x02, 0x01, 0x00, 0x02, 0x00, 0x03,
        ];
        let mut body = Cursor::from_slice(&data);
        let mut ctx = DecodeContext::default();
        let mut sink = TextSink::new();
        payload_ies(&mut body, &mut ctx, &mut sink).unwrap();
        let text = sink.into_string();
        assert!(text.contains("TSCH Slotframe and Link IE (27), length 10"));
        assert!(text.contains("[corrupt: nested length exceeds envelope]"));
    }

    #[test]
    fn long_sub_ie_uses_its_own_namespace() {
        // Long sub-IE id 9 (channel hopping), length 1.
        let data = [0x03, 0x88, 0x01, 0xc8, 0x04];
        let mut body = Cursor::from_slice(&data);
        let mut ctx = DecodeContext::default();
        let mut sink = TextSink::new();
        payload_ies(&mut body, &mut ctx, &mut sink).unwrap();
        let text = sink.into_string();
        assert!(text.contains("Channel Hopping IE (265), length 1"));
        assert!(text.contains("hopping sequence id: 4"));
    }

    #[test]
    fn payload_ie_in_header_list_is_malformed() {
        let data = [0x00, 0x88];
        let mut body = Cursor::from_slice(&data);
        let mut ctx = DecodeContext::default();
        let mut sink = TextSink::new();
        let err = header_ies(&mut body, &mut ctx, &mut sink).unwrap_err();
        assert!(err.is_malformed());
    }
}
