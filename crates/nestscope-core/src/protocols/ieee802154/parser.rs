use std::fmt;

use super::ie::{header_ies, payload_ies};
use super::layout;
use super::reader::{
    Address, AuxSecurity, FRAME_TYPES, FrameControl, pan_id_presence, read_address,
    read_aux_security,
};
use crate::context::DecodeContext;
use crate::protocols::common::reader::{code_name, flag_names};
use crate::sink::{Sink, hex_string, scoped};
use crate::wire::{Crc16Kermit, Cursor, DecodeError, opaque};

const VERSIONS: [&str; 4] = ["2003", "2006", "2015", "reserved"];

const COMMANDS: &[(u32, &str)] = &[
    (0x01, "Association Request"),
    (0x02, "Association Response"),
    (0x03, "Disassociation Notification"),
    (0x04, "Data Request"),
    (0x05, "PAN ID Conflict Notification"),
    (0x06, "Orphan Notification"),
    (0x07, "Beacon Request"),
    (0x08, "Coordinator Realignment"),
    (0x09, "GTS Request"),
    (0x0a, "TRLE Management Request"),
    (0x0b, "TRLE Management Response"),
    (0x13, "DSME Association Request"),
    (0x14, "DSME Association Response"),
    (0x1b, "Beacon Notification"),
    (0x2b, "LE-RIT Data Request"),
];

const CAPABILITIES: &[(u32, &str)] = &[
    (0x01, "alternate PAN coordinator"),
    (0x02, "FFD"),
    (0x04, "mains powered"),
    (0x08, "receiver on when idle"),
    (0x10, "fast association"),
    (0x40, "security"),
    (0x80, "allocate address"),
];

const ASSOCIATION_STATUS: &[(u32, &str)] = &[
    (0x00, "successful"),
    (0x01, "PAN at capacity"),
    (0x02, "PAN access denied"),
    (0x03, "hopping sequence offset duplication"),
    (0x80, "fast association successful"),
];

const DISASSOCIATION_REASONS: &[(u32, &str)] = &[
    (0x01, "coordinator wishes device to leave"),
    (0x02, "device wishes to leave"),
];

const SUPERFRAME_FLAGS: &[(u32, &str)] = &[
    (layout::SF_BATTERY_EXTENSION as u32, "battery life extension"),
    (layout::SF_PAN_COORDINATOR as u32, "PAN coordinator"),
    (layout::SF_ASSOCIATION_PERMIT as u32, "association permit"),
];

/// Outcome of the frame check sequence comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcsCheck {
    Correct(u16),
    Incorrect { stored: u16, computed: u16 },
    /// Verification disabled, or the FCS was not captured.
    Unverified(Option<u16>),
}

impl fmt::Display for FcsCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FcsCheck::Correct(value) => write!(f, "0x{value:04x} (correct)"),
            FcsCheck::Incorrect { stored, computed } => {
                write!(f, "0x{stored:04x} (incorrect, computed 0x{computed:04x})")
            }
            FcsCheck::Unverified(Some(value)) => write!(f, "0x{value:04x} (unverified)"),
            FcsCheck::Unverified(None) => f.write_str("not captured (unverified)"),
        }
    }
}

/// CRC over the raw frame bytes, independent of how the fields decode.
pub fn check_fcs(frame: &Cursor<'_>, ctx: &DecodeContext) -> FcsCheck {
    let covered = frame.remaining_claimed().saturating_sub(layout::FCS_LEN);
    let stored = frame
        .advance(covered)
        .and_then(|mut trailer| trailer.read_u16_le());
    let Ok(stored) = stored else {
        return FcsCheck::Unverified(None);
    };
    if !ctx.options.verify_checksums {
        return FcsCheck::Unverified(Some(stored));
    }
    let Some(bytes) = frame.captured_rest().get(..covered) else {
        return FcsCheck::Unverified(Some(stored));
    };
    let computed = Crc16Kermit::checksum(bytes);
    if computed == stored {
        FcsCheck::Correct(stored)
    } else {
        log::debug!("802.15.4 FCS mismatch: stored 0x{stored:04x}, computed 0x{computed:04x}");
        FcsCheck::Incorrect { stored, computed }
    }
}

/// Decode one MAC frame occupying every claimed byte of `cursor`.
///
/// With `has_fcs` the last two bytes are the frame check sequence; it is
/// reported even when the fields before it fail to decode.
pub fn decode_frame(
    cursor: &mut Cursor<'_>,
    has_fcs: bool,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let frame_len = cursor.remaining_claimed();
    let fcs_len = if has_fcs { layout::FCS_LEN } else { 0 };
    if frame_len < layout::FRAME_CONTROL_LEN + fcs_len {
        return Err(DecodeError::malformed(
            cursor.offset(),
            "frame shorter than its frame control",
        ));
    }
    let fcs = has_fcs.then(|| check_fcs(cursor, ctx));
    let mut frame = cursor.sub_cursor(frame_len - fcs_len)?;
    let fc = FrameControl(frame.read_u16_le()?);
    let label = format!(
        "IEEE 802.15.4 {} frame ({}), length {frame_len}",
        code_name(FRAME_TYPES, u32::from(fc.frame_type())),
        VERSIONS[usize::from(fc.version())],
    );
    let result = scoped(sink, &label, |sink| {
        let result = decode_mac(fc, &mut frame, ctx, sink);
        if let Some(fcs) = fcs {
            sink.field("fcs", &fcs);
        }
        result
    });
    *cursor = cursor.advance(frame_len)?;
    result
}

fn decode_mac(
    fc: FrameControl,
    frame: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    sink.field("frame control", &format!("0x{:04x} ({})", fc.0, fc.flags()));
    if fc.frame_type() > layout::FRAME_COMMAND {
        sink.text("frame layout not decoded");
        return opaque(frame, sink);
    }
    if fc.version() == layout::VERSION_RESERVED {
        return Err(DecodeError::malformed(frame.offset(), "reserved frame version"));
    }
    if !fc.sequence_suppressed() {
        sink.field("seq", &frame.read_u8()?);
    }
    let (dst_pan, src_pan) = pan_id_presence(fc, frame.offset())?;
    if dst_pan {
        sink.field("dst pan", &Address::Short(frame.read_u16_le()?));
    }
    if let Some(dst) = read_address(frame, fc.dst_mode())? {
        sink.field("dst", &dst);
    }
    if src_pan {
        sink.field("src pan", &Address::Short(frame.read_u16_le()?));
    }
    if let Some(src) = read_address(frame, fc.src_mode())? {
        sink.field("src", &src);
    }

    let security = if fc.security_enabled() {
        let aux = read_aux_security(frame, fc)?;
        scoped(sink, "Auxiliary security header", |sink| {
            print_aux_security(&aux, sink);
        });
        Some(aux)
    } else {
        None
    };
    let mic_len = security.map_or(0, |aux| aux.mic_len());
    let body_len = frame
        .remaining_claimed()
        .checked_sub(mic_len)
        .ok_or_else(|| DecodeError::malformed(frame.offset(), "frame shorter than its MIC"))?;
    let mut body = frame.take_cursor(body_len)?;

    let payload_ies_follow = if fc.ie_present() {
        header_ies(&mut body, ctx, sink)?
    } else {
        false
    };
    match security {
        // Payload IEs and payload are ciphertext; nothing past the header
        // IEs can be decoded.
        Some(aux) if aux.encrypted() => {
            sink.field(
                "encrypted payload",
                &format!("{} bytes", body.remaining_claimed()),
            );
            opaque(&mut body, sink)?;
        }
        _ => {
            if payload_ies_follow {
                payload_ies(&mut body, ctx, sink)?;
            }
            frame_body(fc, &mut body, sink)?;
        }
    }
    if mic_len > 0 {
        sink.field("MIC", &hex_string(frame.take(mic_len)?));
    }
    Ok(())
}

fn print_aux_security(aux: &AuxSecurity, sink: &mut dyn Sink) {
    sink.field("level", &aux.level_name());
    sink.field("key id mode", &aux.key_id_mode);
    if let Some(counter) = aux.frame_counter {
        sink.field("frame counter", &counter);
    }
    if let Some(source) = aux.key_source {
        sink.field("key source", &format!("0x{source:x}"));
    }
    if let Some(index) = aux.key_index {
        sink.field("key index", &index);
    }
}

fn frame_body(
    fc: FrameControl,
    body: &mut Cursor<'_>,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    match fc.frame_type() {
        // Enhanced beacons carry everything in IEs.
        layout::FRAME_BEACON if fc.version() == layout::VERSION_2015 => payload(body, sink),
        layout::FRAME_BEACON => beacon(body, sink),
        layout::FRAME_COMMAND => command(body, sink),
        _ => payload(body, sink),
    }
}

fn payload(body: &mut Cursor<'_>, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    if body.is_empty() {
        return Ok(());
    }
    sink.field("payload", &format!("{} bytes", body.remaining_claimed()));
    opaque(body, sink)
}

fn beacon(body: &mut Cursor<'_>, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    let superframe = body.read_u16_le()?;
    scoped(sink, "Superframe", |sink| {
        sink.field("beacon order", &(superframe & layout::SF_BEACON_ORDER_MASK));
        sink.field(
            "superframe order",
            &((superframe >> layout::SF_SUPERFRAME_ORDER_SHIFT) & layout::SF_NIBBLE_MASK),
        );
        sink.field(
            "final CAP slot",
            &((superframe >> layout::SF_FINAL_CAP_SHIFT) & layout::SF_NIBBLE_MASK),
        );
        sink.field(
            "flags",
            &flag_names(u32::from(superframe), SUPERFRAME_FLAGS),
        );
    });

    let gts = body.read_u8()?;
    let descriptors = gts & layout::GTS_COUNT_MASK;
    sink.field("GTS descriptors", &descriptors);
    if gts & layout::GTS_PERMIT != 0 {
        sink.text("GTS permit");
    }
    if descriptors > 0 {
        let directions = body.read_u8()?;
        for index in 0..descriptors {
            let device = Address::Short(body.read_u16_le()?);
            let slot = body.read_u8()?;
            let direction = if (directions >> index) & 1 != 0 {
                "receive"
            } else {
                "transmit"
            };
            sink.text(&format!(
                "GTS {device}: start slot {}, length {}, {direction}",
                slot & 0x0f,
                slot >> 4
            ));
        }
    }

    let pending = body.read_u8()?;
    for _ in 0..(pending & layout::PENDING_SHORT_MASK) {
        sink.field("pending", &Address::Short(body.read_u16_le()?));
    }
    for _ in 0..((pending >> layout::PENDING_EXT_SHIFT) & layout::PENDING_SHORT_MASK) {
        sink.field("pending", &Address::Extended(body.read_u64_le()?));
    }
    payload(body, sink)
}

fn command(body: &mut Cursor<'_>, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    let id = body.read_u8()?;
    sink.field(
        "command",
        &format!("{} ({id})", code_name(COMMANDS, u32::from(id))),
    );
    match id {
        layout::CMD_ASSOCIATION_REQUEST => {
            let capability = body.read_u8()?;
            sink.field(
                "capability",
                &flag_names(u32::from(capability), CAPABILITIES),
            );
        }
        layout::CMD_ASSOCIATION_RESPONSE => {
            sink.field("short address", &Address::Short(body.read_u16_le()?));
            let status = body.read_u8()?;
            sink.field("status", &code_name(ASSOCIATION_STATUS, u32::from(status)));
        }
        layout::CMD_DISASSOCIATION => {
            let reason = body.read_u8()?;
            sink.field(
                "reason",
                &code_name(DISASSOCIATION_REASONS, u32::from(reason)),
            );
        }
        _ => {}
    }
    payload(body, sink)
}
