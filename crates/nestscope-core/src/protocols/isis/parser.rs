use super::layout;
use super::reader::{read_lsp_id, read_node_id, read_system_id};
use super::subtlv::walk_tlvs;
use super::tlv::TLVS;
use crate::context::DecodeContext;
use crate::protocols::common::reader::code_name;
use crate::sink::{Sink, scoped};
use crate::wire::{ByteFold, Cursor, DecodeError, Fletcher, Flow, Records, TLV8, WalkEnd, opaque, walk_until};

struct PduKind {
    code: u8,
    name: &'static str,
    header_len: usize,
}

const PDU_KINDS: &[PduKind] = &[
    PduKind {
        code: layout::PDU_L1_LAN_IIH,
        name: "L1 Lan IIH",
        header_len: layout::LAN_IIH_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_L2_LAN_IIH,
        name: "L2 Lan IIH",
        header_len: layout::LAN_IIH_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_P2P_IIH,
        name: "p2p IIH",
        header_len: layout::P2P_IIH_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_L1_LSP,
        name: "L1 LSP",
        header_len: layout::LSP_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_L2_LSP,
        name: "L2 LSP",
        header_len: layout::LSP_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_L1_CSNP,
        name: "L1 CSNP",
        header_len: layout::CSNP_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_L2_CSNP,
        name: "L2 CSNP",
        header_len: layout::CSNP_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_L1_PSNP,
        name: "L1 PSNP",
        header_len: layout::PSNP_HEADER_LEN,
    },
    PduKind {
        code: layout::PDU_L2_PSNP,
        name: "L2 PSNP",
        header_len: layout::PSNP_HEADER_LEN,
    },
];

const CIRCUIT_TYPES: &[(u32, &str)] = &[(1, "L1 only"), (2, "L2 only"), (3, "L1, L2")];

const IS_TYPES: &[(u32, &str)] = &[(1, "L1 IS"), (3, "L1L2 IS")];

/// Fields of an LSP header the checksum check needs after the TLV walk.
struct LspFields {
    lifetime: u16,
    checksum: u16,
}

/// Decode one IS-IS PDU starting at `cursor` and move past it.
///
/// The PDU length field bounds the TLV walk; any claimed bytes after it
/// (link-layer padding) are left unconsumed.
pub fn decode_pdu(
    cursor: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let message = *cursor;
    let irpd = cursor.read_u8()?;
    if irpd != layout::IRPD {
        return Err(DecodeError::malformed(message.offset(), "not an IS-IS PDU"));
    }
    let header_len = usize::from(cursor.read_u8()?);
    let version = cursor.read_u8()?;
    let id_length = cursor.read_u8()?;
    let pdu_type = cursor.read_u8()? & layout::PDU_TYPE_MASK;
    let pdu_version = cursor.read_u8()?;
    let _reserved = cursor.read_u8()?;
    let max_areas = cursor.read_u8()?;

    if version != layout::VERSION || pdu_version != layout::VERSION {
        return Err(DecodeError::malformed(message.offset(), "unsupported IS-IS version"));
    }
    if id_length != 0 && usize::from(id_length) != layout::SYSTEM_ID_LEN {
        return Err(DecodeError::malformed(
            message.offset(),
            "unsupported system id length",
        ));
    }

    let Some(kind) = PDU_KINDS.iter().find(|kind| kind.code == pdu_type) else {
        log::debug!("IS-IS PDU type {pdu_type} not decoded");
        return scoped(sink, &format!("IS-IS, unknown PDU type {pdu_type}"), |sink| {
            opaque(cursor, sink)
        });
    };
    if header_len != kind.header_len {
        return Err(DecodeError::malformed(
            message.offset() + 1,
            "header length indicator mismatch",
        ));
    }

    let label = format!("IS-IS, {} ({pdu_type}), hlen: {header_len}", kind.name);
    ctx.origin = None;
    let result = scoped(sink, &label, |sink| {
        let max_areas = if max_areas == 0 { 3 } else { max_areas };
        sink.field("max-area", &max_areas);
        let (pdu_length, lsp) = fixed_header(pdu_type, cursor, ctx, sink)?;
        if pdu_length < kind.header_len || pdu_length > message.remaining_claimed() {
            return Err(DecodeError::malformed(
                message.offset(),
                "PDU length out of range",
            ));
        }
        let pdu = message.sub_cursor(pdu_length)?;
        let tlvs = pdu.advance(kind.header_len)?;
        match lsp {
            Some(fields) => lsp_tlvs(pdu, tlvs, fields, ctx, sink)?,
            None => {
                walk_tlvs(tlvs, &TLVS, ctx, sink)?;
            }
        }
        *cursor = pdu.advance(pdu_length)?;
        Ok(())
    });
    ctx.origin = None;
    result
}

/// Decode the type-specific fixed header and return the PDU length.
fn fixed_header(
    pdu_type: u8,
    cursor: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(usize, Option<LspFields>), DecodeError> {
    match pdu_type {
        layout::PDU_L1_LAN_IIH | layout::PDU_L2_LAN_IIH | layout::PDU_P2P_IIH => {
            let circuit_type = cursor.read_u8()? & layout::CIRCUIT_TYPE_MASK;
            let source = read_system_id(cursor)?;
            let holding_time = cursor.read_u16_be()?;
            let pdu_length = cursor.read_u16_be()?;
            sink.field("source-id", &source.name(&ctx.hostnames));
            sink.field("holding time", &format!("{holding_time}s"));
            sink.field(
                "circuit type",
                &code_name(CIRCUIT_TYPES, u32::from(circuit_type)),
            );
            if pdu_type == layout::PDU_P2P_IIH {
                sink.field("circuit-id", &format!("0x{:02x}", cursor.read_u8()?));
            } else {
                let priority = cursor.read_u8()? & layout::PRIORITY_MASK;
                let lan_id = read_node_id(cursor)?;
                sink.field("lan-id", &lan_id.name(&ctx.hostnames));
                sink.field("priority", &priority);
            }
            sink.field("PDU length", &pdu_length);
            Ok((usize::from(pdu_length), None))
        }
        layout::PDU_L1_LSP | layout::PDU_L2_LSP => {
            let pdu_length = cursor.read_u16_be()?;
            let lifetime = cursor.read_u16_be()?;
            let lsp_id = read_lsp_id(cursor)?;
            let sequence = cursor.read_u32_be()?;
            let checksum = cursor.read_u16_be()?;
            let type_block = cursor.read_u8()?;
            ctx.origin = Some(lsp_id.node.system.0);
            sink.field("lsp-id", &lsp_id.name(&ctx.hostnames));
            sink.field("seq", &format!("0x{sequence:08x}"));
            sink.field("lifetime", &format!("{lifetime:5}s"));
            sink.field("PDU length", &pdu_length);
            sink.field("type block", &type_block_flags(type_block));
            Ok((
                usize::from(pdu_length),
                Some(LspFields { lifetime, checksum }),
            ))
        }
        layout::PDU_L1_CSNP | layout::PDU_L2_CSNP => {
            let pdu_length = cursor.read_u16_be()?;
            let source = read_node_id(cursor)?;
            let start = read_lsp_id(cursor)?;
            let end = read_lsp_id(cursor)?;
            sink.field("source-id", &source.name(&ctx.hostnames));
            sink.field("PDU length", &pdu_length);
            sink.field("start lsp-id", &start.name(&ctx.hostnames));
            sink.field("end lsp-id", &end.name(&ctx.hostnames));
            Ok((usize::from(pdu_length), None))
        }
        _ => {
            let pdu_length = cursor.read_u16_be()?;
            let source = read_node_id(cursor)?;
            sink.field("source-id", &source.name(&ctx.hostnames));
            sink.field("PDU length", &pdu_length);
            Ok((usize::from(pdu_length), None))
        }
    }
}

fn type_block_flags(type_block: u8) -> String {
    let mut flags = Vec::new();
    if type_block & layout::LSP_TYPE_PARTITION_REPAIR != 0 {
        flags.push("Partition Repair");
    }
    if type_block & layout::LSP_TYPE_ATTACHED_MASK != 0 {
        flags.push("ATT bit set");
    }
    if type_block & layout::LSP_TYPE_OVERLOAD != 0 {
        flags.push("Overload bit set");
    }
    let is_type = code_name(
        IS_TYPES,
        u32::from(type_block & layout::LSP_TYPE_IS_TYPE_MASK),
    );
    flags.push(is_type);
    flags.join(", ")
}

/// Walk the LSP TLVs with the Fletcher fold tapped onto the record stream,
/// then report the checksum.
fn lsp_tlvs(
    pdu: Cursor<'_>,
    tlvs: Cursor<'_>,
    fields: LspFields,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let mut fold = Fletcher::new();
    let covered = pdu.advance(layout::LSP_CHECKSUM_START)?;
    let header_tail = covered.sub_cursor(layout::LSP_HEADER_LEN - layout::LSP_CHECKSUM_START)?;
    fold.update(header_tail.captured_rest());

    let mut records = Records::new(tlvs, TLV8).with_tap(&mut fold);
    let summary = walk_until(&mut records, sink, |record, sink| {
        TLVS.dispatch(record, ctx, sink).map(|()| Flow::Continue)
    })?;
    let trailing = records.remaining().captured_rest();
    if let WalkEnd::TrailingBytes(_) = summary.end {
        fold.update(trailing);
    }

    let status = if !ctx.options.verify_checksums
        || fields.lifetime == 0
        || fields.checksum == 0
        || pdu.is_truncated()
    {
        "unverified"
    } else if fold.is_valid() {
        "correct"
    } else {
        "incorrect"
    };
    sink.field("chksum", &format!("0x{:04x} ({status})", fields.checksum));
    Ok(())
}
