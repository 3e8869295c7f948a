//! Sub-TLV namespaces nested inside IS-IS TLVs.
//!
//! Each namespace is its own dispatch table; the same TLV8 walk drives all
//! of them.

use super::reader::read_system_id;
use crate::context::DecodeContext;
use crate::protocols::common::reader::{code_name, flag_names, read_ipv4, read_ipv6};
use crate::sink::{Sink, scoped};
use crate::wire::{
    Cursor, DecodeError, DispatchTable, Entry, Records, TLV8, WalkSummary, read_record, walk,
};

/// Walk a TLV8 envelope and dispatch every record through `table`.
pub(super) fn walk_tlvs(
    envelope: Cursor<'_>,
    table: &'static DispatchTable<DecodeContext>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<WalkSummary, DecodeError> {
    walk(Records::new(envelope, TLV8), sink, |record, sink| {
        table.dispatch(record, ctx, sink)
    })
}

pub(super) static IS_REACH_SUBTLVS: DispatchTable<DecodeContext> = DispatchTable::new(
    "isis-is-reach",
    &[
        Entry::decoded(3, "Administrative group", admin_group),
        Entry::decoded(4, "Link Local/Remote Identifier", link_ids),
        Entry::decoded(6, "IPv4 interface address", ipv4_address),
        Entry::decoded(8, "IPv4 neighbor address", ipv4_address),
        Entry::decoded(9, "Maximum link bandwidth", bandwidth),
        Entry::decoded(10, "Reservable link bandwidth", bandwidth),
        Entry::decoded(11, "Unreserved bandwidth", unreserved_bandwidth),
        Entry::decoded(18, "Traffic Engineering Metric", te_metric),
        Entry::decoded(31, "Adjacency SID", adjacency_sid),
        Entry::decoded(32, "LAN Adjacency SID", lan_adjacency_sid),
    ],
);

pub(super) static PREFIX_SUBTLVS: DispatchTable<DecodeContext> = DispatchTable::new(
    "isis-prefix",
    &[
        Entry::decoded(1, "32-Bit Administrative Tag", admin_tags_32),
        Entry::decoded(2, "64-Bit Administrative Tag", admin_tags_64),
        Entry::decoded(3, "Prefix SID", prefix_sid),
        Entry::decoded(4, "Prefix Attribute Flags", prefix_attribute_flags),
        Entry::decoded(11, "IPv4 Source Router ID", ipv4_router_id),
        Entry::decoded(12, "IPv6 Source Router ID", ipv6_router_id),
    ],
);

pub(super) static ROUTER_CAPABILITY_SUBTLVS: DispatchTable<DecodeContext> = DispatchTable::new(
    "isis-router-cap",
    &[
        Entry::decoded(2, "Segment Routing Capability", sr_capability),
        Entry::decoded(19, "Segment Routing Algorithms", sr_algorithms),
        Entry::decoded(22, "Segment Routing Local Block", sr_local_block),
        Entry::decoded(24, "SRMS Preference", srms_preference),
    ],
);

static SID_LABEL_SUBTLVS: DispatchTable<DecodeContext> =
    DispatchTable::new("isis-sid-label", &[Entry::decoded(1, "SID/Label", sid_label)]);

const ADJ_SID_FLAGS: &[(u32, &str)] = &[
    (0x80, "address-family"),
    (0x40, "backup"),
    (0x20, "value"),
    (0x10, "local"),
    (0x08, "set"),
    (0x04, "persistent"),
];

const PREFIX_SID_FLAGS: &[(u32, &str)] = &[
    (0x80, "readvertisement"),
    (0x40, "node"),
    (0x20, "no-php"),
    (0x10, "explicit-null"),
    (0x08, "value"),
    (0x04, "local"),
];

const PREFIX_ATTRIBUTE_FLAGS: &[(u32, &str)] = &[
    (0x80, "external"),
    (0x40, "re-advertisement"),
    (0x20, "node"),
];

const SR_CAPABILITY_FLAGS: &[(u32, &str)] = &[(0x80, "mpls-ipv4"), (0x40, "mpls-ipv6")];

const SR_ALGORITHMS: &[(u32, &str)] = &[(0, "SPF"), (1, "strict SPF")];

/// SID value whose encoding is chosen by its length: a 20-bit label in
/// three bytes or a 32-bit index in four.
fn read_sid(body: &mut Cursor<'_>, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    match body.remaining_claimed() {
        3 => {
            let label = body.read_u24_be()? & 0x000f_ffff;
            sink.field("label", &label);
        }
        4 => {
            let index = body.read_u32_be()?;
            sink.field("index", &index);
        }
        _ => {
            return Err(DecodeError::malformed(
                body.offset(),
                "SID length is neither 3 nor 4",
            ));
        }
    }
    Ok(())
}

/// Bytes per second on the wire, shown in Mbps.
fn format_bandwidth(bytes_per_second: f32) -> String {
    format!("{:.3} Mbps", f64::from(bytes_per_second) * 8.0 / 1_000_000.0)
}

fn admin_group(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(4, "administrative group length is not 4")?;
    let group = body.read_u32_be()?;
    sink.field("group", &format!("0x{group:08x}"));
    Ok(())
}

fn link_ids(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(8, "link identifier length is not 8")?;
    let local = body.read_u32_be()?;
    let remote = body.read_u32_be()?;
    sink.field("local", &local);
    sink.field("remote", &remote);
    Ok(())
}

fn ipv4_address(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(4, "IPv4 address length is not 4")?;
    sink.field("address", &read_ipv4(body)?);
    Ok(())
}

fn bandwidth(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(4, "bandwidth length is not 4")?;
    sink.field("bandwidth", &format_bandwidth(body.read_f32_be()?));
    Ok(())
}

fn unreserved_bandwidth(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(32, "unreserved bandwidth length is not 32")?;
    for priority in 0..8 {
        let value = format_bandwidth(body.read_f32_be()?);
        sink.field(&format!("priority {priority}"), &value);
    }
    Ok(())
}

fn te_metric(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(3, "TE metric length is not 3")?;
    sink.field("metric", &body.read_u24_be()?);
    Ok(())
}

fn adjacency_sid(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let flags = body.read_u8()?;
    let weight = body.read_u8()?;
    sink.field("flags", &flag_names(u32::from(flags), ADJ_SID_FLAGS));
    sink.field("weight", &weight);
    read_sid(body, sink)
}

fn lan_adjacency_sid(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let flags = body.read_u8()?;
    let weight = body.read_u8()?;
    let neighbor = read_system_id(body)?;
    sink.field("flags", &flag_names(u32::from(flags), ADJ_SID_FLAGS));
    sink.field("weight", &weight);
    sink.field("neighbor", &neighbor.name(&ctx.hostnames));
    read_sid(body, sink)
}

fn admin_tags_32(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let count = body.entry_count(4, "administrative tag list is not a multiple of 4")?;
    for _ in 0..count {
        sink.field("tag", &body.read_u32_be()?);
    }
    Ok(())
}

fn admin_tags_64(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let count = body.entry_count(8, "administrative tag list is not a multiple of 8")?;
    for _ in 0..count {
        sink.field("tag", &body.read_u64_be()?);
    }
    Ok(())
}

fn prefix_sid(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let flags = body.read_u8()?;
    let algorithm = body.read_u8()?;
    sink.field("flags", &flag_names(u32::from(flags), PREFIX_SID_FLAGS));
    sink.field(
        "algorithm",
        &code_name(SR_ALGORITHMS, u32::from(algorithm)),
    );
    read_sid(body, sink)
}

fn prefix_attribute_flags(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let flags = body.read_u8()?;
    sink.field(
        "flags",
        &flag_names(u32::from(flags), PREFIX_ATTRIBUTE_FLAGS),
    );
    Ok(())
}

fn ipv4_router_id(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(4, "IPv4 router id length is not 4")?;
    sink.field("router id", &read_ipv4(body)?);
    Ok(())
}

fn ipv6_router_id(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(16, "IPv6 router id length is not 16")?;
    sink.field("router id", &read_ipv6(body)?);
    Ok(())
}

/// One or more `range + SID/Label sub-TLV` descriptors.
fn label_ranges(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    while !body.is_empty() {
        let range = body.read_u24_be()?;
        scoped(sink, &format!("range {range}"), |sink| {
            let record = read_record(body, &TLV8, None)?;
            SID_LABEL_SUBTLVS.dispatch(record, ctx, sink)
        })?;
    }
    Ok(())
}

fn sr_capability(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let flags = body.read_u8()?;
    sink.field("flags", &flag_names(u32::from(flags), SR_CAPABILITY_FLAGS));
    label_ranges(body, ctx, sink)
}

fn sr_local_block(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let _flags = body.read_u8()?;
    label_ranges(body, ctx, sink)
}

fn sr_algorithms(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    for algorithm in body.take_rest()? {
        sink.field("algorithm", &code_name(SR_ALGORITHMS, u32::from(*algorithm)));
    }
    Ok(())
}

fn srms_preference(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(1, "SRMS preference length is not 1")?;
    sink.field("preference", &body.read_u8()?);
    Ok(())
}

fn sid_label(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    read_sid(body, sink)
}
