//! Top-level IS-IS TLVs carried after the fixed PDU header.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::layout;
use super::reader::{format_area, format_metric, read_lsp_id, read_node_id, read_system_id};
use super::subtlv::{IS_REACH_SUBTLVS, PREFIX_SUBTLVS, ROUTER_CAPABILITY_SUBTLVS, walk_tlvs};
use crate::context::DecodeContext;
use crate::protocols::common::reader::{
    code_name, flag_names, printable, read_ipv4, read_ipv6, read_prefix,
};
use crate::sink::{Sink, hex_string, scoped};
use crate::wire::{Cursor, DecodeError, DispatchTable, Entry, opaque};

pub(super) static TLVS: DispatchTable<DecodeContext> = DispatchTable::new(
    "isis",
    &[
        Entry::decoded(1, "Area address(es)", area_addresses),
        Entry::decoded(2, "IS Reachability", is_reachability),
        Entry::decoded(6, "IS Neighbor(s)", is_neighbors),
        Entry::decoded(8, "Padding", padding),
        Entry::decoded(9, "LSP entries", lsp_entries),
        Entry::decoded(10, "Authentication", authentication),
        Entry::decoded(22, "Extended IS Reachability", extended_is_reachability),
        Entry::decoded(128, "IPv4 Internal Reachability", ip_reachability),
        Entry::decoded(129, "Protocols supported", protocols_supported),
        Entry::decoded(130, "IPv4 External Reachability", ip_reachability),
        Entry::decoded(132, "IPv4 Interface address(es)", ipv4_interface_addresses),
        Entry::decoded(134, "Traffic Engineering Router ID", te_router_id),
        Entry::decoded(135, "Extended IPv4 Reachability", extended_ip_reachability),
        Entry::decoded(137, "Hostname", hostname),
        Entry::named(229, "Multi-Topology"),
        Entry::decoded(232, "IPv6 Interface address(es)", ipv6_interface_addresses),
        Entry::decoded(236, "IPv6 reachability", ipv6_reachability),
        Entry::decoded(240, "Point-to-point Adjacency State", p2p_adjacency_state),
        Entry::decoded(242, "IS-IS Router Capability", router_capability),
    ],
);

/// NLPIDs are fixed data; no lazily built table is needed.
const NLPIDS: &[(u32, &str)] = &[
    (0x81, "CLNP"),
    (0x82, "ES-IS"),
    (0x83, "IS-IS"),
    (0x8e, "IPv6"),
    (0xcc, "IPv4"),
];

const AUTH_TYPES: &[(u32, &str)] = &[
    (layout::AUTH_CLEARTEXT as u32, "simple text password"),
    (layout::AUTH_HMAC_MD5 as u32, "HMAC-MD5 password"),
];

const ADJACENCY_STATES: &[(u32, &str)] = &[(0, "Up"), (1, "Initializing"), (2, "Down")];

const IPV6_PREFIX_FLAGS: &[(u32, &str)] = &[
    (layout::IPV6_UP_DOWN as u32, "down"),
    (layout::IPV6_EXTERNAL as u32, "external"),
];

const ROUTER_CAPABILITY_FLAGS: &[(u32, &str)] = &[(0x01, "S bit"), (0x02, "D bit")];

fn area_addresses(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    while !body.is_empty() {
        let length = usize::from(body.read_u8()?);
        if length == 0 {
            return Err(DecodeError::malformed(body.offset(), "empty area address"));
        }
        let mut area = body.take_cursor(length)?;
        sink.field("area address", &format_area(area.take_rest()?));
    }
    Ok(())
}

fn is_reachability(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let virtual_flag = body.read_u8()?;
    sink.field("virtual", &(virtual_flag != 0));
    let count = body.entry_count(
        layout::IS_REACH_ENTRY_LEN,
        "IS reachability list is not a multiple of 11",
    )?;
    for _ in 0..count {
        let default = body.read_u8()?;
        let delay = body.read_u8()?;
        let expense = body.read_u8()?;
        let error = body.read_u8()?;
        let neighbor = read_node_id(body)?;
        scoped(sink, &format!("IS Neighbor: {}", neighbor.name(&ctx.hostnames)), |sink| {
            let scope = if default & layout::METRIC_EXTERNAL != 0 {
                "external"
            } else {
                "internal"
            };
            sink.field("default metric", &format!("{} ({scope})", format_metric(default)));
            sink.field("delay metric", &format_metric(delay));
            sink.field("expense metric", &format_metric(expense));
            sink.field("error metric", &format_metric(error));
        });
    }
    Ok(())
}

fn is_neighbors(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let count = body.entry_count(layout::MAC_ADDRESS_LEN, "neighbor list is not a multiple of 6")?;
    for _ in 0..count {
        let mac: [u8; layout::MAC_ADDRESS_LEN] = body.read_array()?;
        let mac = mac
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<Vec<_>>()
            .join(":");
        sink.field("SNPA", &mac);
    }
    Ok(())
}

fn padding(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let length = body.remaining_claimed();
    sink.field("padding", &format!("{length} bytes"));
    body.skip(length)
}

fn lsp_entries(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let count = body.entry_count(layout::LSP_ENTRY_LEN, "LSP entry list is not a multiple of 16")?;
    for _ in 0..count {
        let lifetime = body.read_u16_be()?;
        let lsp_id = read_lsp_id(body)?;
        let sequence = body.read_u32_be()?;
        let checksum = body.read_u16_be()?;
        sink.text(&format!(
            "lsp-id: {}, seq: 0x{sequence:08x}, lifetime: {lifetime:5}s, chksum: 0x{checksum:04x}",
            lsp_id.name(&ctx.hostnames)
        ));
    }
    Ok(())
}

fn authentication(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let auth_type = body.read_u8()?;
    sink.field("type", &code_name(AUTH_TYPES, u32::from(auth_type)));
    match auth_type {
        layout::AUTH_CLEARTEXT => {
            sink.field("password", &printable(body.take_rest()?));
            Ok(())
        }
        layout::AUTH_HMAC_MD5 => {
            body.expect_len(16, "HMAC-MD5 digest length is not 16")?;
            sink.field("digest", &hex_string(body.take_rest()?));
            Ok(())
        }
        _ => opaque(body, sink),
    }
}

fn extended_is_reachability(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    while !body.is_empty() {
        let neighbor = read_node_id(body)?;
        let metric = body.read_u24_be()?;
        let sub_len = usize::from(body.read_u8()?);
        let label = format!(
            "IS Neighbor: {}, Metric: {metric}",
            neighbor.name(&ctx.hostnames)
        );
        let sub_tlvs = body.take_cursor(sub_len)?;
        scoped(sink, &label, |sink| {
            walk_tlvs(sub_tlvs, &IS_REACH_SUBTLVS, ctx, sink).map(|_| ())
        })?;
    }
    Ok(())
}

fn ip_reachability(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let count = body.entry_count(
        layout::IP_REACH_ENTRY_LEN,
        "IP reachability list is not a multiple of 12",
    )?;
    for _ in 0..count {
        let default = body.read_u8()?;
        let _delay = body.read_u8()?;
        let _expense = body.read_u8()?;
        let _error = body.read_u8()?;
        let prefix = read_ipv4(body)?;
        let mask = read_ipv4(body)?;
        let bits = u32::from(mask).leading_ones();
        let distribution = if default & layout::METRIC_UNSUPPORTED != 0 {
            "down"
        } else {
            "up"
        };
        sink.text(&format!(
            "IPv4 prefix: {prefix}/{bits}, Distribution: {distribution}, Metric: {}",
            format_metric(default)
        ));
    }
    Ok(())
}

fn protocols_supported(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let nlpids = body.take_rest()?;
    let names: Vec<String> = nlpids
        .iter()
        .map(|nlpid| {
            format!(
                "{} (0x{nlpid:02x})",
                code_name(NLPIDS, u32::from(*nlpid))
            )
        })
        .collect();
    sink.field("NLPID(s)", &names.join(", "));
    Ok(())
}

fn ipv4_interface_addresses(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let count = body.entry_count(4, "IPv4 address list is not a multiple of 4")?;
    for _ in 0..count {
        sink.field("IPv4 interface address", &read_ipv4(body)?);
    }
    Ok(())
}

fn te_router_id(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(4, "TE router id length is not 4")?;
    sink.field("Traffic Engineering Router ID", &read_ipv4(body)?);
    Ok(())
}

fn extended_ip_reachability(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    while !body.is_empty() {
        let metric = body.read_u32_be()?;
        let control = body.read_u8()?;
        let bits = control & layout::EXT_IP_PREFIX_LEN_MASK;
        if bits > layout::MAX_IPV4_PREFIX {
            return Err(DecodeError::malformed(body.offset(), "IPv4 prefix length above 32"));
        }
        let prefix = Ipv4Addr::from(read_prefix::<4>(body, bits)?);
        let distribution = if control & layout::EXT_IP_UP_DOWN != 0 {
            "down"
        } else {
            "up"
        };
        let label = format!("IPv4 prefix: {prefix}/{bits}, Distribution: {distribution}, Metric: {metric}");
        prefix_entry(body, control & layout::EXT_IP_SUB_TLVS != 0, &label, ctx, sink)?;
    }
    Ok(())
}

fn ipv6_reachability(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    while !body.is_empty() {
        let metric = body.read_u32_be()?;
        let flags = body.read_u8()?;
        let bits = body.read_u8()?;
        if bits > layout::MAX_IPV6_PREFIX {
            return Err(DecodeError::malformed(body.offset(), "IPv6 prefix length above 128"));
        }
        let prefix = Ipv6Addr::from(read_prefix::<16>(body, bits)?);
        let label = format!(
            "IPv6 prefix: {prefix}/{bits}, Flags: {}, Metric: {metric}",
            flag_names(u32::from(flags), IPV6_PREFIX_FLAGS)
        );
        prefix_entry(body, flags & layout::IPV6_SUB_TLVS != 0, &label, ctx, sink)?;
    }
    Ok(())
}

/// One reachability entry scope, with its optional prefix sub-TLVs.
fn prefix_entry(
    body: &mut Cursor<'_>,
    has_sub_tlvs: bool,
    label: &str,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    if !has_sub_tlvs {
        sink.text(label);
        return Ok(());
    }
    let sub_len = usize::from(body.read_u8()?);
    let sub_tlvs = body.take_cursor(sub_len)?;
    scoped(sink, label, |sink| {
        walk_tlvs(sub_tlvs, &PREFIX_SUBTLVS, ctx, sink).map(|_| ())
    })
}

fn hostname(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let name = printable(body.take_rest()?);
    sink.field("Hostname", &name);
    if let Some(origin) = ctx.origin {
        ctx.hostnames.learn(origin, name);
    }
    Ok(())
}

fn ipv6_interface_addresses(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let count = body.entry_count(16, "IPv6 address list is not a multiple of 16")?;
    for _ in 0..count {
        sink.field("IPv6 interface address", &read_ipv6(body)?);
    }
    Ok(())
}

fn p2p_adjacency_state(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let length = body.remaining_claimed();
    if !matches!(length, 1 | 5 | 11 | 15) {
        return Err(DecodeError::malformed(
            body.offset(),
            "unexpected adjacency state length",
        ));
    }
    let state = body.read_u8()?;
    sink.field("Adjacency State", &code_name(ADJACENCY_STATES, u32::from(state)));
    if length >= 5 {
        sink.field("Extended Local circuit-ID", &format!("0x{:08x}", body.read_u32_be()?));
    }
    if length >= 11 {
        let neighbor = read_system_id(body)?;
        sink.field("Neighbor System-ID", &neighbor.name(&ctx.hostnames));
    }
    if length == 15 {
        sink.field(
            "Neighbor Extended Local circuit-ID",
            &format!("0x{:08x}", body.read_u32_be()?),
        );
    }
    Ok(())
}

fn router_capability(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let router_id = read_ipv4(body)?;
    let flags = body.read_u8()?;
    sink.field("Router-ID", &router_id);
    sink.field(
        "Flags",
        &flag_names(u32::from(flags), ROUTER_CAPABILITY_FLAGS),
    );
    let sub_tlvs = body.take_cursor(body.remaining_claimed())?;
    walk_tlvs(sub_tlvs, &ROUTER_CAPABILITY_SUBTLVS, ctx, sink).map(|_| ())
}
