//! Attribute dispatch, including vendor-specific sub-attributes.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::layout;
use super::reader::{ATTRIBUTE, integer, text};
use crate::context::DecodeContext;
use crate::protocols::common::reader::{code_name, read_ipv4, read_ipv6, read_prefix};
use crate::sink::{Sink, hex_string};
use crate::wire::{Cursor, DecodeError, DispatchTable, Entry, Records, opaque, walk};

pub(super) static ATTRIBUTES: DispatchTable<DecodeContext> = DispatchTable::new(
    "radius",
    &[
        Entry::decoded(layout::ATTR_USER_NAME, "User-Name", text_value),
        Entry::named(layout::ATTR_USER_PASSWORD, "User-Password"),
        Entry::decoded(layout::ATTR_CHAP_PASSWORD, "CHAP-Password", chap_password),
        Entry::decoded(layout::ATTR_NAS_IP_ADDRESS, "NAS-IP-Address", address),
        Entry::decoded(layout::ATTR_NAS_PORT, "NAS-Port", integer_value),
        Entry::decoded(layout::ATTR_SERVICE_TYPE, "Service-Type", service_type),
        Entry::decoded(layout::ATTR_FRAMED_PROTOCOL, "Framed-Protocol", framed_protocol),
        Entry::decoded(layout::ATTR_FRAMED_IP_ADDRESS, "Framed-IP-Address", address),
        Entry::decoded(layout::ATTR_FRAMED_IP_NETMASK, "Framed-IP-Netmask", address),
        Entry::decoded(layout::ATTR_FILTER_ID, "Filter-Id", text_value),
        Entry::decoded(layout::ATTR_FRAMED_MTU, "Framed-MTU", integer_value),
        Entry::decoded(layout::ATTR_REPLY_MESSAGE, "Reply-Message", text_value),
        Entry::decoded(layout::ATTR_STATE, "State", octets),
        Entry::decoded(layout::ATTR_CLASS, "Class", octets),
        Entry::decoded(layout::ATTR_VENDOR_SPECIFIC, "Vendor-Specific", vendor_specific),
        Entry::decoded(layout::ATTR_SESSION_TIMEOUT, "Session-Timeout", seconds),
        Entry::decoded(layout::ATTR_IDLE_TIMEOUT, "Idle-Timeout", seconds),
        Entry::decoded(layout::ATTR_CALLED_STATION_ID, "Called-Station-Id", text_value),
        Entry::decoded(layout::ATTR_CALLING_STATION_ID, "Calling-Station-Id", text_value),
        Entry::decoded(layout::ATTR_NAS_IDENTIFIER, "NAS-Identifier", text_value),
        Entry::decoded(layout::ATTR_PROXY_STATE, "Proxy-State", octets),
        Entry::decoded(layout::ATTR_ACCT_STATUS_TYPE, "Acct-Status-Type", acct_status_type),
        Entry::decoded(layout::ATTR_ACCT_DELAY_TIME, "Acct-Delay-Time", seconds),
        Entry::decoded(layout::ATTR_ACCT_INPUT_OCTETS, "Acct-Input-Octets", integer_value),
        Entry::decoded(layout::ATTR_ACCT_OUTPUT_OCTETS, "Acct-Output-Octets", integer_value),
        Entry::decoded(layout::ATTR_ACCT_SESSION_ID, "Acct-Session-Id", text_value),
        Entry::decoded(layout::ATTR_ACCT_AUTHENTIC, "Acct-Authentic", acct_authentic),
        Entry::decoded(layout::ATTR_ACCT_SESSION_TIME, "Acct-Session-Time", seconds),
        Entry::decoded(layout::ATTR_ACCT_INPUT_PACKETS, "Acct-Input-Packets", integer_value),
        Entry::decoded(layout::ATTR_ACCT_OUTPUT_PACKETS, "Acct-Output-Packets", integer_value),
        Entry::decoded(
            layout::ATTR_ACCT_TERMINATE_CAUSE,
            "Acct-Terminate-Cause",
            acct_terminate_cause,
        ),
        Entry::decoded(layout::ATTR_EVENT_TIMESTAMP, "Event-Timestamp", event_timestamp),
        Entry::decoded(layout::ATTR_CHAP_CHALLENGE, "CHAP-Challenge", octets),
        Entry::decoded(layout::ATTR_NAS_PORT_TYPE, "NAS-Port-Type", nas_port_type),
        Entry::decoded(layout::ATTR_EAP_MESSAGE, "EAP-Message", eap_message),
        Entry::decoded(
            layout::ATTR_MESSAGE_AUTHENTICATOR,
            "Message-Authenticator",
            message_authenticator,
        ),
        Entry::decoded(layout::ATTR_NAS_PORT_ID, "NAS-Port-Id", text_value),
        Entry::decoded(layout::ATTR_NAS_IPV6_ADDRESS, "NAS-IPv6-Address", ipv6_address),
        Entry::decoded(layout::ATTR_FRAMED_IPV6_PREFIX, "Framed-IPv6-Prefix", ipv6_prefix),
        Entry::decoded(layout::ATTR_ERROR_CAUSE, "Error-Cause", error_cause),
    ],
);

static CISCO_ATTRIBUTES: DispatchTable<DecodeContext> = DispatchTable::new(
    "radius-cisco",
    &[
        Entry::decoded(1, "Cisco-AVPair", text_value),
        Entry::decoded(2, "Cisco-NAS-Port", text_value),
        Entry::decoded(250, "Cisco-Account-Info", text_value),
        Entry::decoded(252, "Cisco-Command-Code", octets),
    ],
);

static MICROSOFT_ATTRIBUTES: DispatchTable<DecodeContext> = DispatchTable::new(
    "radius-microsoft",
    &[
        Entry::named(1, "MS-CHAP-Response"),
        Entry::decoded(2, "MS-CHAP-Error", text_value),
        Entry::decoded(7, "MS-MPPE-Encryption-Policy", integer_value),
        Entry::decoded(8, "MS-MPPE-Encryption-Types", integer_value),
        Entry::decoded(11, "MS-CHAP-Challenge", octets),
        Entry::named(16, "MS-MPPE-Send-Key"),
        Entry::named(17, "MS-MPPE-Recv-Key"),
        Entry::named(25, "MS-CHAP2-Response"),
        Entry::decoded(26, "MS-CHAP2-Success", text_value),
    ],
);

/// Vendors whose sub-attributes follow the recommended type/length layout.
static VENDORS: &[(u32, &str, &DispatchTable<DecodeContext>)] = &[
    (layout::VENDOR_CISCO, "Cisco", &CISCO_ATTRIBUTES),
    (layout::VENDOR_MICROSOFT, "Microsoft", &MICROSOFT_ATTRIBUTES),
];

const SERVICE_TYPES: &[(u32, &str)] = &[
    (1, "Login"),
    (2, "Framed"),
    (3, "Callback Login"),
    (4, "Callback Framed"),
    (5, "Outbound"),
    (6, "Administrative"),
    (7, "NAS Prompt"),
    (8, "Authenticate Only"),
    (9, "Callback NAS Prompt"),
    (10, "Call Check"),
    (11, "Callback Administrative"),
];

const FRAMED_PROTOCOLS: &[(u32, &str)] = &[
    (1, "PPP"),
    (2, "SLIP"),
    (3, "ARAP"),
    (4, "Gandalf"),
    (5, "Xylogics"),
    (6, "X.75"),
];

const ACCT_STATUS_TYPES: &[(u32, &str)] = &[
    (1, "Start"),
    (2, "Stop"),
    (3, "Interim-Update"),
    (7, "Accounting-On"),
    (8, "Accounting-Off"),
];

const ACCT_AUTHENTIC: &[(u32, &str)] = &[(1, "RADIUS"), (2, "Local"), (3, "Remote")];

const TERMINATE_CAUSES: &[(u32, &str)] = &[
    (1, "User Request"),
    (2, "Lost Carrier"),
    (3, "Lost Service"),
    (4, "Idle Timeout"),
    (5, "Session Timeout"),
    (6, "Admin Reset"),
    (7, "Admin Reboot"),
    (8, "Port Error"),
    (9, "NAS Error"),
    (10, "NAS Request"),
    (11, "NAS Reboot"),
    (12, "Port Unneeded"),
    (13, "Port Preempted"),
    (14, "Port Suspended"),
    (15, "Service Unavailable"),
    (16, "Callback"),
    (17, "User Error"),
    (18, "Host Request"),
];

const NAS_PORT_TYPES: &[(u32, &str)] = &[
    (0, "Async"),
    (1, "Sync"),
    (2, "ISDN Sync"),
    (3, "ISDN Async V.120"),
    (4, "ISDN Async V.110"),
    (5, "Virtual"),
    (15, "Ethernet"),
    (18, "Wireless - Other"),
    (19, "Wireless - IEEE 802.11"),
];

const ERROR_CAUSES: &[(u32, &str)] = &[
    (201, "Residual Session Context Removed"),
    (202, "Invalid EAP Packet"),
    (401, "Unsupported Attribute"),
    (402, "Missing Attribute"),
    (403, "NAS Identification Mismatch"),
    (404, "Invalid Request"),
    (405, "Unsupported Service"),
    (406, "Unsupported Extension"),
    (407, "Invalid Attribute Value"),
    (501, "Administratively Prohibited"),
    (502, "Request Not Routable (Proxy)"),
    (503, "Session Context Not Found"),
    (504, "Session Context Not Removable"),
    (505, "Other Proxy Processing Error"),
    (506, "Resources Unavailable"),
    (507, "Request Initiated"),
    (508, "Multiple Session Selection Unsupported"),
];

const EAP_CODES: &[(u32, &str)] = &[
    (1, "Request"),
    (2, "Response"),
    (3, "Success"),
    (4, "Failure"),
];

const EAP_TYPES: &[(u32, &str)] = &[
    (1, "Identity"),
    (2, "Notification"),
    (3, "Nak"),
    (4, "MD5-Challenge"),
    (13, "EAP-TLS"),
    (21, "EAP-TTLS"),
    (25, "PEAP"),
    (26, "MS-CHAP-V2"),
    (43, "EAP-FAST"),
];

/// Walk the attribute list of one message.
pub(super) fn walk_attributes(
    envelope: Cursor<'_>,
    table: &'static DispatchTable<DecodeContext>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<usize, DecodeError> {
    let summary = walk(Records::new(envelope, ATTRIBUTE), sink, |record, sink| {
        table.dispatch(record, ctx, sink)
    })?;
    Ok(summary.records)
}

fn text_value(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    text(body, sink)
}

fn octets(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    sink.field("value", &format!("0x{}", hex_string(body.take_rest()?)));
    Ok(())
}

fn integer_value(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    sink.field("value", &integer(body)?);
    Ok(())
}

fn seconds(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    sink.field("value", &format!("{} secs", integer(body)?));
    Ok(())
}

fn enumerated(
    body: &mut Cursor<'_>,
    table: &[(u32, &'static str)],
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let value = integer(body)?;
    sink.field("value", &format!("{} ({value})", code_name(table, value)));
    Ok(())
}

fn service_type(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    enumerated(body, SERVICE_TYPES, sink)
}

fn framed_protocol(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    enumerated(body, FRAMED_PROTOCOLS, sink)
}

fn acct_status_type(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    enumerated(body, ACCT_STATUS_TYPES, sink)
}

fn acct_authentic(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    enumerated(body, ACCT_AUTHENTIC, sink)
}

fn acct_terminate_cause(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    enumerated(body, TERMINATE_CAUSES, sink)
}

fn nas_port_type(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    enumerated(body, NAS_PORT_TYPES, sink)
}

fn error_cause(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    enumerated(body, ERROR_CAUSES, sink)
}

fn address(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(4, "address attribute length is not 4")?;
    sink.field("value", &read_ipv4(body)?);
    Ok(())
}

fn ipv6_address(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(16, "IPv6 address attribute length is not 16")?;
    sink.field("value", &read_ipv6(body)?);
    Ok(())
}

fn ipv6_prefix(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let _reserved = body.read_u8()?;
    let bits = body.read_u8()?;
    if bits > layout::MAX_IPV6_PREFIX {
        return Err(DecodeError::malformed(body.offset(), "IPv6 prefix length too long"));
    }
    let prefix = read_prefix::<16>(body, bits)?;
    sink.field("value", &format!("{}/{bits}", std::net::Ipv6Addr::from(prefix)));
    Ok(())
}

fn chap_password(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(layout::CHAP_PASSWORD_LEN, "CHAP password length is not 17")?;
    sink.field("chap ident", &body.read_u8()?);
    sink.field("response", &hex_string(body.take_rest()?));
    Ok(())
}

fn event_timestamp(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let seconds = integer(body)?;
    let formatted = OffsetDateTime::from_unix_timestamp(i64::from(seconds))
        .ok()
        .and_then(|when| when.format(&Rfc3339).ok());
    match formatted {
        Some(when) => sink.field("value", &when),
        None => sink.field("value", &seconds),
    }
    Ok(())
}

/// EAP header of the fragment carried in this attribute; the rest stays
/// opaque.
fn eap_message(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    if body.remaining_claimed() < layout::EAP_HEADER_LEN {
        return opaque(body, sink);
    }
    let code = body.read_u8()?;
    let id = body.read_u8()?;
    let length = body.read_u16_be()?;
    sink.field("eap code", &code_name(EAP_CODES, u32::from(code)));
    sink.field("eap id", &id);
    sink.field("eap length", &length);
    // Only requests and responses carry a method type.
    if matches!(code, 1 | 2) && !body.is_empty() {
        let method = body.read_u8()?;
        sink.field(
            "eap type",
            &format!("{} ({method})", code_name(EAP_TYPES, u32::from(method))),
        );
    }
    opaque(body, sink)
}

fn message_authenticator(
    body: &mut Cursor<'_>,
    _ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    body.expect_len(
        layout::MESSAGE_AUTHENTICATOR_LEN,
        "Message-Authenticator length is not 16",
    )?;
    sink.field("value", &hex_string(body.take_rest()?));
    Ok(())
}

fn vendor_specific(
    body: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    sink: &mut dyn Sink,
) -> Result<(), DecodeError> {
    let vendor = body.read_u32_be()?;
    let known = VENDORS.iter().find(|(id, _, _)| *id == vendor);
    let name = known.map_or("Unknown", |(_, name, _)| *name);
    sink.field("vendor", &format!("{name} ({vendor})"));
    let Some(&(_, _, table)) = known else {
        // Unknown vendors may not use the type/length layout.
        return opaque(body, sink);
    };
    let nested = body.take_cursor(body.remaining_claimed())?;
    walk_attributes(nested, table, ctx, sink)?;
    Ok(())
}
