use std::net::{IpAddr, SocketAddr};

use etherparse::{Ethernet2HeaderSlice, NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::LinkError;
use super::layout;
use super::reader::UdpReader;
use crate::ProtocolTag;
use crate::protocols::radius::is_radius_port;

/// The part of a frame handed to a protocol decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPayload<'a> {
    pub tag: ProtocolTag,
    /// Captured payload bytes.
    pub payload: &'a [u8],
    /// Payload length promised by the enclosing headers.
    pub claimed_len: usize,
    /// Source and destination, when the link layer names them.
    pub endpoints: Option<String>,
}

/// Find the decodable payload inside a link-layer frame.
///
/// `original_len` is the frame's length on the wire. Returns `Ok(None)` for
/// traffic no decoder handles.
pub fn demux(
    linktype: Linktype,
    frame: &[u8],
    original_len: usize,
) -> Result<Option<LinkPayload<'_>>, LinkError> {
    match linktype {
        layout::LINKTYPE_IEEE802_15_4_WITHFCS => Ok(Some(LinkPayload {
            tag: ProtocolTag::Ieee802154 { fcs: true },
            payload: frame,
            claimed_len: original_len,
            endpoints: None,
        })),
        layout::LINKTYPE_IEEE802_15_4_NOFCS => Ok(Some(LinkPayload {
            tag: ProtocolTag::Ieee802154 { fcs: false },
            payload: frame,
            claimed_len: original_len,
            endpoints: None,
        })),
        Linktype::ETHERNET => ethernet(frame, original_len),
        Linktype::RAW => {
            let sliced = SlicedPacket::from_ip(frame).map_err(|e| LinkError::header("ip", e))?;
            radius_over_udp(sliced)
        }
        _ => Ok(None),
    }
}

fn ethernet(frame: &[u8], original_len: usize) -> Result<Option<LinkPayload<'_>>, LinkError> {
    let header =
        Ethernet2HeaderSlice::from_slice(frame).map_err(|e| LinkError::header("ethernet", e))?;
    let length = header.ether_type().0;
    if length > layout::MAX_8023_LENGTH {
        let sliced =
            SlicedPacket::from_ethernet(frame).map_err(|e| LinkError::header("ethernet", e))?;
        return radius_over_udp(sliced);
    }

    // IEEE 802.3 framing: the length field counts LLC and payload, and
    // excludes any padding up to the minimum frame size.
    let llc_start = layout::ETHERNET_HEADER_LEN;
    let payload_start = llc_start + layout::LLC_LEN;
    if frame.get(llc_start..payload_start) != Some(&layout::LLC_OSI[..]) {
        return Ok(None);
    }
    let payload = frame.get(payload_start..).unwrap_or(&[]);
    let claimed_len = usize::from(length)
        .saturating_sub(layout::LLC_LEN)
        .min(original_len.saturating_sub(payload_start));
    let endpoints = format!(
        "{} > {}",
        format_mac(header.source()),
        format_mac(header.destination())
    );
    Ok(Some(LinkPayload {
        tag: ProtocolTag::Isis,
        payload,
        claimed_len,
        endpoints: Some(endpoints),
    }))
}

fn radius_over_udp(sliced: SlicedPacket<'_>) -> Result<Option<LinkPayload<'_>>, LinkError> {
    let net = sliced.net.ok_or(LinkError::NotIp)?;
    let Some(TransportSlice::Udp(udp)) = sliced.transport else {
        return Ok(None);
    };
    if !is_radius_port(udp.source_port()) && !is_radius_port(udp.destination_port()) {
        return Ok(None);
    }

    let (src_ip, dst_ip) = match net {
        NetSlice::Ipv4(ref ipv4) => (
            IpAddr::V4(ipv4.header().source_addr()),
            IpAddr::V4(ipv4.header().destination_addr()),
        ),
        NetSlice::Ipv6(ref ipv6) => (
            IpAddr::V6(ipv6.header().source_addr()),
            IpAddr::V6(ipv6.header().destination_addr()),
        ),
    };

    let ip_payload = net.ip_payload_ref().ok_or(LinkError::NoIpPayload)?;
    let reader = UdpReader::new(ip_payload.payload);
    let payload = reader.payload_without_header()?;
    let claimed_len = reader.claimed_payload_len()?;
    let endpoints = format!(
        "{} > {}",
        SocketAddr::new(src_ip, udp.source_port()),
        SocketAddr::new(dst_ip, udp.destination_port())
    );

    Ok(Some(LinkPayload {
        tag: ProtocolTag::Radius,
        payload,
        claimed_len,
        endpoints: Some(endpoints),
    }))
}

fn format_mac(mac: [u8; 6]) -> String {
    mac.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::demux;
    use crate::ProtocolTag;
    use crate::link::error::LinkError;
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
            .udp(src_port, dst_port);
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, payload).unwrap();
        packet
    }

    #[test]
    fn radius_port_selects_radius() {
        let payload = [1u8, 2, 0, 20];
        let frame = udp_frame(50000, 1812, &payload);
        let found = demux(Linktype::ETHERNET, &frame, frame.len()).unwrap().unwrap();
        assert_eq!(found.tag, ProtocolTag::Radius);
        assert_eq!(found.payload, payload);
        assert_eq!(found.claimed_len, payload.len());
        assert_eq!(
            found.endpoints.as_deref(),
            Some("192.168.0.1:50000 > 192.168.0.2:1812")
        );
    }

    #[test]
    fn other_udp_is_skipped() {
        let frame = udp_frame(5353, 5353, &[0; 4]);
        assert!(demux(Linktype::ETHERNET, &frame, frame.len()).unwrap().is_none());
    }

    #[test]
    fn llc_frame_selects_isis_without_padding() {
        let mut frame = vec![0x01, 0x80, 0xc2, 0x00, 0x00, 0x14];
        frame.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        frame.extend_from_slice(&[0x00, 0x0b]);
        frame.extend_from_slice(&[0xfe, 0xfe, 0x03]);
        frame.extend_from_slice(&[0x83, 0x1b, 0x01, 0x00, 0x14, 0x01, 0x00, 0x01]);
        frame.resize(60, 0);
        let found = demux(Linktype::ETHERNET, &frame, 60).unwrap().unwrap();
        assert_eq!(found.tag, ProtocolTag::Isis);
        assert_eq!(found.claimed_len, 8);
        assert_eq!(found.payload[0], 0x83);
        assert_eq!(
            found.endpoints.as_deref(),
            Some("00:11:22:33:44:55 > 01:80:c2:00:00:14")
        );
    }

    #[test]
    fn non_osi_llc_is_skipped() {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0x00, 0x06, 0xaa, 0xaa, 0x03, 0, 0, 0]);
        assert!(demux(Linktype::ETHERNET, &frame, frame.len()).unwrap().is_none());
    }

    #[test]
    fn ieee802154_linktypes_carry_fcs_flag() {
        let frame = [0x41, 0x88, 0x01];
        let found = demux(Linktype(195), &frame, 10).unwrap().unwrap();
        assert_eq!(found.tag, ProtocolTag::Ieee802154 { fcs: true });
        assert_eq!(found.claimed_len, 10);
        let found = demux(Linktype(230), &frame, 3).unwrap().unwrap();
        assert_eq!(found.tag, ProtocolTag::Ieee802154 { fcs: false });
    }

    #[test]
    fn unsupported_linktype_is_skipped() {
        assert!(demux(Linktype(147), &[0; 4], 4).unwrap().is_none());
    }

    #[test]
    fn short_ethernet_frame_is_header_error() {
        let result = demux(Linktype::ETHERNET, &[], 0);
        assert!(matches!(result, Err(LinkError::Header { layer: "ethernet", .. })));
    }
}
