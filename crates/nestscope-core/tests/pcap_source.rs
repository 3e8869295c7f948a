use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use etherparse::PacketBuilder;
use nestscope_core::wire::{Crc16Kermit, Fletcher};
use nestscope_core::{
    DecodeContext, DumpSummary, PacketSource, PcapFileSource, SourceError, TextSink,
    dump_pcap_file,
};

const TS_SECONDS: u64 = 1_700_000_000;

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    path.push(format!("nestscope_{name}_{unique}"));
    path
}

fn block(kind: u32, body: &[u8]) -> Vec<u8> {
    let padded = body.len().div_ceil(4) * 4;
    let total = (12 + padded) as u32;
    let mut out = Vec::with_capacity(12 + padded);
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(body);
    out.resize(8 + padded, 0);
    out.extend_from_slice(&total.to_le_bytes());
    out
}

/// Minimal little-endian pcapng writer.
struct PcapNg {
    bytes: Vec<u8>,
}

impl PcapNg {
    fn new(linktypes: &[u16]) -> Self {
        let mut shb = Vec::new();
        shb.extend_from_slice(&0x1a2b_3c4du32.to_le_bytes());
        shb.extend_from_slice(&1u16.to_le_bytes());
        shb.extend_from_slice(&0u16.to_le_bytes());
        shb.extend_from_slice(&(-1i64).to_le_bytes());
        let mut bytes = block(0x0a0d_0d0a, &shb);
        for linktype in linktypes {
            let mut idb = Vec::new();
            idb.extend_from_slice(&linktype.to_le_bytes());
            idb.extend_from_slice(&0u16.to_le_bytes());
            idb.extend_from_slice(&65535u32.to_le_bytes());
            bytes.extend_from_slice(&block(1, &idb));
        }
        Self { bytes }
    }

    fn packet(&mut self, if_id: u32, data: &[u8], original_len: usize) {
        let micros = TS_SECONDS * 1_000_000;
        let mut epb = Vec::new();
        epb.extend_from_slice(&if_id.to_le_bytes());
        epb.extend_from_slice(&((micros >> 32) as u32).to_le_bytes());
        epb.extend_from_slice(&(micros as u32).to_le_bytes());
        epb.extend_from_slice(&(data.len() as u32).to_le_bytes());
        epb.extend_from_slice(&(original_len as u32).to_le_bytes());
        epb.extend_from_slice(data);
        self.bytes.extend_from_slice(&block(6, &epb));
    }
}

fn ieee802154_frame() -> Vec<u8> {
    let mut frame = vec![0x61, 0x98, 0x17, 0xcd, 0xab, 0x02, 0x00, 0x01, 0x00];
    frame.extend_from_slice(b"sensor");
    let crc = Crc16Kermit::checksum(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

fn isis_frame() -> Vec<u8> {
    let name = b"core-1";
    let mut pdu = vec![0x83, 27, 1, 0, 18, 1, 0, 0];
    pdu.extend_from_slice(&((27 + 2 + name.len()) as u16).to_be_bytes());
    pdu.extend_from_slice(&1200u16.to_be_bytes());
    pdu.extend_from_slice(&[0x19, 0x21, 0x68, 0x00, 0x10, 0x01, 0, 0]);
    pdu.extend_from_slice(&1u32.to_be_bytes());
    pdu.extend_from_slice(&[0, 0, 0x03, 137, name.len() as u8]);
    pdu.extend_from_slice(name);
    let checksum = Fletcher::generate(&pdu[12..], 12);
    pdu[24..26].copy_from_slice(&checksum);

    let mut frame = vec![0x01, 0x80, 0xc2, 0x00, 0x00, 0x14];
    frame.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    frame.extend_from_slice(&((3 + pdu.len()) as u16).to_be_bytes());
    frame.extend_from_slice(&[0xfe, 0xfe, 0x03]);
    frame.extend_from_slice(&pdu);
    frame.resize(frame.len().max(60), 0);
    frame
}

fn radius_message() -> Vec<u8> {
    let mut message = vec![2, 0x11, 0, 26];
    message.extend_from_slice(&[0; 16]);
    message.extend_from_slice(&[18, 6, b'w', b'e', b'l', b'c']);
    message
}

fn udp_frame(dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
        .udp(50000, dst_port);
    let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut packet, payload).unwrap();
    packet
}

fn mixed_capture() -> PathBuf {
    let mut capture = PcapNg::new(&[195, 1]);
    let wpan = ieee802154_frame();
    capture.packet(0, &wpan, wpan.len());
    let isis = isis_frame();
    capture.packet(1, &isis, isis.len());
    let radius = udp_frame(1812, &radius_message());
    capture.packet(1, &radius, radius.len());
    let other = udp_frame(5353, &[0; 12]);
    capture.packet(1, &other, other.len());
    // Snapshot length cut inside the payload.
    capture.packet(0, &wpan[..11], wpan.len());

    let path = temp_path("mixed.pcapng");
    fs::write(&path, &capture.bytes).unwrap();
    path
}

#[test]
fn pcap_source_reads_packets_and_lengths() {
    let path = mixed_capture();
    let mut source = PcapFileSource::open(&path).unwrap();

    let mut events = Vec::new();
    while let Some(event) = source.next_packet().unwrap() {
        events.push(event);
    }
    let _ = fs::remove_file(&path);

    assert_eq!(events.len(), 5);
    assert_eq!(events[0].linktype.0, 195);
    assert_eq!(events[1].linktype.0, 1);
    assert_eq!(events[0].ts, Some(TS_SECONDS as f64));
    assert!(!events[0].is_truncated());
    assert!(events[4].is_truncated());
    assert_eq!(events[4].captured.len(), 11);
    assert_eq!(events[4].original_len, ieee802154_frame().len());
}

#[test]
fn dump_decodes_every_protocol_in_a_capture() {
    let path = mixed_capture();
    let mut ctx = DecodeContext::default();
    let mut sink = TextSink::new();
    let summary = dump_pcap_file(&path, &mut ctx, &mut sink).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(
        summary,
        DumpSummary {
            packets: 5,
            decoded: 3,
            truncated: 1,
            malformed: 0,
            corrupt_records: 0,
            skipped: 1,
            hostnames: 1,
        }
    );
    let text = sink.as_str();
    assert!(text.starts_with("packet 1, 2023-11-14T22:13:20Z, length 17/17\n"));
    assert!(text.contains("  IEEE 802.15.4 Data frame (2006), length 17\n"));
    assert!(text.contains("(correct)"));
    assert!(text.contains("  00:11:22:33:44:55 > 01:80:c2:00:00:14\n"));
    assert!(text.contains("Hostname: core-1"));
    assert!(text.contains("  192.168.0.1:50000 > 192.168.0.2:1812\n"));
    assert!(text.contains("RADIUS, Access-Accept (2), id 0x11, length 26"));
    assert!(text.contains("value: welc"));
    assert!(text.contains("packet 4, 2023-11-14T22:13:20Z, length 54/54\n  not decoded\n"));
    assert!(text.contains("packet 5, 2023-11-14T22:13:20Z, length 11/17\n"));
    assert!(text.ends_with("[|truncated]\n"));
    assert_eq!(
        ctx.hostnames.lookup(&[0x19, 0x21, 0x68, 0x00, 0x10, 0x01]),
        Some("core-1")
    );
}

#[test]
fn legacy_pcap_with_raw_ip() {
    let payload = radius_message();
    let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64).udp(1813, 40000);
    let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
    builder.write(&mut packet, &payload).unwrap();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&65535u32.to_le_bytes());
    bytes.extend_from_slice(&101u32.to_le_bytes());
    bytes.extend_from_slice(&(TS_SECONDS as u32).to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&(packet.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(packet.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&packet);

    let path = temp_path("raw.pcap");
    fs::write(&path, &bytes).unwrap();
    let mut sink = TextSink::new();
    let summary = dump_pcap_file(&path, &mut DecodeContext::default(), &mut sink).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(summary.packets, 1);
    assert_eq!(summary.decoded, 1);
    assert!(sink.as_str().contains("10.0.0.1:1813 > 10.0.0.2:40000"));
}

#[test]
fn pcap_source_rejects_truncated_file() {
    let path = temp_path("truncated.pcapng");
    fs::write(&path, [0x0a, 0x0d, 0x0d]).unwrap();
    let err = match PcapFileSource::open(&path) {
        Ok(_) => panic!("expected truncated file to be rejected"),
        Err(err) => err,
    };
    let _ = fs::remove_file(&path);

    assert!(matches!(err, SourceError::Io(_)));
}
