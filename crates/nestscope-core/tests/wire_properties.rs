use nestscope_core::wire::{
    ByteFold, Crc16Kermit, Cursor, DecodeError, DispatchTable, Entry, Records, TLV8, Tlv,
    WalkEnd, walk,
};
use nestscope_core::{Sink, TextSink};

/// Sub-records seen by the test decoders, in visit order.
#[derive(Default)]
struct Visits {
    inner: Vec<(u32, Vec<u8>)>,
}

fn container(body: &mut Cursor<'_>, visits: &mut Visits, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    let records = Records::new(body.take_cursor(body.remaining_claimed())?, TLV8);
    walk(records, sink, |record, sink| {
        let mut inner = record.body;
        let bytes = inner.take_rest()?;
        visits.inner.push((record.type_code, bytes.to_vec()));
        sink.field("bytes", &bytes.len());
        Ok(())
    })?;
    Ok(())
}

fn strict_pair(body: &mut Cursor<'_>, _: &mut Visits, sink: &mut dyn Sink) -> Result<(), DecodeError> {
    body.expect_len(2, "pair length is not 2")?;
    sink.field("pair", &body.read_u16_be()?);
    Ok(())
}

static OUTER: DispatchTable<Visits> = DispatchTable::new(
    "test-outer",
    &[
        Entry::decoded(1, "Container", container),
        Entry::decoded(2, "Pair", strict_pair),
        Entry::named(3, "Reserved"),
    ],
);

fn walk_outer(data: &[u8], visits: &mut Visits, sink: &mut dyn Sink) -> (Result<WalkEnd, DecodeError>, usize) {
    let mut records = Records::new(Cursor::from_slice(data), TLV8);
    let mut count = 0;
    let end = loop {
        match records.next() {
            Some(Ok(record)) => {
                count += 1;
                if let Err(err) = OUTER.dispatch(record, visits, sink) {
                    break Err(err);
                }
            }
            Some(Err(err)) => break Err(err),
            None => break Ok(records.end().unwrap_or(WalkEnd::Done)),
        }
    };
    (end, count)
}

#[test]
fn sign_extension_of_three_byte_reads() {
    for (bytes, expected) in [
        ([0x7f, 0xff, 0xff], 8_388_607i64),
        ([0x80, 0x00, 0x00], -8_388_608),
        ([0xff, 0xff, 0xff], -1),
    ] {
        let mut cursor = Cursor::from_slice(&bytes);
        assert_eq!(cursor.read_sint_be(3).unwrap(), expected);
        assert!(cursor.is_empty());
    }
}

#[test]
fn sign_extension_of_odd_widths() {
    let bytes = [0x80, 0, 0, 0, 0, 0, 0];
    for width in [5usize, 6, 7] {
        let mut cursor = Cursor::from_slice(&bytes[..width]);
        let expected = -(1i64 << (width * 8 - 1));
        assert_eq!(cursor.read_sint_be(width).unwrap(), expected, "width {width}");
    }
}

#[test]
fn two_level_stream_round_trips() {
    let data = [1, 10, 7, 3, 0xa1, 0xa2, 0xa3, 8, 3, 0xb1, 0xb2, 0xb3];
    let mut outer = Cursor::from_slice(&data);
    let mut visits = Visits::default();
    let mut sink = TextSink::new();

    let record = nestscope_core::wire::read_record(&mut outer, &TLV8, None).unwrap();
    assert_eq!(record.declared_length, 10);
    OUTER.dispatch(record, &mut visits, &mut sink).unwrap();

    assert_eq!(outer.offset(), 12);
    assert!(outer.is_empty());
    assert_eq!(
        visits.inner,
        vec![(7, vec![0xa1, 0xa2, 0xa3]), (8, vec![0xb1, 0xb2, 0xb3])]
    );
    assert_eq!(
        sink.as_str(),
        "Container (1), length 10\n  bytes: 3\n  bytes: 3\n"
    );
}

#[test]
fn inner_overrun_is_rejected_inside_the_container() {
    let data = [1, 10, 7, 9, 0xa1, 0xa2, 0xa3, 8, 3, 0xb1, 0xb2, 0xb3, 2, 2, 0, 5];
    let mut visits = Visits::default();
    let mut sink = TextSink::new();

    let (end, count) = walk_outer(&data, &mut visits, &mut sink);

    // The container is marked corrupt and its sibling still decodes.
    assert_eq!(end, Ok(WalkEnd::Done));
    assert_eq!(count, 2);
    assert!(visits.inner.is_empty());
    assert!(sink.as_str().contains("[corrupt: record length exceeds envelope]"));
    assert!(sink.as_str().contains("pair: 5"));
}

#[test]
fn overrun_is_detected_before_the_child_is_read() {
    let data = [7, 9, 0xa1, 0xa2, 0xa3, 8, 3, 0xb1, 0xb2, 0xb3];
    let mut records = Records::new(Cursor::from_slice(&data), TLV8);
    let err = records.next().unwrap().unwrap_err();
    assert_eq!(
        err,
        DecodeError::Malformed {
            offset: 0,
            reason: "record length exceeds envelope"
        }
    );
    assert!(records.next().is_none());
}

#[test]
fn unknown_type_passes_through() {
    let data = [99, 4, 0xde, 0xad, 0xbe, 0xef, 2, 2, 0x01, 0x02];
    let mut visits = Visits::default();
    let mut sink = TextSink::new();

    let (end, count) = walk_outer(&data, &mut visits, &mut sink);

    assert_eq!(end, Ok(WalkEnd::Done));
    assert_eq!(count, 2);
    assert_eq!(
        sink.as_str(),
        "Unknown (99), length 4\n  0x0000:  dead beef\nPair (2), length 2\n  pair: 258\n"
    );
}

#[test]
fn named_type_without_decoder_is_dumped() {
    let data = [3, 1, 0x5a];
    let (end, _) = walk_outer(&data, &mut Visits::default(), &mut TextSink::new());
    assert_eq!(end, Ok(WalkEnd::Done));
    assert!(OUTER.is_handled(1));
    assert!(!OUTER.is_handled(3));
    assert_eq!(OUTER.name_of(3), "Reserved");
}

#[test]
fn malformed_sibling_is_skipped_by_its_length() {
    let data = [2, 3, 0, 0, 0, 2, 2, 0, 9];
    let mut sink = TextSink::new();
    let (end, count) = walk_outer(&data, &mut Visits::default(), &mut sink);
    assert_eq!(end, Ok(WalkEnd::Done));
    assert_eq!(count, 2);
    assert!(sink.as_str().contains("[corrupt: pair length is not 2]"));
    assert!(sink.as_str().contains("pair: 9"));
}

#[test]
fn trailing_bytes_end_the_walk() {
    let data = [2, 2, 0, 1, 0xff];
    let mut sink = TextSink::new();
    let (end, count) = walk_outer(&data, &mut Visits::default(), &mut sink);
    assert_eq!(end, Ok(WalkEnd::TrailingBytes(1)));
    assert_eq!(count, 1);
}

#[test]
fn zero_length_records_still_terminate() {
    let data = [5u8, 0].repeat(500);
    let records = Records::new(Cursor::from_slice(&data), TLV8);
    let mut visited = 0;
    let summary = walk(records, &mut TextSink::new(), |_, _| {
        visited += 1;
        Ok(())
    })
    .unwrap();
    assert_eq!(visited, 500);
    assert_eq!(summary.end, WalkEnd::Done);
}

#[test]
fn length_below_header_is_malformed() {
    let format = Tlv::new(1, 1, nestscope_core::wire::Endian::Big).including_header();
    let data = [1u8, 0, 1, 0, 1, 0];
    let mut records = Records::new(Cursor::from_slice(&data), format);
    assert!(records.next().unwrap().unwrap_err().is_malformed());
    assert!(records.next().is_none());
}

#[test]
fn child_never_claims_more_than_parent() {
    let data = [0u8; 16];
    let parent = Cursor::new(&data, 16, 16).advance(4).unwrap();
    let child = parent.sub_cursor(8).unwrap();
    assert!(child.remaining_claimed() <= parent.remaining_claimed());
    let grandchild = child.sub_cursor(8).unwrap();
    assert_eq!(grandchild.remaining_claimed(), 8);
    assert!(child.sub_cursor(9).unwrap_err().is_malformed());
    assert!(parent.sub_cursor(13).unwrap_err().is_malformed());
}

#[test]
fn crc_tap_matches_reference_despite_corrupt_record() {
    // The middle record is malformed for its decoder but has a valid length.
    let data = [2, 2, 0x12, 0x34, 2, 3, 1, 2, 3, 2, 2, 0x56, 0x78];
    let mut crc = Crc16Kermit::new();
    let mut sink = TextSink::new();
    let mut visits = Visits::default();
    let records = Records::new(Cursor::from_slice(&data), TLV8).with_tap(&mut crc);
    let summary = walk(records, &mut sink, |record, sink| {
        OUTER.dispatch(record, &mut visits, sink)
    })
    .unwrap();

    assert_eq!(summary.records, 3);
    assert!(sink.as_str().contains("[corrupt: pair length is not 2]"));
    assert_eq!(crc.value(), Crc16Kermit::checksum(&data));
}

#[test]
fn crc_tap_covers_bytes_up_to_the_failure() {
    let data = [2, 2, 0x12, 0x34, 2, 9, 1, 2, 3];
    let mut crc = Crc16Kermit::new();
    let records = Records::new(Cursor::from_slice(&data), TLV8).with_tap(&mut crc);
    let err = walk(records, &mut TextSink::new(), |_, _| Ok(())).unwrap_err();
    assert!(err.is_malformed());

    let mut reference = Crc16Kermit::new();
    reference.update(&data[..6]);
    assert_eq!(crc.value(), reference.value());
}

#[test]
fn crc_check_value() {
    assert_eq!(Crc16Kermit::checksum(b"123456789"), 0x2189);
}
