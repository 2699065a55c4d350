/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::{
    *,
    super::{
        TICKS_PER_MS,
        config::{DecodeOptions, ScreenSize, TruncationPolicy},
        finding::Issue,
    },
};
use std::io::Cursor;
use rand::{thread_rng, Rng};

fn header_bytes(ticks: u32, code: u8, size: u16) -> Vec<u8> {

    let mut bytes = vec![b'P', b'G'];

    bytes.extend_from_slice(&ticks.to_be_bytes());
    bytes.extend_from_slice(&ticks.to_be_bytes());
    bytes.push(code);
    bytes.extend_from_slice(&size.to_be_bytes());

    bytes
}

fn raw(code: u8, payload: Vec<u8>) -> RawSegment {
    RawSegment {
        header: SegmentHeader {
            pts: 0,
            dts: 0,
            code,
            size: payload.len() as u16,
        },
        payload,
    }
}

fn encode(segment: &Segment) -> RawSegment {

    let mut buffer = Vec::<u8>::new();

    buffer.write_segment(segment).unwrap();

    Cursor::new(buffer).read_raw_segment().unwrap().unwrap()
}

fn decode(raw: &RawSegment, policy: TruncationPolicy) -> (ReadResult<Segment>, Vec<Issue>) {

    let mut issues = vec![];
    let options = DecodeOptions::new().with_truncated_lists(policy);
    let result = raw.decode(None, &options, &mut issues);

    (result, issues)
}

fn pcs_payload(state: u8, count: u8, objects: &[u8]) -> Vec<u8> {

    let mut payload = vec![0x07, 0x80, 0x04, 0x38, 0x10, 0x00, 0x01, state, 0x00, 0x00, count];

    payload.extend_from_slice(objects);

    payload
}

#[test]
fn test_header_ticks_to_ms() {

    let mut bytes = header_bytes(90_000, 0x16, 11);

    bytes.extend_from_slice(&pcs_payload(0x80, 0, &[]));

    let raw = Cursor::new(bytes).read_raw_segment().unwrap().unwrap();

    assert_eq!(raw.header.pts, 1_000);
    assert_eq!(raw.header.dts, 1_000);
    assert_eq!(raw.header.kind(), Some(SegmentKind::PresentationComposition));
    assert_eq!(raw.payload.len(), 11);
}

#[test]
fn test_header_truncates_partial_ms() {

    let header = parse_header(&header_bytes(179, 0x80, 0).try_into().unwrap()).unwrap();

    assert_eq!(header.pts, 1);
}

#[test]
fn test_malformed_header() {

    let mut bytes = header_bytes(0, 0x80, 0);

    bytes[1] = b'X';

    assert!(matches!(
        Cursor::new(bytes).read_raw_segment(),
        Err(ReadError::MalformedHeader)
    ));
}

#[test]
fn test_empty_stream() {
    assert!(Cursor::new(Vec::<u8>::new()).read_raw_segment().unwrap().is_none());
}

#[test]
fn test_truncated_header() {
    assert!(matches!(
        Cursor::new(vec![b'P', b'G', 0x00, 0x00]).read_segment_header(),
        Err(ReadError::TruncatedHeader { length: 4 })
    ));
}

#[test]
fn test_zero_size_is_end_and_consumes_nothing() {

    let mut bytes = header_bytes(0, 0x16, 0);

    bytes.extend_from_slice(&header_bytes(90, 0x80, 0));

    let mut input = Cursor::new(bytes);
    let first = input.read_raw_segment().unwrap().unwrap();
    let second = input.read_raw_segment().unwrap().unwrap();

    assert_eq!(first.header.kind(), Some(SegmentKind::End));
    assert!(first.payload.is_empty());
    assert_eq!(second.header.pts, 1);
    assert_eq!(second.header.kind(), Some(SegmentKind::End));
    assert!(input.read_raw_segment().unwrap().is_none());

    let (result, issues) = decode(&first, TruncationPolicy::Degrade);

    assert_eq!(result.unwrap().body, SegmentBody::End);
    assert!(issues.is_empty());
}

#[test]
fn test_truncated_payload() {

    let mut bytes = header_bytes(0, 0x14, 10);

    bytes.extend_from_slice(&[0x00, 0x00, 0x01]);

    let raw = Cursor::new(bytes).read_raw_segment().unwrap().unwrap();

    assert!(raw.is_truncated());
    assert_eq!(raw.payload.len(), 3);
}

#[test]
fn test_unsupported_type() {

    let (result, _) = decode(&raw(0x42, vec![0x00]), TruncationPolicy::Degrade);

    assert!(matches!(result, Err(ReadError::UnsupportedSegmentType(0x42))));
}

#[test]
fn test_end_with_payload() {

    let (result, issues) = decode(&raw(0x80, vec![0x00, 0x00]), TruncationPolicy::Degrade);

    assert_eq!(result.unwrap().body, SegmentBody::End);
    assert_eq!(issues, vec![Issue::EndWithPayload { size: 2 }]);
}

#[test]
fn test_pcs_cycle() {

    let mut rng = thread_rng();
    let states = [0x00, 0x40, 0x80];
    let segment = Segment {
        pts: rng.gen_range(0..=u32::MAX / TICKS_PER_MS),
        dts: rng.gen_range(0..=u32::MAX / TICKS_PER_MS),
        body: SegmentBody::PresentationComposition(
            PresentationComposition {
                width: rng.gen(),
                height: rng.gen(),
                frame_rate: rng.gen(),
                composition_number: rng.gen(),
                composition_state: CompositionState::from_byte(states[rng.gen_range(0..3)]),
                palette_update: rng.gen(),
                palette_id: rng.gen(),
                composition_objects: vec![
                    CompositionObject {
                        object_id: rng.gen(),
                        window_id: rng.gen(),
                        x: rng.gen(),
                        y: rng.gen(),
                        crop: None,
                    },
                    CompositionObject {
                        object_id: rng.gen(),
                        window_id: rng.gen(),
                        x: rng.gen(),
                        y: rng.gen(),
                        crop: Some(
                            Crop {
                                x: rng.gen(),
                                y: rng.gen(),
                                width: rng.gen(),
                                height: rng.gen(),
                            }
                        ),
                    },
                ],
            }
        ),
    };
    let (result, issues) = decode(&encode(&segment), TruncationPolicy::Degrade);

    assert_eq!(result.unwrap(), segment);
    assert!(issues.is_empty());
}

#[test]
fn test_pcs_epoch_states() {

    let (result, _) = decode(&raw(0x16, pcs_payload(0x80, 0, &[])), TruncationPolicy::Degrade);

    match result.unwrap().body {
        SegmentBody::PresentationComposition(pcs) => {
            assert_eq!(pcs.width, 1920);
            assert_eq!(pcs.height, 1080);
            assert_eq!(pcs.composition_state, CompositionState::EpochStart);
        }
        _ => panic!("not a composition"),
    }
}

#[test]
fn test_pcs_too_short() {

    let (result, _) = decode(&raw(0x16, vec![0x00; 10]), TruncationPolicy::Degrade);

    assert!(matches!(result, Err(ReadError::TruncatedComposition { length: 10 })));
}

#[test]
fn test_pcs_truncated_crop() {

    let object = [0x00, 0x01, 0x00, 0x40, 0x00, 0x10, 0x00, 0x20, 0x00, 0x00];
    let mut issues = vec![];
    let pcs = parse_pcs(&pcs_payload(0x80, 1, &object), TruncationPolicy::Degrade, &mut issues)
        .unwrap();

    assert_eq!(
        pcs.composition_objects,
        vec![
            CompositionObject {
                object_id: 1,
                window_id: 0,
                x: 0x10,
                y: 0x20,
                crop: Some(Crop::default()),
            },
        ],
    );
    assert_eq!(issues, vec![Issue::TruncatedCrop { object_id: 1 }]);
}

#[test]
fn test_pcs_truncated_list_degrades() {

    let object = [0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x00, 0x20, 0x00, 0x02];
    let mut issues = vec![];
    let pcs = parse_pcs(&pcs_payload(0x80, 2, &object), TruncationPolicy::Degrade, &mut issues)
        .unwrap();

    assert_eq!(pcs.composition_objects.len(), 1);
    assert_eq!(pcs.composition_objects[0].object_id, 1);
    assert_eq!(issues, vec![Issue::TruncatedCompositionObjects { expected: 2, read: 1 }]);
}

#[test]
fn test_pcs_truncated_list_rejected() {

    let object = [0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x00, 0x20];
    let mut issues = vec![];

    assert!(matches!(
        parse_pcs(&pcs_payload(0x80, 2, &object), TruncationPolicy::Reject, &mut issues),
        Err(ReadError::TruncatedCompositionObjects { expected: 2, read: 1 })
    ));
}

#[test]
fn test_wds_bounds() {

    let windows = vec![
        Window { id: 0, x: 10, y: 10, width: 100, height: 50 },
        Window { id: 1, x: 700, y: 0, width: 100, height: 10 },
        Window { id: 2, x: 800, y: 0, width: 10, height: 10 },
        Window { id: 3, x: 0, y: 0, width: 0, height: 10 },
    ];
    let segment = Segment {
        pts: 0,
        dts: 0,
        body: SegmentBody::WindowDefinition(windows.clone()),
    };
    let raw = encode(&segment);
    let mut issues = vec![];
    let screen = ScreenSize::new(720, 480);
    let decoded = parse_wds(&raw.payload, screen, TruncationPolicy::Degrade, &mut issues).unwrap();

    assert_eq!(decoded, windows);
    assert_eq!(
        issues,
        vec![
            Issue::WindowExceedsScreen { id: 1, screen_width: 720, screen_height: 480 },
            Issue::WindowOutsideScreen { id: 2, x: 800, y: 0, screen_width: 720, screen_height: 480 },
            Issue::ZeroSizedWindow { id: 3, width: 0, height: 10 },
        ],
    );
}

#[test]
fn test_wds_truncated_list() {

    let payload = vec![3, 0, 0, 0, 0, 0, 0, 10, 0, 10, 1, 2, 3, 4];
    let mut issues = vec![];
    let windows = parse_wds(&payload, ScreenSize::HD, TruncationPolicy::Degrade, &mut issues)
        .unwrap();

    assert_eq!(windows, vec![Window { id: 0, x: 0, y: 0, width: 10, height: 10 }]);
    assert_eq!(issues, vec![Issue::TruncatedWindows { expected: 3, read: 1 }]);

    assert!(matches!(
        parse_wds(&payload, ScreenSize::HD, TruncationPolicy::Reject, &mut vec![]),
        Err(ReadError::TruncatedWindows { expected: 3, read: 1 })
    ));
}

#[test]
fn test_wds_missing_count() {
    assert!(matches!(
        parse_wds(&[], ScreenSize::HD, TruncationPolicy::Degrade, &mut vec![]),
        Err(ReadError::MissingWindowCount)
    ));
}

#[test]
fn test_pds_single_entry() {

    let palette = parse_pds(&[1, 2, 0x00, 10, 20, 30, 40]).unwrap();

    assert_eq!(palette.id, 1);
    assert_eq!(palette.version, 2);
    assert_eq!(palette.defined, 1);
    assert_eq!(palette.entries[0], PaletteEntry { y: 10, cr: 20, cb: 30, alpha: 40 });
    assert_eq!(palette.entries[1], PaletteEntry::default());
}

#[test]
fn test_pds_sparse_and_overwritten() {

    let palette = parse_pds(&[0, 0, 200, 9, 9, 9, 9, 5, 1, 1, 1, 1, 5, 2, 2, 2, 2]).unwrap();

    assert_eq!(palette.defined, 3);
    assert_eq!(palette.get(5), PaletteEntry { y: 2, cr: 2, cb: 2, alpha: 2 });
    assert_eq!(palette.get(200), PaletteEntry { y: 9, cr: 9, cb: 9, alpha: 9 });
    assert_eq!(palette.get(4), PaletteEntry::default());
}

#[test]
fn test_pds_zeroed_entry_cycle() {

    let mut palette = Palette::new(3, 1);

    palette.set(0, PaletteEntry::default());
    palette.set(7, PaletteEntry { y: 235, cr: 128, cb: 128, alpha: 255 });

    let segment = Segment {
        pts: 0,
        dts: 0,
        body: SegmentBody::PaletteDefinition(palette.clone()),
    };
    let raw = encode(&segment);

    assert_eq!(raw.payload.len(), 2 + 2 * 5);

    let decoded = parse_pds(&raw.payload).unwrap();

    assert_eq!(decoded, palette);
    assert_eq!(decoded.defined, 2);
    assert!(decoded.is_defined(0));
    assert!(!decoded.is_defined(1));
}

#[test]
fn test_pds_truncated() {
    assert!(matches!(
        parse_pds(&[1, 2, 0x00, 10, 20]),
        Err(ReadError::TruncatedPalette { length: 5 })
    ));
    assert!(matches!(parse_pds(&[1]), Err(ReadError::TruncatedPalette { length: 1 })));
}

#[test]
fn test_pds_cycle() {

    let mut rng = thread_rng();
    let mut palette = Palette::new(rng.gen(), rng.gen());

    for id in 0..=255_u8 {
        palette.set(
            id,
            PaletteEntry {
                y: rng.gen_range(1..=255),
                cr: rng.gen(),
                cb: rng.gen(),
                alpha: rng.gen(),
            },
        );
    }

    let segment = Segment {
        pts: 0,
        dts: 0,
        body: SegmentBody::PaletteDefinition(palette),
    };
    let (result, _) = decode(&encode(&segment), TruncationPolicy::Degrade);

    assert_eq!(result.unwrap(), segment);
}

#[test]
fn test_ods_first_fragment() {

    let fragment = ObjectDefinition {
        id: 7,
        version: 1,
        sequence: Sequence::Single,
        length: 7,
        width: 2,
        height: 1,
        data: vec![0x01, 0x02, 0x00],
    };
    let segment = Segment {
        pts: 0,
        dts: 0,
        body: SegmentBody::ObjectDefinition(fragment),
    };
    let (result, issues) = decode(&encode(&segment), TruncationPolicy::Degrade);

    assert_eq!(result.unwrap(), segment);
    assert!(issues.is_empty());
}

#[test]
fn test_ods_continuation() {

    let ods = parse_ods(&[0x00, 0x07, 0x01, 0x40, 0x09, 0x09], None, &mut vec![])
        .unwrap();

    assert_eq!(ods.id, 7);
    assert_eq!(ods.sequence, Sequence::Last);
    assert_eq!(ods.length, 0);
    assert_eq!(ods.data, vec![0x09, 0x09]);
    assert_eq!(ods.contributed_length(), 2);
}

#[test]
fn test_ods_truncated() {
    assert!(matches!(
        parse_ods(&[0x00, 0x07, 0x00], None, &mut vec![]),
        Err(ReadError::TruncatedObject { length: 3 })
    ));
    assert!(matches!(
        parse_ods(&[0x00, 0x07, 0x00, 0x80, 0x00, 0x00, 0x05], None, &mut vec![]),
        Err(ReadError::TruncatedFirstObject { id: 7, length: 7 })
    ));
}

#[test]
fn test_ods_dimension_findings() {

    let mut issues = vec![];
    let zero = [0x00, 0x01, 0x00, 0xC0, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x05];

    parse_ods(&zero, Some(ScreenSize::HD), &mut issues).unwrap();

    let wide = [0x00, 0x02, 0x00, 0xC0, 0x00, 0x00, 0x04, 0x07, 0xD0, 0x00, 0x05];

    parse_ods(&wide, Some(ScreenSize::HD), &mut issues).unwrap();

    assert_eq!(
        issues,
        vec![
            Issue::ZeroSizedObject { id: 1, width: 0, height: 5 },
            Issue::ObjectExceedsScreen {
                id: 2,
                width: 2000,
                height: 5,
                screen_width: 1920,
                screen_height: 1080,
            },
        ],
    );

    let mut unchecked = vec![];

    parse_ods(&wide, None, &mut unchecked).unwrap();

    assert!(unchecked.is_empty());
}

#[test]
fn test_write_too_many_windows() {

    let segment = Segment {
        pts: 0,
        dts: 0,
        body: SegmentBody::WindowDefinition(vec![Window::default(); 256]),
    };

    assert!(matches!(
        Vec::<u8>::new().write_segment(&segment),
        Err(WriteError::TooManyWindowDefinitions)
    ));
}
