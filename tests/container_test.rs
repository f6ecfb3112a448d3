//! Container files produced by the pipeline: structure and corruption.

mod common;

use common::*;
use ctif::{ContainerReader, CtifError, FrameStorage, Pipeline, StoragePolicy};
use pretty_assertions::assert_eq;

fn encoded_clip() -> Vec<u8> {
    Pipeline::new(dual_config(StoragePolicy::Delta))
        .unwrap()
        .encode(clip(8, 8))
        .unwrap()
}

fn expect_corrupt(bytes: &[u8]) -> (usize, String) {
    match ContainerReader::parse(bytes) {
        Err(CtifError::CorruptContainer { offset, reason }) => (offset, reason),
        other => panic!("Expected CorruptContainer, got {other:?}"),
    }
}

#[test]
fn test_header_layout() {
    let bytes = encoded_clip();
    let container = assert_valid_container(&bytes);

    assert_eq!(bytes[4], 1, "version");
    assert_eq!(&bytes[5..9], &[8, 0, 8, 0], "little-endian width and height");
    assert_eq!(&bytes[9..12], &[2, 4, 1], "cell width, height and mode");
    assert_eq!(&bytes[12..14], &[16, 0], "palette size");

    let count_offset = 14 + 16 * 3;
    let count = u32::from_le_bytes(bytes[count_offset..count_offset + 4].try_into().unwrap());
    assert_eq!(count as usize, container.frame_count());
    assert_eq!(count, 5);
}

#[test]
fn test_still_frames_stored_as_deltas() {
    let container = assert_valid_container(&encoded_clip());
    let storages: Vec<FrameStorage> = container.frames.iter().map(|f| f.storage).collect();

    assert!(!storages[0].is_delta(), "first frame cannot be a delta");
    assert_eq!(storages[2], FrameStorage::DeltaRle);
    assert_eq!(storages[3], FrameStorage::DeltaRle);
    assert_eq!(container.frames[2].cells, container.frames[1].cells);
    assert_eq!(container.frames[3].cells, container.frames[1].cells);
}

#[test]
fn test_full_storage_never_uses_deltas() {
    let bytes = Pipeline::new(dual_config(StoragePolicy::Full))
        .unwrap()
        .encode(clip(8, 8))
        .unwrap();
    let container = assert_valid_container(&bytes);
    assert!(container
        .frames
        .iter()
        .all(|f| f.storage == FrameStorage::Raw));
}

#[test]
fn test_every_truncation_is_rejected() {
    let bytes = encoded_clip();
    for len in 0..bytes.len() {
        let (offset, _) = expect_corrupt(&bytes[..len]);
        assert!(offset <= len, "offset {offset} past end of {len}-byte input");
    }
}

#[test]
fn test_trailing_garbage_is_rejected() {
    let mut bytes = encoded_clip();
    let end = bytes.len();
    bytes.push(0);
    let (offset, _) = expect_corrupt(&bytes);
    assert_eq!(offset, end);
}

#[test]
fn test_frame_count_must_match_records() {
    let bytes = encoded_clip();
    let count_offset = 14 + 16 * 3;

    let mut more = bytes.clone();
    more[count_offset] = 6;
    expect_corrupt(&more);

    let mut fewer = bytes;
    fewer[count_offset] = 4;
    expect_corrupt(&fewer);
}

#[test]
fn test_error_message_names_offset() {
    let mut bytes = encoded_clip();
    bytes[0] = b'G';
    let err = ContainerReader::parse(&bytes).unwrap_err();
    assert_eq!(err.to_string(), "Corrupt container at byte 0: bad magic");
}
