use simraw_cli::commands::verify;
use simraw_core::test_utils::{stream_of, DatagramBuilder};
use std::fs;
use tempfile::tempdir;

/// Helper: valid sequential annotations
fn create_valid_datagrams(count: usize) -> Vec<u8> {
    let frames: Vec<Vec<u8>> = (0..count)
        .map(|i| {
            DatagramBuilder::new(b"TAG0")
                .payload(format!("annotation {}", i + 1).into_bytes())
                .build()
        })
        .collect();
    stream_of(&frames)
}

#[test]
fn test_verify_valid_file() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("valid.raw");
    fs::write(&input_path, create_valid_datagrams(5)).unwrap();

    let report = verify::check(input_path.to_str().unwrap()).unwrap();
    assert_eq!(report.datagrams, 5);
    assert!(report.is_clean());

    verify::execute(input_path.to_str().unwrap()).unwrap();
}

#[test]
fn test_verify_corrupted_datagram() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("corrupt.raw");

    let mut frames: Vec<Vec<u8>> = (0..4)
        .map(|i| {
            DatagramBuilder::new(b"TAG0")
                .payload(format!("annotation {}", i).into_bytes())
                .build()
        })
        .collect();
    frames[1] = DatagramBuilder::new(b"TAG0")
        .payload(b"annotation x".to_vec())
        .trailing_size(3)
        .build();
    fs::write(&input_path, stream_of(&frames)).unwrap();

    let report = verify::check(input_path.to_str().unwrap()).unwrap();
    assert_eq!(report.datagrams, 3);
    assert_eq!(report.resyncs, 1);
    assert!(!report.is_clean());

    verify::execute(input_path.to_str().unwrap()).unwrap();
}

#[test]
fn test_verify_truncated_file() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("truncated.raw");

    let mut data = create_valid_datagrams(3);
    data.truncate(data.len() - 2);
    fs::write(&input_path, &data).unwrap();

    let report = verify::check(input_path.to_str().unwrap()).unwrap();
    assert_eq!(report.datagrams, 2);
    assert!(report.truncated_tail);
    assert!(!report.is_clean());
}

#[test]
fn test_verify_empty_file() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("empty.raw");
    fs::write(&input_path, b"").unwrap();

    let report = verify::check(input_path.to_str().unwrap()).unwrap();
    assert_eq!(report.datagrams, 0);

    // Should report no datagrams without failing
    verify::execute(input_path.to_str().unwrap()).unwrap();
}
