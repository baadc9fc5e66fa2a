//! Fuzzing harnesses for simraw-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_read

use simraw_core::{DatagramReader, ReaderConfig};
use std::io::{Cursor, SeekFrom};

/// Read every datagram forward, then walk back to the start
pub fn fuzz_read(data: &[u8]) {
    let mut reader = DatagramReader::new(Cursor::new(data), ReaderConfig::default());

    // Should never panic, whatever the bytes
    let read = reader.iterate().filter(Result::is_ok).count();
    while reader.skip_back().is_ok() {}

    // Each successful forward step consumes at least one minimal frame
    assert!(read <= data.len() / 20);
}

/// Peek, skip and seek in the order a header browser would
pub fn fuzz_navigate(data: &[u8]) {
    let mut reader = DatagramReader::new(Cursor::new(data), ReaderConfig::default());

    let _ = reader.peek(false);
    if let Ok(header) = reader.get_header() {
        let _ = reader.skip_with_header(&header);
    }
    let _ = reader.datagram_seek(SeekFrom::End(0));
    let _ = reader.datagram_seek(SeekFrom::Current(-1));
    let _ = reader.read_prev();
}

/// Scan for recoverable datagrams
pub fn fuzz_scan(data: &[u8]) {
    use simraw_core::scanner::scan_bytes;

    // Try to scan - should never panic
    let _ = scan_bytes(data);
}
