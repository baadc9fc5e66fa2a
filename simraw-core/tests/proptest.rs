//! Property-based tests using proptest

mod common;

use common::{encode_datagram, nmea};
use proptest::prelude::*;
use simraw_core::{scanner::scan_bytes, DatagramReader, ReaderConfig};
use std::io::{Cursor, SeekFrom};

fn reader(data: Vec<u8>) -> DatagramReader<Cursor<Vec<u8>>> {
    DatagramReader::new(Cursor::new(data), ReaderConfig::default())
}

proptest! {
    #[test]
    fn prop_round_trip_size_and_bytes_read(
        ticks in any::<u64>(),
        payload in prop::collection::vec(any::<u8>(), 4..1024)
    ) {
        let frame = encode_datagram(b"BOT1", ticks, &payload);
        let mut r = reader(frame.clone());

        let d = r.read_next().unwrap().into_datagram().unwrap();
        prop_assert_eq!(d.size, payload.len() as u64);
        prop_assert_eq!(d.bytes_read, d.size + 20);
        prop_assert_eq!(d.bytes_read, frame.len() as u64);
        prop_assert_eq!(r.tell(), 1);
    }

    #[test]
    fn prop_peek_is_idempotent(
        lens in prop::collection::vec(0usize..300, 1..8),
        skip in 0usize..8
    ) {
        let frames: Vec<Vec<u8>> = lens
            .iter()
            .map(|&n| encode_datagram(b"RAW3", n as u64, &vec![0u8; 128 + n]))
            .collect();
        let count = frames.len();
        let mut r = reader(frames.concat());
        for _ in 0..skip.min(count - 1) {
            r.skip().unwrap();
        }

        let before = r.position();
        let first = r.peek(false).unwrap();
        for _ in 0..3 {
            prop_assert_eq!(&r.peek(false).unwrap(), &first);
            prop_assert_eq!(r.position(), before);
        }
    }

    #[test]
    fn prop_seek_lands_on_frame_offsets(
        lens in prop::collection::vec(4usize..200, 1..12)
    ) {
        let frames: Vec<Vec<u8>> = lens
            .iter()
            .map(|&n| encode_datagram(b"DEP0", 0, &vec![0x20; n]))
            .collect();
        let mut offsets = vec![0u64];
        for f in &frames {
            let next = offsets[offsets.len() - 1] + f.len() as u64;
            offsets.push(next);
        }
        let mut r = reader(frames.concat());

        for k in (0..=frames.len()).rev() {
            prop_assert_eq!(r.datagram_seek(SeekFrom::Start(k as u64)).unwrap(), k as u64);
            prop_assert_eq!(r.byte_offset(), offsets[k]);
        }

        let back = frames.len() as i64;
        prop_assert_eq!(r.datagram_seek(SeekFrom::End(-back)).unwrap(), 0);
        prop_assert_eq!(r.byte_offset(), 0);
    }

    #[test]
    fn prop_forward_reads_are_monotonic(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        frames in prop::collection::vec(4usize..64, 0..6)
    ) {
        // Valid frames behind random bytes, so some reads succeed after recovery
        let mut stream = data;
        for n in frames {
            stream.extend(encode_datagram(b"MRU0", 0, &vec![0x55; n]));
        }
        let mut r = reader(stream);

        let mut last = r.position();
        while r.read_next().is_ok() {
            let now = r.position();
            prop_assert_eq!(now.datagram_index, last.datagram_index + 1);
            prop_assert!(now.byte_offset >= last.byte_offset + 20);
            last = now;
        }
    }

    #[test]
    fn prop_reader_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let mut r = reader(data);
        // Should either yield records or stop, never panic
        let _ = r.iterate().take(4096).count();
        let _ = r.total_count();
        let _ = r.skip_back();
    }

    #[test]
    fn prop_scan_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..8192)
    ) {
        let _ = scan_bytes(&data);
    }

    #[test]
    fn prop_corrupted_stream_keeps_intact_prefix(
        num_frames in 2usize..10,
        corruption_len in 10usize..100
    ) {
        let mut stream = Vec::new();
        for i in 0..num_frames {
            stream.extend(nmea(&format!("$GPTXT,frame {}", i)));
        }

        // Add corruption in the middle
        let corrupt_pos = stream.len() / 2;
        stream.splice(corrupt_pos..corrupt_pos, vec![0xFF; corruption_len]);

        // Every frame ahead of the damage survives
        let located = scan_bytes(&stream);
        prop_assert!(located.len() >= num_frames / 2);
        prop_assert_eq!(located[0].offset, 0);
    }
}
