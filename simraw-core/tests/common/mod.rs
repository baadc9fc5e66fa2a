//! Shared fixtures for integration tests

#![allow(dead_code)]

/// Encode one datagram: `[size][tag][time low][time high][payload][size]`
pub fn encode_datagram(tag: &[u8; 4], ticks: u64, payload: &[u8]) -> Vec<u8> {
    let size = (12 + payload.len()) as i32;
    let mut out = Vec::with_capacity(payload.len() + 20);
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(&(ticks as u32).to_le_bytes());
    out.extend_from_slice(&((ticks >> 32) as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&size.to_le_bytes());
    out
}

/// NMEA datagram carrying `sentence`
pub fn nmea(sentence: &str) -> Vec<u8> {
    encode_datagram(b"NME0", 132_223_104_000_000_000, sentence.as_bytes())
}

/// RAW3 datagram with a NUL-padded channel id and `samples` zero bytes
pub fn raw3(channel_id: &str, samples: usize) -> Vec<u8> {
    let mut payload = vec![0u8; 128];
    payload[..channel_id.len()].copy_from_slice(channel_id.as_bytes());
    payload.extend(std::iter::repeat(0u8).take(samples));
    encode_datagram(b"RAW3", 132_223_104_000_000_000, &payload)
}

/// A survey-like stream: configuration, then alternating pings and positions
pub fn survey(pings: usize) -> Vec<u8> {
    let mut stream = encode_datagram(b"CON0", 0, &[0x01; 64]);
    for i in 0..pings {
        stream.extend(raw3("WBT 545612-15 ES38-7", 40 + i));
        stream.extend(nmea(&format!("$GPGLL,5958.{:04},N,01044.0,E", i)));
    }
    stream
}
