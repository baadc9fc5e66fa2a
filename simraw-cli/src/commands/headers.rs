use super::open_reader;
use anyhow::{Context, Result};
use serde::Serialize;
use simraw_core::{DatagramError, ReaderConfig};
use tracing::{info, warn};

/// One row of header output
#[derive(Debug, Clone, Serialize)]
pub struct HeaderRow {
    pub index: u64,
    pub offset: u64,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub timestamp: String,
    pub size: i32,
    pub channel: Option<String>,
}

/// Read headers without decoding payloads, up to `limit` datagrams
pub fn collect(input: &str, limit: Option<usize>) -> Result<Vec<HeaderRow>> {
    let mut reader = open_reader(input, ReaderConfig::default())?;
    let mut rows = Vec::new();

    while limit.map_or(true, |n| rows.len() < n) {
        let offset = reader.byte_offset();
        let index = reader.tell();
        let header = match reader.get_header() {
            Ok(h) => h,
            Err(DatagramError::EndOfStream) => break,
            Err(e) => return Err(e).context("Failed to read datagram header"),
        };

        let located = match reader.skip_located_with_header(&header) {
            Ok(located) => located,
            Err(DatagramError::EndOfStream) => break,
            Err(e) => return Err(e).context("Failed to skip datagram"),
        };

        if located.offset != offset {
            // Damaged frame: back up onto the recovered one and list that
            warn!(
                "Datagram at offset {} is corrupt, resumed at {}",
                offset, located.offset
            );
            reader
                .skip_back()
                .context("Failed to step back onto recovered datagram")?;
            continue;
        }

        rows.push(HeaderRow {
            index,
            offset,
            type_tag: header.type_tag().to_string(),
            timestamp: header.timestamp.to_rfc3339(),
            size: header.declared_size(),
            channel: header.channel.as_ref().map(ToString::to_string),
        });
    }

    Ok(rows)
}

pub fn execute(input: &str, limit: Option<usize>) -> Result<()> {
    info!("Reading headers from: {}", input);

    for row in collect(input, limit)? {
        let channel = row.channel.as_deref().unwrap_or("-");
        println!(
            "#{:<6} {:>10}  {}  {}  {:>8}  {}",
            row.index, row.offset, row.type_tag, row.timestamp, row.size, channel
        );
    }

    Ok(())
}
