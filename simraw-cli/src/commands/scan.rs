use super::{input_len, open_reader};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use simraw_core::{scanner::ScanStats, DatagramError, ReaderConfig};
use std::fs;
use tracing::{info, warn};

/// Summary of one recovered datagram
#[derive(Debug, Serialize, Deserialize)]
pub struct DatagramSummary {
    pub index: u64,
    pub offset: u64,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub timestamp: String,
    pub size: u64,
    pub bytes_read: u64,
}

/// Walk the whole input, collecting datagram summaries and scan statistics
pub fn scan(input: &str) -> Result<(Vec<DatagramSummary>, ScanStats)> {
    let mut reader = open_reader(input, ReaderConfig::new().raw_mode(true))?;
    let mut summaries = Vec::new();

    loop {
        match reader.read_located() {
            Ok((located, record)) => {
                let envelope = located.envelope;
                summaries.push(DatagramSummary {
                    index: reader.tell() - 1,
                    offset: located.offset,
                    type_tag: envelope.type_tag.to_string(),
                    timestamp: envelope.timestamp().to_rfc3339(),
                    size: envelope.payload_len(),
                    bytes_read: record.bytes_read(),
                });
            }
            Err(DatagramError::EndOfStream) => break,
            Err(e @ DatagramError::Framing { .. }) => {
                warn!("Stopping at truncated datagram: {}", e);
                break;
            }
            Err(e) => return Err(e).context("Failed to read datagrams"),
        }
    }

    let reader_stats = reader.stats();
    let bytes_scanned = input_len(input).unwrap_or(reader.byte_offset());
    let stats = ScanStats {
        bytes_scanned,
        frames_found: summaries.len(),
        resyncs: reader_stats.resyncs,
        bytes_skipped: reader_stats.bytes_skipped,
        bytes_recovered: summaries.iter().map(|s| s.bytes_read).sum(),
    };

    Ok((summaries, stats))
}

pub fn execute(input: &str, output: Option<&str>, stats_only: bool) -> Result<()> {
    info!("Scanning file: {}", input);

    let (summaries, stats) = scan(input)?;

    // Print statistics
    println!("\n=== Scan Results ===");
    println!("Bytes scanned:     {} bytes", stats.bytes_scanned);
    println!("Valid datagrams:   {}", stats.frames_found);
    println!("Resyncs:           {}", stats.resyncs);
    println!("Bytes skipped:     {} bytes", stats.bytes_skipped);
    println!("Bytes recovered:   {} bytes", stats.bytes_recovered);
    println!("Recovery rate:     {:.2}%", stats.recovery_rate());
    println!();

    if stats_only {
        return Ok(());
    }

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&summaries)
            .with_context(|| "Failed to serialize datagram summaries")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Datagram summaries written to: {}", output_path);
    } else {
        println!("=== Datagrams ===");
        for d in &summaries {
            println!(
                "#{} {} @ offset {}: {} ({} bytes)",
                d.index, d.type_tag, d.offset, d.timestamp, d.bytes_read
            );
        }
    }

    Ok(())
}
