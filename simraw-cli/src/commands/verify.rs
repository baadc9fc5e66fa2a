use super::{input_len, open_reader};
use anyhow::{Context, Result};
use colored::*;
use simraw_core::{DatagramError, ReaderConfig};
use tracing::{info, warn};

/// Outcome of walking a file datagram by datagram
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub datagrams: u64,
    pub resyncs: u64,
    pub bytes_skipped: u64,
    pub end_offset: u64,
    pub file_size: Option<u64>,
    pub truncated_tail: bool,
}

impl VerifyReport {
    /// Every byte of the file belongs to a valid datagram
    pub fn is_clean(&self) -> bool {
        self.resyncs == 0
            && !self.truncated_tail
            && self.file_size.map_or(true, |size| size == self.end_offset)
    }
}

/// Walk the input with `skip`, recording every recovery the reader performs
pub fn check(input: &str) -> Result<VerifyReport> {
    let mut reader = open_reader(input, ReaderConfig::default())?;
    let mut truncated_tail = false;

    loop {
        match reader.skip() {
            Ok(()) => {}
            Err(DatagramError::EndOfStream) => break,
            Err(e @ DatagramError::Framing { .. }) => {
                warn!("{}", e);
                truncated_tail = true;
                break;
            }
            Err(e) => return Err(e).context("Failed to walk datagrams"),
        }
    }

    let stats = reader.stats();
    Ok(VerifyReport {
        datagrams: reader.tell(),
        resyncs: stats.resyncs,
        bytes_skipped: stats.bytes_skipped,
        end_offset: reader.byte_offset(),
        file_size: input_len(input),
        truncated_tail,
    })
}

pub fn execute(input: &str) -> Result<()> {
    info!("Verifying file: {}", input);

    let report = check(input)?;

    if report.datagrams == 0 {
        println!("{} No valid datagrams found", "✗".red());
        return Ok(());
    }

    println!("\n=== Verification Results ===");
    println!("Datagrams:          {}", report.datagrams.to_string().green());
    if report.resyncs > 0 {
        println!("Resyncs:            {}", report.resyncs.to_string().red());
        println!("Bytes skipped:      {}", report.bytes_skipped.to_string().red());
    } else {
        println!("Resyncs:            {}", report.resyncs);
    }

    println!("\n=== Summary ===");
    if report.is_clean() {
        println!("{} File is fully valid", "✓".green());
    } else if report.truncated_tail {
        println!(
            "{} File ends inside a datagram @ offset {}",
            "✗".red(),
            report.end_offset
        );
    } else if report.resyncs > 0 {
        println!("{} File contains corrupted datagrams", "✗".red());
    } else {
        println!(
            "{} File has trailing bytes after the last datagram",
            "!".yellow()
        );
    }

    Ok(())
}
