use super::open_reader;
use anyhow::{Context, Result};
use simraw_core::ReaderConfig;
use tracing::info;

/// Number of datagrams in the input
pub fn count(input: &str) -> Result<u64> {
    let mut reader = open_reader(input, ReaderConfig::default())?;
    reader.total_count().context("Failed to count datagrams")
}

pub fn execute(input: &str) -> Result<()> {
    info!("Counting datagrams in: {}", input);
    println!("{}", count(input)?);
    Ok(())
}
