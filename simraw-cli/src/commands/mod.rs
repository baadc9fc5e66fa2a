//! Subcommand implementations

pub mod count;
pub mod headers;
pub mod scan;
pub mod verify;

use anyhow::{Context, Result};
use simraw_core::{DatagramReader, ReaderConfig};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};

/// Any seekable input
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Open `input` for reading; `-` buffers stdin in memory so it can be seeked
pub fn open_reader(input: &str, config: ReaderConfig) -> Result<DatagramReader<Box<dyn ReadSeek>>> {
    let source: Box<dyn ReadSeek> = if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        Box::new(Cursor::new(buf))
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open input file: {}", input))?;
        Box::new(file)
    };
    Ok(DatagramReader::new(source, config))
}

/// Size of the input in bytes, without moving the reader
pub(crate) fn input_len(input: &str) -> Option<u64> {
    if input == "-" {
        None
    } else {
        std::fs::metadata(input).ok().map(|m| m.len())
    }
}
