//! # Simraw Core
//!
//! Random-access reader for Simrad RAW echosounder files: length-prefixed,
//! length-suffixed datagrams carrying sample data, NMEA, annotations and XML.
//!
//! ## Modules
//!
//! - `constants`: Frame layout constants and known datagram kinds
//! - `types`: Core types (TypeTag, Envelope, Datagram, Record)
//! - `cursor`: Buffered byte cursor over a seekable source
//! - `decoder`: Frame envelope decoding
//! - `scanner`: Resynchronization and damaged stream scanning
//! - `reader`: Datagram-level reading, skipping and seeking
//! - `iter`: Forward iteration over datagrams
//! - `dispatch`: Type tag to payload decoder mapping
//! - `time`: NT timestamp conversion
//! - `config`: Reader configuration
//!
//! ## Example
//!
//! ```no_run
//! use simraw_core::{DatagramReader, ReaderConfig};
//!
//! let mut reader = DatagramReader::open("survey.raw", ReaderConfig::default())?;
//! for record in reader.iterate() {
//!     let record = record?;
//!     println!("{} ({} bytes)", record.type_tag(), record.bytes_read());
//! }
//! # Ok::<(), simraw_core::DatagramError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod cursor;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod iter;
pub mod reader;
pub mod scanner;
pub mod time;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use config::ReaderConfig;
pub use dispatch::{DatagramDecoder, DispatchTable};
pub use error::DatagramError;
pub use reader::{DatagramReader, ReaderStats};
pub use types::{
    Channel, Datagram, DatagramBody, DatagramHeader, RawFrame, Record, StreamPosition, TypeTag,
};

/// Result type alias for datagram operations
pub type Result<T> = std::result::Result<T, DatagramError>;
