//! CAN Dump Decoder Library
//!
//! A stateless, reusable library for decoding raw CAN frames into physical signal
//! values using DBC signal databases.
//!
//! # Architecture
//!
//! - A database front end turns DBC text into an immutable [`Catalog`]
//!   (native line parser or the `can-dbc` crate, chosen by [`ParserBackend`])
//! - Malformed database records are dropped and reported, never fatal
//! - Decoding is a pure function of catalog, identifier and payload
//! - Intel and Motorola bit layouts, sign extension, scale/offset and
//!   single-level multiplexing are supported
//!
//! The library does NOT:
//! - Read frame dumps
//! - Format or write output
//! - Decode value tables, comments, attributes or multi-level multiplexing
//!
//! Dump reading and output live in the application layer (can-dump-cli).
//!
//! # Example Usage
//!
//! ```
//! use can_dump_decoder::{decode_frame, load_catalog};
//!
//! let dbc = r#"
//! BO_ 256 Msg: 8 ECU
//!  SG_ Speed : 0|16@1+ (0.1,0) [0|6553.5] "km/h" ECU
//! "#;
//!
//! let outcome = load_catalog(dbc);
//! assert!(outcome.is_clean());
//!
//! let signals = decode_frame(&outcome.catalog, 0x100, &[0x2C, 0x01]);
//! assert_eq!(signals[0].name, "Speed");
//! assert!((signals[0].value - 30.0).abs() < 1e-9);
//! ```

// Public modules
pub mod bits;
pub mod config;
pub mod decoder;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use config::{DecoderConfig, ParserBackend};
pub use decoder::{decode_frame, load_catalog, load_catalog_file, load_catalog_with, Decoder};
pub use signals::{
    ByteOrder, Catalog, CatalogStats, LoadOutcome, MessageDefinition, MultiplexRole,
    SignalDefinition, ValueType,
};
pub use types::{CanFrame, DecodedSignal, DecoderError, ParseDiagnostic, Result};

// Internal modules (not exposed in public API)
mod message_decoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a decoder
        let decoder = Decoder::default();
        let stats = decoder.database_stats();
        assert_eq!(stats.num_messages, 0);
        assert!(!VERSION.is_empty());
    }
}
