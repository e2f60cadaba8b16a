//! Core types for the CAN dump decoder library
//!
//! This module defines the records the decoder consumes and emits. The decoder is
//! stateless: it turns one frame into a list of decoded signals and keeps nothing
//! between calls.

use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Raw CAN frame from a frame dump
///
/// This represents a single CAN frame as read from the dump,
/// before any signal decoding or message interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    /// Capture time in seconds, as written in the dump
    pub timestamp: f64,
    /// Canonical bus name (e.g. "can0")
    pub bus: String,
    /// CAN message ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Frame data bytes (0-8 bytes for classic CAN, up to 64 for CAN-FD)
    pub data: Vec<u8>,
}

impl CanFrame {
    /// Create a frame from its parts
    pub fn new(timestamp: f64, bus: impl Into<String>, can_id: u32, data: Vec<u8>) -> Self {
        Self {
            timestamp,
            bus: bus.into(),
            can_id,
            data,
        }
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Errors that can occur while loading databases or decoding
///
/// Malformed database records are not errors: they are collected as
/// [`ParseDiagnostic`]s on the load outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to read database {path}: {source}")]
    DbcRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No database registered for bus '{0}'")]
    BusNotFound(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),
}

/// A record that was discarded while loading a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// 1-based line number in the database text (0 when the front end has no line info)
    pub line: usize,
    /// Why the record was discarded
    pub reason: String,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "line {}: {}", self.line, self.reason)
        }
    }
}

/// A decoded signal with its physical value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the database
    pub name: String,
    /// Physical value (raw * scale + offset)
    pub value: f64,
    /// Raw value after masking and sign extension
    pub raw_value: i64,
}

impl fmt::Display for DecodedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}
