//! Signal catalog and database front ends
//!
//! Two front ends turn database text into the same [`Catalog`]: the native line
//! parser in [`dbc`] and an adapter over the `can-dbc` crate in [`dbc_library`].
//! Both go through [`CatalogBuilder`], so duplicate handling and multiplexer
//! checks are identical whichever one is configured.

pub mod catalog;
pub mod dbc;
pub mod dbc_library;

// Re-export key types for convenience
pub use catalog::{
    ByteOrder, Catalog, CatalogStats, MessageDefinition, MultiplexRole, SignalDefinition,
    ValueType,
};

use crate::bits::MAX_BIT_LENGTH;
use crate::types::{DecoderError, ParseDiagnostic, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Result of loading one database: the catalog plus every discarded record
///
/// The catalog is frozen once loaded, so it is handed out already shared.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub catalog: Arc<Catalog>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl LoadOutcome {
    /// True if no record was discarded
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// All diagnostics joined one per line; empty on a clean parse
    pub fn detail(&self) -> String {
        self.diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Read database text from disk
///
/// Files that are not valid UTF-8 are decoded as Latin-1, which is what most
/// DBC editors write. A file that cannot be read is the only fatal load error.
pub fn read_database(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| DecoderError::DbcRead {
        path: path.display().to_string(),
        source,
    })?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            log::warn!("Database {:?} is not UTF-8, decoding as Latin-1", path);
            Ok(err.into_bytes().iter().map(|&b| b as char).collect())
        }
    }
}

/// Accumulates messages in database order and records rejected records
#[derive(Debug, Default)]
pub(crate) struct CatalogBuilder {
    messages: Vec<MessageDefinition>,
    index: HashMap<u32, usize>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl CatalogBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start a message and return its slot; a repeated ID replaces the earlier message
    pub(crate) fn begin_message(&mut self, line: usize, message: MessageDefinition) -> usize {
        if let Some(&slot) = self.index.get(&message.id) {
            self.reject(
                line,
                format!(
                    "message 0x{:X} '{}' redefined as '{}', earlier definition dropped",
                    message.id, self.messages[slot].name, message.name
                ),
            );
            self.messages[slot] = message;
            slot
        } else {
            let slot = self.messages.len();
            self.index.insert(message.id, slot);
            self.messages.push(message);
            slot
        }
    }

    /// Attach a signal to a message slot, rejecting it if it breaks a message invariant
    pub(crate) fn add_signal(&mut self, line: usize, slot: usize, signal: SignalDefinition) {
        let Some(message) = self.messages.get_mut(slot) else {
            self.reject(line, format!("signal '{}' has no message", signal.name));
            return;
        };

        let reason = if signal.length == 0 || signal.length > MAX_BIT_LENGTH {
            Some(format!(
                "signal '{}' has bit length {}, expected 1..={}",
                signal.name, signal.length, MAX_BIT_LENGTH
            ))
        } else if message.signal(&signal.name).is_some() {
            Some(format!(
                "signal '{}' defined twice in message '{}'",
                signal.name, message.name
            ))
        } else if signal.multiplexer == MultiplexRole::Switch && message.multiplexer().is_some() {
            Some(format!(
                "signal '{}' is a second multiplexer switch in message '{}'",
                signal.name, message.name
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => self.reject(line, reason),
            None => {
                log::debug!(
                    "Parsed signal: {} start={} len={} order={:?} type={:?} scale={} offset={} mux={:?}",
                    signal.name,
                    signal.start_bit,
                    signal.length,
                    signal.byte_order,
                    signal.value_type,
                    signal.factor,
                    signal.offset,
                    signal.multiplexer
                );
                message.signals.push(signal);
            }
        }
    }

    /// Record a discarded record
    pub(crate) fn reject(&mut self, line: usize, reason: impl Into<String>) {
        let diagnostic = ParseDiagnostic {
            line,
            reason: reason.into(),
        };
        log::warn!("Discarding database record: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Freeze everything collected so far into a catalog
    pub(crate) fn finish(self) -> LoadOutcome {
        LoadOutcome {
            catalog: Arc::new(Catalog::from_messages(self.messages)),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builder_replaces_duplicate_message() {
        let mut builder = CatalogBuilder::new();
        let first = builder.begin_message(1, MessageDefinition::new(0x10, "First", 8));
        builder.add_signal(2, first, SignalDefinition::new("A", 0, 8));
        let second = builder.begin_message(3, MessageDefinition::new(0x10, "Second", 8));
        assert_eq!(first, second);

        let outcome = builder.finish();
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].line, 3);
        let msg = outcome.catalog.get_message(0x10).unwrap();
        assert_eq!(msg.name, "Second");
        assert!(msg.signals.is_empty());
    }

    #[test]
    fn test_builder_rejects_invalid_signals() {
        let mut builder = CatalogBuilder::new();
        let slot = builder.begin_message(1, MessageDefinition::new(0x20, "Msg", 8));
        builder.add_signal(2, slot, SignalDefinition::new("Zero", 0, 0));
        builder.add_signal(3, slot, SignalDefinition::new("Wide", 0, 65));
        builder.add_signal(4, slot, SignalDefinition::new("Ok", 0, 8));
        builder.add_signal(5, slot, SignalDefinition::new("Ok", 8, 8));
        builder.add_signal(
            6,
            slot,
            SignalDefinition::new("Mode", 0, 4).with_multiplexer(MultiplexRole::Switch),
        );
        builder.add_signal(
            7,
            slot,
            SignalDefinition::new("Mode2", 4, 4).with_multiplexer(MultiplexRole::Switch),
        );
        builder.add_signal(8, 99, SignalDefinition::new("Orphan", 0, 8));

        let outcome = builder.finish();
        let lines: Vec<usize> = outcome.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![2, 3, 5, 7, 8]);

        let msg = outcome.catalog.get_message(0x20).unwrap();
        let names: Vec<&str> = msg.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ok", "Mode"]);
    }

    #[test]
    fn test_detail_is_empty_when_clean() {
        let outcome = LoadOutcome::default();
        assert!(outcome.is_clean());
        assert_eq!(outcome.detail(), "");
    }

    #[test]
    fn test_read_database_latin1_fallback() {
        let mut temp_file = NamedTempFile::new().unwrap();
        // "°C" in Latin-1
        temp_file.write_all(b"SG_ unit \"\xB0C\"").unwrap();
        temp_file.flush().unwrap();

        let text = read_database(temp_file.path()).unwrap();
        assert_eq!(text, "SG_ unit \"\u{B0}C\"");
    }

    #[test]
    fn test_read_database_missing_file_is_fatal() {
        let result = read_database(Path::new("/nonexistent/dir/missing.dbc"));
        assert!(matches!(result, Err(DecoderError::DbcRead { .. })));
    }
}
