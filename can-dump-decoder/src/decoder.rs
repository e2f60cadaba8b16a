//! Main decoder API
//!
//! Free functions cover the single-database case: [`load_catalog`] builds a
//! catalog from text and [`decode_frame`] decodes one payload against it.
//! [`Decoder`] holds one catalog per bus for dumps that interleave several buses.

use crate::config::{DecoderConfig, ParserBackend};
use crate::message_decoder::MessageDecoder;
use crate::signals::{self, Catalog, CatalogStats, LoadOutcome};
use crate::types::{CanFrame, DecodedSignal, DecoderError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Build a catalog from database text with the native parser
///
/// Never fails: malformed records are dropped and listed in the outcome.
pub fn load_catalog(text: &str) -> LoadOutcome {
    load_catalog_with(text, ParserBackend::Native)
}

/// Build a catalog from database text with the given front end
pub fn load_catalog_with(text: &str, backend: ParserBackend) -> LoadOutcome {
    match backend {
        ParserBackend::Native => signals::dbc::parse_dbc_str(text),
        ParserBackend::CanDbc => signals::dbc_library::parse_dbc_str(text),
    }
}

/// Build a catalog from a database file
///
/// Fails only if the file cannot be read.
pub fn load_catalog_file(path: &Path, backend: ParserBackend) -> Result<LoadOutcome> {
    log::info!("Loading database: {:?} ({:?} parser)", path, backend);
    let text = signals::read_database(path)?;
    Ok(load_catalog_with(&text, backend))
}

/// Decode one payload against a catalog
///
/// Returns the active signals in database order, or an empty list when the
/// identifier is not in the catalog.
pub fn decode_frame(catalog: &Catalog, can_id: u32, data: &[u8]) -> Vec<DecodedSignal> {
    match catalog.get_message(can_id) {
        Some(message_def) => {
            log::trace!("Decoding message: {} (ID 0x{:X})", message_def.name, can_id);
            MessageDecoder::decode_message(data, message_def)
        }
        None => {
            log::trace!("Unknown CAN ID: 0x{:X}", can_id);
            Vec::new()
        }
    }
}

/// Multi-bus decoder: one shared, read-only catalog per bus
///
/// `Decoder` is `Sync`, so frames can be decoded from many threads at once.
#[derive(Debug, Default)]
pub struct Decoder {
    config: DecoderConfig,
    catalogs: HashMap<String, Arc<Catalog>>,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            catalogs: HashMap::new(),
        }
    }

    /// Load a database file for a bus with the configured front end
    ///
    /// Replaces any catalog already registered for the bus. The returned outcome
    /// shares the registered catalog and lists discarded records; only an
    /// unreadable file is an error.
    ///
    /// # Example
    /// ```no_run
    /// use can_dump_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new(DecoderConfig::new());
    /// let outcome = decoder.add_database("can0", Path::new("ControlBus.dbc")).unwrap();
    /// if !outcome.is_clean() {
    ///     eprintln!("{}", outcome.detail());
    /// }
    /// ```
    pub fn add_database(&mut self, bus: &str, path: &Path) -> Result<LoadOutcome> {
        let outcome = load_catalog_file(path, self.config.parser)?;
        self.add_catalog(bus, Arc::clone(&outcome.catalog));
        Ok(outcome)
    }

    /// Register an already built catalog for a bus
    pub fn add_catalog(&mut self, bus: &str, catalog: Arc<Catalog>) {
        log::info!("Bus {}: {} messages", bus, catalog.len());
        self.catalogs.insert(bus.to_string(), catalog);
    }

    /// Catalog registered for a bus
    pub fn catalog(&self, bus: &str) -> Result<&Arc<Catalog>> {
        self.catalogs
            .get(bus)
            .ok_or_else(|| DecoderError::BusNotFound(bus.to_string()))
    }

    /// Registered bus names, sorted
    pub fn buses(&self) -> Vec<&str> {
        let mut buses: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
        buses.sort_unstable();
        buses
    }

    /// Decode one frame against its bus's catalog
    ///
    /// Filtered frames, unknown buses and unknown identifiers all decode to an
    /// empty list.
    pub fn decode(&self, frame: &CanFrame) -> Vec<DecodedSignal> {
        if !self.config.should_process_frame(&frame.bus, frame.can_id) {
            return Vec::new();
        }
        match self.catalogs.get(&frame.bus) {
            Some(catalog) => decode_frame(catalog, frame.can_id, &frame.data),
            None => {
                log::trace!("No database for bus {}", frame.bus);
                Vec::new()
            }
        }
    }

    /// Get statistics summed over all buses
    pub fn database_stats(&self) -> CatalogStats {
        self.catalogs
            .values()
            .map(|catalog| catalog.stats())
            .fold(CatalogStats::default(), |acc, stats| acc + stats)
    }

    /// The active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}
