//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library:
//! which database front end to use and which frames to decode. Everything else
//! (bus mapping, output) belongs to the application layer.

use serde::{Deserialize, Serialize};

/// Database front end used to build catalogs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserBackend {
    /// Built-in line parser, tolerant of malformed records
    #[default]
    Native,
    /// The `can-dbc` crate
    CanDbc,
}

impl std::str::FromStr for ParserBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(ParserBackend::Native),
            "can-dbc" | "can_dbc" | "candbc" => Ok(ParserBackend::CanDbc),
            other => Err(format!(
                "unknown parser backend '{}', expected 'native' or 'can-dbc'",
                other
            )),
        }
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Database front end
    #[serde(default)]
    pub parser: ParserBackend,

    /// Optional: only decode frames from these buses
    #[serde(default)]
    pub bus_filter: Option<Vec<String>>,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: select the database front end
    pub fn with_parser(mut self, parser: ParserBackend) -> Self {
        self.parser = parser;
        self
    }

    /// Builder method: set bus filter
    pub fn with_bus_filter(mut self, buses: Vec<String>) -> Self {
        self.bus_filter = Some(buses);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a bus should be processed
    pub fn should_process_bus(&self, bus: &str) -> bool {
        match &self.bus_filter {
            Some(buses) => buses.iter().any(|b| b == bus),
            None => true,
        }
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }

    /// Check if a frame should be processed based on filters
    pub fn should_process_frame(&self, bus: &str, can_id: u32) -> bool {
        self.should_process_bus(bus) && self.should_process_message(can_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_parser(ParserBackend::CanDbc)
            .with_bus_filter(vec!["can0".to_string()])
            .with_message_filter(vec![0x100]);

        assert_eq!(config.parser, ParserBackend::CanDbc);
        assert_eq!(config.bus_filter, Some(vec!["can0".to_string()]));
        assert_eq!(config.message_filter, Some(vec![0x100]));
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new()
            .with_bus_filter(vec!["can0".to_string(), "can1".to_string()])
            .with_message_filter(vec![0x123, 0x456]);

        assert!(config.should_process_frame("can0", 0x123));
        assert!(config.should_process_frame("can1", 0x456));
        assert!(!config.should_process_frame("can2", 0x123)); // Wrong bus
        assert!(!config.should_process_frame("can0", 0x789)); // Wrong message
    }

    #[test]
    fn test_no_filters() {
        let config = DecoderConfig::new();

        // Without filters, everything should pass
        assert!(config.should_process_frame("can0", 0x123));
        assert!(config.should_process_frame("anything", 0xFFFFFFFF));
        assert_eq!(config.parser, ParserBackend::Native);
    }

    #[test]
    fn test_parser_backend_from_str() {
        assert_eq!("native".parse::<ParserBackend>(), Ok(ParserBackend::Native));
        assert_eq!("CAN-DBC".parse::<ParserBackend>(), Ok(ParserBackend::CanDbc));
        assert!("regex".parse::<ParserBackend>().is_err());
    }
}
