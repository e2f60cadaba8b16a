//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use can_dump_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub buses: Vec<BusConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub dump: Option<PathBuf>,
}

/// One bus and the database its frames are decoded with
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BusConfig {
    pub name: String,
    pub dbc: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output file (stdout when absent)
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `(<timestamp>): <signal>: <value>` lines
    #[default]
    Text,
    /// One JSON object per decoded signal
    Json,
}

impl AppConfig {
    /// Add or replace the database for a bus
    pub fn set_bus(&mut self, bus: BusConfig) {
        match self.buses.iter_mut().find(|b| b.name == bus.name) {
            Some(existing) => existing.dbc = bus.dbc,
            None => self.buses.push(bus),
        }
    }

    /// Check the configuration is usable before any file is opened
    pub fn validate(&self) -> Result<()> {
        if self.input.dump.is_none() {
            bail!("No dump file given (use --dump or [input] dump)");
        }
        if self.buses.is_empty() {
            bail!("No bus databases given (use --dbc BUS=FILE or [[buses]])");
        }
        let mut seen = HashSet::new();
        for bus in &self.buses {
            if !seen.insert(bus.name.as_str()) {
                bail!("Bus '{}' is configured more than once", bus.name);
            }
        }
        Ok(())
    }
}

/// Parse a `BUS=FILE` command-line mapping
pub fn parse_bus_mapping(arg: &str) -> std::result::Result<BusConfig, String> {
    match arg.split_once('=') {
        Some((name, dbc)) if !name.trim().is_empty() && !dbc.trim().is_empty() => Ok(BusConfig {
            name: name.trim().to_string(),
            dbc: PathBuf::from(dbc.trim()),
        }),
        _ => Err(format!("expected BUS=FILE, got '{}'", arg)),
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_dump_decoder::ParserBackend;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            dump = "dump.log"

            [[buses]]
            name = "can0"
            dbc = "dbc-files/ControlBus.dbc"

            [[buses]]
            name = "can1"
            dbc = "dbc-files/SensorBus.dbc"

            [output]
            path = "output.txt"
            format = "json"

            [decoder]
            parser = "can-dbc"
            message_filter = [256, 512]
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.dump, Some(PathBuf::from("dump.log")));
        assert_eq!(config.buses.len(), 2);
        assert_eq!(config.buses[1].name, "can1");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.decoder.parser, ParserBackend::CanDbc);
        assert_eq!(config.decoder.message_filter, Some(vec![256, 512]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.decoder.parser, ParserBackend::Native);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_bus_rejected() {
        let mut config = AppConfig::default();
        config.input.dump = Some(PathBuf::from("dump.log"));
        config.buses.push(parse_bus_mapping("can0=a.dbc").unwrap());
        config.buses.push(parse_bus_mapping("can0=b.dbc").unwrap());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_bus_overrides() {
        let mut config = AppConfig::default();
        config.set_bus(parse_bus_mapping("can0=a.dbc").unwrap());
        config.set_bus(parse_bus_mapping("can0=b.dbc").unwrap());
        config.set_bus(parse_bus_mapping("can1=c.dbc").unwrap());
        assert_eq!(config.buses.len(), 2);
        assert_eq!(config.buses[0].dbc, PathBuf::from("b.dbc"));
    }

    #[test]
    fn test_parse_bus_mapping() {
        let bus = parse_bus_mapping("can2=dbc-files/TractiveBus.dbc").unwrap();
        assert_eq!(bus.name, "can2");
        assert_eq!(bus.dbc, PathBuf::from("dbc-files/TractiveBus.dbc"));
        assert!(parse_bus_mapping("can2").is_err());
        assert!(parse_bus_mapping("=x.dbc").is_err());
        assert!(parse_bus_mapping("can2=").is_err());
    }
}
