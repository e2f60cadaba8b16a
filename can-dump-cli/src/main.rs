//! CAN Dump Decoder CLI Application
//!
//! This is the command-line interface for the CAN dump decoder.
//! It uses the can-dump-decoder library and adds:
//! - Frame dump reading (candump text format)
//! - Bus to database mapping from flags or config.toml
//! - Parallel decoding across frames
//! - Text or JSON output

use anyhow::{Context, Result};
use can_dump_decoder::{CanFrame, DecodedSignal, Decoder, ParserBackend};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod dump;
mod report;

use config::{AppConfig, BusConfig, OutputFormat};

/// CAN Dump Decoder - Decode candump logs with DBC databases
#[derive(Parser, Debug)]
#[command(name = "can-dump-cli")]
#[command(about = "Decode candump frame logs into physical signal values", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the frame dump to decode
    #[arg(short, long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Database for a bus, as BUS=FILE (can be repeated)
    #[arg(long, value_name = "BUS=FILE", value_parser = config::parse_bus_mapping)]
    dbc: Vec<BusConfig>,

    /// Output file for decoded signals (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database parser: native or can-dbc
    #[arg(long, value_name = "PARSER")]
    parser: Option<ParserBackend>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Maximum number of frames to decode (for testing)
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Counters reported at the end of a run
#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    frames: usize,
    skipped_lines: usize,
    signals: usize,
    discarded_records: usize,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Dump Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_dump_decoder::VERSION);

    let config = build_config(&args)?;
    let summary = run(&config, args.max_frames)?;

    log::info!(
        "Decoded {} signals from {} frames ({} dump lines skipped, {} database records discarded)",
        summary.signals,
        summary.frames,
        summary.skipped_lines,
        summary.discarded_records
    );
    Ok(())
}

/// Merge the optional config file with command-line overrides
fn build_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(dump) = &args.dump {
        config.input.dump = Some(dump.clone());
    }
    for bus in &args.dbc {
        config.set_bus(bus.clone());
    }
    if let Some(output) = &args.output {
        config.output.path = Some(output.clone());
    }
    if let Some(parser) = args.parser {
        config.decoder.parser = parser;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }

    config.validate()?;
    Ok(config)
}

/// Load databases, decode the dump and write the output
fn run(config: &AppConfig, max_frames: Option<usize>) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    let mut decoder = Decoder::new(config.decoder.clone());
    for bus in &config.buses {
        let outcome = decoder
            .add_database(&bus.name, &bus.dbc)
            .with_context(|| format!("Failed to load database for bus {}", bus.name))?;
        if !outcome.is_clean() {
            log::warn!(
                "Bus {}: {} database records discarded from {:?}:\n{}",
                bus.name,
                outcome.diagnostics.len(),
                bus.dbc,
                outcome.detail()
            );
        }
        summary.discarded_records += outcome.diagnostics.len();
    }
    let stats = decoder.database_stats();
    log::info!(
        "Signal database: {} messages, {} signals, {} multiplexed messages",
        stats.num_messages,
        stats.num_signals,
        stats.num_multiplexed
    );

    let dump_path = config
        .input
        .dump
        .as_deref()
        .context("No dump file configured")?;
    let dump = dump::read_dump(dump_path, max_frames)?;
    summary.frames = dump.frames.len();
    summary.skipped_lines = dump.skipped;

    // Catalogs are read-only, so frames decode independently; collect keeps file order
    let decoded: Vec<Vec<DecodedSignal>> = dump
        .frames
        .par_iter()
        .map(|frame| decoder.decode(frame))
        .collect();

    let sink: Box<dyn Write> = match &config.output.path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);
    summary.signals = write_output(&mut out, config.output.format, &dump.frames, &decoded)?;
    out.flush().context("Failed to flush output")?;

    Ok(summary)
}

/// Write decoded frames in order, returning the number of signals written
fn write_output<W: Write>(
    out: &mut W,
    format: OutputFormat,
    frames: &[CanFrame],
    decoded: &[Vec<DecodedSignal>],
) -> Result<usize> {
    let mut written = 0;
    for (frame, signals) in frames.iter().zip(decoded) {
        report::write_signals(out, format, frame, signals).context("Failed to write output")?;
        written += signals.len();
    }
    Ok(written)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    // Logs go to stderr so stdout stays clean for decoded output
    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
