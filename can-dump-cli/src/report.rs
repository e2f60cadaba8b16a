//! Output sink
//!
//! Writes one line per decoded signal, either as text
//! `(<timestamp>): <name>: <value>` or as a JSON object. Numbers use the
//! shortest representation that parses back to the same `f64`.

use crate::config::OutputFormat;
use can_dump_decoder::{CanFrame, DecodedSignal};
use serde::Serialize;
use std::io::{self, Write};

/// JSON form of one decoded signal
#[derive(Debug, Serialize)]
struct SignalRecord<'a> {
    timestamp: f64,
    bus: &'a str,
    can_id: u32,
    signal: &'a str,
    value: f64,
}

/// Format one signal as a text line (without newline)
pub fn format_text(timestamp: f64, signal: &DecodedSignal) -> String {
    format!("({}): {}: {}", timestamp, signal.name, signal.value)
}

/// Write all decoded signals of one frame
pub fn write_signals<W: Write>(
    out: &mut W,
    format: OutputFormat,
    frame: &CanFrame,
    signals: &[DecodedSignal],
) -> io::Result<()> {
    for signal in signals {
        match format {
            OutputFormat::Text => writeln!(out, "{}", format_text(frame.timestamp, signal))?,
            OutputFormat::Json => {
                let record = SignalRecord {
                    timestamp: frame.timestamp,
                    bus: &frame.bus,
                    can_id: frame.can_id,
                    signal: &signal.name,
                    value: signal.value,
                };
                serde_json::to_writer(&mut *out, &record)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(name: &str, value: f64) -> DecodedSignal {
        DecodedSignal {
            name: name.to_string(),
            value,
            raw_value: value as i64,
        }
    }

    #[test]
    fn test_text_format() {
        assert_eq!(format_text(9.0, &signal("NameA", 5.0)), "(9): NameA: 5");
        assert_eq!(format_text(1.23, &signal("SigLE", 30.0)), "(1.23): SigLE: 30");
        assert_eq!(format_text(2.5, &signal("SigBE", -2048.0)), "(2.5): SigBE: -2048");
    }

    #[test]
    fn test_text_round_trips() {
        let value = 0.1 + 0.2;
        let line = format_text(1705638799.992057, &signal("X", value));
        let printed = line.rsplit(": ").next().unwrap();
        assert_eq!(printed.parse::<f64>().unwrap(), value);
        assert!(line.starts_with("(1705638799.992057): X: "));
    }

    #[test]
    fn test_write_signals_text() {
        let frame = CanFrame::new(9.0, "can0", 0x123, vec![5]);
        let mut out = Vec::new();
        write_signals(
            &mut out,
            OutputFormat::Text,
            &frame,
            &[signal("A", 5.0), signal("B", 1.5)],
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "(9): A: 5\n(9): B: 1.5\n");
    }

    #[test]
    fn test_write_signals_json() {
        let frame = CanFrame::new(9.5, "can1", 0x200, vec![]);
        let mut out = Vec::new();
        write_signals(&mut out, OutputFormat::Json, &frame, &[signal("A", -1.25)]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["bus"], "can1");
        assert_eq!(value["can_id"], 512);
        assert_eq!(value["signal"], "A");
        assert_eq!(value["value"], -1.25);
        assert_eq!(value["timestamp"], 9.5);
    }

    #[test]
    fn test_no_signals_writes_nothing() {
        let frame = CanFrame::new(1.0, "can0", 1, vec![]);
        let mut out = Vec::new();
        write_signals(&mut out, OutputFormat::Text, &frame, &[]).unwrap();
        assert!(out.is_empty());
    }
}
