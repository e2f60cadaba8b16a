//! Frame dump reader
//!
//! Reads candump-style logs, one frame per line:
//!
//! ```text
//! (1705638799.992057) vcan0  705#B1B8E3680F488B72
//! ```
//!
//! Lines that do not have this shape are skipped.

use anyhow::{Context, Result};
use can_dump_decoder::CanFrame;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Largest payload accepted (CAN-FD)
const MAX_PAYLOAD: usize = 64;

/// Frames read from a dump, in file order
#[derive(Debug, Default)]
pub struct Dump {
    pub frames: Vec<CanFrame>,
    /// Lines that were not frames
    pub skipped: usize,
}

/// Map virtual interfaces onto the physical bus they stand in for (`vcan1` -> `can1`)
pub fn canonical_bus(iface: &str) -> String {
    match iface.strip_prefix("vcan") {
        Some(index) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            format!("can{}", index)
        }
        _ => iface.to_string(),
    }
}

/// Parse one `(<ts>) <iface> <ID>#<DATA>` line
pub fn parse_line(line: &str) -> Option<CanFrame> {
    let line = line.trim();
    let (timestamp, rest) = line.strip_prefix('(')?.split_once(')')?;
    let timestamp = parse_timestamp(timestamp)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut tokens = rest.split_whitespace();
    let iface = tokens.next()?;
    let frame = tokens.next()?;
    if tokens.next().is_some()
        || !iface.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return None;
    }

    let (id, data) = frame.split_once('#')?;
    let can_id = parse_hex_id(id)?;
    let data = parse_hex_data(data)?;

    Some(CanFrame::new(timestamp, canonical_bus(iface), can_id, data))
}

/// `<digits>.<digits>`
fn parse_timestamp(text: &str) -> Option<f64> {
    let (secs, frac) = text.split_once('.')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(secs) || !all_digits(frac) {
        return None;
    }
    text.parse().ok()
}

fn parse_hex_id(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(text, 16).ok()
}

/// Hex byte pairs; an odd trailing nibble is dropped
fn parse_hex_data(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let data: Vec<u8> = text
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            // Both bytes are ASCII hex digits, checked above
            let hi = (pair[0] as char).to_digit(16).unwrap_or(0) as u8;
            let lo = (pair[1] as char).to_digit(16).unwrap_or(0) as u8;
            (hi << 4) | lo
        })
        .collect();
    (data.len() <= MAX_PAYLOAD).then_some(data)
}

/// Read the frames of a dump file, stopping once `limit` frames are read
pub fn read_dump(path: &Path, limit: Option<usize>) -> Result<Dump> {
    let file = File::open(path).with_context(|| format!("Failed to open dump file: {:?}", path))?;
    let reader = BufReader::new(file);

    let mut dump = Dump::default();
    for (idx, line) in reader.lines().enumerate() {
        if limit.is_some_and(|limit| dump.frames.len() >= limit) {
            log::debug!("Frame limit reached after {} lines", idx);
            break;
        }
        let line = line.with_context(|| format!("Failed to read dump file: {:?}", path))?;
        match parse_line(&line) {
            Some(frame) => dump.frames.push(frame),
            None => {
                if !line.trim().is_empty() {
                    log::debug!("Skipping dump line {}: {}", idx + 1, line);
                }
                dump.skipped += 1;
            }
        }
    }

    log::info!(
        "Read {} frames from {:?} ({} lines skipped)",
        dump.frames.len(),
        path,
        dump.skipped
    );
    Ok(dump)
}
