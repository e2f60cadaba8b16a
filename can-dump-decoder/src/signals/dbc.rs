//! Native DBC parser
//!
//! Reads the subset of the DBC format needed for decoding: `BO_` message lines
//! and `SG_` signal lines. Every other record kind is skipped. Each line goes
//! through [`parse_record`], a pure tokenizer; the loader only remembers which
//! message the following signal lines belong to.
//!
//! A malformed record never fails the load. It is dropped and reported in the
//! returned [`LoadOutcome`].

use crate::signals::catalog::{
    ByteOrder, MessageDefinition, MultiplexRole, SignalDefinition, ValueType,
};
use crate::signals::{CatalogBuilder, LoadOutcome};

/// One tokenized database line
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// `BO_` line (signals not yet attached)
    Message(MessageDefinition),
    /// `SG_` line
    Signal(SignalDefinition),
    /// Any other line kind, blank lines and comments
    Ignored,
}

/// Why a line could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("malformed message record: {0}")]
    Message(String),

    #[error("malformed signal record: {0}")]
    Signal(String),
}

/// Parse DBC text into a catalog
pub fn parse_dbc_str(text: &str) -> LoadOutcome {
    let mut builder = CatalogBuilder::new();
    let mut current: Option<usize> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        match parse_record(line) {
            Ok(Record::Message(message)) => {
                log::debug!(
                    "Parsed message: {} id=0x{:X} size={}",
                    message.name,
                    message.id,
                    message.size
                );
                current = Some(builder.begin_message(line_no, message));
            }
            Ok(Record::Signal(signal)) => match current {
                Some(slot) => builder.add_signal(line_no, slot, signal),
                None => builder.reject(
                    line_no,
                    format!("signal '{}' appears outside a message", signal.name),
                ),
            },
            Ok(Record::Ignored) => {}
            Err(err) => {
                // Signals after a broken BO_ line must not land in the previous message
                if matches!(err, RecordError::Message(_)) {
                    current = None;
                }
                builder.reject(line_no, err.to_string());
            }
        }
    }

    let outcome = builder.finish();
    log::info!(
        "Parsed {} messages ({} records discarded)",
        outcome.catalog.len(),
        outcome.diagnostics.len()
    );
    outcome
}

/// Tokenize a single database line
pub fn parse_record(line: &str) -> Result<Record, RecordError> {
    let line = line.trim();
    match line.split_whitespace().next() {
        Some("BO_") => parse_message(line).map(Record::Message),
        Some("SG_") => parse_signal(line).map(Record::Signal),
        _ => Ok(Record::Ignored),
    }
}

/// `BO_ <id> <name>: <dlc> <transmitter>`
fn parse_message(line: &str) -> Result<MessageDefinition, RecordError> {
    let err = |what: &str| RecordError::Message(format!("{} in '{}'", what, line));

    let (head, tail) = line.split_once(':').ok_or_else(|| err("missing ':'"))?;
    let mut head_tokens = head.split_whitespace().skip(1);
    let id_str = head_tokens.next().ok_or_else(|| err("missing identifier"))?;
    let name = head_tokens.next().ok_or_else(|| err("missing name"))?;
    if head_tokens.next().is_some() {
        return Err(err("unexpected token before ':'"));
    }

    let id = parse_id(id_str).ok_or_else(|| err("invalid identifier"))?;

    let mut tail_tokens = tail.split_whitespace();
    let size = tail_tokens
        .next()
        .ok_or_else(|| err("missing length"))?
        .parse::<usize>()
        .map_err(|_| err("invalid length"))?;

    let mut message = MessageDefinition::new(id, name, size);
    message.sender = tail_tokens.next().map(str::to_string);
    Ok(message)
}

/// Decimal or `0x`-prefixed hexadecimal message identifier
fn parse_id(token: &str) -> Option<u32> {
    match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => token.parse::<u32>().ok(),
    }
}

/// `SG_ <name> [mNN|M] : <start>|<len>@<order><sign> (<scale>,<offset>) [<min>|<max>] "<unit>" <receivers>`
fn parse_signal(line: &str) -> Result<SignalDefinition, RecordError> {
    let err = |what: &str| RecordError::Signal(format!("{} in '{}'", what, line));

    let (head, tail) = line.split_once(':').ok_or_else(|| err("missing ':'"))?;
    let mut head_tokens = head.split_whitespace().skip(1);
    let name = head_tokens.next().ok_or_else(|| err("missing name"))?;
    let multiplexer = match head_tokens.next() {
        Some(token) => parse_multiplexer(token).ok_or_else(|| err("unsupported multiplex marker"))?,
        None => MultiplexRole::None,
    };
    if head_tokens.next().is_some() {
        return Err(err("unexpected token before ':'"));
    }

    let tail = tail.trim_start();
    let (bit_spec, rest) = tail
        .split_once(char::is_whitespace)
        .unwrap_or((tail, ""));
    let (start_bit, length, byte_order, value_type) =
        parse_bit_spec(bit_spec).ok_or_else(|| err("invalid bit spec"))?;

    let (scaling, rest) = delimited(rest, '(', ')').ok_or_else(|| err("missing (scale,offset)"))?;
    let (factor, offset) = parse_pair(scaling, ',').ok_or_else(|| err("invalid (scale,offset)"))?;

    let mut signal = SignalDefinition::new(name, start_bit, length)
        .with_byte_order(byte_order)
        .with_value_type(value_type)
        .with_scaling(factor, offset)
        .with_multiplexer(multiplexer);

    // Range, unit and receivers are informational only
    let rest = match delimited(rest, '[', ']') {
        Some((range, rest)) => {
            if let Some((min, max)) = parse_pair(range, '|') {
                signal.min = min;
                signal.max = max;
            }
            rest
        }
        None => rest,
    };
    let rest = match delimited(rest, '"', '"') {
        Some((unit, rest)) => {
            if !unit.is_empty() {
                signal.unit = Some(unit.to_string());
            }
            rest
        }
        None => rest,
    };
    signal.receivers = rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    Ok(signal)
}

/// `M` is the switch, `mNN` a multiplexed signal. `mNNM` (multi-level) is not supported.
fn parse_multiplexer(token: &str) -> Option<MultiplexRole> {
    if token == "M" {
        return Some(MultiplexRole::Switch);
    }
    let digits = token.strip_prefix('m')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok().map(MultiplexRole::Value)
}

/// `<start>|<length>@<order><sign>`
fn parse_bit_spec(spec: &str) -> Option<(u32, u32, ByteOrder, ValueType)> {
    let (start, rest) = spec.split_once('|')?;
    let (length, flags) = rest.split_once('@')?;

    let mut flag_chars = flags.chars();
    let byte_order = match flag_chars.next()? {
        '1' => ByteOrder::LittleEndian,
        '0' => ByteOrder::BigEndian,
        _ => return None,
    };
    let value_type = match flag_chars.next()? {
        '+' => ValueType::Unsigned,
        '-' => ValueType::Signed,
        _ => return None,
    };
    if flag_chars.next().is_some() {
        return None;
    }

    Some((
        start.parse().ok()?,
        length.parse().ok()?,
        byte_order,
        value_type,
    ))
}

/// Split `text` around the first `open ... close` group, returning (inside, after)
fn delimited(text: &str, open: char, close: char) -> Option<(&str, &str)> {
    let start = text.find(open)? + open.len_utf8();
    let len = text[start..].find(close)?;
    Some((&text[start..start + len], &text[start + len + close.len_utf8()..]))
}

/// Two floats separated by `sep`
fn parse_pair(text: &str, sep: char) -> Option<(f64, f64)> {
    let (a, b) = text.split_once(sep)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}
