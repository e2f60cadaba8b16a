//! `can-dbc` front end
//!
//! Parses database text with the `can-dbc` crate and converts its messages into
//! our catalog types. The library parses the whole text in one go, so a syntax
//! error anywhere leaves an empty catalog with one diagnostic; the load itself
//! still succeeds, like the native parser.

use crate::signals::catalog::{
    ByteOrder, MessageDefinition, MultiplexRole, SignalDefinition, ValueType,
};
use crate::signals::{CatalogBuilder, LoadOutcome};
use crate::types::{DecoderError, Result};

/// Parse DBC text with `can-dbc` and convert it to a catalog
pub fn parse_dbc_str(text: &str) -> LoadOutcome {
    let mut builder = CatalogBuilder::new();

    let dbc = match can_dbc::DBC::from_slice(text.as_bytes()) {
        Ok(dbc) => dbc,
        Err(e) => {
            builder.reject(0, format!("can-dbc failed to parse database: {:?}", e));
            return builder.finish();
        }
    };

    for dbc_msg in dbc.messages() {
        let slot = builder.begin_message(0, convert_message(dbc_msg));
        for dbc_sig in dbc_msg.signals() {
            match convert_signal(dbc_sig) {
                Ok(signal) => builder.add_signal(0, slot, signal),
                Err(e) => builder.reject(0, e.to_string()),
            }
        }
    }

    let outcome = builder.finish();
    log::info!(
        "can-dbc parsed {} messages ({} records discarded)",
        outcome.catalog.len(),
        outcome.diagnostics.len()
    );
    outcome
}

/// Convert a can-dbc message header to our MessageDefinition (signals attached later)
fn convert_message(dbc_msg: &can_dbc::Message) -> MessageDefinition {
    let mut message = MessageDefinition::new(
        dbc_msg.message_id().0, // Extract raw ID from MessageId tuple struct
        dbc_msg.message_name().to_string(),
        *dbc_msg.message_size() as usize,
    );
    message.sender = match dbc_msg.transmitter() {
        can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
        _ => None,
    };
    message
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(dbc_sig: &can_dbc::Signal) -> Result<SignalDefinition> {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let multiplexer = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::Plain => MultiplexRole::None,
        can_dbc::MultiplexIndicator::Multiplexor => MultiplexRole::Switch,
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value) => {
            MultiplexRole::Value(switch_value)
        }
        can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(_) => {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "signal '{}' uses multi-level multiplexing, which is not supported",
                dbc_sig.name()
            )));
        }
    };

    let start_bit = u32::try_from(*dbc_sig.start_bit()).map_err(|_| {
        DecoderError::InvalidSignalDefinition(format!(
            "signal '{}' start bit {} out of range",
            dbc_sig.name(),
            dbc_sig.start_bit()
        ))
    })?;
    // Lengths above 64 are rejected by the catalog builder
    let length = u32::try_from(*dbc_sig.signal_size()).unwrap_or(u32::MAX);

    let mut signal = SignalDefinition::new(dbc_sig.name().to_string(), start_bit, length)
        .with_byte_order(byte_order)
        .with_value_type(value_type)
        .with_scaling(*dbc_sig.factor(), *dbc_sig.offset())
        .with_multiplexer(multiplexer);
    signal.min = *dbc_sig.min();
    signal.max = *dbc_sig.max();
    signal.unit = if dbc_sig.unit().is_empty() {
        None
    } else {
        Some(dbc_sig.unit().to_string())
    };
    signal.receivers = dbc_sig.receivers().clone();

    Ok(signal)
}
