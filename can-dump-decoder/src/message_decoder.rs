//! Message Decoding Engine
//!
//! Turns a payload into physical signal values using a message definition from
//! the catalog. Handles masking, sign extension, scaling and multiplexer
//! selection; the bit walking itself lives in [`crate::bits`].

use crate::bits;
use crate::signals::catalog::{MessageDefinition, MultiplexRole, SignalDefinition, ValueType};
use crate::types::DecodedSignal;

/// Message decoder - extracts signals from CAN payloads
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode every active signal of a message
    ///
    /// Signals come back in database order. A multiplexed signal is emitted only
    /// when the message has a switch and the switch's raw value equals the
    /// signal's multiplexer value; without a switch, multiplexed signals are
    /// never emitted.
    pub fn decode_message(data: &[u8], message_def: &MessageDefinition) -> Vec<DecodedSignal> {
        let multiplexer_value = message_def
            .multiplexer()
            .map(|switch| Self::raw_value(data, switch));

        message_def
            .signals
            .iter()
            .filter(|signal| match signal.multiplexer {
                MultiplexRole::None | MultiplexRole::Switch => true,
                MultiplexRole::Value(expected) => multiplexer_value == Some(expected),
            })
            .map(|signal| Self::decode_signal(data, signal))
            .collect()
    }

    /// Decode a single signal from payload data
    pub fn decode_signal(data: &[u8], signal: &SignalDefinition) -> DecodedSignal {
        let raw_value = Self::signed_value(data, signal);

        DecodedSignal {
            name: signal.name.clone(),
            value: Self::physical_value(raw_value, signal),
            raw_value,
        }
    }

    /// Raw value after extraction and masking, before sign extension
    pub fn raw_value(data: &[u8], signal: &SignalDefinition) -> u64 {
        bits::extract(data, signal.start_bit, signal.length, signal.byte_order)
            & bits::mask(signal.length)
    }

    /// Raw value interpreted per the signal's value type
    ///
    /// Unsigned 64-bit values above `i64::MAX` wrap in the returned `i64`;
    /// `physical_value` reinterprets them as unsigned again.
    fn signed_value(data: &[u8], signal: &SignalDefinition) -> i64 {
        let raw = Self::raw_value(data, signal);
        match signal.value_type {
            ValueType::Unsigned => raw as i64,
            ValueType::Signed => Self::sign_extend(raw, signal.length),
        }
    }

    /// Apply scale and offset in double precision
    fn physical_value(raw_value: i64, signal: &SignalDefinition) -> f64 {
        let raw = match signal.value_type {
            ValueType::Signed => raw_value as f64,
            // Recover the unsigned magnitude of full-width values
            ValueType::Unsigned => raw_value as u64 as f64,
        };
        raw * signal.factor + signal.offset
    }

    /// Sign-extend a value from N bits to 64 bits
    ///
    /// If the value's top bit is 1, fill the upper bits with 1s.
    fn sign_extend(value: u64, bit_length: u32) -> i64 {
        if bit_length == 0 || bit_length >= bits::MAX_BIT_LENGTH {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            (value | !bits::mask(bit_length)) as i64
        } else {
            value as i64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::catalog::ByteOrder;

    fn mux_message() -> MessageDefinition {
        let mut message = MessageDefinition::new(0x200, "MultiplexedMsg", 8);
        message.signals = vec![
            SignalDefinition::new("Counter", 24, 8),
            SignalDefinition::new("Mode", 0, 8).with_multiplexer(MultiplexRole::Switch),
            SignalDefinition::new("SignalA", 8, 16).with_multiplexer(MultiplexRole::Value(0)),
            SignalDefinition::new("SignalB", 8, 16)
                .with_scaling(0.1, 0.0)
                .with_multiplexer(MultiplexRole::Value(1)),
        ];
        message
    }

    fn names(signals: &[DecodedSignal]) -> Vec<&str> {
        signals.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_sign_extend_positive() {
        // 8-bit value 0x7F (127) should remain positive
        assert_eq!(MessageDecoder::sign_extend(0x7F, 8), 127);
    }

    #[test]
    fn test_sign_extend_negative() {
        // 8-bit value 0xFF (-1 in two's complement) should become -1
        assert_eq!(MessageDecoder::sign_extend(0xFF, 8), -1);
    }

    #[test]
    fn test_sign_extend_negative_16bit() {
        assert_eq!(MessageDecoder::sign_extend(0x8000, 16), -32768);
    }

    #[test]
    fn test_sign_extend_full_width() {
        assert_eq!(MessageDecoder::sign_extend(u64::MAX, 64), -1);
    }

    #[test]
    fn test_scaled_little_endian() {
        let signal = SignalDefinition::new("SigLE", 0, 16).with_scaling(0.1, 0.0);
        let decoded = MessageDecoder::decode_signal(&[0x2C, 0x01, 0, 0, 0, 0, 0, 0], &signal);
        assert_eq!(decoded.raw_value, 300);
        assert!((decoded.value - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_big_endian_signed_12bit() {
        let signal = SignalDefinition::new("SigBE", 0, 12)
            .with_byte_order(ByteOrder::BigEndian)
            .with_value_type(ValueType::Signed);
        let decoded = MessageDecoder::decode_signal(&[0xFF, 0x0F, 0, 0, 0, 0, 0, 0], &signal);
        // Field reads 0xFF0, top bit set
        assert_eq!(decoded.raw_value, -16);
        assert_eq!(decoded.value, -16.0);
    }

    #[test]
    fn test_offset_applied_after_scale() {
        let signal = SignalDefinition::new("Temp", 0, 8).with_scaling(0.5, -40.0);
        let decoded = MessageDecoder::decode_signal(&[100], &signal);
        assert_eq!(decoded.value, 10.0);
    }

    #[test]
    fn test_unsigned_full_width_keeps_magnitude() {
        let signal = SignalDefinition::new("Big", 0, 64);
        let decoded = MessageDecoder::decode_signal(&[0xFF; 8], &signal);
        assert_eq!(decoded.value, u64::MAX as f64);
        assert!(decoded.value > 0.0);
    }

    #[test]
    fn test_short_payload_is_zero_filled() {
        let signal = SignalDefinition::new("Wide", 0, 32);
        let decoded = MessageDecoder::decode_signal(&[0x01], &signal);
        assert_eq!(decoded.raw_value, 1);
    }

    #[test]
    fn test_multiplexer_selects_signal() {
        let message = mux_message();

        let mode0 = MessageDecoder::decode_message(&[0x00, 0x2C, 0x01, 0x07], &message);
        assert_eq!(names(&mode0), vec!["Counter", "Mode", "SignalA"]);
        assert_eq!(mode0[2].value, 300.0);

        let mode1 = MessageDecoder::decode_message(&[0x01, 0x2C, 0x01, 0x07], &message);
        assert_eq!(names(&mode1), vec!["Counter", "Mode", "SignalB"]);
        assert!((mode1[2].value - 30.0).abs() < 1e-9);

        let mode2 = MessageDecoder::decode_message(&[0x02, 0x2C, 0x01, 0x07], &message);
        assert_eq!(names(&mode2), vec!["Counter", "Mode"]);
    }

    #[test]
    fn test_switch_compared_on_raw_value() {
        // Scaling on the switch must not affect selection
        let mut message = mux_message();
        message.signals[1] = SignalDefinition::new("Mode", 0, 8)
            .with_scaling(10.0, 5.0)
            .with_multiplexer(MultiplexRole::Switch);

        let decoded = MessageDecoder::decode_message(&[0x01, 0x00, 0x00], &message);
        assert_eq!(names(&decoded), vec!["Counter", "Mode", "SignalB"]);
        assert_eq!(decoded[1].value, 15.0);
    }

    #[test]
    fn test_multiplexed_without_switch_is_skipped() {
        let mut message = mux_message();
        message.signals.remove(1);

        let decoded = MessageDecoder::decode_message(&[0x00; 8], &message);
        assert_eq!(names(&decoded), vec!["Counter"]);
    }
}
