//! Message catalog
//!
//! Holds the message and signal layouts of one database. A catalog is built once
//! by a database front end and is read-only afterwards, so it can be shared
//! between threads behind an `Arc` without locking.

use std::collections::HashMap;

/// A complete CAN message definition
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    /// CAN message ID
    pub id: u32,
    /// Message name
    pub name: String,
    /// Declared message size in bytes (advisory, never enforced)
    pub size: usize,
    /// Sender ECU name (optional)
    pub sender: Option<String>,
    /// All signals in this message, in database order
    pub signals: Vec<SignalDefinition>,
}

impl MessageDefinition {
    /// Create an empty message definition
    pub fn new(id: u32, name: impl Into<String>, size: usize) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            sender: None,
            signals: Vec::new(),
        }
    }

    /// The multiplexer switch signal of this message, if any
    pub fn multiplexer(&self) -> Option<&SignalDefinition> {
        self.signals
            .iter()
            .find(|s| s.multiplexer == MultiplexRole::Switch)
    }

    /// True if any signal takes part in multiplexing
    pub fn is_multiplexed(&self) -> bool {
        self.signals
            .iter()
            .any(|s| s.multiplexer != MultiplexRole::None)
    }

    /// Look up a signal by name
    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.name == name)
    }
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit, in the database's numbering for the signal's byte order
    pub start_bit: u32,
    /// Length in bits (1..=64)
    pub length: u32,
    /// Byte order used to lay the bits out in the payload
    pub byte_order: ByteOrder,
    /// Value type (signed/unsigned)
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum physical value
    pub min: f64,
    /// Maximum physical value
    pub max: f64,
    /// Engineering unit (e.g., "km/h", "V")
    pub unit: Option<String>,
    /// Receiving nodes
    pub receivers: Vec<String>,
    /// Role of this signal in single-level multiplexing
    pub multiplexer: MultiplexRole,
}

impl SignalDefinition {
    /// Create an unsigned little-endian signal with unit scaling
    pub fn new(name: impl Into<String>, start_bit: u32, length: u32) -> Self {
        Self {
            name: name.into(),
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: None,
            receivers: Vec::new(),
            multiplexer: MultiplexRole::None,
        }
    }

    /// Builder method: set byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Builder method: set value type
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Builder method: set scale and offset
    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    /// Builder method: set multiplex role
    pub fn with_multiplexer(mut self, role: MultiplexRole) -> Self {
        self.multiplexer = role;
        self
    }
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

/// Multiplexing role of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiplexRole {
    /// Always present
    #[default]
    None,
    /// The multiplexer switch (`M`)
    Switch,
    /// Present only when the switch's raw value equals this (`mNN`)
    Value(u64),
}

/// Read-only catalog of message definitions keyed by CAN ID
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// All message definitions by CAN ID
    messages: HashMap<u32, MessageDefinition>,

    /// Signal name lookup for quick access
    /// Key: Signal name, Value: List of (CAN ID, signal index) tuples
    signal_lookup: HashMap<String, Vec<(u32, usize)>>,
}

impl Catalog {
    /// Freeze a set of message definitions into a catalog
    ///
    /// Messages sharing an ID are resolved by the front end before this point;
    /// should duplicates still arrive, the last one wins.
    pub fn from_messages(messages: impl IntoIterator<Item = MessageDefinition>) -> Self {
        let messages: HashMap<u32, MessageDefinition> =
            messages.into_iter().map(|m| (m.id, m)).collect();

        let mut signal_lookup: HashMap<String, Vec<(u32, usize)>> = HashMap::new();
        for (can_id, message) in &messages {
            for (sig_idx, signal) in message.signals.iter().enumerate() {
                signal_lookup
                    .entry(signal.name.clone())
                    .or_default()
                    .push((*can_id, sig_idx));
            }
        }
        for locations in signal_lookup.values_mut() {
            locations.sort_unstable();
        }

        Self {
            messages,
            signal_lookup,
        }
    }

    /// Get the message definition for a CAN ID
    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.messages.get(&can_id)
    }

    /// Find all messages containing a specific signal name
    pub fn find_signal(&self, signal_name: &str) -> Vec<(u32, &SignalDefinition)> {
        self.signal_lookup
            .get(signal_name)
            .map(|locations| {
                locations
                    .iter()
                    .filter_map(|(can_id, sig_idx)| {
                        self.get_message(*can_id)
                            .and_then(|msg| msg.signals.get(*sig_idx))
                            .map(|sig| (*can_id, sig))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterate over all messages (unordered)
    pub fn messages(&self) -> impl Iterator<Item = &MessageDefinition> {
        self.messages.values()
    }

    /// Get database statistics
    pub fn stats(&self) -> CatalogStats {
        let num_messages = self.messages.len();
        let num_signals: usize = self.messages.values().map(|msg| msg.signals.len()).sum();
        let num_multiplexed = self
            .messages
            .values()
            .filter(|msg| msg.is_multiplexed())
            .count();

        CatalogStats {
            num_messages,
            num_signals,
            num_multiplexed,
        }
    }

    /// Get all unique CAN IDs in the database
    pub fn get_all_can_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.messages.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if the catalog holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
    /// Messages with at least one multiplexed signal
    pub num_multiplexed: usize,
}

impl std::ops::Add for CatalogStats {
    type Output = CatalogStats;

    fn add(self, other: CatalogStats) -> CatalogStats {
        CatalogStats {
            num_messages: self.num_messages + other.num_messages,
            num_signals: self.num_signals + other.num_signals,
            num_multiplexed: self.num_multiplexed + other.num_multiplexed,
        }
    }
}
