//! # Debug sink
//!
//! A bounded, in-memory buffer of `header -> value` packets. Components push
//! their working values into it each cycle and the host periodically dumps the
//! buffer to wherever it wants (the simulation executable archives it to the
//! session directory).
//!
//! The buffer never grows beyond its capacity. Two slots before it is full a
//! single warning packet is recorded, after which further packets are dropped
//! until the buffer is dumped or cleared.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, error, info, warn};
use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Capacity of a logger built with [`DebugLogger::default`].
pub const DEFAULT_CAPACITY: usize = 50;

/// Number of slots left free when the full warning is raised.
const FULL_MARGIN: usize = 2;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Anything which can name a debug packet.
pub trait StringIdentifiable {
    fn identifier(&self) -> String;
}

/// A component which can report its working values to a debug logger.
pub trait Debuggable {
    fn debug(&self, logger: &mut DebugLogger);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A debug logger shared between the components of one control loop.
pub type SharedDebugLogger = Rc<RefCell<DebugLogger>>;

/// A free-form packet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(pub String);

/// A header naming an element of a sequence, rendered as `Index[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexIdentifier(pub usize);

/// A single debug record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugPacket {
    pub header: String,
    pub value: DebugValue,
}

/// Bounded buffer of debug packets.
#[derive(Debug)]
pub struct DebugLogger {
    packets: Vec<DebugPacket>,
    capacity: usize,
    full: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The payload of a debug packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DebugValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
}

/// Severity of a message packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    #[error("A debug logger must have a capacity of at least one packet")]
    ZeroCapacity,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StringIdentifiable for Identifier {
    fn identifier(&self) -> String {
        self.0.clone()
    }
}

impl StringIdentifiable for IndexIdentifier {
    fn identifier(&self) -> String {
        format!("Index[{}]", self.0)
    }
}

impl StringIdentifiable for MessageLevel {
    fn identifier(&self) -> String {
        let s = match self {
            MessageLevel::Debug => "DEBUG",
            MessageLevel::Info => "INFO",
            MessageLevel::Warning => "WARNING",
            MessageLevel::Error => "ERROR",
            MessageLevel::Critical => "CRITICAL",
        };
        s.to_string()
    }
}

impl StringIdentifiable for str {
    fn identifier(&self) -> String {
        self.to_string()
    }
}

impl StringIdentifiable for String {
    fn identifier(&self) -> String {
        self.clone()
    }
}

impl From<f64> for DebugValue {
    fn from(v: f64) -> Self {
        DebugValue::Float(v)
    }
}

impl From<i64> for DebugValue {
    fn from(v: i64) -> Self {
        DebugValue::Int(v)
    }
}

impl From<usize> for DebugValue {
    fn from(v: usize) -> Self {
        DebugValue::Int(v as i64)
    }
}

impl From<bool> for DebugValue {
    fn from(v: bool) -> Self {
        DebugValue::Bool(v)
    }
}

impl From<&str> for DebugValue {
    fn from(v: &str) -> Self {
        DebugValue::Text(v.to_string())
    }
}

impl From<String> for DebugValue {
    fn from(v: String) -> Self {
        DebugValue::Text(v)
    }
}

impl fmt::Display for DebugValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugValue::Float(v) => write!(f, "{}", v),
            DebugValue::Int(v) => write!(f, "{}", v),
            DebugValue::Bool(v) => write!(f, "{}", v),
            DebugValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl DebugLogger {
    /// Create a new logger holding at most `capacity` packets.
    pub fn new(capacity: usize) -> Result<Self, DebugError> {
        if capacity == 0 {
            return Err(DebugError::ZeroCapacity);
        }

        Ok(Self {
            packets: Vec::with_capacity(capacity),
            capacity,
            full: false,
        })
    }

    /// Create a new logger wrapped for sharing between components.
    pub fn new_shared(capacity: usize) -> Result<SharedDebugLogger, DebugError> {
        Ok(Rc::new(RefCell::new(Self::new(capacity)?)))
    }

    /// Record a packet, dropping it if the buffer is full.
    pub fn record(&mut self, packet: DebugPacket) {
        if self.full {
            return;
        }

        self.packets.push(packet);

        if self.packets.len() >= self.capacity.saturating_sub(FULL_MARGIN) {
            if self.packets.len() < self.capacity {
                warn!(
                    "Debug buffer full ({} packets), dropping further packets until dumped",
                    self.capacity
                );
                self.packets.push(DebugPacket {
                    header: MessageLevel::Warning.identifier(),
                    value: DebugValue::Text("Debug buffer full".into()),
                });
            }
            self.full = true;
        }
    }

    /// Record a named value.
    pub fn log_value<H, V>(&mut self, header: &H, value: V)
    where
        H: StringIdentifiable + ?Sized,
        V: Into<DebugValue>,
    {
        self.record(DebugPacket {
            header: header.identifier(),
            value: value.into(),
        });
    }

    /// Record a message, mirroring it into the log.
    pub fn log_message(&mut self, level: MessageLevel, message: &str) {
        mirror(level, message);
        self.log_value(&level, message);
    }

    /// Record a message at [`MessageLevel::Debug`].
    pub fn log_debug(&mut self, message: &str) {
        self.log_message(MessageLevel::Debug, message);
    }

    /// Return every recorded packet and empty the buffer.
    pub fn dump(&mut self) -> Vec<DebugPacket> {
        let packets = std::mem::replace(&mut self.packets, Vec::with_capacity(self.capacity));
        self.full = false;
        packets
    }

    /// Empty the buffer, discarding its contents.
    pub fn clear(&mut self) {
        self.packets.clear();
        self.full = false;
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn packets(&self) -> &[DebugPacket] {
        &self.packets
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self {
            packets: Vec::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
            full: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Write a message to the log at the matching level.
pub fn mirror(level: MessageLevel, message: &str) {
    match level {
        MessageLevel::Debug => debug!("{}", message),
        MessageLevel::Info => info!("{}", message),
        MessageLevel::Warning => warn!("{}", message),
        MessageLevel::Error | MessageLevel::Critical => error!("{}", message),
    }
}

/// Report a message to an optional debug logger, falling back to the log
/// alone when none is attached.
pub fn report(logger: Option<&SharedDebugLogger>, level: MessageLevel, message: &str) {
    match logger {
        Some(l) => l.borrow_mut().log_message(level, message),
        None => mirror(level, message),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_capacity() {
        assert!(DebugLogger::new(0).is_err());
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(IndexIdentifier(3).identifier(), "Index[3]");
        assert_eq!(Identifier("robotX".into()).identifier(), "robotX");
        assert_eq!(MessageLevel::Critical.identifier(), "CRITICAL");
        assert_eq!("target".identifier(), "target");
    }

    /// The logger never holds more than its capacity, and dumping empties it.
    #[test]
    fn test_capacity_never_exceeded() {
        for cap in 1..8 {
            let mut logger = DebugLogger::new(cap).unwrap();
            for i in 0..20 {
                logger.log_value(&IndexIdentifier(i), i);
                assert!(logger.len() <= cap);
            }
            assert!(logger.is_full());

            let dumped = logger.dump();
            assert!(dumped.len() <= cap);
            assert_eq!(logger.len(), 0);
            assert!(!logger.is_full());
        }
    }

    #[test]
    fn test_full_warning_emitted_once() {
        let mut logger = DebugLogger::new(5).unwrap();
        for i in 0..10 {
            logger.log_value("x", i as f64);
        }

        let packets = logger.dump();
        assert_eq!(packets.len(), 4);
        assert_eq!(packets[3].header, "WARNING");
        assert_eq!(packets[2].value, DebugValue::Float(2.0));

        // Recording resumes after a dump
        logger.log_value("y", true);
        assert_eq!(logger.packets()[0].value, DebugValue::Bool(true));
    }

    #[test]
    fn test_messages_and_clear() {
        let mut logger = DebugLogger::default();
        logger.log_debug("hello");
        logger.log_message(MessageLevel::Error, "bad");

        assert_eq!(logger.len(), 2);
        assert_eq!(logger.packets()[0].header, "DEBUG");
        assert_eq!(logger.packets()[1].value, DebugValue::Text("bad".into()));

        logger.clear();
        assert!(logger.is_empty());
        assert_eq!(logger.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_report_to_shared() {
        let shared = DebugLogger::new_shared(10).unwrap();
        report(Some(&shared), MessageLevel::Warning, "chord miss");
        report(None, MessageLevel::Warning, "not recorded");

        let packets = shared.borrow_mut().dump();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].header, "WARNING");
    }

    #[test]
    fn test_packet_serialises_flat() {
        let packet = DebugPacket {
            header: "robotX".into(),
            value: DebugValue::Float(1.5),
        };
        assert_eq!(
            serde_json::to_string(&packet).unwrap(),
            r#"{"header":"robotX","value":1.5}"#
        );
    }
}
