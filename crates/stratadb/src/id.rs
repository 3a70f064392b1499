//! Time-ordered record identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Size of an identifier in bytes.
pub const ID_SIZE: usize = 16;

/// A 16-byte, time-ordered record identifier.
///
/// Layout: `[timestamp_nanos (8 bytes, big-endian)][counter (8 bytes, big-endian)]`
///
/// Big-endian encoding makes lexicographic byte ordering match chronological
/// ordering, so primary-key range scans return records in creation order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id([u8; ID_SIZE]);

impl Id {
    /// The nil identifier (all zeros). Records carry this before first save.
    pub const NIL: Id = Id([0u8; ID_SIZE]);

    /// Generate a fresh identifier from the current time.
    ///
    /// A process-local counter breaks ties between identifiers generated
    /// within the same nanosecond tick.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::from_parts(SystemTime::now(), counter)
    }

    /// The identifier with the given timestamp and zero payload.
    ///
    /// This is the smallest identifier any record created at that instant can
    /// carry, which makes it the correct half-open boundary for timestamp
    /// range bounds.
    pub fn from_time(time: SystemTime) -> Self {
        Self::from_parts(time, 0)
    }

    fn from_parts(time: SystemTime, counter: u64) -> Self {
        let nanos = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        let mut bytes = [0u8; ID_SIZE];
        bytes[..8].copy_from_slice(&nanos.to_be_bytes());
        bytes[8..].copy_from_slice(&counter.to_be_bytes());
        Id(bytes)
    }

    /// Reconstruct an identifier from its raw bytes.
    pub fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Id(bytes)
    }

    /// Extract an identifier from the trailing 16 bytes of a key.
    pub fn from_key_suffix(key: &[u8]) -> Result<Self, Error> {
        if key.len() < ID_SIZE {
            return Err(Error::InvalidKey);
        }
        let mut bytes = [0u8; ID_SIZE];
        bytes.copy_from_slice(&key[key.len() - ID_SIZE..]);
        Ok(Id(bytes))
    }

    /// Raw bytes of the identifier.
    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// The creation instant encoded in the identifier.
    pub fn time(&self) -> SystemTime {
        let mut nanos = [0u8; 8];
        nanos.copy_from_slice(&self.0[..8]);
        UNIX_EPOCH + Duration::from_nanos(u64::from_be_bytes(nanos))
    }

    /// Whether this is the nil identifier.
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Parse the canonical text form: 32 lowercase hex digits.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let raw = hex::decode(s).map_err(|_| Error::Usage(format!("unparsable identifier: {s}")))?;
        if raw.len() != ID_SIZE {
            return Err(Error::Usage(format!("unparsable identifier: {s}")));
        }
        let mut bytes = [0u8; ID_SIZE];
        bytes.copy_from_slice(&raw);
        Ok(Id(bytes))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", hex::encode(self.0))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Id::parse(&text).map_err(serde::de::Error::custom)
    }
}
