//! Key codec: ordering-preserving record and index key assembly.
//!
//! Key format:
//! - record key: `r:<root>:<16-byte id>`
//! - index key:  `i:<root>:<lowercase index name>:<encoded value>:<16-byte id>`
//!
//! Identifier extraction always takes the trailing 16 bytes of a key and
//! never splits on the separator, so binary-encoded values may contain any
//! byte.

use crate::id::Id;
use crate::value::Value;

/// Prefix byte for record keys.
pub const RECORD_PREFIX: u8 = b'r';

/// Prefix byte for index keys.
pub const INDEX_PREFIX: u8 = b'i';

/// Separator between key components.
pub const SEPARATOR: u8 = b':';

/// The primary key of a record.
pub fn record_key(root: &str, id: &Id) -> Vec<u8> {
    let mut key = record_prefix(root);
    key.extend_from_slice(id.as_bytes());
    key
}

/// The prefix shared by all record keys of a root, separator included.
pub fn record_prefix(root: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(root.len() + 3);
    key.push(RECORD_PREFIX);
    key.push(SEPARATOR);
    key.extend_from_slice(root.as_bytes());
    key.push(SEPARATOR);
    key
}

/// An index entry key for (root, index name, value, owning id).
///
/// Index names are normalized to lowercase at storage time.
pub fn index_key(root: &str, index_name: &str, value: &Value, id: &Id) -> Vec<u8> {
    let mut key = index_value_prefix(root, index_name, value);
    key.extend_from_slice(id.as_bytes());
    key
}

/// The prefix shared by all entries of one index, separator included.
pub fn index_prefix(root: &str, index_name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(root.len() + index_name.len() + 4);
    key.push(INDEX_PREFIX);
    key.push(SEPARATOR);
    key.extend_from_slice(root.as_bytes());
    key.push(SEPARATOR);
    for b in index_name.bytes() {
        key.push(b.to_ascii_lowercase());
    }
    key.push(SEPARATOR);
    key
}

/// The prefix shared by all entries of one index holding one exact value,
/// trailing separator included. Only the 16-byte identifier follows it.
pub fn index_value_prefix(root: &str, index_name: &str, value: &Value) -> Vec<u8> {
    let mut key = index_prefix(root, index_name);
    value.encode_into(&mut key);
    key.push(SEPARATOR);
    key
}

/// The smallest key strictly greater than every key starting with `prefix`.
///
/// Returns `None` when no such key exists (all bytes 0xFF), in which case
/// the scan is unbounded above.
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last != 0xFF {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}
