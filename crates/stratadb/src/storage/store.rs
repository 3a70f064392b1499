//! The store contract: an ordered byte-key/byte-value transactional engine.
//!
//! The engine supplies scoped read transactions (point get plus ordered
//! iteration over half-open key ranges, forward or backward) and scoped
//! write transactions (read-your-writes get, put, delete, atomic commit).
//! Every operation is synchronous and driven by the calling thread.

use crate::error::Error;

/// A key-value pair yielded by range iteration.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// A scoped read transaction.
///
/// All reads for one query run against a single `ReadTxn`, so index
/// resolution and record hydration observe one consistent view.
pub trait ReadTxn {
    /// Point lookup.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    /// Iterate keys in `[lower, upper)` in key order, or in reverse key
    /// order when `reverse` is set. `None` for `upper` leaves the range
    /// unbounded above.
    fn range<'a>(
        &'a self,
        lower: &[u8],
        upper: Option<&[u8]>,
        reverse: bool,
    ) -> Box<dyn Iterator<Item = Result<KvPair, Error>> + 'a>;
}

/// A scoped read-write transaction.
///
/// Writes are visible to `get` within the same transaction before commit.
/// Commit applies every buffered operation atomically or none at all; a
/// store detecting a write-write conflict must surface
/// [`Error::Conflict`](crate::Error::Conflict) rather than dropping writes.
pub trait WriteTxn {
    /// Point lookup, observing this transaction's uncommitted writes.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    /// Set a key.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), Error>;

    /// Remove a key.
    fn delete(&mut self, key: Vec<u8>) -> Result<(), Error>;

    /// Commit all buffered operations atomically.
    fn commit(self) -> Result<(), Error>;
}

/// An ordered transactional key-value store.
pub trait Store {
    /// Read transaction type.
    type Read<'s>: ReadTxn
    where
        Self: 's;

    /// Write transaction type.
    type Write<'s>: WriteTxn
    where
        Self: 's;

    /// Begin a read transaction. May block while acquiring it.
    fn begin_read(&self) -> Result<Self::Read<'_>, Error>;

    /// Begin a read-write transaction. May block while acquiring it.
    fn begin_write(&self) -> Result<Self::Write<'_>, Error>;
}
