//! The database facade: typed save, get, delete and find over a store.

use std::path::Path;

use tracing::debug;

use crate::error::Error;
use crate::id::Id;
use crate::index;
use crate::key;
use crate::model::{Context, Model};
use crate::query::Query;
use crate::storage::{ReadTxn, SledStore, Store, StoreConfig, WriteTxn};

/// An embeddable structured-record store over an ordered key-value engine.
///
/// Writes derive index entries from each record's declared descriptors and
/// commit them with the primary record in one transaction; reads resolve
/// queries against a single read transaction.
pub struct Db<S: Store = SledStore> {
    store: S,
}

impl Db<SledStore> {
    /// Open or create a sled-backed database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with(StoreConfig::new(path.as_ref()))
    }

    /// Open with explicit store configuration.
    pub fn open_with(config: StoreConfig) -> Result<Self, Error> {
        Ok(Self {
            store: SledStore::open(config)?,
        })
    }

    /// Open a temporary database, deleted on drop. Intended for tests.
    pub fn temporary() -> Result<Self, Error> {
        Self::open_with(StoreConfig::temporary())
    }
}

impl<S: Store> Db<S> {
    /// Wrap an already-open store.
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save one record. See [`Db::save_all`].
    pub fn save<T: Model>(&self, record: &mut T) -> Result<(), Error> {
        self.save_all(std::slice::from_mut(record))
    }

    /// Save records atomically: every primary record and every derived index
    /// entry in the call commits, or none does.
    ///
    /// A nil identifier is replaced with a freshly generated one. Updates
    /// retract the index entries derived from the previously stored values
    /// inside the same transaction before writing the new ones.
    pub fn save_all<T: Model>(&self, records: &mut [T]) -> Result<(), Error> {
        let mut txn = self.store.begin_write()?;

        for record in records.iter_mut() {
            if record.id().is_nil() {
                record.set_id(Id::generate());
            }
            let id = record.id();
            let primary = key::record_key(T::ROOT, &id);

            if let Some(old_bytes) = txn.get(&primary)? {
                let old: T = serde_json::from_slice(&old_bytes)
                    .map_err(|e| Error::Deserialization(e.to_string()))?;
                index::retract_entries(&mut txn, &old, &id)?;
            }

            let payload =
                serde_json::to_vec(&*record).map_err(|e| Error::Serialization(e.to_string()))?;
            txn.put(primary, payload)?;
            index::write_entries(&mut txn, &*record, &id)?;
        }

        txn.commit()?;
        debug!(root = T::ROOT, count = records.len(), "saved records");
        Ok(())
    }

    /// Fetch a record by identifier. An absent identifier is an explicit
    /// [`Error::NotFound`], unlike scans.
    pub fn get<T: Model>(&self, id: Id) -> Result<T, Error> {
        self.get_with_context(id, &Context::new())
    }

    /// Fetch a record by identifier, passing a context to its post-fetch
    /// hook.
    pub fn get_with_context<T: Model>(&self, id: Id, context: &Context) -> Result<T, Error> {
        let txn = self.store.begin_read()?;
        let bytes = txn
            .get(&key::record_key(T::ROOT, &id))?
            .ok_or(Error::NotFound)?;

        let mut record: T =
            serde_json::from_slice(&bytes).map_err(|e| Error::Deserialization(e.to_string()))?;
        record.post_fetch(context);
        Ok(record)
    }

    /// Delete a record, retracting its index entries in the same
    /// transaction. An absent identifier is [`Error::NotFound`].
    pub fn delete<T: Model>(&self, id: Id) -> Result<(), Error> {
        let mut txn = self.store.begin_write()?;
        let primary = key::record_key(T::ROOT, &id);

        let bytes = txn.get(&primary)?.ok_or(Error::NotFound)?;
        let record: T =
            serde_json::from_slice(&bytes).map_err(|e| Error::Deserialization(e.to_string()))?;

        index::retract_entries(&mut txn, &record, &id)?;
        txn.delete(primary)?;
        txn.commit()?;

        debug!(root = T::ROOT, %id, "deleted record");
        Ok(())
    }

    /// Begin a chainable query over one entity type.
    pub fn find<T: Model>(&self) -> Query<'_, S, T> {
        Query::new(self)
    }
}
