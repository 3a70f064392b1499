//! sled-backed implementation of the store contract.

use std::collections::BTreeMap;

use sled::{Db, Tree};
use tracing::debug;

use super::config::StoreConfig;
use super::store::{KvPair, ReadTxn, Store, WriteTxn};
use crate::error::Error;

/// Tree holding all record and index keys.
const DATA_TREE: &str = "data";

/// An ordered store on a single sled tree.
///
/// Records and index entries share one keyspace, separated by their key
/// prefixes, so one atomic batch covers a record together with its index
/// entries.
pub struct SledStore {
    db: Db,
    tree: Tree,
}

impl SledStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StoreConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let tree = db.open_tree(DATA_TREE)?;
        debug!(path = %config.path.display(), "opened sled store");

        Ok(Self { db, tree })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Database size on disk in bytes.
    pub fn size_on_disk(&self) -> Result<u64, Error> {
        Ok(self.db.size_on_disk()?)
    }
}

impl Store for SledStore {
    type Read<'s>
        = SledReadTxn<'s>
    where
        Self: 's;
    type Write<'s>
        = SledWriteTxn<'s>
    where
        Self: 's;

    fn begin_read(&self) -> Result<Self::Read<'_>, Error> {
        Ok(SledReadTxn { tree: &self.tree })
    }

    fn begin_write(&self) -> Result<Self::Write<'_>, Error> {
        Ok(SledWriteTxn {
            tree: &self.tree,
            pending: BTreeMap::new(),
        })
    }
}

/// Read transaction over the sled tree.
pub struct SledReadTxn<'a> {
    tree: &'a Tree,
}

impl ReadTxn for SledReadTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn range<'a>(
        &'a self,
        lower: &[u8],
        upper: Option<&[u8]>,
        reverse: bool,
    ) -> Box<dyn Iterator<Item = Result<KvPair, Error>> + 'a> {
        let iter = match upper {
            Some(upper) => self.tree.range(lower.to_vec()..upper.to_vec()),
            None => self.tree.range(lower.to_vec()..),
        };
        let iter = iter.map(|entry| {
            entry
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(Error::from)
        });

        if reverse {
            Box::new(iter.rev())
        } else {
            Box::new(iter)
        }
    }
}

/// Write transaction buffering operations until commit.
///
/// Operations land in an overlay map, making uncommitted writes visible to
/// `get`; commit applies the whole overlay as one atomic sled batch.
/// Dropping the transaction without committing discards every operation.
pub struct SledWriteTxn<'a> {
    tree: &'a Tree,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteTxn for SledWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        if let Some(pending) = self.pending.get(key) {
            return Ok(pending.clone());
        }
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), Error> {
        self.pending.insert(key, Some(value));
        Ok(())
    }

    fn delete(&mut self, key: Vec<u8>) -> Result<(), Error> {
        self.pending.insert(key, None);
        Ok(())
    }

    fn commit(self) -> Result<(), Error> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut batch = sled::Batch::default();
        for (key, op) in self.pending {
            match op {
                Some(value) => batch.insert(key, value),
                None => batch.remove(key),
            }
        }

        self.tree.apply_batch(batch)?;
        Ok(())
    }
}
