//! Storage layer: the ordered-store contract and its sled backend.

mod config;
mod sled_store;
mod store;

pub use config::StoreConfig;
pub use sled_store::{SledReadTxn, SledStore, SledWriteTxn};
pub use store::{KvPair, ReadTxn, Store, WriteTxn};
