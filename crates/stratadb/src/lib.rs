//! stratadb — an embeddable structured-record store on an ordered key-value
//! engine.
//!
//! Records are typed entities with 16-byte time-ordered identifiers.
//! Declared indexable fields produce secondary index entries automatically,
//! written atomically with the record; queries combine primary-order range
//! scans, index value ranges and equality matches with limit, offset,
//! reverse, counting and aggregation.

pub mod db;
pub mod error;
pub mod id;
pub mod idset;
pub mod index;
pub mod key;
pub mod model;
pub mod query;
pub mod storage;
pub mod value;

pub use db::Db;
pub use error::Error;
pub use id::Id;
pub use model::{Context, FieldAccess, FieldDescriptor, Model};
pub use query::{Bound, Query, QueryConfig, ScanStrategy};
pub use storage::{ReadTxn, SledStore, Store, StoreConfig, WriteTxn};
pub use value::{Kind, Value};
