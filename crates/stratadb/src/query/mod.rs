//! Query configuration, builder surface and execution.
//!
//! A query accumulates an immutable [`QueryConfig`] through chainable
//! builder calls; translation into a [`ScanStrategy`] happens only at the
//! terminal call, and execution runs inside a single read transaction.

mod executor;
mod plan;

pub use plan::{plan, ScanStrategy};

use std::marker::PhantomData;
use std::time::SystemTime;

use crate::db::Db;
use crate::error::Error;
use crate::id::Id;
use crate::model::{Context, Model};
use crate::storage::Store;
use crate::value::Value;

/// A range bound: an index value, an explicit identifier, or a timestamp
/// (translated to the identifier with that timestamp and zero payload).
#[derive(Debug, Clone)]
pub enum Bound {
    /// An index value bound; requires a named index.
    Value(Value),
    /// An identifier bound on the primary order.
    Id(Id),
    /// A timestamp bound on the primary order.
    Time(SystemTime),
}

impl From<Value> for Bound {
    fn from(v: Value) -> Self {
        Bound::Value(v)
    }
}

impl From<i64> for Bound {
    fn from(n: i64) -> Self {
        Bound::Value(Value::Int(n))
    }
}

impl From<i32> for Bound {
    fn from(n: i32) -> Self {
        Bound::Value(Value::Int(n as i64))
    }
}

impl From<f64> for Bound {
    fn from(f: f64) -> Self {
        Bound::Value(Value::Float(f))
    }
}

impl From<&str> for Bound {
    fn from(s: &str) -> Self {
        Bound::Value(Value::Text(s.to_string()))
    }
}

impl From<String> for Bound {
    fn from(s: String) -> Self {
        Bound::Value(Value::Text(s))
    }
}

impl From<Id> for Bound {
    fn from(id: Id) -> Self {
        Bound::Id(id)
    }
}

impl From<SystemTime> for Bound {
    fn from(t: SystemTime) -> Self {
        Bound::Time(t)
    }
}

/// Immutable query configuration, translated into a plan at the terminal
/// call. All ranges are half-open: From inclusive, To exclusive.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Target root.
    pub root: &'static str,
    /// Named index for value-range scans.
    pub index: Option<String>,
    /// Inclusive lower value bound (requires `index`).
    pub lower: Option<Value>,
    /// Exclusive upper value bound (requires `index`).
    pub upper: Option<Value>,
    /// Inclusive lower identifier bound.
    pub since: Option<Id>,
    /// Exclusive upper identifier bound.
    pub until: Option<Id>,
    /// Reverse output order. Never reinterprets bounds.
    pub reverse: bool,
    /// Maximum results; 0 means unlimited.
    pub limit: usize,
    /// Candidates to skip before collecting results.
    pub offset: usize,
    /// Equality match constraints as (index name, value), ANDed together.
    pub matches: Vec<(String, Value)>,
    /// Context handed to post-fetch hooks. Empty by default, never null.
    pub context: Context,
}

impl QueryConfig {
    /// An unconstrained configuration for one root.
    pub fn new(root: &'static str) -> Self {
        Self {
            root,
            index: None,
            lower: None,
            upper: None,
            since: None,
            until: None,
            reverse: false,
            limit: 0,
            offset: 0,
            matches: Vec::new(),
            context: Context::new(),
        }
    }
}

/// A chainable query over one entity type.
pub struct Query<'a, S: Store, T: Model> {
    db: &'a Db<S>,
    config: QueryConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, S: Store, T: Model> Query<'a, S, T> {
    pub(crate) fn new(db: &'a Db<S>) -> Self {
        Self {
            db,
            config: QueryConfig::new(T::ROOT),
            _marker: PhantomData,
        }
    }

    /// Scan the named index instead of the primary order. Unknown names
    /// yield zero results.
    pub fn with_index(mut self, name: impl Into<String>) -> Self {
        self.config.index = Some(name.into());
        self
    }

    /// Inclusive lower bound: an index value, identifier or timestamp.
    pub fn from(mut self, bound: impl Into<Bound>) -> Self {
        match bound.into() {
            Bound::Value(v) => self.config.lower = Some(v),
            Bound::Id(id) => self.config.since = Some(id),
            Bound::Time(t) => self.config.since = Some(Id::from_time(t)),
        }
        self
    }

    /// Exclusive upper bound: an index value, identifier or timestamp.
    pub fn to(mut self, bound: impl Into<Bound>) -> Self {
        match bound.into() {
            Bound::Value(v) => self.config.upper = Some(v),
            Bound::Id(id) => self.config.until = Some(id),
            Bound::Time(t) => self.config.until = Some(Id::from_time(t)),
        }
        self
    }

    /// Reverse the output order without changing the result set.
    pub fn reverse(mut self) -> Self {
        self.config.reverse = true;
        self
    }

    /// Cap the number of results. 0 means unlimited.
    pub fn limit(mut self, n: usize) -> Self {
        self.config.limit = n;
        self
    }

    /// Skip the first `n` candidates.
    pub fn offset(mut self, n: usize) -> Self {
        self.config.offset = n;
        self
    }

    /// Add an equality constraint on a named index. Multiple constraints
    /// are ANDed via identifier intersection.
    pub fn matching(mut self, index: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.matches.push((index.into(), value.into()));
        self
    }

    /// Supply the context passed to post-fetch hooks during this execution.
    pub fn with_context(mut self, context: Context) -> Self {
        self.config.context = context;
        self
    }

    /// Execute and return the matching records.
    pub fn run(self) -> Result<Vec<T>, Error> {
        let txn = self.db.store().begin_read()?;
        executor::run::<T, _>(&txn, &self.config)
    }

    /// Count matching records without hydrating them.
    pub fn count(self) -> Result<usize, Error> {
        let txn = self.db.store().begin_read()?;
        executor::count::<T, _>(&txn, &self.config)
    }

    /// Execute with an implicit limit of one.
    pub fn first(mut self) -> Result<Option<T>, Error> {
        self.config.limit = 1;
        Ok(self.run()?.into_iter().next())
    }

    /// The candidate identifiers, sorted and paged, without hydration.
    /// Combine across queries with [`crate::idset::union`] for OR
    /// composition.
    pub fn ids(self) -> Result<Vec<Id>, Error> {
        let txn = self.db.store().begin_read()?;
        executor::ids::<T, _>(&txn, &self.config)
    }

    /// Sum the named numeric field over every candidate, ignoring `limit`.
    /// The sum's arithmetic type matches the field's declared kind.
    pub fn sum(self, field: &str) -> Result<Value, Error> {
        let txn = self.db.store().begin_read()?;
        executor::sum::<T, _>(&txn, &self.config, field)
    }
}
