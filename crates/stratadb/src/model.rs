//! The record contract: roots, field descriptors and post-fetch hooks.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::id::Id;
use crate::value::{Kind, Value};

/// Transient string-keyed map passed through one query execution into
/// per-record post-fetch hooks. Never persisted; defaults to empty.
pub type Context = HashMap<String, Value>;

/// How an indexable field's values are read off a record.
///
/// Multi-valuedness is part of the declaration: a scalar accessor yields at
/// most one value, a multi accessor one value per element.
pub enum FieldAccess<R> {
    /// A single optional value. `None` means absent: no entry is written.
    Scalar(fn(&R) -> Option<Value>),
    /// One value per element of a collection field.
    Multi(fn(&R) -> Vec<Value>),
}

/// Registration-time declaration of one indexable field.
///
/// The index builder consumes only these descriptors; fields without a
/// descriptor are never indexed. Nested indexable structures are flattened
/// by declaring descriptors on the outer entity whose accessors reach into
/// the nested value.
pub struct FieldDescriptor<R> {
    /// Index name. Normalized to lowercase at storage time.
    pub name: &'static str,
    /// Declared encoding kind; accessor values must match it.
    pub kind: Kind,
    /// Whether text values are split into content-word tokens, each indexed
    /// separately.
    pub tokenize: bool,
    /// Value accessor.
    pub access: FieldAccess<R>,
}

impl<R> FieldDescriptor<R> {
    /// Declare a scalar indexable field.
    pub fn scalar(name: &'static str, kind: Kind, get: fn(&R) -> Option<Value>) -> Self {
        Self {
            name,
            kind,
            tokenize: false,
            access: FieldAccess::Scalar(get),
        }
    }

    /// Declare a collection-valued indexable field: one entry per element.
    pub fn multi(name: &'static str, kind: Kind, get: fn(&R) -> Vec<Value>) -> Self {
        Self {
            name,
            kind,
            tokenize: false,
            access: FieldAccess::Multi(get),
        }
    }

    /// Declare a text field indexed by content word: tokenized on
    /// whitespace, stop words dropped, one entry per surviving token.
    pub fn tokenized_text(name: &'static str, get: fn(&R) -> Option<Value>) -> Self {
        Self {
            name,
            kind: Kind::Text,
            tokenize: true,
            access: FieldAccess::Scalar(get),
        }
    }

    /// Read the field's values off a record.
    pub fn values(&self, record: &R) -> Vec<Value> {
        match &self.access {
            FieldAccess::Scalar(get) => get(record).into_iter().collect(),
            FieldAccess::Multi(get) => get(record),
        }
    }
}

/// A storable entity.
///
/// Implementors belong to one root (a collection/table analogue), expose
/// get/set of their identifier, declare their indexable fields, and may
/// react to being fetched via [`Model::post_fetch`].
pub trait Model: Serialize + DeserializeOwned {
    /// Namespace grouping this entity's keys and indexes. Must not contain
    /// the `:` separator.
    const ROOT: &'static str;

    /// The record's identifier. Nil before first save.
    fn id(&self) -> Id;

    /// Store a generated identifier on the record.
    fn set_id(&mut self, id: Id);

    /// Indexable field declarations. Default: nothing indexed.
    fn indexes() -> Vec<FieldDescriptor<Self>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Hook invoked after the record is hydrated by a query or direct get,
    /// receiving the execution's [`Context`].
    fn post_fetch(&mut self, _ctx: &Context) {}
}
