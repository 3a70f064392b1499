//! Query execution against a read transaction.
//!
//! Candidate identifiers are resolved per the planned strategy, sorted into
//! the requested direction, paged, and hydrated by primary-key fetch inside
//! the same read transaction that resolved them.

use tracing::trace;

use crate::error::Error;
use crate::id::{Id, ID_SIZE};
use crate::idset;
use crate::key;
use crate::model::Model;
use crate::storage::ReadTxn;
use crate::value::{Kind, Value};

use super::plan::{plan, ScanStrategy};
use super::QueryConfig;

/// Run the query: resolve, sort, page, hydrate.
pub(crate) fn run<T: Model, R: ReadTxn>(txn: &R, config: &QueryConfig) -> Result<Vec<T>, Error> {
    let ids = candidate_page::<T, R>(txn, config)?;
    hydrate::<T, R>(txn, config, &ids)
}

/// Count matching records without hydrating them.
pub(crate) fn count<T: Model, R: ReadTxn>(txn: &R, config: &QueryConfig) -> Result<usize, Error> {
    Ok(candidate_page::<T, R>(txn, config)?.len())
}

/// The candidate identifiers, sorted and paged, without hydration.
pub(crate) fn ids<T: Model, R: ReadTxn>(txn: &R, config: &QueryConfig) -> Result<Vec<Id>, Error> {
    candidate_page::<T, R>(txn, config)
}

/// Fold one named numeric field over every candidate into a running sum.
///
/// Limit is ignored: aggregation covers the full candidate set past the
/// offset. The sum's arithmetic type matches the field's declared kind.
pub(crate) fn sum<T: Model, R: ReadTxn>(
    txn: &R,
    config: &QueryConfig,
    field: &str,
) -> Result<Value, Error> {
    let descriptors = T::indexes();
    let descriptor = descriptors
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(field))
        .ok_or_else(|| Error::Usage(format!("cannot aggregate undeclared field '{field}'")))?;

    let mut total = match descriptor.kind {
        Kind::Int => Value::Int(0),
        Kind::Float => Value::Float(0.0),
        Kind::Text | Kind::Bool => {
            return Err(Error::Usage(format!(
                "cannot aggregate non-numeric field '{field}'"
            )))
        }
    };

    let strategy = plan::<T>(config)?;
    let mut candidates = resolve(txn, config.root, &strategy)?;
    idset::sort(&mut candidates, config.reverse);
    let page = paginate(candidates, config.offset, 0);

    for record in hydrate::<T, R>(txn, config, &page)? {
        for value in descriptor.values(&record) {
            match (&mut total, value) {
                (Value::Int(sum), Value::Int(n)) => *sum += n,
                (Value::Float(sum), Value::Float(f)) => *sum += f,
                _ => {}
            }
        }
    }

    Ok(total)
}

/// Resolve, sort and page the candidate identifiers.
fn candidate_page<T: Model, R: ReadTxn>(txn: &R, config: &QueryConfig) -> Result<Vec<Id>, Error> {
    let strategy = plan::<T>(config)?;
    trace!(root = config.root, ?strategy, "planned query");

    let mut candidates = resolve(txn, config.root, &strategy)?;
    idset::sort(&mut candidates, config.reverse);
    Ok(paginate(candidates, config.offset, config.limit))
}

/// Resolve a strategy into its (unsorted) candidate identifiers.
fn resolve<R: ReadTxn>(txn: &R, root: &str, strategy: &ScanStrategy) -> Result<Vec<Id>, Error> {
    match strategy {
        ScanStrategy::Empty => Ok(Vec::new()),

        ScanStrategy::Primary { from, to } => primary_range_ids(txn, root, *from, *to),

        ScanStrategy::Index {
            index,
            lower,
            upper,
            id_from,
            id_to,
        } => index_range_ids(txn, root, index, lower.as_ref(), upper.as_ref(), *id_from, *id_to),

        ScanStrategy::Match { constraints, range } => {
            let mut lists = Vec::with_capacity(constraints.len() + 1);
            for (name, value) in constraints {
                lists.push(match_ids(txn, root, name, value)?);
            }
            if let Some(range) = range {
                lists.push(resolve(txn, root, range)?);
            }
            Ok(idset::intersection(&lists))
        }
    }
}

/// Identifiers of all records in the root's primary range `[from, to)`.
fn primary_range_ids<R: ReadTxn>(
    txn: &R,
    root: &str,
    from: Option<Id>,
    to: Option<Id>,
) -> Result<Vec<Id>, Error> {
    let prefix = key::record_prefix(root);

    let lower = match from {
        Some(id) => key::record_key(root, &id),
        None => prefix.clone(),
    };
    let upper = match to {
        Some(id) => Some(key::record_key(root, &id)),
        None => key::prefix_successor(&prefix),
    };

    let mut ids = Vec::new();
    for entry in txn.range(&lower, upper.as_deref(), false) {
        let (entry_key, _) = entry?;
        if entry_key.len() != prefix.len() + ID_SIZE {
            return Err(Error::InvalidKey);
        }
        ids.push(Id::from_key_suffix(&entry_key)?);
    }
    Ok(ids)
}

/// Identifiers extracted from one index's key range, clamped to the
/// identifier bounds when present.
fn index_range_ids<R: ReadTxn>(
    txn: &R,
    root: &str,
    index: &str,
    lower: Option<&Value>,
    upper: Option<&Value>,
    id_from: Option<Id>,
    id_to: Option<Id>,
) -> Result<Vec<Id>, Error> {
    let prefix = key::index_prefix(root, index);

    let mut lower_key = prefix.clone();
    if let Some(value) = lower {
        value.encode_into(&mut lower_key);
    }
    let upper_key = match upper {
        Some(value) => {
            let mut k = prefix.clone();
            value.encode_into(&mut k);
            Some(k)
        }
        None => key::prefix_successor(&prefix),
    };

    let mut ids = Vec::new();
    for entry in txn.range(&lower_key, upper_key.as_deref(), false) {
        let (entry_key, _) = entry?;
        let id = Id::from_key_suffix(&entry_key)?;

        if id_from.is_some_and(|from| id < from) || id_to.is_some_and(|to| id >= to) {
            continue;
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Identifiers of the exact index entries for one equality constraint.
fn match_ids<R: ReadTxn>(
    txn: &R,
    root: &str,
    index: &str,
    value: &Value,
) -> Result<Vec<Id>, Error> {
    let prefix = key::index_value_prefix(root, index, value);
    let upper = key::prefix_successor(&prefix);

    let mut ids = Vec::new();
    for entry in txn.range(&prefix, upper.as_deref(), false) {
        let (entry_key, _) = entry?;
        // Entries carry exactly the 16-byte identifier after the value prefix
        if entry_key.len() != prefix.len() + ID_SIZE {
            continue;
        }
        ids.push(Id::from_key_suffix(&entry_key)?);
    }
    Ok(ids)
}

/// Hydrate records by primary-key fetch and invoke post-fetch hooks.
///
/// An identifier whose primary record is absent is skipped: a dangling
/// index entry is zero results for a scan, not a failure.
fn hydrate<T: Model, R: ReadTxn>(
    txn: &R,
    config: &QueryConfig,
    ids: &[Id],
) -> Result<Vec<T>, Error> {
    let mut records = Vec::with_capacity(ids.len());

    for id in ids {
        let Some(bytes) = txn.get(&key::record_key(config.root, id))? else {
            continue;
        };
        let mut record: T = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        record.post_fetch(&config.context);
        records.push(record);
    }

    Ok(records)
}

/// Skip `offset` identifiers, then take up to `limit` (0 = unlimited).
fn paginate(ids: Vec<Id>, offset: usize, limit: usize) -> Vec<Id> {
    let iter = ids.into_iter().skip(offset);
    match limit {
        0 => iter.collect(),
        n => iter.take(n).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let ids: Vec<Id> = (0..10).map(|_| Id::generate()).collect();

        assert_eq!(paginate(ids.clone(), 0, 0).len(), 10);
        assert_eq!(paginate(ids.clone(), 0, 3).len(), 3);
        assert_eq!(paginate(ids.clone(), 2, 0).len(), 8);
        assert_eq!(paginate(ids.clone(), 2, 3), ids[2..5].to_vec());
        assert_eq!(paginate(ids.clone(), 9, 5).len(), 1);
        assert!(paginate(ids, 20, 0).is_empty());
    }
}
