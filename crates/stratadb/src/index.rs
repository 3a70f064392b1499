//! Index builder: derives index entries from declared field descriptors.

use crate::error::Error;
use crate::id::Id;
use crate::key;
use crate::model::Model;
use crate::storage::WriteTxn;
use crate::value::{Kind, Value};

/// Words dropped from tokenized text fields.
const STOP_WORDS: [&str; 5] = ["on", "at", "the", "in", "a"];

/// All index keys for a record at its current field values.
///
/// Scalar fields yield one key, collection fields one per element, and
/// tokenized text fields one per surviving content word. Duplicate element
/// values collapse at the store, since entries are keyed by (value, id).
pub fn entries<T: Model>(record: &T, id: &Id) -> Result<Vec<Vec<u8>>, Error> {
    let mut keys = Vec::new();

    for descriptor in T::indexes() {
        for value in descriptor.values(record) {
            if value.kind() != descriptor.kind {
                return Err(Error::EncodingUnsupported(format!(
                    "index '{}' on root '{}' declared {} but holds {}",
                    descriptor.name,
                    T::ROOT,
                    descriptor.kind,
                    value.kind()
                )));
            }

            // tokenize is only constructible on Text descriptors, and the
            // kind check above has already run
            if let (true, Value::Text(text)) = (descriptor.tokenize, &value) {
                for token in tokenize(text) {
                    keys.push(key::index_key(T::ROOT, descriptor.name, &Value::Text(token), id));
                }
            } else {
                keys.push(key::index_key(T::ROOT, descriptor.name, &value, id));
            }
        }
    }

    Ok(keys)
}

/// Write one payload-less entry per index key into the transaction.
///
/// The first failing write aborts; the caller discards the enclosing
/// transaction on error, so partial application never becomes visible.
pub fn write_entries<T: Model, W: WriteTxn>(txn: &mut W, record: &T, id: &Id) -> Result<(), Error> {
    for entry in entries(record, id)? {
        txn.put(entry, Vec::new())?;
    }
    Ok(())
}

/// Retract every entry the record's current values produce, inside the same
/// transaction as the replacement writes.
pub fn retract_entries<T: Model, W: WriteTxn>(
    txn: &mut W,
    record: &T,
    id: &Id,
) -> Result<(), Error> {
    for entry in entries(record, id)? {
        txn.delete(entry)?;
    }
    Ok(())
}

/// The declared kind of a named index on `T`, if any. Names compare
/// case-insensitively, matching storage-time normalization.
pub fn declared_kind<T: Model>(index_name: &str) -> Option<Kind> {
    T::indexes()
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(index_name))
        .map(|d| d.kind)
}

/// Split text on whitespace and drop stop words. Matching is
/// case-insensitive; surviving tokens keep their original case.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| {
            let lowered = token.to_lowercase();
            !STOP_WORDS.contains(&lowered.as_str())
        })
        .map(|token| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDescriptor;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Default)]
    struct FullRecord {
        id: Id,
        int_field: i64,
        string_field: String,
        float_field: f64,
        int_slice_field: Vec<i64>,
        name: String,
    }

    impl Model for FullRecord {
        const ROOT: &'static str = "fullrecord";

        fn id(&self) -> Id {
            self.id
        }

        fn set_id(&mut self, id: Id) {
            self.id = id;
        }

        fn indexes() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::scalar("IntField", Kind::Int, |r| Some(Value::Int(r.int_field))),
                FieldDescriptor::scalar("StringField", Kind::Text, |r| {
                    Some(Value::Text(r.string_field.clone()))
                }),
                FieldDescriptor::scalar("FloatField", Kind::Float, |r| {
                    Some(Value::Float(r.float_field))
                }),
                FieldDescriptor::multi("IntSliceField", Kind::Int, |r| {
                    r.int_slice_field.iter().map(|n| Value::Int(*n)).collect()
                }),
                FieldDescriptor::tokenized_text("Name", |r| Some(Value::Text(r.name.clone()))),
            ]
        }
    }

    fn entry_set(record: &FullRecord, id: &Id) -> Vec<Vec<u8>> {
        entries(record, id).unwrap()
    }

    #[test]
    fn test_scalar_fields_one_entry_each() {
        let id = Id::generate();
        let record = FullRecord {
            int_field: 1,
            string_field: "test".into(),
            float_field: 0.99,
            ..Default::default()
        };

        let keys = entry_set(&record, &id);

        assert!(keys.contains(&key::index_key("fullrecord", "intfield", &Value::Int(1), &id)));
        assert!(keys.contains(&key::index_key(
            "fullrecord",
            "stringfield",
            &Value::Text("test".into()),
            &id
        )));
        assert!(keys.contains(&key::index_key(
            "fullrecord",
            "floatfield",
            &Value::Float(0.99),
            &id
        )));
    }

    #[test]
    fn test_collection_field_one_entry_per_element() {
        let id = Id::generate();
        let record = FullRecord {
            int_slice_field: vec![1, 2],
            ..Default::default()
        };

        let keys = entry_set(&record, &id);

        assert!(keys.contains(&key::index_key("fullrecord", "intslicefield", &Value::Int(1), &id)));
        assert!(keys.contains(&key::index_key("fullrecord", "intslicefield", &Value::Int(2), &id)));
    }

    #[test]
    fn test_tokenized_field_drops_stop_words() {
        let id = Id::generate();
        let record = FullRecord {
            name: "the coolest fullStruct in the world".into(),
            ..Default::default()
        };

        let keys = entry_set(&record, &id);

        for expected in ["coolest", "fullStruct", "world"] {
            assert!(
                keys.contains(&key::index_key(
                    "fullrecord",
                    "name",
                    &Value::Text(expected.into()),
                    &id
                )),
                "missing token entry for {expected:?}"
            );
        }

        for dropped in ["the", "in"] {
            assert!(
                !keys.contains(&key::index_key(
                    "fullrecord",
                    "name",
                    &Value::Text(dropped.into()),
                    &id
                )),
                "stop word {dropped:?} must not be indexed"
            );
        }
    }

    #[test]
    fn test_every_entry_ends_with_owning_id() {
        let id = Id::generate();
        let record = FullRecord {
            int_field: 7,
            string_field: "x".into(),
            int_slice_field: vec![1, 2, 3],
            name: "alpha beta".into(),
            ..Default::default()
        };

        for entry in entry_set(&record, &id) {
            assert_eq!(Id::from_key_suffix(&entry).unwrap(), id);
        }
    }

    #[test]
    fn test_declared_kind_is_case_insensitive() {
        assert_eq!(declared_kind::<FullRecord>("intfield"), Some(Kind::Int));
        assert_eq!(declared_kind::<FullRecord>("IntField"), Some(Kind::Int));
        assert_eq!(declared_kind::<FullRecord>("notanindex"), None);
    }

    #[test]
    fn test_kind_mismatch_is_encoding_unsupported() {
        #[derive(Serialize, Deserialize, Default)]
        struct Broken {
            id: Id,
        }

        impl Model for Broken {
            const ROOT: &'static str = "broken";

            fn id(&self) -> Id {
                self.id
            }

            fn set_id(&mut self, id: Id) {
                self.id = id;
            }

            fn indexes() -> Vec<FieldDescriptor<Self>> {
                vec![FieldDescriptor::scalar("count", Kind::Int, |_| {
                    Some(Value::Text("not a number".into()))
                })]
            }
        }

        let result = entries(&Broken::default(), &Id::generate());
        assert!(matches!(result, Err(Error::EncodingUnsupported(_))));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("a quick fox"), vec!["quick", "fox"]);
        assert_eq!(tokenize("The Fox AT home"), vec!["Fox", "home"]);
        assert!(tokenize("the in a on at").is_empty());
        assert!(tokenize("").is_empty());
    }
}
