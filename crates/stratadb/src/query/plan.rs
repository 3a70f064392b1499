//! Query planning: translating an immutable configuration into a scan
//! strategy, independently of any store.

use crate::error::Error;
use crate::id::Id;
use crate::index;
use crate::model::Model;
use crate::value::Value;

use super::QueryConfig;

/// The scan strategy chosen for a query.
///
/// All ranges are half-open: From bounds are inclusive, To bounds exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStrategy {
    /// Scan the primary-key range for the root, bounded by identifiers.
    Primary {
        /// Inclusive lower identifier bound.
        from: Option<Id>,
        /// Exclusive upper identifier bound.
        to: Option<Id>,
    },
    /// Scan one index's key range; identifiers are additionally clamped to
    /// the identifier bounds when present.
    Index {
        /// Index name as declared (lowercased at key assembly).
        index: String,
        /// Inclusive lower value bound.
        lower: Option<Value>,
        /// Exclusive upper value bound.
        upper: Option<Value>,
        /// Inclusive lower identifier bound.
        id_from: Option<Id>,
        /// Exclusive upper identifier bound.
        id_to: Option<Id>,
    },
    /// Exact index lookup per equality constraint; all candidate lists are
    /// intersected, together with the range list when one is also present.
    Match {
        /// Equality constraints as (index name, value).
        constraints: Vec<(String, Value)>,
        /// Additional range candidates to intersect.
        range: Option<Box<ScanStrategy>>,
    },
    /// Unknown index name: zero results by policy, not an error.
    Empty,
}

/// Choose the scan strategy for a configuration.
///
/// Pure: depends only on the configuration and `T`'s declared descriptors,
/// so planning is unit-testable without a store.
pub fn plan<T: Model>(config: &QueryConfig) -> Result<ScanStrategy, Error> {
    if let Some(name) = &config.index {
        if index::declared_kind::<T>(name).is_none() {
            return Ok(ScanStrategy::Empty);
        }
    }
    for (name, _) in &config.matches {
        if index::declared_kind::<T>(name).is_none() {
            return Ok(ScanStrategy::Empty);
        }
    }

    if config.index.is_none() && (config.lower.is_some() || config.upper.is_some()) {
        return Err(Error::Usage(
            "value bounds require an index; use with_index or pass identifier bounds".into(),
        ));
    }

    let range = range_strategy(config);

    if !config.matches.is_empty() {
        return Ok(ScanStrategy::Match {
            constraints: config.matches.clone(),
            range: range.map(Box::new),
        });
    }

    // No constraints: the range scan alone drives the query, and an
    // unbounded primary scan covers the whole root.
    Ok(range.unwrap_or(ScanStrategy::Primary {
        from: None,
        to: None,
    }))
}

/// The range portion of the configuration, if any bound or index is set.
fn range_strategy(config: &QueryConfig) -> Option<ScanStrategy> {
    if let Some(name) = &config.index {
        return Some(ScanStrategy::Index {
            index: name.clone(),
            lower: config.lower.clone(),
            upper: config.upper.clone(),
            id_from: config.since,
            id_to: config.until,
        });
    }

    if config.since.is_some() || config.until.is_some() {
        return Some(ScanStrategy::Primary {
            from: config.since,
            to: config.until,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDescriptor;
    use crate::value::Kind;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Default)]
    struct Order {
        id: Id,
        department: i64,
    }

    impl Model for Order {
        const ROOT: &'static str = "order";

        fn id(&self) -> Id {
            self.id
        }

        fn set_id(&mut self, id: Id) {
            self.id = id;
        }

        fn indexes() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::scalar("department", Kind::Int, |o| {
                Some(Value::Int(o.department))
            })]
        }
    }

    fn config() -> QueryConfig {
        QueryConfig::new(Order::ROOT)
    }

    #[test]
    fn test_bare_config_plans_unbounded_primary_scan() {
        let strategy = plan::<Order>(&config()).unwrap();
        assert_eq!(
            strategy,
            ScanStrategy::Primary {
                from: None,
                to: None
            }
        );
    }

    #[test]
    fn test_id_bounds_plan_primary_range() {
        let from = Id::generate();
        let mut cfg = config();
        cfg.since = Some(from);

        let strategy = plan::<Order>(&cfg).unwrap();
        assert_eq!(
            strategy,
            ScanStrategy::Primary {
                from: Some(from),
                to: None
            }
        );
    }

    #[test]
    fn test_index_bounds_plan_index_range() {
        let mut cfg = config();
        cfg.index = Some("department".into());
        cfg.lower = Some(Value::Int(50));
        cfg.upper = Some(Value::Int(60));

        let strategy = plan::<Order>(&cfg).unwrap();
        assert_eq!(
            strategy,
            ScanStrategy::Index {
                index: "department".into(),
                lower: Some(Value::Int(50)),
                upper: Some(Value::Int(60)),
                id_from: None,
                id_to: None,
            }
        );
    }

    #[test]
    fn test_matches_plan_intersection_with_range() {
        let mut cfg = config();
        cfg.matches.push(("department".into(), Value::Int(42)));
        cfg.since = Some(Id::NIL);

        let strategy = plan::<Order>(&cfg).unwrap();
        match strategy {
            ScanStrategy::Match { constraints, range } => {
                assert_eq!(constraints, vec![("department".into(), Value::Int(42))]);
                assert_eq!(
                    *range.unwrap(),
                    ScanStrategy::Primary {
                        from: Some(Id::NIL),
                        to: None
                    }
                );
            }
            other => panic!("expected match strategy, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_index_plans_empty() {
        let mut cfg = config();
        cfg.index = Some("notanindex".into());
        assert_eq!(plan::<Order>(&cfg).unwrap(), ScanStrategy::Empty);

        let mut cfg = config();
        cfg.matches.push(("notanindex".into(), Value::Int(1)));
        assert_eq!(plan::<Order>(&cfg).unwrap(), ScanStrategy::Empty);
    }

    #[test]
    fn test_value_bounds_without_index_are_a_usage_error() {
        let mut cfg = config();
        cfg.lower = Some(Value::Int(1));

        assert!(matches!(plan::<Order>(&cfg), Err(Error::Usage(_))));
    }
}
