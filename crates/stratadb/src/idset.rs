//! Set algebra over identifier lists, for composing query candidates.

use std::collections::{HashMap, HashSet};

use crate::id::Id;

/// Deduplicated set of identifiers appearing in any input list (OR
/// semantics). Result order is unspecified.
pub fn union(lists: &[Vec<Id>]) -> Vec<Id> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for list in lists {
        for id in list {
            if seen.insert(*id) {
                result.push(*id);
            }
        }
    }

    result
}

/// Identifiers appearing in every input list (AND semantics).
///
/// Zero lists yield nothing; a single list is returned unchanged. Duplicates
/// within one list are counted once, so they cannot inflate that list's
/// contribution toward the present-in-all requirement.
pub fn intersection(lists: &[Vec<Id>]) -> Vec<Id> {
    if lists.is_empty() {
        return Vec::new();
    }
    if lists.len() == 1 {
        return lists[0].clone();
    }

    let mut counts: HashMap<Id, usize> = HashMap::new();
    for list in lists {
        let mut this_list = HashSet::new();
        for id in list {
            if this_list.insert(*id) {
                *counts.entry(*id).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count == lists.len())
        .map(|(id, _)| id)
        .collect()
}

/// Sort identifiers into a stable total order, ascending by default.
pub fn sort(ids: &mut [Id], reverse: bool) {
    ids.sort_unstable();
    if reverse {
        ids.reverse();
    }
}
