use std::collections::HashSet;

use crate::feed::{FeedEntry, FeedSnapshot};

/// Entries of `current` whose id is not in `previous`, in feed order.
///
/// Without a previous snapshot every current entry counts as new. Repeated
/// ids inside `current` are checked one by one and are not collapsed.
pub fn diff(previous: Option<&FeedSnapshot>, current: &FeedSnapshot) -> Vec<FeedEntry> {
    let previous = match previous {
        Some(previous) => previous,
        None => return current.datalist.clone(),
    };

    let seen: HashSet<&str> = previous.datalist.iter().map(|e| e.id.as_str()).collect();
    current
        .datalist
        .iter()
        .filter(|e| !seen.contains(e.id.as_str()))
        .cloned()
        .collect()
}
