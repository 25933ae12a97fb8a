// Waiting-line ordering rules

use crate::domain::entry::EntryId;

/// Minutes until a waiting entry at `position` reaches the counter
///
/// The head of the line waits 0 minutes; everyone behind it waits one
/// service slot per person ahead. Saturates instead of overflowing.
pub fn estimate_wait(position: i64, service_minutes: i64) -> i64 {
    position
        .saturating_sub(1)
        .max(0)
        .saturating_mul(service_minutes.max(0))
}

/// True when `positions` (in any order) is exactly `1..=N`
pub fn is_dense(positions: &[i64]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(idx, &position)| position == idx as i64 + 1)
}

/// Compute the writes that make a waiting line dense again
///
/// `line` must already be sorted by `(position, id)`. Survivors keep their
/// relative order; only entries whose position changes are returned.
pub fn densify(line: &[(EntryId, i64)]) -> Vec<(EntryId, i64)> {
    line.iter()
        .enumerate()
        .filter_map(|(idx, &(id, position))| {
            let target = idx as i64 + 1;
            (position != target).then_some((id, target))
        })
        .collect()
}
