use crate::{histogram::Count, key::SplitKey};
use std::collections::BTreeSet;
use tracing::{trace, warn};

/// Outcome of one refinement step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement<K> {
    /// splitter keys decided in this round, in goal order
    pub resolved: Vec<K>,
    /// keys to probe next round for the remaining goals, without sentinels
    pub probes: BTreeSet<K>,
}

/// One round of the simultaneous binary search over all unresolved goals.
///
/// `cumulative[i]` is the number of records below `candidates[i]`. `goals` must be
/// sorted ascending: a single cursor moves forward over `cumulative` and is never
/// rewound. Resolved goals are removed from `goals`.
pub fn refine<K: SplitKey>(
    candidates: &[K],
    cumulative: &[Count],
    goals: &mut Vec<Count>,
    window: Count,
) -> Refinement<K> {
    debug_assert_eq!(candidates.len(), cumulative.len());

    let mut resolved = Vec::new();
    let mut probes = BTreeSet::new();
    let mut cursor = 0;
    let last = cumulative.len().saturating_sub(1);

    goals.retain(|&goal| {
        // lower bound, first position holding at least `goal` records below it
        cursor += cumulative[cursor..].partition_point(|&count| count < goal);

        let right = if cursor > last {
            warn!(goal, "Goal lies beyond the last probed key, bracketing with the final gap");
            last
        } else {
            cursor
        };
        let left = if right == 0 {
            warn!(goal, "Goal lies at the first probed key, bracket is degenerate");
            0
        } else {
            right - 1
        };

        let (left_key, right_key) = (candidates[left], candidates[right]);
        let left_miss = cumulative[left].abs_diff(goal);
        let right_miss = cumulative[right].abs_diff(goal);

        if left_miss <= window {
            resolved.push(left_key);
            false
        } else if right_miss <= window {
            resolved.push(right_key);
            false
        } else if let Some(middle) = left_key.split(right_key) {
            probes.insert(left_key);
            probes.insert(middle);
            probes.insert(right_key);
            true
        } else {
            // no key left between the bounds, settle for the closer one
            let key = if left_miss <= right_miss {
                left_key
            } else {
                right_key
            };
            trace!(
                goal,
                key = ?key,
                miss = left_miss.min(right_miss),
                "Bracket exhausted, accepting imprecise splitter"
            );
            resolved.push(key);
            false
        }
    });

    Refinement { resolved, probes }
}
