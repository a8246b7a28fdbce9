use crate::{histogram::Count, key::SplitKey};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Final outcome of a sort, as delivered to the data holders on commit.
///
/// Interval `i` is `[boundaries[i], boundaries[i + 1])` and belongs to partition
/// `owners[i]`; `counts[i]` is the exact number of records inside it.
pub struct PartitionTable<K> {
    pub boundaries: Vec<K>,
    pub owners: Vec<usize>,
    pub counts: Vec<Count>,
    /// histogram rounds used, including the final exact count
    pub rounds: u32,
}

impl<K: SplitKey> PartitionTable<K> {
    pub fn partitions(&self) -> usize {
        self.owners.len()
    }

    /// splitter keys without the `MIN`/`MAX` sentinels
    pub fn splitters(&self) -> &[K] {
        match self.boundaries.len() {
            0..=2 => &[],
            len => &self.boundaries[1..len - 1],
        }
    }

    /// Partition responsible for a record key.
    ///
    /// Duplicate splitters leave empty partitions in between, the record goes to the
    /// last partition whose interval starts at or below its key.
    pub fn partition_of(&self, key: K) -> usize {
        let interval = self
            .boundaries
            .partition_point(|boundary| *boundary <= key)
            .saturating_sub(1)
            .min(self.owners.len().saturating_sub(1));

        self.owners.get(interval).copied().unwrap_or(0)
    }

    pub fn total(&self) -> Count {
        self.counts.iter().sum()
    }

    /// largest distance of a single partition from the average partition size
    pub fn max_deviation(&self) -> Count {
        let average = self.total() / self.partitions().max(1) as Count;

        self.counts
            .iter()
            .map(|count| count.abs_diff(average))
            .max()
            .unwrap_or(0)
    }
}
