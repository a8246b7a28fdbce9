pub mod local;


use crate::{key::SplitKey, partition::PartitionTable};
use itertools::Itertools;
use thiserror::Error;

/// number of records, always aggregated over the whole cluster
pub type Count = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("At least two candidate keys are required, got {0}")]
    TooFewCandidates(usize),
    #[error("Candidate keys must be sorted")]
    UnsortedCandidates,
    #[error("Partition table is inconsistent: {boundaries} boundaries, {owners} owners, {counts} counts")]
    CommitMismatch {
        boundaries: usize,
        owners: usize,
        counts: usize,
    },
    #[error("Histogram provider is unavailable: {0}")]
    Unavailable(String),
}

/// The distributed side of a sort: whatever holds the records.
///
/// Implementations fan the candidates out to every data holder, sum the local
/// histograms and answer every probe exactly once.
pub trait HistogramProvider<K: SplitKey> {
    /// Count the records in every half-open interval `[candidates[i], candidates[i + 1])`.
    ///
    /// The returned vector holds `candidates.len() - 1` entries, summed over all holders.
    fn probe(&self, candidates: &[K]) -> Result<Vec<Count>, ProviderError>;

    /// Hand the final partition table to the data holders. Called once per sort.
    fn commit(&self, table: &PartitionTable<K>) -> Result<(), ProviderError>;
}

/// Check that a candidate set can be binned.
pub fn check_candidates<K: SplitKey>(candidates: &[K]) -> Result<(), ProviderError> {
    if candidates.len() < 2 {
        return Err(ProviderError::TooFewCandidates(candidates.len()));
    }

    if candidates.iter().tuple_windows().any(|(left, right)| left > right) {
        return Err(ProviderError::UnsortedCandidates);
    }

    Ok(())
}

/// Histogram of locally sorted keys against sorted candidates.
///
/// Keys equal to `K::MAX` never fall into an interval.
pub fn local_histogram<K: SplitKey>(keys: &[K], candidates: &[K]) -> Vec<Count> {
    candidates
        .iter()
        .map(|candidate| keys.partition_point(|key| key < candidate))
        .tuple_windows()
        .map(|(start, end)| (end - start) as Count)
        .collect()
}

/// Prefix sums of a count vector with the synthetic leading zero.
///
/// Entry `i` is the number of records with a key below `candidates[i]`.
pub fn cumulative(counts: &[Count]) -> Vec<Count> {
    std::iter::once(0)
        .chain(counts.iter().scan(0, |total: &mut Count, count| {
            *total += count;

            Some(*total)
        }))
        .collect()
}

/// Element-wise sum used to reduce the histograms of all holders.
pub fn sum_histograms(mut left: Vec<Count>, right: Vec<Count>) -> Vec<Count> {
    if left.len() < right.len() {
        left.resize(right.len(), 0);
    }

    left.iter_mut()
        .zip(right)
        .for_each(|(total, count)| *total += count);

    left
}
