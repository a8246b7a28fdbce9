use super::{
    check_candidates, local_histogram, sum_histograms, Count, HistogramProvider, ProviderError,
};
use crate::{key::SplitKey, partition::PartitionTable};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tracing::{debug, instrument, trace};

/// Records held by a single member of the cluster
#[derive(Debug)]
pub struct DataHolder<K> {
    keys: Vec<K>,
    assignment: RwLock<Option<Arc<PartitionTable<K>>>>,
}

impl<K: SplitKey> DataHolder<K> {
    pub fn new(mut keys: Vec<K>) -> Self {
        keys.sort_unstable();

        Self {
            keys,
            assignment: RwLock::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn histogram(&self, candidates: &[K]) -> Vec<Count> {
        local_histogram(&self.keys, candidates)
    }

    /// partition table received with the last commit
    pub fn assignment(&self) -> Option<Arc<PartitionTable<K>>> {
        self.assignment.read().clone()
    }

    /// Number of local records going to each partition, once a table was committed.
    pub fn outgoing(&self) -> Option<Vec<Count>> {
        let table = self.assignment()?;
        let mut outgoing = vec![0; table.partitions()];

        self.keys
            .iter()
            .filter(|key| **key != K::MAX)
            .for_each(|key| outgoing[table.partition_of(*key)] += 1);

        Some(outgoing)
    }
}

/// In-process stand-in for a cluster of data holders.
///
/// Every probe is answered by computing all local histograms in parallel and
/// reducing them with an element-wise sum.
#[derive(Debug)]
pub struct LocalCluster<K> {
    holders: Vec<DataHolder<K>>,
    probes: AtomicUsize,
    commits: AtomicUsize,
}

impl<K: SplitKey> LocalCluster<K> {
    pub fn new(holders: Vec<Vec<K>>) -> Self {
        Self {
            holders: holders.into_par_iter().map(DataHolder::new).collect(),
            probes: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
        }
    }

    /// Deal `keys` round robin onto `holders` data holders.
    pub fn scatter(keys: impl IntoIterator<Item = K>, holders: usize) -> Self {
        let mut local = (0..holders.max(1)).map(|_| Vec::new()).collect::<Vec<_>>();
        let size = local.len();

        keys.into_iter()
            .enumerate()
            .for_each(|(index, key)| local[index % size].push(key));

        Self::new(local)
    }

    pub fn holders(&self) -> &[DataHolder<K>] {
        &self.holders
    }

    /// number of records that can fall into an interval
    pub fn total(&self) -> Count {
        self.holders
            .iter()
            .flat_map(|holder| holder.keys.iter())
            .filter(|key| **key != K::MAX)
            .count() as Count
    }

    /// histogram requests answered so far
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Records every partition receives under the committed table, summed over all holders.
    pub fn incoming(&self) -> Option<Vec<Count>> {
        self.holders
            .par_iter()
            .map(DataHolder::outgoing)
            .collect::<Option<Vec<_>>>()
            .map(|outgoing| outgoing.into_iter().fold(Vec::new(), sum_histograms))
    }
}

impl<K: SplitKey> HistogramProvider<K> for LocalCluster<K> {
    #[instrument(skip_all, level = "trace")]
    fn probe(&self, candidates: &[K]) -> Result<Vec<Count>, ProviderError> {
        check_candidates(candidates)?;

        let gaps = candidates.len() - 1;
        let counts = self
            .holders
            .par_iter()
            .map(|holder| holder.histogram(candidates))
            .reduce(|| vec![0; gaps], sum_histograms);

        let round = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(round, candidates = candidates.len(), "Answered histogram probe");

        Ok(counts)
    }

    fn commit(&self, table: &PartitionTable<K>) -> Result<(), ProviderError> {
        if table.boundaries.len() != table.owners.len() + 1
            || table.owners.len() != table.counts.len()
        {
            return Err(ProviderError::CommitMismatch {
                boundaries: table.boundaries.len(),
                owners: table.owners.len(),
                counts: table.counts.len(),
            });
        }
        check_candidates(&table.boundaries)?;

        let shared = Arc::new(table.clone());

        self.holders
            .par_iter()
            .for_each(|holder| *holder.assignment.write() = Some(shared.clone()));
        self.commits.fetch_add(1, Ordering::SeqCst);

        debug!(
            holders = self.holders.len(),
            partitions = table.partitions(),
            "Distributed partition table"
        );

        Ok(())
    }
}
