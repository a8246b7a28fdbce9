pub mod refine;

#[cfg(test)]
mod coordinator_test;

use crate::{
    config::SortConfig,
    histogram::{cumulative, Count},
    key::SplitKey,
    partition::PartitionTable,
};
use refine::refine;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error("A sort is already in progress")]
    Busy,
    #[error("No sort is waiting for this step")]
    NotRunning,
    #[error("At least one partition is required")]
    NoPartitions,
    #[error("Histogram has {received} counts but {expected} were expected")]
    CountMismatch { expected: usize, received: usize },
    #[error("Splitters not balanced after {0} rounds")]
    RoundLimit(u32),
    #[error("Histogram provider failed")]
    Provider(#[from] crate::histogram::ProviderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// waiting for a sort request
    Idle,
    /// binary search in progress, waiting for a probe histogram
    Probing,
    /// all splitters decided, waiting for the exact counts of the final intervals
    Converged,
    /// partition table handed out, waiting for the commit to finish
    Finalizing,
}

/// What the caller has to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<K> {
    /// probe these candidates and feed the summed histogram back into `receive`
    Probe(Vec<K>),
    /// commit the table to the data holders, then call `finish`
    Commit(PartitionTable<K>),
}

/// Parameters derived from the first histogram of a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    pub total: Count,
    pub average: Count,
    pub window: Count,
}

impl SearchState {
    pub fn new(total: Count, partitions: usize, tolerance: f64) -> Self {
        let average = total / partitions as Count;

        Self {
            total,
            average,
            window: tolerance_window(average, tolerance),
        }
    }
}

/// Allowed miss per splitter, falls back to an exact fit for invalid tolerances.
pub fn tolerance_window(average: Count, tolerance: f64) -> Count {
    let window = (average as f64 * tolerance).floor();

    // also rejects NaN
    if !(window >= 0.0) || window >= average as f64 {
        warn!(
            tolerance,
            average, "Unacceptable tolerance, requiring exact fit"
        );

        0
    } else {
        window as Count
    }
}

/// Drives the search for splitter keys.
///
/// The coordinator owns no records, it only sees the summed histograms fed to
/// `receive`. Exactly one histogram is outstanding at any time.
#[derive(Debug)]
pub struct SplitterCoordinator<K> {
    phase: Phase,
    partitions: usize,
    tolerance: f64,
    max_rounds: Option<u32>,
    // number of counts expected in the pending response
    pending: Option<usize>,
    search: Option<SearchState>,
    goals: Vec<Count>,
    candidates: Vec<K>,
    boundaries: Vec<K>,
    rounds: u32,
}

impl<K: SplitKey> Default for SplitterCoordinator<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SplitKey> SplitterCoordinator<K> {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            partitions: 0,
            tolerance: 0.0,
            max_rounds: None,
            pending: None,
            search: None,
            goals: Vec::new(),
            candidates: Vec::new(),
            boundaries: Vec::new(),
            rounds: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `None` until the first histogram of the current sort arrived
    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    /// goals without a splitter yet
    pub fn unresolved(&self) -> usize {
        self.goals.len()
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Begin a new sort and return the first candidate set to probe.
    pub fn start(&mut self, config: &SortConfig) -> Result<Vec<K>, SortError> {
        if self.phase != Phase::Idle {
            return Err(SortError::Busy);
        }
        if config.partitions == 0 {
            return Err(SortError::NoPartitions);
        }

        self.reset();
        self.partitions = config.partitions;
        self.tolerance = config.tolerance;
        self.max_rounds = config.max_rounds;
        self.boundaries.reserve(config.partitions + 1);
        self.boundaries.push(K::MIN);

        // oversample so the first histogram brackets every goal
        self.candidates = K::spread(3 * config.partitions - 1);
        debug!(
            partitions = config.partitions,
            "Initially probing {} candidate keys",
            self.candidates.len()
        );

        Ok(self.send(self.candidates.clone(), Phase::Probing))
    }

    /// Feed the summed histogram for the pending candidates into the search.
    pub fn receive(&mut self, counts: &[Count]) -> Result<Action<K>, SortError> {
        let Some(expected) = self.pending.take() else {
            return Err(SortError::NotRunning);
        };
        if counts.len() != expected {
            self.reset();

            return Err(SortError::CountMismatch {
                expected,
                received: counts.len(),
            });
        }

        self.rounds += 1;

        match self.phase {
            Phase::Probing => self.adjust(counts),
            Phase::Converged => Ok(self.finalize(counts)),
            Phase::Idle | Phase::Finalizing => {
                self.reset();

                Err(SortError::NotRunning)
            }
        }
    }

    /// Mark the commit of the partition table as done and return to `Idle`.
    pub fn finish(&mut self) -> Result<(), SortError> {
        if self.phase != Phase::Finalizing {
            return Err(SortError::NotRunning);
        }

        self.reset();

        Ok(())
    }

    /// Drop the current sort, whatever state it is in.
    pub fn abort(&mut self) {
        if self.phase != Phase::Idle {
            debug!(phase = ?self.phase, rounds = self.rounds, "Aborting sort");
        }

        self.reset();
    }

    fn adjust(&mut self, counts: &[Count]) -> Result<Action<K>, SortError> {
        debug!(round = self.rounds, "Collecting histogram");

        let cumulative = cumulative(counts);

        let search = match self.search {
            Some(search) => search,
            None => {
                let search = SearchState::new(
                    cumulative.last().copied().unwrap_or(0),
                    self.partitions,
                    self.tolerance,
                );

                // each splitter cuts at a multiple of the average partition size
                self.goals = (1..self.partitions as Count)
                    .map(|index| index * search.average)
                    .collect();
                self.search = Some(search);

                debug!(
                    total = search.total,
                    "Target records per partition: {} plus/minus {}",
                    search.average,
                    2 * search.window
                );

                search
            }
        };

        let refinement = refine(
            &self.candidates,
            &cumulative,
            &mut self.goals,
            search.window,
        );
        self.boundaries.extend(refinement.resolved);

        trace!(
            "Probing {} candidate keys, decided on {} splitters",
            refinement.probes.len(),
            self.boundaries.len() - 1
        );

        if refinement.probes.is_empty() {
            info!("Histograms balanced after {} rounds", self.rounds);

            self.boundaries[1..].sort_unstable();
            self.boundaries.push(K::MAX);

            // one more round for the exact count of every final interval
            return Ok(Action::Probe(
                self.send(self.boundaries.clone(), Phase::Converged),
            ));
        }

        if let Some(limit) = self.max_rounds {
            if self.rounds >= limit {
                warn!(
                    unresolved = self.goals.len(),
                    "Giving up on balancing after {} rounds", self.rounds
                );
                self.reset();

                return Err(SortError::RoundLimit(limit));
            }
        }

        let mut candidates = Vec::with_capacity(refinement.probes.len() + 2);
        candidates.push(K::MIN);
        candidates.extend(
            refinement
                .probes
                .into_iter()
                .filter(|key| *key != K::MIN && *key != K::MAX),
        );
        candidates.push(K::MAX);
        self.candidates = candidates;

        Ok(Action::Probe(self.send(self.candidates.clone(), Phase::Probing)))
    }

    fn finalize(&mut self, counts: &[Count]) -> Action<K> {
        if let Some(search) = self.search {
            let total: Count = counts.iter().sum();

            if total != search.total {
                warn!(
                    expected = search.total,
                    total, "Record count changed while sorting"
                );
            }
        }

        self.phase = Phase::Finalizing;

        Action::Commit(PartitionTable {
            boundaries: std::mem::take(&mut self.boundaries),
            // interval i belongs to partition i
            owners: (0..self.partitions).collect(),
            counts: counts.to_vec(),
            rounds: self.rounds,
        })
    }

    fn send(&mut self, candidates: Vec<K>, phase: Phase) -> Vec<K> {
        self.pending = Some(candidates.len().saturating_sub(1));
        self.phase = phase;

        candidates
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.pending = None;
        self.search = None;
        self.goals.clear();
        self.candidates.clear();
        self.boundaries.clear();
        self.rounds = 0;
    }
}
