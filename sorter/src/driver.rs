use crate::{
    config::SortConfig,
    coordinator::{Action, SortError, SplitterCoordinator},
    histogram::HistogramProvider,
    key::SplitKey,
    partition::PartitionTable,
};
use tracing::{debug, error, instrument};

/// Runs complete sorts against a histogram provider, one round in flight at a time.
#[derive(Debug)]
pub struct Sorter<K, P> {
    coordinator: SplitterCoordinator<K>,
    provider: P,
}

impl<K: SplitKey, P: HistogramProvider<K>> Sorter<K, P> {
    pub fn new(provider: P) -> Self {
        Self {
            coordinator: SplitterCoordinator::new(),
            provider,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Find the splitters for `config.partitions` partitions and commit them.
    ///
    /// `on_done` fires once, after the provider accepted the partition table.
    #[instrument(skip(self, on_done), level = "info")]
    pub fn sort<F>(
        &mut self,
        config: &SortConfig,
        on_done: F,
    ) -> Result<PartitionTable<K>, SortError>
    where
        F: FnOnce(&PartitionTable<K>),
    {
        let mut candidates = self.coordinator.start(config)?;

        loop {
            let counts = match self.provider.probe(&candidates) {
                Ok(counts) => counts,
                Err(error) => {
                    error!(
                        error = ?error,
                        round = self.coordinator.rounds(),
                        "Histogram probe failed"
                    );
                    self.coordinator.abort();

                    return Err(error.into());
                }
            };

            match self.coordinator.receive(&counts)? {
                Action::Probe(next) => candidates = next,
                Action::Commit(table) => {
                    if let Err(error) = self.provider.commit(&table) {
                        error!(error = ?error, "Failed to commit partition table");
                        self.coordinator.abort();

                        return Err(error.into());
                    }

                    debug!(
                        partitions = table.partitions(),
                        rounds = table.rounds,
                        "Committed partition table"
                    );
                    on_done(&table);
                    self.coordinator.finish()?;

                    return Ok(table);
                }
            }
        }
    }
}
