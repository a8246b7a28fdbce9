//! Distributed splitter search.
//!
//! Finds the keys that cut a globally distributed, totally ordered set of records
//! into contiguous ranges of near-equal size, one per partition. The records stay
//! with their holders, the search only ever looks at summed histograms.

pub mod config;
pub mod coordinator;
pub mod driver;
pub mod histogram;
pub mod key;
pub mod partition;


pub use config::SortConfig;
pub use coordinator::{Action, Phase, SortError, SplitterCoordinator};
pub use driver::Sorter;
pub use histogram::{local::LocalCluster, Count, HistogramProvider, ProviderError};
pub use key::SplitKey;
pub use partition::PartitionTable;
