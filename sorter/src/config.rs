use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
/// A single sort request
pub struct SortConfig {
    // number of target partitions (workers), at least one
    pub partitions: usize,
    // allowed deviation per splitter as a fraction of the average partition, only [0, 1) is
    // meaningful, anything else falls back to an exact fit
    #[serde(default)]
    pub tolerance: f64,
    // upper bound on histogram rounds, unbounded if missing
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

impl SortConfig {
    pub fn new(partitions: usize, tolerance: f64) -> Self {
        Self {
            partitions,
            tolerance,
            max_rounds: None,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}
