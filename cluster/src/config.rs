use serde::{Deserialize, Serialize};
use splitsort_sorter::SortConfig;
use std::{fs, path::Path, str::FromStr};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read config file")]
    ReadFailed(#[from] std::io::Error),
    #[error("Config is not valid YAML")]
    ParseFailed(#[from] serde_yaml::Error),
    #[error("Config failed the preflight checks")]
    PreflightFailed,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    // the sort request run against the cluster
    pub sort: SortConfig,
    // synthetic records spread over the data holders
    pub dataset: DatasetConfig,
    // size of the global thread pool, defaults to the number of CPUs
    pub threads: Option<usize>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub records: u64,
    #[serde(default = "default_holders")]
    pub holders: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub distribution: Distribution,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields, tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    /// keys drawn uniformly from the whole key space
    #[default]
    Uniform,
    /// `share` of all records packed into the lowest `fraction` of the key space
    Skewed { fraction: f64, share: f64 },
    /// records around `centers` evenly spaced keys, `width` relative to the center spacing
    Clustered { centers: usize, width: f64 },
}

impl FromStr for ClusterConfig {
    type Err = ConfigErrors;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(serde_yaml::from_str(input)?)
    }
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        fs::read_to_string(path)?.parse()
    }

    /// Check the whole config and log every problem, returns true if any was an error.
    pub fn preflight_checks(&self) -> bool {
        let mut contains_error = false;

        if self.sort.partitions == 0 {
            error!("sort.partitions must be at least 1");
            contains_error = true;
        }

        if !(0.0..1.0).contains(&self.sort.tolerance) {
            warn!(
                "sort.tolerance ({}) is outside of [0, 1), the sort will require an exact fit",
                self.sort.tolerance
            );
        }

        if self.sort.max_rounds == Some(0) {
            error!("sort.max_rounds must be positive, leave it out for an unbounded search");
            contains_error = true;
        }

        if self.threads == Some(0) {
            error!("threads cannot be 0");
            contains_error = true;
        }

        if self.dataset.holders == 0 {
            error!("dataset.holders must be at least 1");
            contains_error = true;
        }

        if self.dataset.records < self.sort.partitions as u64 {
            warn!(
                "dataset.records ({}) is smaller than sort.partitions ({}), some partitions stay empty",
                self.dataset.records, self.sort.partitions
            );
        }

        match self.dataset.distribution {
            Distribution::Uniform => {}
            Distribution::Skewed { fraction, share } => {
                if !(fraction > 0.0 && fraction < 1.0) {
                    error!("dataset.distribution.fraction ({fraction}) must lie in (0, 1)");
                    contains_error = true;
                }
                if !(0.0..=1.0).contains(&share) {
                    error!("dataset.distribution.share ({share}) must lie in [0, 1]");
                    contains_error = true;
                }
            }
            Distribution::Clustered { centers, width } => {
                if centers == 0 {
                    error!("dataset.distribution.centers must be at least 1");
                    contains_error = true;
                }
                if !(width.is_finite() && width > 0.0) {
                    error!("dataset.distribution.width ({width}) must be positive and finite");
                    contains_error = true;
                }
            }
        }

        contains_error
    }
}

fn default_holders() -> usize {
    4
}
