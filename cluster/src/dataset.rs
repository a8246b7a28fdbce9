use crate::config::{DatasetConfig, Distribution};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use splitsort_sorter::SplitKey;
use tracing::debug;

/// highest key a record may carry, `u64::MAX` is reserved as sentinel
const LAST_KEY: u64 = u64::MAX - 1;

/// Generate the local records of every holder.
///
/// Each holder draws from its own generator seeded with `seed + holder`, so the
/// dataset only depends on the config and not on the thread pool.
pub fn generate(config: &DatasetConfig) -> Vec<Vec<u64>> {
    let holders = config.holders.max(1) as u64;
    let share = config.records / holders;
    let remainder = config.records % holders;
    let centers = cluster_centers(&config.distribution);

    (0..holders)
        .into_par_iter()
        .map(|holder| {
            let records = share + u64::from(holder < remainder);
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(holder));
            let keys = (0..records)
                .map(|_| sample(&config.distribution, &centers, &mut rng))
                .collect::<Vec<_>>();

            debug!(holder, records, "Generated local records");

            keys
        })
        .collect()
}

/// interior keys of an even spread, empty unless the records are clustered
fn cluster_centers(distribution: &Distribution) -> Vec<u64> {
    match *distribution {
        Distribution::Clustered { centers, .. } => {
            let spread = u64::spread(centers.max(1) + 2);

            spread[1..spread.len() - 1].to_vec()
        }
        Distribution::Uniform | Distribution::Skewed { .. } => Vec::new(),
    }
}

fn sample(distribution: &Distribution, centers: &[u64], rng: &mut StdRng) -> u64 {
    match *distribution {
        Distribution::Uniform => rng.random_range(0..=LAST_KEY),
        Distribution::Skewed { fraction, share } => {
            let dense_end = ((u64::MAX as f64 * fraction) as u64).clamp(1, LAST_KEY);

            if rng.random_bool(share) {
                rng.random_range(0..dense_end)
            } else {
                rng.random_range(dense_end..=LAST_KEY)
            }
        }
        Distribution::Clustered {
            centers: count,
            width,
        } => {
            let center = centers[rng.random_range(0..centers.len())];
            let reach =
                ((u64::MAX as f64 / (count.max(1) + 1) as f64) * width).min(u64::MAX as f64);
            let key = center as f64 + rng.random_range(-reach..=reach);

            (key.max(0.0) as u64).min(LAST_KEY)
        }
    }
}
