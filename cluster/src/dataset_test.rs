use crate::{
    config::{DatasetConfig, Distribution},
    dataset::generate,
};

fn dataset(distribution: Distribution) -> DatasetConfig {
    DatasetConfig {
        records: 10_003,
        holders: 4,
        seed: 42,
        distribution,
    }
}

#[test]
pub fn records_are_dealt_to_every_holder() {
    let holders = generate(&dataset(Distribution::Uniform));

    assert_eq!(
        holders.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![2501, 2501, 2501, 2500]
    );
    assert!(holders.iter().flatten().all(|key| *key != u64::MAX));
}

#[test]
pub fn generation_is_seeded() {
    let config = dataset(Distribution::Clustered {
        centers: 3,
        width: 0.2,
    });

    assert_eq!(generate(&config), generate(&config));
}

#[test]
pub fn skewed_records_crowd_the_low_keys() {
    let holders = generate(&dataset(Distribution::Skewed {
        fraction: 0.1,
        share: 0.9,
    }));
    let dense = holders
        .iter()
        .flatten()
        .filter(|key| **key < u64::MAX / 10)
        .count();

    // 90% expected, binomial spread is far below 2%
    assert!(dense > 8_800 && dense < 9_200, "dense records: {dense}");
}

#[test]
pub fn clustered_records_stay_near_their_center() {
    let holders = generate(&dataset(Distribution::Clustered {
        centers: 1,
        width: 0.01,
    }));
    let center = u64::MAX / 2;
    let reach = u64::MAX / 100;

    assert!(holders
        .iter()
        .flatten()
        .all(|key| key.abs_diff(center) <= reach));
}

#[test]
pub fn many_clusters_generate_quickly() {
    let config = DatasetConfig {
        records: 20_000,
        holders: 2,
        seed: 3,
        distribution: Distribution::Clustered {
            centers: 20_000,
            width: 0.5,
        },
    };
    let start = std::time::Instant::now();

    assert_eq!(generate(&config).iter().map(Vec::len).sum::<usize>(), 20_000);
    assert!(start.elapsed() < std::time::Duration::from_secs(5));
}

#[test]
pub fn huge_cluster_width_stays_in_key_space() {
    let holders = generate(&dataset(Distribution::Clustered {
        centers: 2,
        width: 1e300,
    }));

    assert!(holders.iter().flatten().all(|key| *key != u64::MAX));
}
