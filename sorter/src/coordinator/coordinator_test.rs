use super::{tolerance_window, Action, Phase, SortError, SplitterCoordinator};
use crate::{
    config::SortConfig,
    histogram::{local::LocalCluster, HistogramProvider},
    partition::PartitionTable,
};

fn uniform(records: u64) -> LocalCluster<u64> {
    LocalCluster::scatter((0..records).map(|index| index * (u64::MAX / records)), 4)
}

#[test]
pub fn tolerance_window_falls_back_to_exact_fit() {
    assert_eq!(tolerance_window(100, 0.05), 5);
    assert_eq!(tolerance_window(100, 0.999), 99);
    assert_eq!(tolerance_window(100, 1.0), 0);
    assert_eq!(tolerance_window(100, 1.5), 0);
    assert_eq!(tolerance_window(100, -0.1), 0);
    assert_eq!(tolerance_window(100, f64::NAN), 0);
    assert_eq!(tolerance_window(0, 0.5), 0);
}

#[test]
pub fn single_partition_needs_no_splitters() {
    let mut coordinator = SplitterCoordinator::<u32>::new();

    let candidates = coordinator.start(&SortConfig::new(1, 0.1)).unwrap();
    assert_eq!(candidates, vec![u32::MIN, u32::MAX]);
    assert_eq!(coordinator.phase(), Phase::Probing);

    let action = coordinator.receive(&[40]).unwrap();
    assert_eq!(action, Action::Probe(vec![u32::MIN, u32::MAX]));
    assert_eq!(coordinator.phase(), Phase::Converged);

    let action = coordinator.receive(&[40]).unwrap();
    assert_eq!(
        action,
        Action::Commit(PartitionTable {
            boundaries: vec![u32::MIN, u32::MAX],
            owners: vec![0],
            counts: vec![40],
            rounds: 2,
        })
    );
    assert_eq!(coordinator.phase(), Phase::Finalizing);

    coordinator.finish().unwrap();
    assert_eq!(coordinator.phase(), Phase::Idle);
}

#[test]
pub fn initial_candidates_oversample_partitions() {
    let mut coordinator = SplitterCoordinator::<u64>::new();
    let candidates = coordinator.start(&SortConfig::new(8, 0.0)).unwrap();

    assert_eq!(candidates.len(), 23);
    assert_eq!(candidates[0], u64::MIN);
    assert_eq!(candidates[22], u64::MAX);
}

#[test]
pub fn rejects_overlapping_sorts() {
    let mut coordinator = SplitterCoordinator::<u64>::new();
    coordinator.start(&SortConfig::new(4, 0.0)).unwrap();

    assert_eq!(
        coordinator.start(&SortConfig::new(4, 0.0)),
        Err(SortError::Busy)
    );
    assert_eq!(coordinator.phase(), Phase::Probing);
}

#[test]
pub fn rejects_zero_partitions() {
    let mut coordinator = SplitterCoordinator::<u64>::new();

    assert_eq!(
        coordinator.start(&SortConfig::new(0, 0.0)),
        Err(SortError::NoPartitions)
    );
    assert_eq!(coordinator.phase(), Phase::Idle);
}

#[test]
pub fn rejects_unrequested_histograms() {
    let mut coordinator = SplitterCoordinator::<u64>::new();

    assert_eq!(coordinator.receive(&[1, 2]), Err(SortError::NotRunning));
    assert_eq!(coordinator.finish(), Err(SortError::NotRunning));
}

#[test]
pub fn wrong_histogram_length_resets() {
    let mut coordinator = SplitterCoordinator::<u64>::new();
    let candidates = coordinator.start(&SortConfig::new(2, 0.0)).unwrap();

    assert_eq!(candidates.len(), 5);
    assert_eq!(
        coordinator.receive(&[1, 2, 3]),
        Err(SortError::CountMismatch {
            expected: 4,
            received: 3
        })
    );
    assert_eq!(coordinator.phase(), Phase::Idle);

    // usable again afterwards
    assert!(coordinator.start(&SortConfig::new(2, 0.0)).is_ok());
}

#[test]
pub fn invalid_tolerance_requires_exact_fit() {
    let cluster = uniform(1000);
    let mut coordinator = SplitterCoordinator::<u64>::new();

    let candidates = coordinator.start(&SortConfig::new(4, 1.5)).unwrap();
    coordinator
        .receive(&cluster.probe(&candidates).unwrap())
        .unwrap();

    let search = coordinator.search().unwrap();
    assert_eq!(search.total, 1000);
    assert_eq!(search.average, 250);
    assert_eq!(search.window, 0);
}

#[test]
pub fn walks_through_every_phase() {
    let cluster = uniform(10_000);
    let mut coordinator = SplitterCoordinator::<u64>::new();
    let mut candidates = coordinator.start(&SortConfig::new(8, 0.0)).unwrap();
    let mut unresolved = usize::MAX;
    let mut converged = false;

    let table = loop {
        assert!(candidates.windows(2).all(|pair| pair[0] <= pair[1]));

        match coordinator
            .receive(&cluster.probe(&candidates).unwrap())
            .unwrap()
        {
            Action::Probe(next) => {
                // the active goal set never grows
                assert!(coordinator.unresolved() <= unresolved);
                unresolved = coordinator.unresolved();

                match coordinator.phase() {
                    Phase::Probing => assert!(!converged),
                    Phase::Converged => {
                        assert_eq!(unresolved, 0);
                        converged = true;
                    }
                    phase => panic!("unexpected phase {phase:?}"),
                }

                candidates = next;
            }
            Action::Commit(table) => break table,
        }
    };

    assert!(converged);
    assert_eq!(coordinator.phase(), Phase::Finalizing);
    assert_eq!(table.splitters().len(), 7);
    assert_eq!(table.counts, vec![1250; 8]);
    assert_eq!(table.owners, (0..8).collect::<Vec<_>>());
    assert_eq!(table.rounds, coordinator.rounds());

    coordinator.finish().unwrap();
    assert_eq!(coordinator.phase(), Phase::Idle);
    assert_eq!(coordinator.search(), None);
}

#[test]
pub fn round_limit_aborts_search() {
    let cluster = uniform(10_000);
    let mut coordinator = SplitterCoordinator::<u64>::new();
    let config = SortConfig::new(8, 0.0).with_max_rounds(2);
    let mut candidates = coordinator.start(&config).unwrap();

    let error = loop {
        match coordinator.receive(&cluster.probe(&candidates).unwrap()) {
            Ok(Action::Probe(next)) => candidates = next,
            Ok(Action::Commit(_)) => panic!("exact fit should need more than two rounds"),
            Err(error) => break error,
        }
    };

    assert_eq!(error, SortError::RoundLimit(2));
    assert_eq!(coordinator.phase(), Phase::Idle);
}

#[test]
pub fn abort_discards_search() {
    let mut coordinator = SplitterCoordinator::<u16>::new();
    coordinator.start(&SortConfig::new(3, 0.1)).unwrap();

    coordinator.abort();

    assert_eq!(coordinator.phase(), Phase::Idle);
    assert_eq!(coordinator.rounds(), 0);
    assert_eq!(coordinator.receive(&[1]), Err(SortError::NotRunning));
}
