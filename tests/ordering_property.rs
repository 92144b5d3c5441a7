// tests/ordering_property.rs

use std::collections::BTreeSet;

use proptest::prelude::*;
use taskdag::dag::TaskDag;
use taskdag::task::ExecutionContext;
use taskdag_test_utils::builders::{DagConfigBuilder, TaskEntryBuilder};
use taskdag_test_utils::probe::{probe_registry, RunLog};
use toml::Value;

/// Dependency lists where task `i` only requires products of tasks `0..i`,
/// so every generated DAG is acyclic.
fn deps_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), num_tasks)
            .prop_map(|raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    })
                    .collect()
            })
    })
}

/// Each task produces a uniquely typed product so greedy resolution binds
/// exactly the generated edges. Tasks are declared in reverse so that
/// declaration order never matches dependency order by accident.
fn build_config(deps: &[BTreeSet<usize>]) -> toml::Table {
    let mut builder = DagConfigBuilder::new();
    for (i, task_deps) in deps.iter().enumerate().rev() {
        let requires: Vec<Value> = task_deps
            .iter()
            .map(|d| Value::from(format!("t{d}:p{d}")))
            .collect();
        let entry = TaskEntryBuilder::new()
            .name(&format!("P{i}"))
            .set("produces", Value::Array(vec![Value::from(format!("t{i}:p{i}"))]))
            .set("requires", Value::Array(requires));
        builder = builder.with_task("probe", entry);
    }
    builder.build()
}

proptest! {
    #[test]
    fn every_task_runs_in_a_later_round_than_its_producers(deps in deps_strategy(12)) {
        let log = RunLog::new();
        let mut dag = TaskDag::parse(&probe_registry(&log), build_config(&deps)).unwrap();

        let report = dag.execute(&mut ExecutionContext::new()).unwrap();

        prop_assert_eq!(log.runs().len(), deps.len());
        prop_assert!(dag.is_empty());

        for (i, task_deps) in deps.iter().enumerate() {
            let task = format!("P{i}");
            let round = report.round_of(&task).unwrap();
            for d in task_deps {
                let producer = format!("P{d}");
                let producer_round = report.round_of(&producer).unwrap();
                prop_assert!(
                    producer_round < round,
                    "{} (round {}) ran before its producer {} (round {})",
                    task, round, producer, producer_round
                );
                prop_assert!(log.position(&producer) < log.position(&task));
            }
        }
    }

    #[test]
    fn tasks_run_as_early_as_their_producers_allow(deps in deps_strategy(12)) {
        let log = RunLog::new();
        let mut dag = TaskDag::parse(&probe_registry(&log), build_config(&deps)).unwrap();

        let report = dag.execute(&mut ExecutionContext::new()).unwrap();

        for (i, task_deps) in deps.iter().enumerate() {
            let expected = task_deps
                .iter()
                .map(|d| report.round_of(&format!("P{d}")).unwrap() + 1)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(report.round_of(&format!("P{i}")), Some(expected));
        }
    }
}
