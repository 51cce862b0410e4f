// tests/property_scheduler.rs

use std::collections::HashSet;

use proptest::prelude::*;
use qualitydag::dag::{Operator, PipelineBuilder, PipelineDefinition, Scheduler, TaskNode, TaskRunState};
use qualitydag::engine::TaskOutcome;
use qualitydag::types::TriggerRule;

// Strategy to generate a valid single-root DAG.
// Acyclicity: task N may only depend on tasks 0..N-1.
// Single root: every task after the first gets at least one dependency.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = PipelineDefinition> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 1..=num_tasks),
            num_tasks,
        );
        let rules_strat = proptest::collection::vec(any::<bool>(), num_tasks);

        (deps_strat, rules_strat).prop_map(move |(raw_deps, all_done)| {
            let mut builder = PipelineBuilder::new("random");
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("task_{i}");
                let rule = if all_done[i] {
                    TriggerRule::AllDone
                } else {
                    TriggerRule::AllSuccess
                };
                builder = builder.task(TaskNode::new(&name, Operator::NoOp).with_trigger_rule(rule));

                if i > 0 {
                    let valid_deps: HashSet<usize> =
                        potential_deps.into_iter().map(|d| d % i).collect();
                    for dep in valid_deps {
                        builder = builder.edge(&format!("task_{dep}"), &name);
                    }
                }
            }
            builder.build().expect("generated DAG is valid")
        })
    })
}

proptest! {
    #[test]
    fn every_run_finishes_with_all_tasks_terminal(
        def in dag_strategy(10),
        failing_indices in proptest::collection::vec(0..10usize, 0..5),
        runs in 1..3usize,
    ) {
        let mut scheduler = Scheduler::from_definition(&def);
        let task_names: Vec<String> = scheduler.task_names().map(str::to_string).collect();
        let failing: HashSet<String> = failing_indices
            .iter()
            .filter(|&&i| i < task_names.len())
            .map(|&i| task_names[i].clone())
            .collect();

        for expected_run in 1..=runs as u64 {
            let mut executing: Vec<String> =
                scheduler.start_new_run().into_iter().map(|t| t.name).collect();
            prop_assert_eq!(scheduler.current_run_id(), Some(expected_run));

            let mut summary = None;
            let mut steps = 0;
            while !executing.is_empty() {
                steps += 1;
                prop_assert!(steps <= task_names.len(), "a task was dispatched twice");

                let task = executing.remove(0);
                let outcome = if failing.contains(&task) {
                    TaskOutcome::Failed("boom".to_string())
                } else {
                    TaskOutcome::Success
                };

                let step = scheduler.step_completion(&task, outcome, None);
                executing.extend(step.newly_scheduled.into_iter().map(|t| t.name));
                if step.finished_run.is_some() {
                    summary = step.finished_run;
                }
            }

            // Nothing left to run means the run must have finished.
            prop_assert!(scheduler.is_idle(), "run stalled with pending tasks");
            let summary = summary.expect("finished run has a summary");
            prop_assert_eq!(summary.run_id, expected_run);
            prop_assert!(summary.states.values().all(|s| s.is_terminal()));

            // A failing task that ran is recorded as failed; no successful
            // all_success task has an unsuccessful predecessor.
            for node in def.tasks() {
                let state = summary.state_of(&node.id);
                if failing.contains(&node.id) && state != Some(TaskRunState::Skipped) {
                    prop_assert_eq!(state, Some(TaskRunState::Failed));
                }
                if node.trigger_rule == TriggerRule::AllSuccess && state == Some(TaskRunState::Success) {
                    for pred in def.predecessors_of(&node.id) {
                        prop_assert_eq!(summary.state_of(pred), Some(TaskRunState::Success));
                    }
                }
            }
        }
    }
}
