// tests/scheduler_trigger_rules.rs

use qualitydag::dag::fifa::{self, build_pipeline};
use qualitydag::dag::{Operator, PipelineBuilder, Scheduler, TaskNode, TaskRunState};
use qualitydag::engine::TaskOutcome;
use qualitydag::types::TriggerRule;
use qualitydag_test_utils::builders::SettingsBuilder;
use qualitydag_test_utils::init_tracing;

fn fifa_scheduler() -> Scheduler {
    let settings = SettingsBuilder::new(&std::env::temp_dir()).build();
    Scheduler::from_definition(&build_pipeline(&settings).expect("valid pipeline"))
}

fn names(tasks: &[qualitydag::dag::ScheduledTask]) -> Vec<String> {
    let mut names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
    names.sort();
    names
}

/// Complete every dispatched task successfully except those in `failing`,
/// returning the order in which tasks were dispatched.
fn drive(scheduler: &mut Scheduler, failing: &[&str]) -> Vec<String> {
    let mut order = Vec::new();
    let mut pending: Vec<String> = names(&scheduler.start_new_run());

    while let Some(task) = pending.first().cloned() {
        pending.remove(0);
        order.push(task.clone());
        let outcome = if failing.contains(&task.as_str()) {
            TaskOutcome::Failed(format!("{task} broke"))
        } else {
            TaskOutcome::Success
        };
        pending.extend(names(&scheduler.handle_completion(&task, outcome, None)));
    }
    order
}

#[test]
fn successful_run_walks_the_chain_and_fans_out_to_both_validations() {
    init_tracing();
    let mut scheduler = fifa_scheduler();

    let first = scheduler.step_start();
    assert_eq!(names(&first.newly_scheduled), vec![fifa::BEGIN.to_string()]);
    assert_eq!(scheduler.current_run_id(), Some(1));
    assert_eq!(
        scheduler.run_state_of(fifa::BEGIN),
        Some(TaskRunState::Running)
    );
    assert_eq!(
        scheduler.run_state_of(fifa::DELETE_DATASET),
        Some(TaskRunState::Pending)
    );

    let chain = [
        fifa::BEGIN,
        fifa::DELETE_DATASET,
        fifa::CREATE_DATASET,
        fifa::UPLOAD_DATA,
        fifa::DELETE_LOCAL_CSV,
        fifa::LOAD_TO_TABLE,
        fifa::DELETE_REMOTE_CSV,
    ];
    for pair in chain.windows(2) {
        let step = scheduler.step_completion(pair[0], TaskOutcome::Success, None);
        assert_eq!(names(&step.newly_scheduled), vec![pair[1].to_string()]);
    }

    let step = scheduler.step_completion(fifa::DELETE_REMOTE_CSV, TaskOutcome::Success, None);
    assert_eq!(
        names(&step.newly_scheduled),
        vec![fifa::CREATE_CLUSTERED_TABLE.to_string()]
    );

    let step = scheduler.step_completion(fifa::CREATE_CLUSTERED_TABLE, TaskOutcome::Success, None);
    assert_eq!(
        names(&step.newly_scheduled),
        vec![
            fifa::VALIDATION_FAIL.to_string(),
            fifa::VALIDATION_PASS.to_string()
        ]
    );

    let step = scheduler.step_completion(
        fifa::VALIDATION_FAIL,
        TaskOutcome::Success,
        Some(serde_json::json!({ "success": false })),
    );
    assert!(step.newly_scheduled.is_empty(), "end waits for both checks");

    let step = scheduler.step_completion(fifa::VALIDATION_PASS, TaskOutcome::Success, None);
    assert_eq!(names(&step.newly_scheduled), vec![fifa::END.to_string()]);
    assert!(!step.run_just_finished());

    let step = scheduler.step_completion(fifa::END, TaskOutcome::Success, None);
    let summary = step.finished_run.expect("run finished");
    assert!(summary.succeeded);
    assert_eq!(summary.run_id, 1);
    assert_eq!(summary.tasks_in_state(TaskRunState::Success).len(), 11);
    assert_eq!(
        summary.outputs.get(fifa::VALIDATION_FAIL),
        Some(&serde_json::json!({ "success": false }))
    );
    assert!(scheduler.is_idle());
    assert_eq!(
        scheduler.run_state_of(fifa::END),
        Some(TaskRunState::NotInRun)
    );
}

#[test]
fn failure_skips_downstream_all_success_nodes_but_end_still_runs() {
    init_tracing();
    let mut scheduler = fifa_scheduler();

    let order = drive(&mut scheduler, &[fifa::UPLOAD_DATA]);

    assert_eq!(
        order,
        vec![
            fifa::BEGIN,
            fifa::DELETE_DATASET,
            fifa::CREATE_DATASET,
            fifa::UPLOAD_DATA,
            fifa::END,
        ]
    );
    assert!(scheduler.is_idle());
}

#[test]
fn failure_summary_records_states_and_errors() {
    let mut scheduler = fifa_scheduler();

    for task in [
        fifa::BEGIN,
        fifa::DELETE_DATASET,
        fifa::CREATE_DATASET,
        fifa::UPLOAD_DATA,
        fifa::DELETE_LOCAL_CSV,
    ] {
        if task == fifa::BEGIN {
            scheduler.start_new_run();
        }
        scheduler.handle_completion(task, TaskOutcome::Success, None);
    }

    let step = scheduler.step_completion(
        fifa::LOAD_TO_TABLE,
        TaskOutcome::Failed("schema mismatch".to_string()),
        None,
    );
    assert_eq!(step.newly_failed, vec![fifa::LOAD_TO_TABLE.to_string()]);
    let mut skipped = step.newly_skipped.clone();
    skipped.sort();
    assert_eq!(
        skipped,
        vec![
            fifa::CREATE_CLUSTERED_TABLE.to_string(),
            fifa::DELETE_REMOTE_CSV.to_string(),
            fifa::VALIDATION_FAIL.to_string(),
            fifa::VALIDATION_PASS.to_string(),
        ]
    );
    assert_eq!(names(&step.newly_scheduled), vec![fifa::END.to_string()]);

    let summary = scheduler
        .step_completion(fifa::END, TaskOutcome::Success, None)
        .finished_run
        .expect("run finished");

    // The only leaf is `end`, which ran.
    assert!(summary.succeeded);
    assert_eq!(summary.state_of(fifa::LOAD_TO_TABLE), Some(TaskRunState::Failed));
    assert_eq!(
        summary.state_of(fifa::VALIDATION_PASS),
        Some(TaskRunState::Skipped)
    );
    assert_eq!(
        summary.errors.get(fifa::LOAD_TO_TABLE).map(String::as_str),
        Some("schema mismatch")
    );
}

#[test]
fn delete_dataset_runs_even_when_begin_fails() {
    let mut scheduler = fifa_scheduler();

    // delete_dataset is all_done, so the rest of the chain still runs.
    let order = drive(&mut scheduler, &[fifa::BEGIN]);
    assert_eq!(order.len(), 11);
    assert_eq!(order[1], fifa::DELETE_DATASET);
}

#[test]
fn failed_delete_dataset_skips_the_chain() {
    let mut scheduler = fifa_scheduler();

    let order = drive(&mut scheduler, &[fifa::DELETE_DATASET]);
    assert_eq!(order, vec![fifa::BEGIN, fifa::DELETE_DATASET, fifa::END]);
}

#[test]
fn all_done_treats_skipped_predecessors_as_done() {
    // a -> b (all_success) -> c (all_done); a fails so b is skipped, c runs.
    let def = PipelineBuilder::new("blunt")
        .task(TaskNode::new("a", Operator::NoOp))
        .task(TaskNode::new("b", Operator::NoOp))
        .task(TaskNode::new("c", Operator::NoOp).with_trigger_rule(TriggerRule::AllDone))
        .chain(["a", "b", "c"])
        .build()
        .expect("valid");
    let mut scheduler = Scheduler::from_definition(&def);

    scheduler.start_new_run();
    let step = scheduler.step_completion("a", TaskOutcome::Failed("x".into()), None);
    assert_eq!(step.newly_skipped, vec!["b".to_string()]);
    assert_eq!(names(&step.newly_scheduled), vec!["c".to_string()]);
}

#[test]
fn completions_for_tasks_not_running_are_ignored() {
    let mut scheduler = fifa_scheduler();

    // No active run.
    let step = scheduler.step_completion(fifa::BEGIN, TaskOutcome::Success, None);
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(scheduler.run_state_of(fifa::BEGIN), Some(TaskRunState::NotInRun));

    scheduler.start_new_run();

    // Pending, not running.
    let step = scheduler.step_completion(fifa::END, TaskOutcome::Success, None);
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(scheduler.run_state_of(fifa::END), Some(TaskRunState::Pending));

    // Unknown task.
    let step = scheduler.step_completion("nope", TaskOutcome::Success, None);
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(scheduler.run_state_of("nope"), None);

    // Duplicate completion.
    scheduler.handle_completion(fifa::BEGIN, TaskOutcome::Success, None);
    let step = scheduler.step_completion(fifa::BEGIN, TaskOutcome::Success, None);
    assert!(step.newly_scheduled.is_empty());
}

#[test]
fn starting_a_run_while_one_is_active_is_ignored_and_run_ids_increase() {
    let mut scheduler = fifa_scheduler();

    assert_eq!(scheduler.start_new_run().len(), 1);
    assert!(scheduler.step_start().newly_scheduled.is_empty());
    assert_eq!(scheduler.current_run_id(), Some(1));
    assert_eq!(scheduler.tasks_in_current_run().len(), 11);

    drive_remaining(&mut scheduler);
    assert!(scheduler.is_idle());
    assert!(scheduler.tasks_in_current_run().is_empty());

    let again = scheduler.start_new_run();
    assert_eq!(again[0].run_id, 2);
    assert_eq!(scheduler.deps_satisfied(fifa::BEGIN), Some(true));
    assert_eq!(scheduler.deps_satisfied(fifa::CREATE_DATASET), Some(false));
    assert_eq!(scheduler.deps_satisfied("nope"), None);
}

fn drive_remaining(scheduler: &mut Scheduler) {
    let mut running = vec![fifa::BEGIN.to_string()];
    while let Some(task) = running.pop() {
        running.extend(names(
            &scheduler.handle_completion(&task, TaskOutcome::Success, None),
        ));
    }
}

/// Drive a whole run, failing the tasks in `failing`, and return its summary.
fn run_to_summary(scheduler: &mut Scheduler, failing: &[&str]) -> qualitydag::dag::RunSummary {
    let mut pending = names(&scheduler.step_start().newly_scheduled);
    while let Some(task) = pending.pop() {
        let outcome = if failing.contains(&task.as_str()) {
            TaskOutcome::Failed(format!("{task} broke"))
        } else {
            TaskOutcome::Success
        };
        let output = Some(serde_json::json!({ "task": task.clone() }));
        let step = scheduler.step_completion(&task, outcome, output);
        if let Some(summary) = step.finished_run {
            return summary;
        }
        pending.extend(names(&step.newly_scheduled));
    }
    panic!("run never finished");
}

#[test]
fn every_run_starts_from_a_clean_slate() {
    init_tracing();
    let mut scheduler = fifa_scheduler();

    let first = run_to_summary(&mut scheduler, &[fifa::LOAD_TO_TABLE]);
    assert_eq!(first.run_id, 1);
    assert!(first.errors.contains_key(fifa::LOAD_TO_TABLE));
    assert_eq!(
        first.state_of(fifa::CREATE_CLUSTERED_TABLE),
        Some(TaskRunState::Skipped)
    );

    let start = scheduler.step_start();
    assert_eq!(names(&start.newly_scheduled), vec![fifa::BEGIN.to_string()]);
    for task in scheduler.task_names().filter(|t| *t != fifa::BEGIN) {
        assert_eq!(scheduler.run_state_of(task), Some(TaskRunState::Pending), "{task}");
    }

    // Finish run 2 without failures: nothing from run 1 leaks into it.
    let mut pending = vec![fifa::BEGIN.to_string()];
    let second = loop {
        let task = pending.pop().expect("run 2 stalled");
        let step = scheduler.step_completion(&task, TaskOutcome::Success, None);
        if let Some(summary) = step.finished_run {
            break summary;
        }
        pending.extend(names(&step.newly_scheduled));
    };
    assert_eq!(second.run_id, 2);
    assert!(second.succeeded);
    assert!(second.errors.is_empty());
    assert!(second.outputs.is_empty());
    assert_eq!(second.tasks_in_state(TaskRunState::Success).len(), 11);
}
