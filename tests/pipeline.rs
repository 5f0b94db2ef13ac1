mod common;

use std::path::Path;
use std::time::Duration;

use common::{pipeline, prompt, tasks, test_config, FakeWorld, PROJECT_PREFIX};
use flow_automation::orchestrator::{MaxAttempts, PipelineOutcome};
use flow_automation::{App, AppError};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn submits_every_task_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    let mut pipeline = pipeline(&world, &test_config(dir.path()));

    assert_ok!(pipeline.start().await);
    assert!(!pipeline.recovery_pending());
    let report = pipeline.run(&tasks(3)).await.unwrap();

    assert_ok!(report.ensure_complete());
    assert_eq!(report.submitted, 3);
    assert_eq!(report.recoveries, 0);
    assert_eq!(world.prompts(), vec![prompt(1), prompt(2), prompt(3)]);
    assert_eq!(world.state().outputs, vec![(1, 1)]);
}

#[tokio::test(start_paused = true)]
async fn sixth_submission_waits_for_the_first_to_expire() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    let mut pipeline = pipeline(&world, &test_config(dir.path()));

    pipeline.start().await.unwrap();
    let report = pipeline.run(&tasks(6)).await.unwrap();
    assert!(report.is_complete());

    let state = world.state();
    assert_eq!(state.submissions.len(), 6);
    let first = state.submissions[0].at;
    let sixth = state.submissions[5].at;
    assert!(sixth.duration_since(first) >= Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn remote_error_retries_the_same_task_after_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    world.configure(|s| {
        s.error_after.insert(3);
    });
    let mut pipeline = pipeline(&world, &test_config(dir.path()));

    pipeline.start().await.unwrap();
    let report = pipeline.run(&tasks(5)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.remote_errors, 1);
    assert_eq!(report.recoveries, 1);
    assert_eq!(
        world.prompts(),
        vec![prompt(1), prompt(2), prompt(3), prompt(3), prompt(4), prompt(5)]
    );

    assert_eq!(report.snapshots.len(), 1);
    assert!(report.snapshots[0].exists());
    assert!(report.snapshots[0].starts_with(dir.path().join("logs")));

    let state = world.state();
    assert_eq!(state.dismissals, 1);
    assert_eq!(state.launches.len(), 2);
    // 重试发生在重建后的会话里，并回到同一个项目
    assert_eq!(state.submissions[3].session, 2);
    assert_eq!(state.projects, 1);
    assert_eq!(state.gotos.last().map(String::as_str), Some(&*format!("{}1", PROJECT_PREFIX)));
    assert_eq!(state.outputs, vec![(1, 1), (2, 1)]);
}

#[tokio::test(start_paused = true)]
async fn driver_fault_never_skips_a_task() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    world.configure(|s| {
        s.fault_on_insert.insert(2);
    });
    let mut pipeline = pipeline(&world, &test_config(dir.path()));

    pipeline.start().await.unwrap();
    let report = pipeline.run(&tasks(3)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.driver_faults, 1);
    assert_eq!(report.recoveries, 1);
    assert!(report.snapshots.is_empty());
    assert_eq!(world.prompts(), vec![prompt(1), prompt(2), prompt(3)]);
}

#[tokio::test(start_paused = true)]
async fn failed_recovery_cools_down_and_retries() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    world.configure(|s| {
        s.fault_on_insert.insert(1);
        s.fail_launches.insert(2);
    });
    let mut pipeline = pipeline(&world, &test_config(dir.path()));

    pipeline.start().await.unwrap();
    let report = pipeline.run(&tasks(2)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.recovery_failures, 1);
    assert_eq!(report.recoveries, 1);
    assert_eq!(world.prompts(), vec![prompt(1), prompt(2)]);

    let state = world.state();
    assert_eq!(state.launches.len(), 3);
    assert!(state.launches[2].duration_since(state.launches[1]) >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn attempt_hook_bounds_endless_retries() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    world.configure(|s| s.always_fault = true);
    let mut pipeline = pipeline(&world, &test_config(dir.path())).with_hook(MaxAttempts(5));

    pipeline.start().await.unwrap();
    let report = pipeline.run(&tasks(2)).await.unwrap();

    assert_eq!(report.outcome, PipelineOutcome::Interrupted);
    assert_eq!(report.submitted, 0);
    assert!(matches!(
        report.ensure_complete(),
        Err(AppError::Incomplete {
            submitted: 0,
            total: 2
        })
    ));
    assert_eq!(report.attempts, 6);
    assert_eq!(report.driver_faults, 5);
    assert_eq!(report.recoveries, 4);
    assert!(world.prompts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn initial_settings_failure_is_recovered_first() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    world.configure(|s| {
        s.hide_settings_on.insert(1);
    });
    let mut pipeline = pipeline(&world, &test_config(dir.path()));

    assert_ok!(pipeline.start().await);
    assert!(pipeline.recovery_pending());

    let report = pipeline.run(&tasks(2)).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.recoveries, 1);

    let state = world.state();
    assert_eq!(state.outputs, vec![(2, 1)]);
    assert!(state.submissions.iter().all(|s| s.session == 2));
}

#[tokio::test(start_paused = true)]
async fn start_fails_when_no_project_page_appears() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    world.configure(|s| s.never_ready = true);
    let mut pipeline = pipeline(&world, &test_config(dir.path()));

    let err = assert_err!(pipeline.start().await);
    assert!(err.is_fatal());
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_between_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    let cancel = CancellationToken::new();
    let mut pipeline =
        pipeline(&world, &test_config(dir.path())).with_cancellation(cancel.clone());

    pipeline.start().await.unwrap();
    cancel.cancel();
    let report = pipeline.run(&tasks(3)).await.unwrap();

    assert_eq!(report.outcome, PipelineOutcome::Interrupted);
    assert_eq!(report.attempts, 0);
    assert!(world.prompts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_abandons_a_running_batch() {
    let dir = tempfile::tempdir().unwrap();
    let world = FakeWorld::new();
    let cancel = CancellationToken::new();
    let mut pipeline =
        pipeline(&world, &test_config(dir.path())).with_cancellation(cancel.clone());
    pipeline.start().await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        trigger.cancel();
    });
    let report = pipeline.run(&tasks(10)).await.unwrap();

    assert_eq!(report.outcome, PipelineOutcome::Interrupted);
    assert!(report.submitted < 10);
    let err = assert_err!(report.ensure_complete());
    assert!(!err.is_fatal());
    // 被打断的那一条可能已经到达远端
    assert!(world.prompts().len() <= report.submitted + 1);
}

#[tokio::test(start_paused = true)]
async fn app_runs_a_batch_and_writes_the_run_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();

    let mut app = App::with_launcher(config, Box::new(world.launcher()), CancellationToken::new())
        .await
        .unwrap();
    let report = app.run(&tasks(2), Path::new("batch_prompts.csv")).await.unwrap();
    app.shutdown().await;

    assert!(report.is_complete());
    assert!(dir.path().join("logs").join("output.txt").exists());
    assert_eq!(world.state().closes, 1);

    let empty = app.run(&[], Path::new("empty.csv")).await.unwrap();
    assert_eq!(empty.total, 0);
}
