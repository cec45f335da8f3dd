use std::sync::Arc;
use std::time::Duration;

use crate::support::helpers::{
    execution_request, init_tracing, serialized_snapshot, FailingExecutor, FailingTransport,
    RecordingBackend, RecordingExecutor, RecordingTerminator,
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use testrig::{
    transport_channel, CoordinatorRequest, PreseedEntry, ProjectConfig, ResolverBackend,
    RunFailure, Runner, SerializedRunContext, SetupData, Supervisor, Terminator, TestExecutor,
    WorkerConfig, WorkerReply,
};
use tokio::time::timeout;

fn worker_config() -> Result<WorkerConfig> {
    Ok(WorkerConfig::builder()
        .metrics_interval(Duration::from_secs(60))
        .transport_capacity(4)
        .build()?)
}

#[tokio::test]
async fn setup_then_execute_reuses_the_preseeded_resolver() -> Result<()> {
    init_tracing();
    let backend = Arc::new(RecordingBackend::default());
    let executor = Arc::new(RecordingExecutor::default());
    let config = worker_config()?;
    let (transport, mut coordinator) = transport_channel(config.transport_capacity());

    let mut runner = Runner::new(
        config,
        Arc::clone(&backend) as Arc<dyn ResolverBackend>,
        Arc::clone(&executor) as Arc<dyn TestExecutor>,
        transport,
    );
    let handle = tokio::spawn(async move { runner.run().await });

    coordinator
        .send(CoordinatorRequest::Setup(SetupData {
            preseed: vec![PreseedEntry {
                configuration: ProjectConfig::new("proj1", "/repo"),
                module_map_snapshot: serialized_snapshot(42),
            }],
        }))
        .await?;
    coordinator
        .send(CoordinatorRequest::Execute(execution_request(
            "proj1",
            "x.test.js",
        )))
        .await?;

    let reply = timeout(Duration::from_secs(1), coordinator.recv())
        .await
        .context("worker should reply to the execute request")?
        .context("worker closed the reply channel")?;

    match reply {
        WorkerReply::Report(report) => {
            assert_eq!(report.path, PathBuf::from("x.test.js"));
            assert_eq!(report.passed, 1);
        }
        WorkerReply::Failure(error) => panic!("execution should succeed, got {error}"),
    }

    let built = backend.built();
    assert_eq!(built.len(), 1, "only the preseed should build a resolver");
    assert!(
        Arc::ptr_eq(&built[0], &executor.last_resolver()),
        "executor must see the preseeded resolver"
    );
    assert_eq!(backend.disk_builds(), 0);

    coordinator.send(CoordinatorRequest::Shutdown).await?;
    timeout(Duration::from_secs(1), handle)
        .await
        .context("runner should stop after shutdown request")??
        .context("request loop should exit cleanly")?;
    Ok(())
}

#[tokio::test]
async fn execution_failures_cross_the_loop_normalized() -> Result<()> {
    init_tracing();
    let backend = Arc::new(RecordingBackend::default());
    let executor = Arc::new(FailingExecutor::new(RunFailure::message(
        "Timeout: exceeded 5000ms",
    )));
    let config = worker_config()?;
    let (transport, mut coordinator) = transport_channel(config.transport_capacity());

    let mut runner = Runner::new(
        config,
        backend as Arc<dyn ResolverBackend>,
        executor as Arc<dyn TestExecutor>,
        transport,
    );
    let handle = tokio::spawn(async move { runner.run().await });

    coordinator
        .send(CoordinatorRequest::Execute(execution_request(
            "web",
            "slow.test.js",
        )))
        .await?;

    let reply = timeout(Duration::from_secs(1), coordinator.recv())
        .await
        .context("worker should reply to the execute request")?
        .context("worker closed the reply channel")?;

    match reply {
        WorkerReply::Failure(error) => {
            assert_eq!(error.message, "Timeout: exceeded 5000ms");
            assert_eq!(error.stack.as_deref(), Some(""));
            assert_eq!(error.kind, "Error");
            assert_eq!(error.code, None);
        }
        WorkerReply::Report(report) => panic!("execution should fail, got {report:?}"),
    }

    drop(coordinator);
    timeout(Duration::from_secs(1), handle)
        .await
        .context("runner should stop once the coordinator goes away")??
        .context("a per-request failure must not abort the loop")?;
    Ok(())
}

#[tokio::test]
async fn duplicate_changed_files_collapse_across_the_wire() -> Result<()> {
    init_tracing();
    let backend = Arc::new(RecordingBackend::default());
    let executor = Arc::new(RecordingExecutor::default());
    let config = worker_config()?;
    let (transport, mut coordinator) = transport_channel(config.transport_capacity());

    let mut runner = Runner::new(
        config,
        backend as Arc<dyn ResolverBackend>,
        Arc::clone(&executor) as Arc<dyn TestExecutor>,
        transport,
    );
    let handle = tokio::spawn(async move { runner.run().await });

    let mut request = execution_request("web", "x.test.js");
    request.context = Some(SerializedRunContext {
        changed_files: Some(vec![
            PathBuf::from("a.js"),
            PathBuf::from("a.js"),
            PathBuf::from("b.js"),
        ]),
        source_map_fingerprints: None,
        watch_mode: true,
    });
    coordinator
        .send(CoordinatorRequest::Execute(request))
        .await?;

    timeout(Duration::from_secs(1), coordinator.recv())
        .await
        .context("worker should reply")?
        .context("worker closed the reply channel")?;

    let context = executor.last_context().expect("context should carry over");
    let changed = context.changed_files.expect("changed files should carry over");
    assert_eq!(changed.len(), 2, "duplicates must collapse");
    assert!(changed.contains(&PathBuf::from("a.js")));
    assert!(changed.contains(&PathBuf::from("b.js")));
    assert!(context.watch_mode);

    drop(coordinator);
    timeout(Duration::from_secs(1), handle)
        .await
        .context("runner should stop once the coordinator goes away")??
        .context("request loop should exit cleanly")?;
    Ok(())
}

#[tokio::test]
async fn runner_stops_when_the_coordinator_closes_the_channel() -> Result<()> {
    init_tracing();
    let backend = Arc::new(RecordingBackend::default());
    let executor = Arc::new(RecordingExecutor::default());
    let config = worker_config()?;
    let (transport, coordinator) = transport_channel(config.transport_capacity());

    let mut runner = Runner::new(
        config,
        backend as Arc<dyn ResolverBackend>,
        executor as Arc<dyn TestExecutor>,
        transport,
    );
    let handle = tokio::spawn(async move { runner.run().await });

    drop(coordinator);
    timeout(Duration::from_secs(1), handle)
        .await
        .context("runner should observe the closed channel")??
        .context("a closed channel is a clean exit, not a fault")?;
    Ok(())
}

#[tokio::test]
async fn transport_fault_terminates_the_process_with_status_one() -> Result<()> {
    init_tracing();
    let backend = Arc::new(RecordingBackend::default());
    let executor = Arc::new(RecordingExecutor::default());
    let config = worker_config()?;

    let runner = Runner::new(
        config,
        backend as Arc<dyn ResolverBackend>,
        executor as Arc<dyn TestExecutor>,
        FailingTransport,
    );

    let terminator = Arc::new(RecordingTerminator::default());
    let supervisor = Supervisor::with_terminator(Arc::clone(&terminator) as Arc<dyn Terminator>);
    timeout(Duration::from_secs(1), runner.run_supervised_with(supervisor))
        .await
        .context("supervised run should finish")?;

    assert_eq!(
        terminator.status(),
        1,
        "an unrecoverable fault must end the process with status 1"
    );
    Ok(())
}
