use std::sync::Arc;
use std::time::{Duration, Instant};

use debease::{
    CommandInstaller, Config, Event, EventKind, InstallerRef, JobId, JobStatus, Orchestrator,
    SimulatedInstaller, Subscription,
};

fn fast_installer(steps: u32) -> InstallerRef {
    Arc::new(SimulatedInstaller::new(steps, Duration::from_millis(5)))
}

async fn next_event(sub: &mut Subscription) -> (Arc<str>, Event) {
    let raw = tokio::time::timeout(Duration::from_secs(10), sub.recv())
        .await
        .expect("event within 10s")
        .expect("subscription open");
    let ev: Event = serde_json::from_str(&raw).expect("valid event json");
    (raw, ev)
}

/// Collects events until `finished` jobs have reported `job_finished`.
async fn collect_until_finished(sub: &mut Subscription, finished: usize) -> Vec<(Arc<str>, Event)> {
    let mut out = Vec::new();
    let mut seen = 0;
    while seen < finished {
        let item = next_event(sub).await;
        if item.1.is_terminal() {
            seen += 1;
        }
        out.push(item);
    }
    out
}

async fn wait_terminal(orch: &Orchestrator, id: &JobId) -> debease::InstallJob {
    for _ in 0..1000 {
        if let Some(job) = orch.store().get(id).await {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} did not finish");
}

#[tokio::test]
async fn simulated_install_reports_full_lifecycle() {
    let orch = Orchestrator::builder(Config::default()).build();
    let mut sub = orch.bus().subscribe().await;
    orch.start().await;

    let started = Instant::now();
    let job = orch.store().enqueue("vim").await;
    let events = collect_until_finished(&mut sub, 1).await;
    assert!(started.elapsed() >= Duration::from_millis(1200));

    let kinds: Vec<&str> = events.iter().map(|(_, e)| e.kind.as_str()).collect();
    assert_eq!(kinds.first(), Some(&"job_started"));
    assert_eq!(kinds.last(), Some(&"job_finished"));
    assert!(events.iter().all(|(_, e)| e.job_id == job.job_id));

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|(_, e)| match e.kind {
            EventKind::Progress { percent } => Some(percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![20, 40, 60, 80, 100]);

    match &events.last().unwrap().1.kind {
        EventKind::JobFinished { success, exit_code } => {
            assert!(*success);
            assert_eq!(*exit_code, 0);
        }
        other => panic!("unexpected {other:?}"),
    }

    let stored = orch.store().get(&job.job_id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Finished);
    assert_eq!(stored.exit_code, Some(0));
    assert_eq!(stored.log.len(), 5);
    assert_eq!(stored.log[0], "Simulated output for vim step 1");
    let (started_at, finished_at) = (stored.started_at.unwrap(), stored.finished_at.unwrap());
    assert!(stored.created_at <= started_at && started_at <= finished_at);

    orch.shutdown().await.unwrap();
}

#[tokio::test]
async fn stdout_events_match_log_lines_in_order() {
    let orch = Orchestrator::builder(Config::default())
        .with_installer(fast_installer(4))
        .build();
    let mut sub = orch.bus().subscribe().await;
    orch.start().await;

    let job = orch.store().enqueue("git").await;
    let events = collect_until_finished(&mut sub, 1).await;

    let lines: Vec<String> = events
        .iter()
        .filter_map(|(_, e)| match &e.kind {
            EventKind::Stdout { line } => Some(line.clone()),
            _ => None,
        })
        .collect();
    let stored = orch.store().get(&job.job_id).await.unwrap();
    assert_eq!(lines, stored.log);

    orch.shutdown().await.unwrap();
}

#[tokio::test]
async fn subscribers_observe_identical_sequences() {
    let orch = Orchestrator::builder(Config::default())
        .with_installer(fast_installer(3))
        .build();
    let mut a = orch.bus().subscribe().await;
    let mut b = orch.bus().subscribe().await;
    orch.start().await;

    orch.store().enqueue("vim").await;
    orch.store().enqueue("htop").await;

    let seq_a: Vec<Arc<str>> = collect_until_finished(&mut a, 2).await.into_iter().map(|(raw, _)| raw).collect();
    let seq_b: Vec<Arc<str>> = collect_until_finished(&mut b, 2).await.into_iter().map(|(raw, _)| raw).collect();
    assert_eq!(seq_a, seq_b);
    // 2 jobs × (started + 3 stdout + 3 progress + finished)
    assert_eq!(seq_a.len(), 16);

    orch.shutdown().await.unwrap();
}

#[tokio::test]
async fn single_worker_runs_jobs_in_submission_order() {
    let orch = Orchestrator::builder(Config::default())
        .with_installer(fast_installer(1))
        .build();
    let mut sub = orch.bus().subscribe().await;

    let first = orch.store().enqueue("vim").await;
    let second = orch.store().enqueue("git").await;
    orch.start().await;

    let started: Vec<JobId> = collect_until_finished(&mut sub, 2)
        .await
        .into_iter()
        .filter(|(_, e)| matches!(e.kind, EventKind::JobStarted { .. }))
        .map(|(_, e)| e.job_id)
        .collect();
    assert_eq!(started, vec![first.job_id, second.job_id]);

    orch.shutdown().await.unwrap();
}

#[tokio::test]
async fn multiple_workers_drain_the_queue() {
    let cfg = Config {
        worker_concurrency: 3,
        ..Config::default()
    };
    let orch = Orchestrator::builder(cfg)
        .with_installer(Arc::new(SimulatedInstaller::new(2, Duration::from_millis(20))))
        .build();
    assert_eq!(orch.pool().size(), 3);
    orch.start().await;

    let mut ids = Vec::new();
    for name in ["vim", "git", "curl", "htop", "nginx", "jq"] {
        ids.push(orch.store().enqueue(name).await.job_id);
    }
    for id in &ids {
        let job = wait_terminal(&orch, id).await;
        assert_eq!(job.status, JobStatus::Finished);
        assert_eq!(job.log.len(), 2);
    }
    assert_eq!(orch.store().queued_len().await, 0);

    orch.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_fails_running_job_and_reports_it() {
    let orch = Orchestrator::builder(Config::default())
        .with_installer(Arc::new(SimulatedInstaller::new(100, Duration::from_millis(50))))
        .build();
    let mut sub = orch.bus().subscribe().await;
    orch.start().await;

    let job = orch.store().enqueue("nginx").await;
    let (_, first) = next_event(&mut sub).await;
    assert!(matches!(first.kind, EventKind::JobStarted { .. }));

    orch.shutdown().await.unwrap();
    assert!(orch.shutdown_token().is_cancelled());

    let stored = orch.store().get(&job.job_id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.exit_code, Some(-1));
    assert!(stored.finished_at.is_some());

    // Already delivered by the time shutdown returned.
    let mut finished = None;
    while let Some(raw) = sub.try_recv() {
        let ev: Event = serde_json::from_str(&raw).unwrap();
        if ev.is_terminal() {
            finished = Some(ev);
        }
    }
    match finished.map(|e| e.kind) {
        Some(EventKind::JobFinished { success, exit_code }) => {
            assert!(!success);
            assert_eq!(exit_code, -1);
        }
        other => panic!("expected job_finished, got {other:?}"),
    }
}

#[tokio::test]
async fn jobs_enqueued_after_shutdown_stay_queued() {
    let orch = Orchestrator::builder(Config::default())
        .with_installer(fast_installer(1))
        .build();
    orch.start().await;
    orch.shutdown().await.unwrap();

    let job = orch.store().enqueue("vim").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stored = orch.store().get(&job.job_id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Queued);
}

#[cfg(unix)]
#[tokio::test]
async fn command_installer_records_output_and_exit_code() {
    let installer = CommandInstaller::new("sh", ["-c", "echo installing $1; echo oops >&2; exit 3", "sh"]);
    let orch = Orchestrator::builder(Config::default())
        .with_installer(Arc::new(installer))
        .build();
    orch.start().await;

    let job = orch.store().enqueue("vim").await;
    let done = wait_terminal(&orch, &job.job_id).await;
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.exit_code, Some(3));
    let mut log = done.log.clone();
    log.sort();
    assert_eq!(log, vec!["installing vim".to_string(), "oops".to_string()]);

    orch.shutdown().await.unwrap();
}

#[tokio::test]
async fn unspawnable_installer_fails_with_127() {
    let installer = CommandInstaller::new("/nonexistent/debease-installer", Vec::<String>::new());
    let orch = Orchestrator::builder(Config::default())
        .with_installer(Arc::new(installer))
        .build();
    let mut sub = orch.bus().subscribe().await;
    orch.start().await;

    let job = orch.store().enqueue("vim").await;
    let events = collect_until_finished(&mut sub, 1).await;
    let kinds: Vec<&str> = events.iter().map(|(_, e)| e.kind.as_str()).collect();
    assert_eq!(kinds, vec!["job_started", "job_finished"]);

    let done = orch.store().get(&job.job_id).await.unwrap();
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.exit_code, Some(127));

    orch.shutdown().await.unwrap();
}
