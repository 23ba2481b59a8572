//! Input validation, rate limiting and reporting at the assistant boundary.

use std::sync::Arc;

use deskloop::DeskloopError;
use deskloop::assistant::Assistant;
use deskloop::controller::DomainsConfig;
use deskloop::domain::{DONE_MARKER, Operation, ParamSet, Task};
use deskloop::executor::ScriptedExecutor;
use deskloop::journal::JsonlJournal;
use deskloop::observer::NoopObserver;
use deskloop::rate_limit::RateLimitConfig;
use deskloop::refine::RefinerConfig;
use tempfile::tempdir;

fn assistant(executor: Arc<ScriptedExecutor>, max_requests: usize) -> Assistant {
    Assistant::standard(
        executor,
        &DomainsConfig::default(),
        RefinerConfig::default(),
        RateLimitConfig {
            max_requests,
            ..Default::default()
        },
        Arc::new(NoopObserver),
    )
    .unwrap()
}

fn open(name: &str) -> Task {
    Task::new("open an app", Operation::OpenApplication, ParamSet::new().with("name", name)).unwrap()
}

#[test]
fn test_empty_description_is_rejected() {
    let err = Task::new("  ", Operation::ReadFile, ParamSet::new().with("file_path", "/tmp/a")).unwrap_err();
    assert!(matches!(err, DeskloopError::InvalidTask(_)));
}

#[test]
fn test_missing_parameter_is_rejected() {
    let err = Task::new(
        "write something",
        Operation::WriteFile,
        ParamSet::new().with("file_path", "/tmp/a"),
    )
    .unwrap_err();
    assert!(err.to_string().contains("content"));
}

#[tokio::test]
async fn test_rate_limited_task_never_reaches_executor() {
    let executor = Arc::new(ScriptedExecutor::always_ok());
    let assistant = assistant(executor.clone(), 2);

    assistant.submit(&open("notepad")).await.unwrap();
    assistant.submit(&open("notepad")).await.unwrap();
    let err = assistant.submit(&open("notepad")).await.unwrap_err();

    match err {
        DeskloopError::RateLimited(wait) => assert!(wait.as_secs() <= 60),
        other => panic!("expected rate limit, got {:?}", other),
    }
    assert_eq!(executor.request_count(), 2);
}

#[tokio::test]
async fn test_report_chunks_end_with_done() {
    let executor = Arc::new(ScriptedExecutor::always_ok());
    let assistant = assistant(executor, 15);

    let report = assistant.submit(&open("notepad")).await.unwrap();
    let chunks = report.chunks();

    assert!(chunks.len() >= 2);
    assert!(chunks[0].starts_with("Done:"));
    assert_eq!(chunks.last().unwrap(), &format!("{}\n\n", DONE_MARKER));
}

#[tokio::test]
async fn test_journal_keeps_every_run() {
    let dir = tempdir().unwrap();
    let executor = Arc::new(ScriptedExecutor::always_ok());
    let assistant = assistant(executor, 15).with_journal(JsonlJournal::new(dir.path()).unwrap());

    let first = open("notepad");
    let second = open("firefox");
    assistant.submit(&first).await.unwrap();
    assistant.submit(&second).await.unwrap();

    let journal = JsonlJournal::new(dir.path()).unwrap();
    let all = journal.list().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].task.id(), second.id());
}
