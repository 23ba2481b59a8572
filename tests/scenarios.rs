//! End-to-end loop runs through the assistant for each domain.

use std::sync::Arc;

use deskloop::assistant::Assistant;
use deskloop::controller::DomainsConfig;
use deskloop::domain::{FailureCategory, LoopOutcome, Operation, ParamSet, StopReason, Task};
use deskloop::executor::{LocalExecutor, LocalExecutorConfig, OperationExecutor, OperationResponse, ScriptedExecutor};
use deskloop::observer::NoopObserver;
use deskloop::rate_limit::RateLimitConfig;
use deskloop::refine::RefinerConfig;
use tempfile::tempdir;

fn assistant(executor: Arc<dyn OperationExecutor>, refiner: RefinerConfig) -> Assistant {
    Assistant::standard(
        executor,
        &DomainsConfig::default(),
        refiner,
        RateLimitConfig::default(),
        Arc::new(NoopObserver),
    )
    .unwrap()
}

fn refiner(search_roots: Vec<String>) -> RefinerConfig {
    RefinerConfig {
        known_applications: vec!["notepad".into(), "calculator".into(), "firefox".into()],
        search_roots,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_misspelled_application_is_corrected() {
    let executor = Arc::new(
        ScriptedExecutor::new(OperationResponse::error("Failed to open application: not found")).respond(
            Operation::OpenApplication,
            "calculator",
            OperationResponse::ok("Application opened successfully: calculator"),
        ),
    );
    let assistant = assistant(executor.clone(), refiner(vec![]));
    let task = Task::new(
        "open the calculator",
        Operation::OpenApplication,
        ParamSet::new().with("name", "calcultor"),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.max_attempts, 5);
    assert_eq!(report.attempt_count(), 2);
    assert_eq!(
        report.verdicts[0].failure_detail().unwrap().category,
        FailureCategory::NotFound
    );
    assert_eq!(report.attempts[1].params.get("name"), Some("calculator"));
    assert_eq!(executor.request_count(), 2);
    assert!(report.narrative.contains("name=calcultor"));
    assert!(report.narrative.contains("name=calculator"));
}

#[tokio::test]
async fn test_nested_file_is_found_by_exploration() {
    let dir = tempdir().unwrap();
    let root = dir.path().display().to_string();
    std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
    std::fs::create_dir_all(dir.path().join("c")).unwrap();
    std::fs::write(dir.path().join("a/b/test.txt"), "hello from b").unwrap();

    let executor = Arc::new(LocalExecutor::new(LocalExecutorConfig::default()));
    let assistant = assistant(executor, refiner(vec![]));
    let task = Task::new(
        "read test.txt",
        Operation::ReadFile,
        ParamSet::new().with("file_path", format!("{}/test.txt", root)),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.max_attempts, 10);
    assert_eq!(report.attempt_count(), 2);
    assert_eq!(
        report.verdicts[0].failure_detail().unwrap().category,
        FailureCategory::NotFound
    );
    match &report.outcome {
        LoopOutcome::Succeeded { payload, .. } => assert!(payload.contains("hello from b")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(report.explored.contains(&format!("{}/a", root)));
    assert!(report.explored.contains(&format!("{}/a/b", root)));
    assert!(report.narrative.contains("Searched:"));
    assert!(report.narrative.contains(&format!("{}/a/b", root)));
}

#[tokio::test]
async fn test_permanently_malformed_path_exhausts_budget() {
    let executor = Arc::new(ScriptedExecutor::new(OperationResponse::error(
        "Error reading file: invalid path format (invalid drive specifier)",
    )));
    let roots: Vec<String> = (0..12).map(|i| format!("/srv/share{}", i)).collect();
    let assistant = assistant(executor.clone(), refiner(roots));
    let task = Task::new(
        "read the report",
        Operation::ReadFile,
        ParamSet::new().with("file_path", "Q::\\data\\report.txt"),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(!report.succeeded());
    assert_eq!(report.attempt_count(), 10);
    assert_eq!(executor.request_count(), 10);

    let last_path = report.attempts[9].params.get("file_path").unwrap().to_string();
    match &report.outcome {
        LoopOutcome::Exhausted { last_failure, reason } => {
            assert_eq!(*reason, StopReason::BudgetSpent);
            assert_eq!(last_failure.category, FailureCategory::MalformedInput);
            assert_eq!(last_failure.resource.as_deref(), Some(last_path.as_str()));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let tried = report.tried_params();
    for (i, params) in tried.iter().enumerate() {
        assert!(!tried[..i].contains(params), "parameter set {} repeated", i);
    }
    assert!(report.narrative.contains("malformed_input"));
    assert!(report.narrative.contains(&last_path));
}

#[tokio::test]
async fn test_first_attempt_success_runs_once() {
    let executor = Arc::new(ScriptedExecutor::always_ok());
    let assistant = assistant(executor.clone(), refiner(vec![]));
    let task = Task::new(
        "list home",
        Operation::ListDirectory,
        ParamSet::new().with("directory_path", "/home"),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(executor.request_count(), 1);
}

#[tokio::test]
async fn test_editor_creates_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md").display().to_string();
    let executor = Arc::new(LocalExecutor::new(LocalExecutorConfig {
        editor_command: "true".into(),
        ..Default::default()
    }));
    let assistant = assistant(executor, refiner(vec![]));
    let task = Task::new(
        "open notes",
        Operation::OpenInEditor,
        ParamSet::new().with("file_path", path.clone()),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.attempt_count(), 1);
    assert!(std::path::Path::new(&path).exists());
}

#[tokio::test]
async fn test_unknown_application_gives_up_before_ceiling() {
    let executor = Arc::new(ScriptedExecutor::new(OperationResponse::error(
        "Failed to open application: not found",
    )));
    let assistant = assistant(executor.clone(), refiner(vec![]));
    let task = Task::new(
        "open something",
        Operation::OpenApplication,
        ParamSet::new().with("name", "zz"),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(!report.succeeded());
    assert!(report.attempt_count() <= 5);
    match &report.outcome {
        LoopOutcome::Exhausted { last_failure, .. } => {
            assert_eq!(last_failure.category, FailureCategory::NotFound)
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_colon_in_file_name_reads_first_time() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes:v2.txt");
    std::fs::write(&path, "second draft").unwrap();

    let executor = Arc::new(LocalExecutor::new(LocalExecutorConfig::default()));
    let assistant = assistant(executor, refiner(vec![]));
    let task = Task::new(
        "read the notes",
        Operation::ReadFile,
        ParamSet::new().with("file_path", path.display().to_string()),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(report.succeeded(), "{}", report.narrative);
    assert_eq!(report.attempt_count(), 1);
}

#[tokio::test]
async fn test_binary_file_reads_without_rewriting_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("img.bin");
    std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();
    let path = path.display().to_string();

    let executor = Arc::new(LocalExecutor::new(LocalExecutorConfig::default()));
    let assistant = assistant(executor, refiner(vec![]));
    let task = Task::new(
        "read the image",
        Operation::ReadFile,
        ParamSet::new().with("file_path", path.clone()),
    )
    .unwrap();

    let report = assistant.submit(&task).await.unwrap();

    assert!(report.succeeded(), "{}", report.narrative);
    assert_eq!(report.attempt_count(), 1);
    assert_eq!(report.attempts[0].params.get("file_path"), Some(path.as_str()));
}
