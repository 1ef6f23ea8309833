use crate::common::{config, start_petstore};
use probe_core::UnresolvedPathPolicy;
use probe_planner::SpecError;
use probe_runtime::{RunError, run_spec};

#[tokio::test]
async fn test_missing_spec_is_fatal() {
    let petstore = start_petstore().await;
    let dir = tempfile::tempdir().unwrap();

    let err = run_spec(&petstore.url("/nope.json"), &config(dir.path()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RunError::Spec(SpecError::Status { status: 404, .. })
    ));
    assert!(petstore.seen.entries().is_empty());
}

#[tokio::test]
async fn test_failed_call_is_recorded_and_run_continues() {
    let petstore = start_petstore().await;
    let dir = tempfile::tempdir().unwrap();

    let records = run_spec(&petstore.spec_url(), &config(dir.path())).await.unwrap();
    let orphan = &records[3];

    assert_eq!(orphan.url, petstore.url("/orphan/1"));
    assert_eq!(orphan.status(), Some(404));
    assert!(orphan.error().is_some());
}

#[tokio::test]
async fn test_skip_policy_reports_skipped_call() {
    let petstore = start_petstore().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.executor.unresolved_path_policy = UnresolvedPathPolicy::Skip;

    let records = run_spec(&petstore.spec_url(), &config).await.unwrap();
    assert_eq!(records.len(), 4);
    assert!(records[3].is_skipped());
    assert_eq!(records[3].url, petstore.url("/orphan/{thing}"));
    assert_eq!(records.iter().filter(|r| !r.is_skipped()).count(), 3);
}
