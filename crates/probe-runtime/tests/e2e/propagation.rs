use crate::common::{config, start_petstore};
use probe_runtime::{RunSummary, run_spec};
use serde_json::json;

#[tokio::test]
async fn test_created_id_flows_into_later_paths() {
    let petstore = start_petstore().await;
    let dir = tempfile::tempdir().unwrap();

    let records = run_spec(&petstore.spec_url(), &config(dir.path())).await.unwrap();
    assert_eq!(records.len(), 4);

    assert_eq!(records[0].url, petstore.url("/pet"));
    assert_eq!(records[0].status(), Some(200));
    assert_eq!(records[0].response(), Some(&json!({"id": 42, "name": "doggie"})));

    assert_eq!(records[1].url, petstore.url("/pet/42"));
    assert_eq!(records[1].parameters["petId"], json!(42));
    assert_eq!(records[2].url, petstore.url("/pet/42/uploadImage"));

    let seen = petstore.seen.entries();
    assert_eq!(
        seen,
        vec!["POST /pet", "GET /pet/42", "POST /pet/42/uploadImage"]
    );
}

#[tokio::test]
async fn test_records_follow_declaration_order() {
    let petstore = start_petstore().await;
    let dir = tempfile::tempdir().unwrap();

    let records = run_spec(&petstore.spec_url(), &config(dir.path())).await.unwrap();
    let methods: Vec<&str> = records.iter().map(|r| r.method.as_str()).collect();
    assert_eq!(methods, vec!["post", "get", "post", "delete"]);

    let summary = RunSummary::from_records(&records);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
}
