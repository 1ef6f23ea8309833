use crate::common::{config, start_petstore};
use probe_planner::PLACEHOLDER_JPEG;
use probe_runtime::run_spec;
use serde_json::json;

#[tokio::test]
async fn test_file_parameter_is_sent_as_multipart_file_part() {
    let petstore = start_petstore().await;
    let dir = tempfile::tempdir().unwrap();

    let records = run_spec(&petstore.spec_url(), &config(dir.path())).await.unwrap();
    let upload = &records[2];

    assert_eq!(upload.status(), Some(200));
    assert_eq!(upload.parameters["file"], json!("file: placeholder.jpg"));

    let fields = upload.response().unwrap()["fields"].as_array().unwrap().clone();
    let file = fields.iter().find(|f| f["name"] == "file").unwrap();
    assert_eq!(file["file_name"], "placeholder.jpg");
    assert_eq!(file["content_type"], "image/jpeg");
    assert_eq!(file["size"], PLACEHOLDER_JPEG.len());

    assert!(fields.iter().any(|f| f["name"] == "additionalMetadata" && f["file_name"].is_null()));
    assert!(dir.path().join("placeholder.jpg").exists());
}
