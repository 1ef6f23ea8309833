//! Loading and planning an OpenAPI 3 YAML document from disk.

use probe_core::{HttpMethod, IdentifierStore, ParamLocation, ParamValue, PlannerConfig};
use probe_planner::{EndpointPlanner, SpecLoader};

const PETSTORE_V3: &str = r#"
openapi: 3.0.2
servers:
  - url: https://petstore3.test/api/v3
paths:
  /pet:
    post:
      operationId: addPet
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
    put:
      operationId: updatePet
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
  /pet/findByStatus:
    get:
      parameters:
        - name: status
          in: query
          schema:
            type: string
            enum: [available, pending, sold]
  /pet/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        schema:
          type: integer
          format: int64
    get:
      operationId: getPetById
    delete:
      parameters:
        - name: api_key
          in: header
          schema:
            type: string
  /pet/{petId}/uploadImage:
    post:
      parameters:
        - name: petId
          in: path
          schema:
            type: integer
      requestBody:
        content:
          application/octet-stream:
            schema:
              type: string
              format: binary
components:
  schemas:
    Category:
      type: object
      properties:
        id:
          type: integer
        name:
          type: string
    Pet:
      type: object
      required: [name]
      properties:
        id:
          type: integer
          format: int64
        name:
          type: string
          example: doggie
        category:
          $ref: '#/components/schemas/Category'
        status:
          type: string
          enum: [available, pending, sold]
"#;

#[tokio::test]
async fn test_plan_petstore_v3() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("petstore.yaml");
    std::fs::write(&path, PETSTORE_V3).unwrap();

    let doc = SpecLoader::new().load(path.to_str().unwrap()).await.unwrap();
    let config = PlannerConfig {
        placeholder_dir: Some(dir.path().join("uploads")),
        seed: Some(5),
        ..Default::default()
    };
    let calls = EndpointPlanner::from_config(config).plan(&doc, &IdentifierStore::new());

    let methods: Vec<(HttpMethod, &str)> = calls
        .iter()
        .map(|c| (c.method, c.path_template.as_str()))
        .collect();
    assert_eq!(
        methods,
        vec![
            (HttpMethod::Post, "/pet"),
            (HttpMethod::Put, "/pet"),
            (HttpMethod::Get, "/pet/findByStatus"),
            (HttpMethod::Get, "/pet/{petId}"),
            (HttpMethod::Delete, "/pet/{petId}"),
            (HttpMethod::Post, "/pet/{petId}/uploadImage"),
        ]
    );

    // Body from the dereferenced component schema.
    let body = &calls[0].params[0];
    assert_eq!(body.location, ParamLocation::Body);
    let ParamValue::Object(pet) = &body.value else {
        panic!("expected object body, got {:?}", body.value);
    };
    assert_eq!(pet["name"], "doggie");
    assert!(pet["category"].is_object());
    assert!((1..=1000).contains(&pet["id"].as_i64().unwrap()));
    assert_eq!(calls[0].content_type, "application/json");
    assert_eq!(calls[0].operation_id.as_deref(), Some("addPet"));

    // Enum query value.
    let status = calls[2].params[0].value.as_text().unwrap();
    assert!(["available", "pending", "sold"].contains(&status.as_str()));

    // Path-item parameters apply to every method of the path.
    let get = &calls[3];
    assert_eq!(get.base_url, "https://petstore3.test/api/v3");
    assert!(!get.has_unresolved());
    assert!(get.url.starts_with("https://petstore3.test/api/v3/pet/"));
    assert_eq!(calls[4].params.len(), 2);

    // Binary request body.
    let upload = &calls[5];
    assert_eq!(upload.content_type, "application/octet-stream");
    assert!(upload.params.iter().any(|p| p.name == "body" && p.value.is_binary()));
    assert!(dir.path().join("uploads/placeholder.jpg").exists());
}
