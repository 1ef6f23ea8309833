//! Shared test infrastructure: a small petstore served by axum on an
//! ephemeral port, which also serves its own Swagger document.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use probe_core::ProbeConfig;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Requests seen by the petstore, as `METHOD path`.
#[derive(Clone, Default)]
pub struct Seen(Arc<Mutex<Vec<String>>>);

impl Seen {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct Petstore {
    pub addr: SocketAddr,
    pub seen: Seen,
}

impl Petstore {
    pub fn spec_url(&self) -> String {
        format!("http://{}/swagger.json", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Swagger 2 document without `host`: the planner falls back to the host the
/// document was fetched from.
pub fn swagger() -> Value {
    json!({
        "swagger": "2.0",
        "basePath": "/",
        "schemes": ["http"],
        "paths": {
            "/pet": {
                "post": {
                    "operationId": "addPet",
                    "parameters": [{
                        "in": "body",
                        "name": "body",
                        "schema": {"$ref": "#/definitions/Pet"}
                    }]
                }
            },
            "/pet/{petId}": {
                "get": {
                    "operationId": "getPetById",
                    "parameters": [{"in": "path", "name": "petId", "type": "integer", "format": "int64"}]
                }
            },
            "/pet/{petId}/uploadImage": {
                "post": {
                    "operationId": "uploadFile",
                    "consumes": ["multipart/form-data"],
                    "parameters": [
                        {"in": "path", "name": "petId", "type": "integer"},
                        {"in": "formData", "name": "additionalMetadata", "type": "string"},
                        {"in": "formData", "name": "file", "type": "file"}
                    ]
                }
            },
            "/orphan/{thing}": {
                "delete": {"operationId": "deleteOrphan"}
            }
        },
        "definitions": {
            "Pet": {
                "type": "object",
                "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "name": {"type": "string", "example": "doggie"}
                }
            }
        }
    })
}

async fn add_pet(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.push("POST /pet".to_string());
    Json(json!({"id": 42, "name": body["name"]}))
}

async fn get_pet(State(seen): State<Seen>, Path(pet_id): Path<u64>) -> Json<Value> {
    seen.push(format!("GET /pet/{}", pet_id));
    Json(json!({"id": pet_id, "name": "doggie"}))
}

async fn upload(
    State(seen): State<Seen>,
    Path(pet_id): Path<u64>,
    mut multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    seen.push(format!("POST /pet/{}/uploadImage", pet_id));

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        fields.push(json!({
            "name": name,
            "file_name": file_name,
            "content_type": content_type,
            "size": bytes.len()
        }));
    }
    Ok(Json(json!({"petId": pet_id, "fields": fields})))
}

/// Start the petstore on `127.0.0.1:0`.
pub async fn start_petstore() -> Petstore {
    let seen = Seen::default();
    let app = Router::new()
        .route("/swagger.json", get(|| async { Json(swagger()) }))
        .route("/pet", post(add_pet))
        .route("/pet/{pet_id}", get(get_pet))
        .route("/pet/{pet_id}/uploadImage", post(upload))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Petstore { addr, seen }
}

/// Deterministic config with the placeholder kept in `dir`.
pub fn config(dir: &std::path::Path) -> ProbeConfig {
    let mut config = ProbeConfig::default();
    config.planner.placeholder_dir = Some(dir.to_path_buf());
    config.planner.seed = Some(11);
    config.executor.timeout_secs = 5;
    config
}
