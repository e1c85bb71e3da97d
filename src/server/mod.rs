//! The remote document store the sync engine talks to.
//!
//! A small axum service: one JSON document map per collection on disk,
//! Bearer api-key auth from a YAML key file, and a public health check.

mod store;

pub use store::{merge_fields, CollectionStore, ServerStoreError};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;

use crate::store::Collection;

/// API key entry in the key file
#[derive(Debug, Clone, Deserialize)]
struct ApiKeyEntry {
    key: String,
    user: String,
}

/// Key file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct KeyFile {
    #[serde(default)]
    api_keys: Vec<ApiKeyEntry>,
}

/// Authenticated user info, added to request extensions after auth
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: String,
}

/// API key store - maps key -> AuthUser
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashMap<String, AuthUser>,
}

impl ApiKeyStore {
    /// Load API keys from the YAML key file.
    pub fn load(path: &PathBuf) -> Self {
        let keys = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str::<KeyFile>(&contents) {
                Ok(file) => {
                    let mut map = HashMap::new();
                    for entry in file.api_keys {
                        map.insert(entry.key, AuthUser { user: entry.user });
                    }
                    tracing::info!("Loaded {} API key(s)", map.len());
                    map
                }
                Err(e) => {
                    tracing::warn!("Failed to parse key file: {}", e);
                    HashMap::new()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read key file {}: {}", path.display(), e);
                tracing::warn!("No API keys loaded - all authenticated requests will fail");
                HashMap::new()
            }
        };
        Self { keys }
    }

    #[cfg(test)]
    pub fn with_key(key: &str, user: &str) -> Self {
        let mut keys = HashMap::new();
        keys.insert(
            key.to_string(),
            AuthUser {
                user: user.to_string(),
            },
        );
        Self { keys }
    }

    fn validate(&self, key: &str) -> Option<AuthUser> {
        self.keys.get(key).cloned()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    api_keys: Arc<ApiKeyStore>,
    store: Arc<Mutex<CollectionStore>>,
}

impl AppState {
    pub fn new(api_keys: ApiKeyStore, store: CollectionStore) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
            store: Arc::new(Mutex::new(store)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn error_response(status: StatusCode, error: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error,
            message: message.into(),
        }),
    )
        .into_response()
}

async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        Some(_) => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "invalid_auth",
                "Authorization header must use Bearer scheme",
            );
        }
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            );
        }
    };

    match state.api_keys.validate(api_key) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key"),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn parse_collection(name: &str) -> Result<Collection, Response> {
    Collection::parse(name).ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            "unknown_collection",
            format!("No such collection: {}", name),
        )
    })
}

fn store_error(e: ServerStoreError) -> Response {
    tracing::error!("storage error: {}", e);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "storage_error",
        "Failed to access collection storage",
    )
}

#[derive(Deserialize, Default)]
struct ListParams {
    limit: Option<usize>,
}

async fn list_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    let collection = match parse_collection(&collection) {
        Ok(c) => c,
        Err(response) => return response,
    };
    let store = match state.store.lock() {
        Ok(store) => store,
        Err(poisoned) => poisoned.into_inner(),
    };
    match store.list(collection, params.limit) {
        Ok(docs) => Json(docs).into_response(),
        Err(e) => store_error(e),
    }
}

async fn upsert_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let collection = match parse_collection(&collection) {
        Ok(c) => c,
        Err(response) => return response,
    };
    if !body.is_object() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_document",
            "Document body must be a JSON object",
        );
    }
    let store = match state.store.lock() {
        Ok(store) => store,
        Err(poisoned) => poisoned.into_inner(),
    };
    match store.upsert(collection, &id, &body) {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => store_error(e),
    }
}

async fn delete_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let collection = match parse_collection(&collection) {
        Ok(c) => c,
        Err(response) => return response,
    };
    let store = match state.store.lock() {
        Ok(store) => store,
        Err(poisoned) => poisoned.into_inner(),
    };
    match store.delete(collection, &id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No document {} in {}", id, collection),
        ),
        Err(e) => store_error(e),
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/{collection}", get(list_collection))
        .route(
            "/api/{collection}/{id}",
            put(upsert_document).delete(delete_document),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde_json::json;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn test_app(dir: &std::path::Path) -> Router {
        let state = AppState::new(
            ApiKeyStore::with_key("secret", "tester"),
            CollectionStore::new(dir),
        );
        router(state)
    }

    fn put_request(uri: &str, key: Option<&str>, body: Value) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header("authorization", format!("Bearer {}", key));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let dir = tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_bearer_key() {
        let dir = tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app
            .clone()
            .oneshot(put_request("/api/clientes/c1", None, json!({"x": 1})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(put_request("/api/clientes/c1", Some("wrong"), json!({"x": 1})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upsert_list_delete_round_trip() {
        let dir = tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app
            .clone()
            .oneshot(put_request(
                "/api/clientes/c1",
                Some("secret"),
                json!({"fullName": "Maria"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/clientes")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let docs: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], "c1");

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("DELETE")
                    .uri("/api/clientes/c1")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_404() {
        let dir = tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(put_request("/api/nope/x", Some("secret"), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
