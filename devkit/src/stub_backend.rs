/*!
Backend flotte simulé pour tester sans serveur réel

Sert des réponses JSON préparées en HTTP réel sur 127.0.0.1, de sorte que le client
reqwest du dashboard soit exercé de bout en bout. Chaque requête est enregistrée
et chaque route peut passer en erreur ou être retardée à la volée.
*/

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: Value,
    pub delay: Option<Duration>,
}

impl StubResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body, delay: None }
    }

    /// Statut d'erreur avec un petit corps JSON.
    pub fn status(status: u16) -> Self {
        Self { status, body: serde_json::json!({ "error": status }), delay: None }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Chemin et query string, tels que routés.
    pub path: String,
    pub body: Option<Value>,
}

/// Table de routes et journal des requêtes, partagés entre le test et le serveur.
#[derive(Clone, Default)]
pub struct StubBackend {
    routes: Arc<Mutex<HashMap<(Method, String), StubResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, method: Method, path: &str, response: StubResponse) -> &Self {
        self.routes.lock().insert((method, path.to_string()), response);
        self
    }

    pub fn get(&self, path: &str, response: StubResponse) -> &Self {
        self.route(Method::GET, path, response)
    }

    pub fn post(&self, path: &str, response: StubResponse) -> &Self {
        self.route(Method::POST, path, response)
    }

    /// Les routes non enregistrées répondent 404.
    pub fn remove(&self, method: Method, path: &str) {
        self.routes.lock().remove(&(method, path.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn hits(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    /// Requêtes dont le chemin commence par `/api/`.
    pub fn api_requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path.starts_with("/api/"))
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Écoute sur un port loopback éphémère et sert en tâche de fond.
    pub async fn serve(&self) -> Result<StubServer> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let app = Router::new().fallback(handle).with_state(self.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "stub backend stopped");
            }
        });
        tracing::info!(%addr, "stub backend listening");
        Ok(StubServer { addr, task })
    }
}

async fn handle(State(stub): State<StubBackend>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    stub.requests.lock().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        body: serde_json::from_slice(&body).ok(),
    });

    let response = stub.routes.lock().get(&(method, path.clone())).cloned();
    let Some(response) = response else {
        tracing::debug!(%path, "stub route not found");
        return (StatusCode::NOT_FOUND, Json(Value::Null)).into_response();
    };

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

/// Serveur simulé en cours ; arrêté au drop.
pub struct StubServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl StubServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_dashboard::api::FleetApi;

    #[tokio::test]
    async fn test_routes_and_recording() {
        let stub = StubBackend::new();
        stub.get("/api/info", StubResponse::ok(serde_json::json!({"ok": true})));
        stub.get("/api/kpis", StubResponse::status(503));
        let server = stub.serve().await.unwrap();

        let api = FleetApi::new(server.base_url(), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(api.get_json("/api/info").await.unwrap()["ok"], true);
        assert!(api.get_json("/api/kpis").await.is_err());
        assert!(api.get_json("/api/missing").await.is_err());

        assert_eq!(stub.hits(Method::GET, "/api/info"), 1);
        assert_eq!(stub.api_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_post_body_is_recorded() {
        let stub = StubBackend::new();
        stub.post("/api/admin/config", StubResponse::ok(Value::Null));
        let server = stub.serve().await.unwrap();

        let api = FleetApi::new(server.base_url(), None).unwrap();
        api.post_json("/api/admin/config", &serde_json::json!({"due_soon_days": 30})).await.unwrap();

        let recorded = stub.requests_to(Method::POST, "/api/admin/config");
        assert_eq!(recorded[0].body.as_ref().unwrap()["due_soon_days"], 30);
    }
}
