/**
 * FLEET API - Client HTTP pour l'API REST du backend flotte
 *
 * RÔLE :
 * Fine surcouche reqwest qui ramène chaque appel à `Result<Value, ApiError>` :
 * statut non-succès, échec transport, corps illisible ou timeout remontent tous
 * en erreur, ce qui permet au fetcher d'appliquer le tout-ou-rien.
 *
 * ENDPOINTS :
 * - six lectures requises (info, kpis, assets, maintenance due, faults actifs, miles mensuels)
 * - lecture best-effort de la config admin et déclencheur refresh-now
 * - écriture de la config admin et lectures détaillées par asset
 */

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub mod endpoints {
    pub const INFO: &str = "/api/info";
    pub const KPIS: &str = "/api/kpis";
    pub const ASSETS: &str = "/api/assets";
    pub const MAINTENANCE_DUE: &str = "/api/maintenance/due";
    pub const FAULTS_ACTIVE: &str = "/api/faults/activeSummary";
    pub const MILES_MONTHLY: &str = "/api/miles/monthly?months=12";
    pub const ADMIN_CONFIG: &str = "/api/admin/config";
    pub const REFRESH_NOW: &str = "/api/refresh-now";

    /// Les six lectures d'un cycle de sync, dans l'ordre des champs du snapshot.
    pub const REQUIRED: [&str; 6] = [INFO, KPIS, ASSETS, MAINTENANCE_DUE, FAULTS_ACTIVE, MILES_MONTHLY];

    pub fn asset_miles(asset_id: &str) -> String {
        format!("/api/miles/asset/{}?months=12", segment(asset_id))
    }

    pub fn asset_faults(asset_id: &str) -> String {
        format!("/api/faults/history/{}", segment(asset_id))
    }

    pub fn asset_maintenance(asset_id: &str) -> String {
        format!("/api/maintenance/asset/{}", segment(asset_id))
    }

    /// Encode un segment de chemin (`/`, `?`, `#`, espaces...).
    fn segment(raw: &str) -> String {
        let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
            return raw.to_string();
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear().push(raw);
        }
        url.path().trim_start_matches('/').to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint}: no response within {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
    #[error("{endpoint}: HTTP {status}")]
    Status { endpoint: String, status: StatusCode },
    #[error("{endpoint}: invalid JSON body: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ApiError::Client(_) => None,
            ApiError::Transport { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::Status { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FleetApi {
    http: reqwest::Client,
    base: String,
    timeout: Option<Duration>,
}

impl FleetApi {
    /// `base` est préfixée telle quelle à chaque chemin d'endpoint.
    pub fn new(base: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("fleet-dashboard/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base, endpoint)
    }

    /// GET d'un document JSON ; un corps `null` revient en `Value::Null`.
    pub async fn get_json(&self, endpoint: &str) -> Result<Value, ApiError> {
        tracing::debug!(endpoint, "GET");
        let response = self
            .http
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;
        let response = self.check_status(endpoint, response)?;

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.send_error(endpoint, e)
            } else {
                ApiError::Decode { endpoint: endpoint.to_string(), source: e }
            }
        })
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<(), ApiError> {
        tracing::debug!(endpoint, "POST");
        let response = self
            .http
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;
        self.check_status(endpoint, response)?;
        Ok(())
    }

    /// POST sans corps (déclencheurs côté serveur).
    pub async fn post_empty(&self, endpoint: &str) -> Result<(), ApiError> {
        tracing::debug!(endpoint, "POST");
        let response = self
            .http
            .post(self.url(endpoint))
            .send()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;
        self.check_status(endpoint, response)?;
        Ok(())
    }

    fn check_status(&self, endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status { endpoint: endpoint.to_string(), status })
        }
    }

    fn send_error(&self, endpoint: &str, source: reqwest::Error) -> ApiError {
        match self.timeout {
            Some(timeout) if source.is_timeout() => ApiError::Timeout { endpoint: endpoint.to_string(), timeout },
            _ => ApiError::Transport { endpoint: endpoint.to_string(), source },
        }
    }
}
