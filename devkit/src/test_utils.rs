/*!
Test Harness pour le dashboard flotte

Démarre un backend simulé qui sert aussi la config client, et y branche un
Dashboard avec un renderer enregistreur et un dossier de réglages jetable.
*/

use crate::fixtures::{config_document, FleetPayloads};
use crate::recording::RecordingRenderer;
use crate::stub_backend::{StubBackend, StubResponse, StubServer};
use anyhow::Result;
use fleet_dashboard::config::{ConfigLoader, ConfigSource};
use fleet_dashboard::{Dashboard, DashboardOptions, Startup};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const CONFIG_PATH: &str = "/config.json";
pub const SAMPLE_CONFIG_PATH: &str = "/config.json.sample";

pub struct TestHarness {
    pub stub: StubBackend,
    pub server: StubServer,
    pub payloads: FleetPayloads,
    pub renderer: Arc<RecordingRenderer>,
    settings: TempDir,
}

impl TestHarness {
    /// Backend sain avec la flotte d'exemple ; la config résout API_BASE vers l'origine du stub.
    pub async fn new() -> Result<Self> {
        init_tracing();

        let stub = StubBackend::new();
        let payloads = FleetPayloads::sample(chrono::Utc::now());
        payloads.install(&stub);
        stub.get(CONFIG_PATH, StubResponse::ok(config_document("")));
        let server = stub.serve().await?;

        Ok(Self {
            stub,
            server,
            payloads,
            renderer: Arc::new(RecordingRenderer::new()),
            settings: TempDir::new()?,
        })
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.settings.path().join("settings")
    }

    pub fn loader(&self) -> ConfigLoader {
        ConfigLoader::new(ConfigSource::Url(self.server.url(CONFIG_PATH)), None)
    }

    /// Dashboard neuf, non initialisé, partageant le renderer et les réglages du harness.
    pub fn dashboard(&self) -> Arc<Dashboard> {
        let options = DashboardOptions {
            loader: Some(self.loader()),
            settings_dir: Some(self.settings_dir()),
        };
        Arc::new(Dashboard::new(options, self.renderer.clone()))
    }

    pub async fn start(&self) -> (Arc<Dashboard>, Startup) {
        let dashboard = self.dashboard();
        let startup = dashboard.init().await;
        (dashboard, startup)
    }

    /// Nombre de cycles vus par le backend (comptés sur `/api/info`).
    pub fn sync_cycles(&self) -> usize {
        self.stub.hits(axum::http::Method::GET, fleet_dashboard::api::endpoints::INFO)
    }
}

/// Tracing vers le writer de test ; appelable depuis chaque test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fleet_dashboard=debug,fleet_devkit=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_dashboard::ConnectionState;

    #[tokio::test]
    async fn test_harness_starts_online() {
        let harness = TestHarness::new().await.unwrap();
        let (dashboard, startup) = harness.start().await;

        assert!(startup.synced);
        assert_eq!(startup.api_base.as_deref(), Some(harness.server.base_url().as_str()));
        assert_eq!(dashboard.state(), ConnectionState::Online);
        assert_eq!(harness.sync_cycles(), 1);
    }
}
