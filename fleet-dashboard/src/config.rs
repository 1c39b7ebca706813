/**
 * DASHBOARD CONFIG - Chargement de la configuration client
 *
 * RÔLE :
 * Détermine l'API base avec laquelle le dashboard dialogue. Le document est un
 * petit JSON (`API_BASE`, `REQUEST_TIMEOUT_SECS`, `SETTINGS_DIR`) lu depuis un
 * fichier ou une URL http(s).
 *
 * FONCTIONNEMENT :
 * - source principale, puis l'exemple fourni, puis les valeurs par défaut ; chaque
 *   étape en échec est loggée sans être fatale à elle seule
 * - `API_BASE` vide signifie "même origine que le document de config" ; une config
 *   venue d'un fichier (ou de nulle part) n'a pas d'origine : seul cas fatal
 */

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG: &str = "config.json";
pub const DEFAULT_SAMPLE_CONFIG: &str = "config.json.sample";
pub const CONFIG_ENV: &str = "FLEET_DASHBOARD_CONFIG";
pub const SAMPLE_CONFIG_ENV: &str = "FLEET_DASHBOARD_CONFIG_SAMPLE";

const CONFIG_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "API_BASE", default)]
    pub api_base: Option<String>,
    #[serde(rename = "REQUEST_TIMEOUT_SECS", default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(rename = "SETTINGS_DIR", default, skip_serializing_if = "Option::is_none")]
    pub settings_dir: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Url(String),
}

impl ConfigSource {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            ConfigSource::Url(location.to_string())
        } else {
            ConfigSource::File(PathBuf::from(location))
        }
    }

    /// `scheme://host[:port]` d'une source URL ; un fichier n'en a pas.
    pub fn origin(&self) -> Option<String> {
        match self {
            ConfigSource::File(_) => None,
            ConfigSource::Url(url) => {
                let url = Url::parse(url).ok()?;
                let origin = url.origin();
                origin.is_tuple().then(|| origin.ascii_serialization())
            }
        }
    }

    /// Document voisin de celui-ci (même dossier, ou même chemin d'URL).
    pub fn sibling(&self, name: &str) -> Self {
        match self {
            ConfigSource::File(path) => {
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                ConfigSource::File(dir.join(name))
            }
            ConfigSource::Url(url) => match Url::parse(url).and_then(|u| u.join(name)) {
                Ok(joined) => ConfigSource::Url(joined.to_string()),
                Err(_) => ConfigSource::Url(name.to_string()),
            },
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: reqwest::StatusCode },
    #[error("{source_name} is not a valid config document: {error}")]
    Parse {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("API_BASE '{0}' is not an absolute http(s) URL")]
    InvalidApiBase(String),
    #[error("API_BASE is empty and the config has no origin to fall back to")]
    NoOrigin,
}

/// Document de config et l'endroit où il a été trouvé.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: DashboardConfig,
    pub source: Option<ConfigSource>,
}

impl LoadedConfig {
    /// API base absolue, sans slash final.
    pub fn api_base(&self) -> Result<String, ConfigLoadError> {
        let explicit = self
            .config
            .api_base
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty());

        match explicit {
            Some(base) => {
                let parsed = Url::parse(base).map_err(|_| ConfigLoadError::InvalidApiBase(base.to_string()))?;
                if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
                    return Err(ConfigLoadError::InvalidApiBase(base.to_string()));
                }
                Ok(base.trim_end_matches('/').to_string())
            }
            None => self
                .source
                .as_ref()
                .and_then(ConfigSource::origin)
                .ok_or(ConfigLoadError::NoOrigin),
        }
    }

    /// Dossier des réglages : override explicite, puis `SETTINGS_DIR`, puis le défaut utilisateur.
    pub fn settings_dir(&self, explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit
            .or_else(|| self.config.settings_dir.clone())
            .or_else(crate::settings::SettingsStore::default_location)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    primary: ConfigSource,
    fallback: ConfigSource,
}

impl ConfigLoader {
    pub fn new(primary: ConfigSource, fallback: Option<ConfigSource>) -> Self {
        let fallback = fallback.unwrap_or_else(|| primary.sibling(DEFAULT_SAMPLE_CONFIG));
        Self { primary, fallback }
    }

    pub fn from_env() -> Self {
        let primary = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.into());
        let fallback = std::env::var(SAMPLE_CONFIG_ENV).ok().map(|s| ConfigSource::parse(&s));
        Self::new(ConfigSource::parse(&primary), fallback)
    }

    pub fn primary(&self) -> &ConfigSource {
        &self.primary
    }

    pub fn fallback(&self) -> &ConfigSource {
        &self.fallback
    }

    /// N'échoue jamais : repli sur l'exemple, puis sur les défauts.
    pub async fn load(&self) -> LoadedConfig {
        match load_from(&self.primary).await {
            Ok(config) => return LoadedConfig { config, source: Some(self.primary.clone()) },
            Err(e) => tracing::warn!(source = %self.primary, error = %e, "config load failed, trying sample"),
        }
        match load_from(&self.fallback).await {
            Ok(config) => return LoadedConfig { config, source: Some(self.fallback.clone()) },
            Err(e) => tracing::warn!(source = %self.fallback, error = %e, "sample config load failed, using defaults"),
        }
        LoadedConfig::default()
    }
}

pub async fn load_from(source: &ConfigSource) -> Result<DashboardConfig, ConfigLoadError> {
    let text = match source {
        ConfigSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigLoadError::Io { path: path.clone(), source: e })?,
        ConfigSource::Url(url) => fetch_text(url).await?,
    };

    if text.trim().is_empty() {
        return Ok(DashboardConfig::default());
    }
    serde_json::from_str(&text).map_err(|error| ConfigLoadError::Parse { source_name: source.to_string(), error })
}

async fn fetch_text(url: &str) -> Result<String, ConfigLoadError> {
    let http_error = |source| ConfigLoadError::Http { url: url.to_string(), source };
    let client = reqwest::Client::builder()
        .timeout(CONFIG_FETCH_TIMEOUT)
        .build()
        .map_err(http_error)?;
    let response = client.get(url).send().await.map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ConfigLoadError::Status { url: url.to_string(), status });
    }
    response.text().await.map_err(http_error)
}
