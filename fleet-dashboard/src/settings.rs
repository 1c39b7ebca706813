//! Réglages de vue persistants (l'onglet actif), restaurés une fois au démarrage et
//! écrits à chaque changement d'onglet. Un enregistrement absent, illisible ou
//! corrompu n'est jamais une erreur pour l'appelant : on retombe sur les défauts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Espace de nom fixe de l'enregistrement persisté.
pub const VIEW_SETTINGS_KEY: &str = "fleetDashboard_viewSettings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabId {
    #[default]
    Overview,
    Miles,
    Maintenance,
    Faults,
    Assets,
    Admin,
}

impl TabId {
    pub const ALL: [TabId; 6] = [
        TabId::Overview,
        TabId::Miles,
        TabId::Maintenance,
        TabId::Faults,
        TabId::Assets,
        TabId::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TabId::Overview => "overview",
            TabId::Miles => "miles",
            TabId::Maintenance => "maintenance",
            TabId::Faults => "faults",
            TabId::Assets => "assets",
            TabId::Admin => "admin",
        }
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tab '{0}'")]
pub struct UnknownTab(pub String);

impl FromStr for TabId {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TabId::ALL
            .into_iter()
            .find(|tab| tab.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTab(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    // les anciennes versions stockaient la même valeur sous `currentTab`
    #[serde(rename = "activeTab", alias = "currentTab", default)]
    pub active_tab: TabId,
    /// Réservé aux filtres de tableaux, transmis tel quel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
}

impl ViewSettings {
    /// Décode un enregistrement ; tout ce qui est illisible donne les défauts.
    pub fn decode(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored view settings are corrupt, using defaults");
            Self::default()
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("view settings persistence is disabled (no settings directory)")]
    Disabled,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode view settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Stockage fichier des réglages : `<dir>/fleetDashboard_viewSettings.json`.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    dir: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Dossier de données utilisateur, ex. `~/.local/share/fleet-dashboard`.
    pub fn default_location() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("fleet-dashboard"))
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.dir
            .as_deref()
            .map(|dir| dir.join(format!("{VIEW_SETTINGS_KEY}.json")))
    }

    pub async fn load(&self) -> ViewSettings {
        let Some(path) = self.path() else {
            return ViewSettings::default();
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => ViewSettings::decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ViewSettings::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read view settings, using defaults");
                ViewSettings::default()
            }
        }
    }

    pub async fn save(&self, settings: &ViewSettings) -> Result<(), SettingsError> {
        let path = self.path().ok_or(SettingsError::Disabled)?;
        if let Some(parent) = path.parent() {
            create_dir(parent).await?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| SettingsError::Io { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), tab = %settings.active_tab, "view settings saved");
        Ok(())
    }
}

async fn create_dir(dir: &Path) -> Result<(), SettingsError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| SettingsError::Io { path: dir.to_path_buf(), source })
}
