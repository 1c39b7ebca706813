/**
 * DASHBOARD CONTROLLER - Orchestration des synchronisations et des vues
 *
 * RÔLE :
 * Unique écrivain du SnapshotStore et du ConnectionState. Chaque action
 * utilisateur (onglet, refresh, mode substitut, upload, admin, détail asset)
 * passe par un seul `Dashboard` partagé derrière un `Arc`.
 *
 * DÉMARRAGE (ordre strict) :
 * config -> écoute des commandes -> réglages de vue -> sync initiale -> rendu
 *
 * CYCLES DE SYNC :
 * Les cycles live et l'activation du mode substitut tiennent le ticket SyncGate
 * pendant leur écriture ; une demande concurrente est rejetée (FetchError::InFlight /
 * SubstituteError::Busy) sans rien modifier. Un cycle live en échec passe Offline
 * et garde le dernier snapshot valide à l'écran.
 */

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::{ApiError, FleetApi};
use crate::config::{ConfigLoader, ConfigSource, LoadedConfig};
use crate::connection::{ConnectionState, ConnectionTracker, Transition};
use crate::fetcher::{FetchError, SnapshotFetcher, SyncGate, SyncTicket};
use crate::models::{AdminConfig, AssetDetail, Snapshot};
use crate::schema::{self, SubstituteDocument, ValidationError};
use crate::settings::{SettingsStore, TabId, ViewSettings};
use crate::store::{DataSource, SnapshotStore};
use crate::view::{build_view, Notice, Renderer, ViewModel};

pub const MSG_CONFIG_FAILED: &str = "Failed to load dashboard configuration";
pub const MSG_FETCH_FAILED: &str = "Failed to load fleet data";
pub const MSG_NO_SUBSTITUTE: &str = "Please upload a substitute data JSON file to enable Substitute Mode.";
pub const MSG_SUBSTITUTE_LOADED: &str = "Substitute data loaded. Substitute mode is ON for this session.";
pub const MSG_SUBSTITUTE_INVALID: &str = "Substitute data invalid. Fix the JSON to match production schema.";
pub const MSG_SYNC_BUSY: &str = "Data is still loading, try again in a moment.";
pub const MSG_ADMIN_SAVED: &str = "Settings saved successfully";
pub const MSG_ADMIN_SAVE_FAILED: &str = "Failed to save settings";
pub const MSG_ADMIN_SUBSTITUTE: &str = "Substitute mode is ON: settings are not sent to the server.";
pub const MSG_ASSET_FAILED: &str = "Failed to load asset details";

#[derive(Debug, thiserror::Error)]
pub enum SubstituteError {
    #[error("no validated substitute document is loaded")]
    MissingDocument,
    #[error("uploaded text is not JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a sync cycle is in flight")]
    Busy,
    #[error("live sync after leaving substitute mode failed: {0}")]
    Sync(#[from] FetchError),
}

#[derive(Debug, thiserror::Error)]
pub enum AdminSaveError {
    #[error("admin settings are not saved in substitute mode")]
    SubstituteMode,
    #[error("no API base configured")]
    NotConfigured,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Événements acceptés par l'écoute des commandes.
#[derive(Debug, Clone)]
pub enum Command {
    SwitchTab(TabId),
    Refresh,
    ToggleSubstitute(bool),
    LoadSubstituteText(String),
    ShowAsset(String),
    SaveAdmin(AdminConfig),
}

pub type CommandSender = mpsc::UnboundedSender<Command>;

#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub loader: Option<ConfigLoader>,
    /// Remplace `SETTINGS_DIR` et le défaut utilisateur.
    pub settings_dir: Option<PathBuf>,
}

/// Ce que `init` a trouvé et fait.
#[derive(Debug, Clone)]
pub struct Startup {
    pub config_source: Option<ConfigSource>,
    pub api_base: Option<String>,
    pub tab: TabId,
    pub synced: bool,
    pub commands: CommandSender,
}

pub struct Dashboard {
    renderer: Arc<dyn Renderer>,
    loader: ConfigLoader,
    settings_override: Option<PathBuf>,
    fetcher: RwLock<Option<SnapshotFetcher>>,
    settings: RwLock<SettingsStore>,
    store: SnapshotStore,
    connection: Mutex<ConnectionTracker>,
    view: Mutex<ViewSettings>,
    admin: Mutex<Option<AdminConfig>>,
    gate: SyncGate,
}

impl Dashboard {
    pub fn new(options: DashboardOptions, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer,
            loader: options.loader.unwrap_or_else(ConfigLoader::from_env),
            settings_override: options.settings_dir,
            fetcher: RwLock::new(None),
            settings: RwLock::new(SettingsStore::default()),
            store: SnapshotStore::new(),
            connection: Mutex::new(ConnectionTracker::new()),
            view: Mutex::new(ViewSettings::default()),
            admin: Mutex::new(None),
            gate: SyncGate::new(),
        }
    }

    pub async fn init(self: &Arc<Self>) -> Startup {
        self.renderer.status(self.state());

        let loaded = self.loader.load().await;
        let api_base = self.configure(&loaded);

        let commands = self.listen();

        let store = self.settings.read().clone();
        let restored = store.load().await;
        let tab = restored.active_tab;
        *self.view.lock() = restored;
        tracing::info!(%tab, "view settings restored");

        let synced = match self.sync_live().await {
            Ok(()) => {
                self.render();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial sync failed");
                false
            }
        };

        Startup { config_source: loaded.source, api_base, tab, synced, commands }
    }

    /// Applique une config chargée ; renvoie l'API base résolue, `None` sur le chemin fatal.
    fn configure(&self, loaded: &LoadedConfig) -> Option<String> {
        let dir = loaded.settings_dir(self.settings_override.clone());
        if dir.is_none() {
            tracing::warn!("no settings directory available, view settings will not persist");
        }
        *self.settings.write() = SettingsStore::new(dir);

        let base = match loaded.api_base() {
            Ok(base) => base,
            Err(e) => {
                tracing::error!(error = %e, "cannot resolve API base");
                return None;
            }
        };
        match FleetApi::new(base.clone(), loaded.config.request_timeout()) {
            Ok(api) => {
                tracing::info!(api_base = %base, "dashboard configured");
                *self.fetcher.write() = Some(SnapshotFetcher::new(api));
                Some(base)
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot build HTTP client");
                None
            }
        }
    }

    fn listen(self: &Arc<Self>) -> CommandSender {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Arc::clone(self).run(rx));
        tx
    }

    /// Boucle de commandes, un événement à la fois jusqu'à la fermeture des émetteurs.
    pub async fn run(self: Arc<Self>, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            tracing::debug!(?command, "command received");
            self.dispatch(command).await;
        }
        tracing::debug!("command channel closed");
    }

    pub async fn dispatch(&self, command: Command) {
        // les échecs sont déjà signalés au renderer
        match command {
            Command::SwitchTab(tab) => self.switch_tab(tab).await,
            Command::Refresh => {
                let _ = self.refresh().await;
            }
            Command::ToggleSubstitute(on) => {
                let _ = self.toggle_substitute_mode(on, None).await;
            }
            Command::LoadSubstituteText(text) => {
                let _ = self.load_substitute_text(&text).await;
            }
            Command::ShowAsset(id) => {
                self.asset_details(&id).await;
            }
            Command::SaveAdmin(config) => {
                let _ = self.save_admin_settings(config).await;
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.lock().state()
    }

    pub fn current_source(&self) -> DataSource {
        self.store.current_source()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn active_tab(&self) -> TabId {
        self.view.lock().active_tab
    }

    pub fn admin_config(&self) -> Option<AdminConfig> {
        self.admin.lock().clone()
    }

    pub fn has_substitute(&self) -> bool {
        self.store.substitute().is_some()
    }

    pub fn is_syncing(&self) -> bool {
        self.gate.is_busy()
    }

    /// View model du snapshot, de l'état et de l'onglet courants.
    pub fn view_model(&self) -> ViewModel {
        let snapshot = self.store.snapshot();
        build_view(&snapshot, self.state(), self.store.current_source(), self.active_tab())
    }

    pub fn render(&self) {
        let view = self.view_model();
        self.renderer.render(&view);
    }

    pub async fn switch_tab(&self, tab: TabId) {
        let settings = {
            let mut view = self.view.lock();
            view.active_tab = tab;
            view.clone()
        };
        let store = self.settings.read().clone();
        if let Err(e) = store.save(&settings).await {
            tracing::warn!(error = %e, %tab, "view settings not persisted");
        }
        self.render();
    }

    /// Live : déclencheur refresh best-effort puis nouveau cycle. Substitut : simple re-rendu.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        if self.store.current_source() == DataSource::Substitute {
            tracing::debug!("substitute mode, refresh re-renders without network");
            self.render();
            return Ok(());
        }

        let Some(fetcher) = self.fetcher() else {
            return Err(self.unconfigured());
        };
        let Some(ticket) = self.gate.try_acquire() else {
            return Err(self.in_flight());
        };

        if let Err(e) = fetcher.trigger_refresh().await {
            tracing::warn!(error = %e, "refresh trigger failed, refetching anyway");
        }
        self.run_sync(&fetcher, &ticket).await?;
        drop(ticket);

        self.render();
        Ok(())
    }

    async fn sync_live(&self) -> Result<(), FetchError> {
        let Some(fetcher) = self.fetcher() else {
            return Err(self.unconfigured());
        };
        let Some(ticket) = self.gate.try_acquire() else {
            return Err(self.in_flight());
        };
        self.run_sync(&fetcher, &ticket).await
    }

    /// Demande de sync concurrente : rejetée avec un avertissement, rien d'autre ne change.
    fn in_flight(&self) -> FetchError {
        tracing::info!("sync request ignored, a sync cycle is already in flight");
        self.notify(Notice::warn(MSG_SYNC_BUSY));
        FetchError::InFlight
    }

    /// Pas d'API base issue de la config : toute tentative de sync finit Offline.
    fn unconfigured(&self) -> FetchError {
        self.set_state(ConnectionState::Connecting);
        self.notify(Notice::error(MSG_CONFIG_FAILED));
        self.set_state(ConnectionState::Offline);
        FetchError::NotConfigured
    }

    async fn run_sync(&self, fetcher: &SnapshotFetcher, ticket: &SyncTicket<'_>) -> Result<(), FetchError> {
        self.set_state(ConnectionState::Connecting);
        tracing::info!(cycle = ticket.id(), "sync cycle started");

        match fetcher.fetch().await {
            Ok(snapshot) => {
                self.store.replace(snapshot, DataSource::Live);
                match fetcher.fetch_admin_config().await {
                    Ok(Some(admin)) => self.apply_admin(admin),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "admin config unavailable, keeping previous values"),
                }
                self.set_state(ConnectionState::Online);
                tracing::info!(cycle = ticket.id(), "sync cycle complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!(cycle = ticket.id(), error = %e, "sync cycle failed");
                self.notify(Notice::error(MSG_FETCH_FAILED));
                self.set_state(ConnectionState::Offline);
                Err(e)
            }
        }
    }

    /// L'activation exige un document validé (celui fourni, ou un déjà chargé).
    /// La désactivation jette le document de session et revient aux données live.
    pub async fn toggle_substitute_mode(&self, on: bool, document: Option<Value>) -> Result<(), SubstituteError> {
        if !on {
            if self.store.clear_substitute().is_some() {
                tracing::info!("substitute document discarded");
            }
            // le store vidé est rendu même si le cycle live échoue
            let synced = self.sync_live().await;
            self.render();
            return synced.map_err(SubstituteError::from);
        }

        let candidate = match document {
            Some(value) => Some(self.validated(value)?),
            None => None,
        };
        if candidate.is_none() && self.store.substitute().is_none() {
            self.notify(Notice::warn(MSG_NO_SUBSTITUTE));
            return Err(SubstituteError::MissingDocument);
        }

        let Some(_ticket) = self.gate.try_acquire() else {
            self.notify(Notice::warn(MSG_SYNC_BUSY));
            return Err(SubstituteError::Busy);
        };

        let document = match candidate {
            Some(document) => self.store.stage_substitute(document),
            None => self.store.substitute().ok_or(SubstituteError::MissingDocument)?,
        };

        self.store.replace(document.snapshot().clone(), DataSource::Substitute);
        if let Some(admin) = document.admin() {
            self.apply_admin(admin.clone());
        }
        self.set_state(ConnectionState::Substitute);
        tracing::info!(assets = document.snapshot().assets.len(), "substitute mode enabled");
        self.render();
        Ok(())
    }

    /// Valide puis active un document substitut.
    pub async fn load_substitute(&self, document: Value) -> Result<(), SubstituteError> {
        self.toggle_substitute_mode(true, Some(document)).await?;
        self.notify(Notice::success(MSG_SUBSTITUTE_LOADED));
        Ok(())
    }

    pub async fn load_substitute_text(&self, text: &str) -> Result<(), SubstituteError> {
        let document: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "uploaded substitute data is not JSON");
                self.notify(Notice::error(format!("Failed to parse uploaded JSON: {e}")));
                return Err(e.into());
            }
        };
        self.load_substitute(document).await
    }

    fn validated(&self, document: Value) -> Result<SubstituteDocument, SubstituteError> {
        SubstituteDocument::parse(document).map_err(|e| {
            tracing::error!(errors = ?e.errors, "substitute document rejected");
            self.notify(Notice::error(format!("{MSG_SUBSTITUTE_INVALID}\n{}", e.errors.join("\n"))));
            SubstituteError::Invalid(e)
        })
    }

    pub fn sample_document(&self) -> Value {
        schema::sample_document(chrono::Utc::now())
    }

    pub async fn save_admin_settings(&self, config: AdminConfig) -> Result<(), AdminSaveError> {
        if self.store.current_source() == DataSource::Substitute {
            self.notify(Notice::warn(MSG_ADMIN_SUBSTITUTE));
            return Err(AdminSaveError::SubstituteMode);
        }
        let Some(fetcher) = self.fetcher() else {
            self.notify(Notice::error(MSG_ADMIN_SAVE_FAILED));
            return Err(AdminSaveError::NotConfigured);
        };

        match fetcher.save_admin_config(&config).await {
            Ok(()) => {
                self.apply_admin(config);
                self.notify(Notice::success(MSG_ADMIN_SAVED));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "admin settings not saved");
                self.notify(Notice::error(MSG_ADMIN_SAVE_FAILED));
                Err(e.into())
            }
        }
    }

    /// Détail d'un asset ; `None` pour un id inconnu ou une lecture live en échec.
    pub async fn asset_details(&self, asset_id: &str) -> Option<AssetDetail> {
        let snapshot = self.store.snapshot();
        let Some(asset) = snapshot.find_asset(asset_id) else {
            tracing::debug!(asset_id, "unknown asset");
            return None;
        };

        let detail = if self.store.current_source() == DataSource::Substitute {
            snapshot.asset_detail(&asset)
        } else {
            let fetcher = self.fetcher()?;
            match fetcher.fetch_asset_detail(&asset).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::error!(asset_id, error = %e, "asset detail read failed");
                    self.notify(Notice::error(MSG_ASSET_FAILED));
                    return None;
                }
            }
        };

        self.renderer.show_asset(&detail);
        Some(detail)
    }

    fn fetcher(&self) -> Option<SnapshotFetcher> {
        self.fetcher.read().clone()
    }

    fn apply_admin(&self, admin: AdminConfig) {
        self.renderer.populate_admin(&admin);
        *self.admin.lock() = Some(admin);
    }

    fn notify(&self, notice: Notice) {
        self.renderer.notify(&notice);
    }

    /// Change l'état de connexion ; chaque changement effectif est signalé une fois.
    fn set_state(&self, to: ConnectionState) -> bool {
        let outcome = self.connection.lock().transition(to);
        match outcome {
            Ok(Transition::Changed { from, to }) => {
                tracing::info!(%from, %to, "connection state changed");
                self.renderer.status(to);
                true
            }
            Ok(Transition::Unchanged) => false,
            Err(e) => {
                tracing::error!(error = %e, "rejected connection transition");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::NoticeLevel;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<ConnectionState>>,
        notices: Mutex<Vec<Notice>>,
        views: Mutex<Vec<ViewModel>>,
    }

    impl Renderer for Recorder {
        fn status(&self, state: ConnectionState) {
            self.statuses.lock().push(state);
        }

        fn notify(&self, notice: &Notice) {
            self.notices.lock().push(notice.clone());
        }

        fn render(&self, view: &ViewModel) {
            self.views.lock().push(view.clone());
        }
    }

    async fn dashboard(config: &str) -> (Arc<Dashboard>, Arc<Recorder>, TempDir) {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        tokio::fs::write(&config_path, config).await.unwrap();

        let recorder = Arc::new(Recorder::default());
        let options = DashboardOptions {
            loader: Some(ConfigLoader::new(ConfigSource::File(config_path), None)),
            settings_dir: Some(dir.path().join("settings")),
        };
        let dashboard = Arc::new(Dashboard::new(options, recorder.clone()));
        (dashboard, recorder, dir)
    }

    #[tokio::test]
    async fn test_missing_origin_is_fatal_config_path() {
        let (dashboard, recorder, _dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        let startup = dashboard.init().await;

        assert!(!startup.synced);
        assert!(startup.api_base.is_none());
        assert_eq!(dashboard.state(), ConnectionState::Offline);
        assert_eq!(*recorder.statuses.lock(), [ConnectionState::Connecting, ConnectionState::Offline]);
        assert_eq!(recorder.notices.lock()[0], Notice::error(MSG_CONFIG_FAILED));
        assert!(recorder.views.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_goes_offline() {
        let (dashboard, recorder, _dir) =
            dashboard(r#"{"API_BASE": "http://127.0.0.1:9", "REQUEST_TIMEOUT_SECS": 2}"#).await;
        let startup = dashboard.init().await;

        assert!(!startup.synced);
        assert_eq!(startup.api_base.as_deref(), Some("http://127.0.0.1:9"));
        assert_eq!(dashboard.state(), ConnectionState::Offline);
        assert_eq!(recorder.notices.lock().as_slice(), [Notice::error(MSG_FETCH_FAILED)]);
        assert!(!dashboard.store().has_data());
    }

    #[tokio::test]
    async fn test_toggle_without_document_warns_once() {
        let (dashboard, recorder, _dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        dashboard.init().await;
        recorder.notices.lock().clear();

        let err = dashboard.toggle_substitute_mode(true, None).await.unwrap_err();
        assert!(matches!(err, SubstituteError::MissingDocument));
        assert_eq!(dashboard.state(), ConnectionState::Offline);
        let notices = recorder.notices.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warn);
    }

    #[tokio::test]
    async fn test_invalid_upload_changes_nothing() {
        let (dashboard, recorder, _dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        dashboard.init().await;

        let mut doc = dashboard.sample_document();
        doc["assets"][1].as_object_mut().unwrap().remove("vin");
        let err = dashboard.load_substitute(doc).await.unwrap_err();

        let SubstituteError::Invalid(validation) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(validation.errors.contains(&"assets[1].vin is required".to_string()));
        assert_eq!(dashboard.state(), ConnectionState::Offline);
        assert!(!dashboard.has_substitute());
        let last = recorder.notices.lock().last().cloned().unwrap();
        assert_eq!(last.level, NoticeLevel::Error);
        assert!(last.message.contains("assets[1].vin is required"));
    }

    #[tokio::test]
    async fn test_upload_text_parse_error() {
        let (dashboard, recorder, _dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        let err = dashboard.load_substitute_text("{ nope").await.unwrap_err();
        assert!(matches!(err, SubstituteError::Parse(_)));
        let notices = recorder.notices.lock();
        assert!(notices[0].message.starts_with("Failed to parse uploaded JSON: "));
    }

    #[tokio::test]
    async fn test_substitute_mode_renders_without_network() {
        let (dashboard, recorder, _dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        dashboard.init().await;

        let text = serde_json::to_string(&dashboard.sample_document()).unwrap();
        dashboard.load_substitute_text(&text).await.unwrap();

        assert_eq!(dashboard.state(), ConnectionState::Substitute);
        assert_eq!(dashboard.current_source(), DataSource::Substitute);
        assert_eq!(dashboard.snapshot().assets.len(), 2);
        assert_eq!(dashboard.admin_config().unwrap().odometer_precedence, "Engine,Transmission,ABS");
        assert_eq!(recorder.notices.lock().last().unwrap(), &Notice::success(MSG_SUBSTITUTE_LOADED));

        dashboard.refresh().await.unwrap();
        let views = recorder.views.lock();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.source == DataSource::Substitute));
        assert!(views[1].header.freshness.is_none());
    }

    #[tokio::test]
    async fn test_substitute_asset_details_filter_by_name() {
        let (dashboard, _recorder, _dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        dashboard.load_substitute(dashboard.sample_document()).await.unwrap();

        let detail = dashboard.asset_details("a2").await.unwrap();
        assert_eq!(detail.asset.name, "Vehicle-02");
        assert_eq!(detail.services.len(), 1);
        assert_eq!(detail.miles.len(), 1);
        assert!(detail.faults.is_empty());
        assert!(dashboard.asset_details("zzz").await.is_none());
    }

    #[tokio::test]
    async fn test_admin_save_refused_in_substitute_mode() {
        let (dashboard, recorder, _dir) = dashboard(r#"{"API_BASE": "http://127.0.0.1:9"}"#).await;
        dashboard.load_substitute(dashboard.sample_document()).await.unwrap();

        let err = dashboard.save_admin_settings(AdminConfig::default()).await.unwrap_err();
        assert!(matches!(err, AdminSaveError::SubstituteMode));
        assert_eq!(recorder.notices.lock().last().unwrap(), &Notice::warn(MSG_ADMIN_SUBSTITUTE));
    }

    #[tokio::test]
    async fn test_switch_tab_persists_and_renders_that_tab() {
        let (dashboard, recorder, dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        dashboard.init().await;
        dashboard.switch_tab(TabId::Maintenance).await;

        assert_eq!(dashboard.active_tab(), TabId::Maintenance);
        assert_eq!(recorder.views.lock().last().unwrap().panel.tab(), TabId::Maintenance);

        let restored = SettingsStore::new(Some(dir.path().join("settings"))).load().await;
        assert_eq!(restored.active_tab, TabId::Maintenance);
    }

    #[tokio::test]
    async fn test_commands_are_dispatched() {
        let (dashboard, recorder, _dir) = dashboard(r#"{"API_BASE": ""}"#).await;
        let startup = dashboard.init().await;

        startup.commands.send(Command::SwitchTab(TabId::Faults)).unwrap();
        for _ in 0..50 {
            if !recorder.views.lock().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(dashboard.active_tab(), TabId::Faults);
        assert_eq!(recorder.views.lock()[0].panel.tab(), TabId::Faults);
    }
}
