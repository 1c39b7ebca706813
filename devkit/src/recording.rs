/*!
Renderer enregistreur

Capture dans l'ordre tout ce que le dashboard pousse vers sa couche d'affichage,
pour vérifier statuts, notifications et view models dans les tests.
*/

use fleet_dashboard::models::{AdminConfig, AssetDetail};
use fleet_dashboard::{ConnectionState, Notice, NoticeLevel, Renderer, ViewModel};
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum RenderEvent {
    Status(ConnectionState),
    Notice(Notice),
    Render(Box<ViewModel>),
    Admin(AdminConfig),
    Asset(Box<AssetDetail>),
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn statuses(&self) -> Vec<ConnectionState> {
        self.collect(|e| match e {
            RenderEvent::Status(s) => Some(*s),
            _ => None,
        })
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.collect(|e| match e {
            RenderEvent::Notice(n) => Some(n.clone()),
            _ => None,
        })
    }

    pub fn notices_at(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }

    pub fn views(&self) -> Vec<ViewModel> {
        self.collect(|e| match e {
            RenderEvent::Render(v) => Some((**v).clone()),
            _ => None,
        })
    }

    pub fn last_view(&self) -> Option<ViewModel> {
        self.views().pop()
    }

    pub fn admin_configs(&self) -> Vec<AdminConfig> {
        self.collect(|e| match e {
            RenderEvent::Admin(a) => Some(a.clone()),
            _ => None,
        })
    }

    pub fn assets_shown(&self) -> Vec<AssetDetail> {
        self.collect(|e| match e {
            RenderEvent::Asset(a) => Some((**a).clone()),
            _ => None,
        })
    }

    /// Interroge jusqu'à ce que `condition` soit vraie ou que `timeout` expire.
    pub async fn wait_for(&self, timeout: Duration, condition: impl Fn(&[RenderEvent]) -> bool) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            let done = condition(self.events.lock().as_slice());
            if done {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    fn collect<T>(&self, pick: impl Fn(&RenderEvent) -> Option<T>) -> Vec<T> {
        self.events.lock().iter().filter_map(pick).collect()
    }

    fn push(&self, event: RenderEvent) {
        self.events.lock().push(event);
    }
}

impl Renderer for RecordingRenderer {
    fn status(&self, state: ConnectionState) {
        tracing::debug!(%state, "status");
        self.push(RenderEvent::Status(state));
    }

    fn notify(&self, notice: &Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "notice");
        self.push(RenderEvent::Notice(notice.clone()));
    }

    fn render(&self, view: &ViewModel) {
        self.push(RenderEvent::Render(Box::new(view.clone())));
    }

    fn populate_admin(&self, config: &AdminConfig) {
        self.push(RenderEvent::Admin(config.clone()));
    }

    fn show_asset(&self, detail: &AssetDetail) {
        self.push(RenderEvent::Asset(Box::new(detail.clone())));
    }
}
