/**
 * VIEW MODEL - Rendu pur d'un snapshot en valeurs affichables
 *
 * RÔLE :
 * `build_view(snapshot, status, source, tab)` transforme le Snapshot courant en
 * ViewModel pour l'en-tête et l'onglet actif seulement. Les panneaux des onglets
 * masqués ne sont jamais calculés.
 *
 * RENDERER :
 * L'affichage vit derrière le trait `Renderer` (console, enregistreur de test...).
 * Le contrôleur n'y pousse que statuts, notifications et view models.
 */

use serde::Serialize;

use crate::connection::ConnectionState;
use crate::models::{AdminConfig, Asset, AssetDetail, FaultRecord, MaintenanceRecord, MileageRecord, Snapshot, TopMover};
use crate::settings::TabId;
use crate::store::DataSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warn,
    Error,
}

/// Message utilisateur transitoire (bandeau).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Collaborateur d'affichage. Les appels viennent du contrôleur, jamais en parallèle
/// pour un même dashboard.
pub trait Renderer: Send + Sync {
    /// L'indicateur de connexion a changé.
    fn status(&self, state: ConnectionState);

    fn notify(&self, notice: &Notice);

    /// Redessine l'en-tête et l'onglet actif.
    fn render(&self, view: &ViewModel);

    /// Remplit le formulaire admin.
    fn populate_admin(&self, _config: &AdminConfig) {}

    /// Ouvre la vue détail d'un asset.
    fn show_asset(&self, _detail: &AssetDetail) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub status: ConnectionState,
    pub source: DataSource,
    pub tab: TabId,
    pub header: HeaderView,
    pub panel: PanelView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderView {
    pub tiles: Vec<KpiTile>,
    /// "Last datapull: ..." en ligne, absent sinon.
    pub freshness: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiTile {
    pub id: &'static str,
    pub label: &'static str,
    pub value: String,
    pub alert: bool,
}

/// Série traçable pour la librairie de graphiques.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

impl Series {
    fn new(label: &str, points: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            label: label.to_string(),
            points: points.into_iter().map(|(label, value)| Point { label, value }).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Ok,
    Warning,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceItem {
    pub label: &'static str,
    pub value: f64,
    pub status: ComplianceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewPanel {
    pub daily_miles: Series,
    pub top_movers: Vec<TopMover>,
    pub compliance: Vec<ComplianceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilesPanel {
    /// Dernier mois présent dans les lignes de kilométrage.
    pub month: Option<String>,
    pub by_asset: Series,
    pub fleet_trend: Series,
    pub rows: Vec<MileageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenancePanel {
    pub overdue: usize,
    pub due_soon: usize,
    pub upcoming: usize,
    pub rows: Vec<MaintenanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultsPanel {
    pub rows: Vec<FaultRecord>,
    pub severity: Series,
    pub top_recurring: Series,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetsPanel {
    pub cards: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PanelView {
    Overview(OverviewPanel),
    Miles(MilesPanel),
    Maintenance(MaintenancePanel),
    Faults(FaultsPanel),
    Assets(AssetsPanel),
    Admin,
}

impl PanelView {
    pub fn tab(&self) -> TabId {
        match self {
            PanelView::Overview(_) => TabId::Overview,
            PanelView::Miles(_) => TabId::Miles,
            PanelView::Maintenance(_) => TabId::Maintenance,
            PanelView::Faults(_) => TabId::Faults,
            PanelView::Assets(_) => TabId::Assets,
            PanelView::Admin => TabId::Admin,
        }
    }
}

const DEVICE_SWAP_WARNING: f64 = 5.0;

pub fn build_view(snapshot: &Snapshot, status: ConnectionState, source: DataSource, tab: TabId) -> ViewModel {
    ViewModel {
        status,
        source,
        tab,
        header: build_header(snapshot, status),
        panel: build_panel(snapshot, tab),
    }
}

pub fn build_header(snapshot: &Snapshot, status: ConnectionState) -> HeaderView {
    let k = snapshot.kpis();
    let tile = |id, label, value: String| KpiTile { id, label, value, alert: false };

    let tiles = vec![
        tile("fleetSize", "Fleet size", format_number(Some(k.fleet_size), 0)),
        tile("mtdMiles", "MTD miles", format_number(Some(k.mtd_miles), 0)),
        tile("ytdMiles", "YTD miles", format_number(Some(k.ytd_miles), 0)),
        tile("fytdMiles", "FYTD miles", format_number(Some(k.fytd_miles), 0)),
        tile("activeAssets7d", "Active assets (7d)", format_number(Some(k.active_assets_7d), 0)),
        tile("utilizationPct7d", "Utilization (7d)", format_percent(k.utilization_pct_7d)),
        tile("avgMiAssetDay7d", "Avg mi/asset/day", format_number(Some(k.avg_mi_asset_day_7d), 1)),
        KpiTile { alert: k.maint_overdue > 0.0, ..tile("maintOverdue", "Maintenance overdue", format_number(Some(k.maint_overdue), 0)) },
        tile("maintDueSoon", "Maintenance due soon", format_number(Some(k.maint_due_soon), 0)),
        tile("faultsVehicle", "Vehicle faults", format_number(Some(k.faults_active_vehicle), 0)),
        tile("faultsTelematics", "Telematics faults", format_number(Some(k.faults_active_telematics), 0)),
    ];

    let freshness = match (status, snapshot.last_snapshot_utc()) {
        (ConnectionState::Online, Some(at)) => Some(format!("Last datapull: {} UTC", at.format("%Y-%m-%d %H:%M:%S"))),
        _ => None,
    };

    HeaderView { tiles, freshness }
}

fn build_panel(snapshot: &Snapshot, tab: TabId) -> PanelView {
    match tab {
        TabId::Overview => PanelView::Overview(overview_panel(snapshot)),
        TabId::Miles => PanelView::Miles(miles_panel(snapshot)),
        TabId::Maintenance => PanelView::Maintenance(maintenance_panel(snapshot)),
        TabId::Faults => PanelView::Faults(faults_panel(snapshot)),
        TabId::Assets => PanelView::Assets(AssetsPanel { cards: snapshot.assets() }),
        TabId::Admin => PanelView::Admin,
    }
}

fn overview_panel(snapshot: &Snapshot) -> OverviewPanel {
    let k = snapshot.kpis();
    let status_if = |bad: bool, level| if bad { level } else { ComplianceStatus::Ok };

    let compliance = vec![
        ComplianceItem {
            label: "Overdue maintenance",
            value: k.maint_overdue,
            status: status_if(k.maint_overdue > 0.0, ComplianceStatus::Overdue),
        },
        ComplianceItem {
            label: "Missing start/end snapshots",
            value: k.compliance.missing_snapshots,
            status: status_if(k.compliance.missing_snapshots > 0.0, ComplianceStatus::Warning),
        },
        ComplianceItem {
            label: "Device swaps since FY start",
            value: k.compliance.device_swaps_fy,
            status: status_if(k.compliance.device_swaps_fy > DEVICE_SWAP_WARNING, ComplianceStatus::Warning),
        },
    ];

    OverviewPanel {
        daily_miles: Series::new("Daily Miles", k.daily_miles_60d.into_iter().map(|d| (d.date, d.miles))),
        top_movers: k.top_movers_mtd,
        compliance,
    }
}

fn miles_panel(snapshot: &Snapshot) -> MilesPanel {
    let rows = snapshot.miles();
    let month = rows
        .iter()
        .map(|r| r.month.as_str())
        .filter(|m| !m.is_empty())
        .max()
        .map(str::to_string);

    let by_asset = Series::new(
        "Miles",
        rows.iter()
            .filter(|r| Some(&r.month) == month.as_ref())
            .map(|r| (r.asset_name.clone(), r.miles.unwrap_or(0.0))),
    );
    let fleet_trend = Series::new(
        "Fleet Miles",
        snapshot.kpis().monthly_fleet_miles_12m.into_iter().map(|m| (m.month, m.miles)),
    );

    MilesPanel { month, by_asset, fleet_trend, rows }
}

fn maintenance_panel(snapshot: &Snapshot) -> MaintenancePanel {
    let rows = snapshot.maintenance();
    let count = |status: &str| rows.iter().filter(|r| r.status == status).count();
    MaintenancePanel {
        overdue: count("OVERDUE"),
        due_soon: count("DUE_SOON"),
        upcoming: count("UPCOMING"),
        rows,
    }
}

fn faults_panel(snapshot: &Snapshot) -> FaultsPanel {
    let rows = snapshot.faults();

    // ordre de première apparition, comme le tableau
    let mut severity: Vec<(String, f64)> = Vec::new();
    for fault in &rows {
        match severity.iter_mut().find(|(s, _)| *s == fault.severity) {
            Some((_, n)) => *n += 1.0,
            None => severity.push((fault.severity.clone(), 1.0)),
        }
    }

    FaultsPanel {
        severity: Series::new("Faults by severity", severity),
        top_recurring: Series::new(
            "Occurrences",
            snapshot.kpis().top_recurring_faults.into_iter().map(|f| (f.code, f.count)),
        ),
        rows,
    }
}

/// Séparateur de milliers et décimales fixes ; `N/A` pour une valeur absente.
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return "N/A".to_string();
    };

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(Some(value), 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{sample_document, SubstituteDocument};
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_snapshot() -> Snapshot {
        let now = chrono::Utc.with_ymd_and_hms(2025, 8, 1, 12, 30, 0).unwrap();
        SubstituteDocument::parse(sample_document(now)).unwrap().snapshot().clone()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(15400.0), 0), "15,400");
        assert_eq!(format_number(Some(1234567.891), 1), "1,234,567.9");
        assert_eq!(format_number(Some(999.0), 0), "999");
        assert_eq!(format_number(Some(-1200.0), 0), "-1,200");
        assert_eq!(format_number(Some(-0.01), 0), "0");
        assert_eq!(format_number(None, 0), "N/A");
        assert_eq!(format_number(Some(f64::NAN), 0), "N/A");
        assert_eq!(format_percent(65.2), "65.2%");
    }

    #[test]
    fn test_header_tiles_and_freshness() {
        let snapshot = sample_snapshot();
        let online = build_header(&snapshot, ConnectionState::Online);
        assert_eq!(online.tiles.len(), 11);
        let ytd = online.tiles.iter().find(|t| t.id == "ytdMiles").unwrap();
        assert_eq!(ytd.value, "15,400");
        assert_eq!(online.freshness.as_deref(), Some("Last datapull: 2025-08-01 12:30:00 UTC"));

        assert!(build_header(&snapshot, ConnectionState::Substitute).freshness.is_none());
        assert!(build_header(&snapshot, ConnectionState::Offline).freshness.is_none());
    }

    #[test]
    fn test_overdue_tile_alert() {
        let mut snapshot = sample_snapshot();
        let header = build_header(&snapshot, ConnectionState::Online);
        assert!(!header.tiles.iter().any(|t| t.alert));

        snapshot.kpis.insert("maint_overdue".into(), json!(3));
        let header = build_header(&snapshot, ConnectionState::Online);
        let overdue = header.tiles.iter().find(|t| t.id == "maintOverdue").unwrap();
        assert!(overdue.alert);
    }

    #[test]
    fn test_only_active_panel_is_built() {
        let snapshot = sample_snapshot();
        for tab in TabId::ALL {
            let view = build_view(&snapshot, ConnectionState::Online, DataSource::Live, tab);
            assert_eq!(view.panel.tab(), tab);
        }
    }

    #[test]
    fn test_miles_panel_uses_latest_month() {
        let mut snapshot = sample_snapshot();
        snapshot.miles.push(json!({"asset_name": "Vehicle-01", "month": "2025-07", "miles": 900}));
        let PanelView::Miles(panel) = build_panel(&snapshot, TabId::Miles) else {
            panic!("expected miles panel");
        };
        assert_eq!(panel.month.as_deref(), Some("2025-08"));
        assert_eq!(panel.by_asset.points.len(), 2);
        assert_eq!(panel.rows.len(), 3);
    }

    #[test]
    fn test_maintenance_counts() {
        let mut snapshot = sample_snapshot();
        snapshot.maintenance.push(json!({"asset_name": "Vehicle-01", "status": "OVERDUE"}));
        let PanelView::Maintenance(panel) = build_panel(&snapshot, TabId::Maintenance) else {
            panic!("expected maintenance panel");
        };
        assert_eq!((panel.overdue, panel.due_soon, panel.upcoming), (1, 1, 0));
    }

    #[test]
    fn test_severity_breakdown_keeps_first_seen_order() {
        let mut snapshot = sample_snapshot();
        snapshot.faults.push(json!({"severity": "Low"}));
        snapshot.faults.push(json!({"severity": "High"}));
        let PanelView::Faults(panel) = build_panel(&snapshot, TabId::Faults) else {
            panic!("expected faults panel");
        };
        let labels: Vec<_> = panel.severity.points.iter().map(|p| (p.label.as_str(), p.value)).collect();
        assert_eq!(labels, [("High", 2.0), ("Low", 1.0)]);
    }

    #[test]
    fn test_compliance_thresholds() {
        let mut snapshot = sample_snapshot();
        snapshot.kpis.insert("compliance".into(), json!({"missing_snapshots": 0, "device_swaps_fy": 5}));
        let PanelView::Overview(panel) = build_panel(&snapshot, TabId::Overview) else {
            panic!("expected overview panel");
        };
        assert!(panel.compliance.iter().all(|c| c.status == ComplianceStatus::Ok));

        snapshot.kpis.insert("compliance".into(), json!({"device_swaps_fy": 6}));
        let PanelView::Overview(panel) = build_panel(&snapshot, TabId::Overview) else {
            panic!("expected overview panel");
        };
        assert_eq!(panel.compliance[2].status, ComplianceStatus::Warning);
    }
}
