/**
 * FLEET MODELS - Snapshot unifié et vues typées des enregistrements
 *
 * RÔLE :
 * Le Snapshot est l'unique jeu de données rendu par tous les onglets. Il est
 * assemblé une fois par cycle de sync (endpoints live ou document substitut validé)
 * puis remplacé en bloc.
 *
 * FONCTIONNEMENT :
 * - Les enregistrements restent les valeurs JSON envoyées ; la validation garantit
 *   leur présence, jamais leur type
 * - Les vues typées (Asset, MaintenanceRecord, ...) les lisent avec tolérance pour
 *   le renderer : chaînes et nombres convertis, champs absents vides ou à zéro
 * - `Snapshot::from_parts` est le seul endroit où les payloads absents deviennent
 *   des conteneurs vides, aucune vérification de null en aval
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// Séries KPI imbriquées tracées par les panneaux overview, miles et faults.
pub const KPI_SERIES_KEYS: [&str; 4] = [
    "daily_miles_60d",
    "top_movers_mtd",
    "monthly_fleet_miles_12m",
    "top_recurring_faults",
];

/// Objet KPI imbriqué des compteurs de conformité.
pub const KPI_COMPLIANCE_KEY: &str = "compliance";

/// Les six payloads requis d'un cycle, avant normalisation.
#[derive(Debug, Clone, Default)]
pub struct SnapshotParts {
    pub info: Value,
    pub kpis: Value,
    pub assets: Value,
    pub maintenance: Value,
    pub faults: Value,
    pub miles: Value,
}

/// Un payload n'a pas le bon type de conteneur.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: expected {expected}, found {found}")]
pub struct ShapeMismatch {
    pub field: &'static str,
    pub expected: &'static str,
    pub found: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub info: JsonObject,
    pub kpis: JsonObject,
    pub assets: Vec<Value>,
    pub maintenance: Vec<Value>,
    pub faults: Vec<Value>,
    pub miles: Vec<Value>,
}

impl Snapshot {
    /// Assemble un snapshot, les payloads `null` deviennent des conteneurs vides.
    pub fn from_parts(parts: SnapshotParts) -> Result<Self, ShapeMismatch> {
        let mut kpis = object_or_empty("kpis", parts.kpis)?;
        normalize_kpis(&mut kpis);

        Ok(Self {
            info: object_or_empty("info", parts.info)?,
            kpis,
            assets: array_or_empty("assets", parts.assets)?,
            maintenance: array_or_empty("maintenance", parts.maintenance)?,
            faults: array_or_empty("faults", parts.faults)?,
            miles: array_or_empty("miles", parts.miles)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
            && self.kpis.is_empty()
            && self.assets.is_empty()
            && self.maintenance.is_empty()
            && self.faults.is_empty()
            && self.miles.is_empty()
    }

    /// Heure du dernier pull côté serveur, si le backend en fournit une lisible.
    pub fn last_snapshot_utc(&self) -> Option<DateTime<Utc>> {
        self.info
            .get("last_snapshot_utc")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn kpis(&self) -> Kpis {
        Kpis::from_object(&self.kpis)
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.assets.iter().map(Asset::from_value).collect()
    }

    pub fn maintenance(&self) -> Vec<MaintenanceRecord> {
        self.maintenance.iter().map(MaintenanceRecord::from_value).collect()
    }

    pub fn faults(&self) -> Vec<FaultRecord> {
        self.faults.iter().map(FaultRecord::from_value).collect()
    }

    pub fn miles(&self) -> Vec<MileageRecord> {
        self.miles.iter().map(MileageRecord::from_value).collect()
    }

    pub fn find_asset(&self, asset_id: &str) -> Option<Asset> {
        self.assets
            .iter()
            .map(Asset::from_value)
            .find(|a| a.id == asset_id)
    }

    /// Détail d'un asset construit à partir de ce snapshot seul (sans réseau).
    pub fn asset_detail(&self, asset: &Asset) -> AssetDetail {
        AssetDetail {
            asset: asset.clone(),
            miles: self.miles().into_iter().filter(|m| m.asset_name == asset.name).collect(),
            faults: self.faults().into_iter().filter(|f| f.asset_name == asset.name).collect(),
            services: self
                .maintenance()
                .into_iter()
                .filter(|m| m.asset_name == asset.name)
                .collect(),
        }
    }
}

fn object_or_empty(field: &'static str, value: Value) -> Result<JsonObject, ShapeMismatch> {
    match value {
        Value::Null => Ok(JsonObject::new()),
        Value::Object(map) => Ok(map),
        other => Err(ShapeMismatch { field, expected: "object", found: json_kind(&other) }),
    }
}

fn array_or_empty(field: &'static str, value: Value) -> Result<Vec<Value>, ShapeMismatch> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        other => Err(ShapeMismatch { field, expected: "array", found: json_kind(&other) }),
    }
}

fn normalize_kpis(kpis: &mut JsonObject) {
    for key in KPI_SERIES_KEYS {
        let entry = kpis.entry(key).or_insert(Value::Null);
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
    }
    let compliance = kpis.entry(KPI_COMPLIANCE_KEY).or_insert(Value::Null);
    if !compliance.is_object() {
        *compliance = Value::Object(JsonObject::new());
    }
}

/// Nom du type JSON pour les diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Lecteurs de champs tolérants partagés par les vues typées.

fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number(value: &Value, key: &str) -> Option<f64> {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub vin: String,
    pub last_known_odo: f64,
    pub miles_7d: f64,
    pub active_faults: u64,
    pub maint_status: String,
}

impl Asset {
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            name: text(value, "name"),
            vin: text(value, "vin"),
            last_known_odo: number(value, "last_known_odo").unwrap_or(0.0).max(0.0),
            miles_7d: number(value, "miles_7d").unwrap_or(0.0).max(0.0),
            active_faults: number(value, "active_faults").map_or(0, |n| n.max(0.0) as u64),
            maint_status: text(value, "maint_status"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub asset_name: String,
    pub service_type: String,
    pub last_service_date: String,
    pub last_service_odo: Option<f64>,
    pub miles_to_due: Option<f64>,
    pub days_to_due: Option<f64>,
    /// OVERDUE, DUE_SOON ou UPCOMING
    pub status: String,
}

impl MaintenanceRecord {
    pub fn from_value(value: &Value) -> Self {
        Self {
            asset_name: text(value, "asset_name"),
            service_type: text(value, "service_type"),
            last_service_date: text(value, "last_service_date"),
            last_service_odo: number(value, "last_service_odo"),
            miles_to_due: number(value, "miles_to_due"),
            days_to_due: number(value, "days_to_due"),
            status: text(value, "status"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub asset_name: String,
    pub code: String,
    pub description: String,
    pub severity: String,
    pub last_seen_utc: String,
    pub is_active: bool,
}

impl FaultRecord {
    pub fn from_value(value: &Value) -> Self {
        Self {
            asset_name: text(value, "asset_name"),
            code: text(value, "code"),
            description: text(value, "description"),
            severity: text(value, "severity"),
            last_seen_utc: text(value, "last_seen_utc"),
            is_active: flag(value, "is_active"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MileageRecord {
    pub asset_name: String,
    /// YYYY-MM
    pub month: String,
    pub start_odo: Option<f64>,
    pub end_odo: Option<f64>,
    pub miles: Option<f64>,
    /// Indicateur de qualité des données fourni par le backend
    pub quality: String,
}

impl MileageRecord {
    pub fn from_value(value: &Value) -> Self {
        Self {
            asset_name: text(value, "asset_name"),
            month: text(value, "month"),
            start_odo: number(value, "start_odo"),
            end_odo: number(value, "end_odo"),
            miles: number(value, "miles"),
            quality: text(value, "quality"),
        }
    }
}

/// Métriques flotte agrégées de `/api/kpis`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub fleet_size: f64,
    pub mtd_miles: f64,
    pub ytd_miles: f64,
    pub fytd_miles: f64,
    pub active_assets_7d: f64,
    pub utilization_pct_7d: f64,
    pub avg_mi_asset_day_7d: f64,
    pub maint_overdue: f64,
    pub maint_due_soon: f64,
    pub faults_active_vehicle: f64,
    pub faults_active_telematics: f64,
    pub daily_miles_60d: Vec<DailyMiles>,
    pub top_movers_mtd: Vec<TopMover>,
    pub monthly_fleet_miles_12m: Vec<MonthlyMiles>,
    pub top_recurring_faults: Vec<RecurringFault>,
    pub compliance: Compliance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyMiles {
    pub date: String,
    pub miles: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopMover {
    pub asset_name: String,
    pub miles: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMiles {
    pub month: String,
    pub miles: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurringFault {
    pub code: String,
    pub count: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compliance {
    pub missing_snapshots: f64,
    pub device_swaps_fy: f64,
}

impl Kpis {
    pub fn from_object(kpis: &JsonObject) -> Self {
        let root = Value::Object(kpis.clone());
        let metric = |key: &str| number(&root, key).unwrap_or(0.0);
        let series = |key: &str| -> Vec<Value> {
            kpis.get(key).and_then(Value::as_array).cloned().unwrap_or_default()
        };
        let compliance = kpis.get(KPI_COMPLIANCE_KEY).cloned().unwrap_or(Value::Null);

        Self {
            fleet_size: metric("fleet_size"),
            mtd_miles: metric("mtd_miles"),
            ytd_miles: metric("ytd_miles"),
            fytd_miles: metric("fytd_miles"),
            active_assets_7d: metric("active_assets_7d"),
            utilization_pct_7d: metric("utilization_pct_7d"),
            avg_mi_asset_day_7d: metric("avg_mi_asset_day_7d"),
            maint_overdue: metric("maint_overdue"),
            maint_due_soon: metric("maint_due_soon"),
            faults_active_vehicle: metric("faults_active_vehicle"),
            faults_active_telematics: metric("faults_active_telematics"),
            daily_miles_60d: series("daily_miles_60d")
                .iter()
                .map(|v| DailyMiles { date: text(v, "date"), miles: number(v, "miles").unwrap_or(0.0) })
                .collect(),
            top_movers_mtd: series("top_movers_mtd")
                .iter()
                .map(|v| TopMover {
                    asset_name: text(v, "asset_name"),
                    miles: number(v, "miles").unwrap_or(0.0),
                })
                .collect(),
            monthly_fleet_miles_12m: series("monthly_fleet_miles_12m")
                .iter()
                .map(|v| MonthlyMiles { month: text(v, "month"), miles: number(v, "miles").unwrap_or(0.0) })
                .collect(),
            top_recurring_faults: series("top_recurring_faults")
                .iter()
                .map(|v| RecurringFault { code: text(v, "code"), count: number(v, "count").unwrap_or(0.0) })
                .collect(),
            compliance: Compliance {
                missing_snapshots: number(&compliance, "missing_snapshots").unwrap_or(0.0),
                device_swaps_fy: number(&compliance, "device_swaps_fy").unwrap_or(0.0),
            },
        }
    }
}

/// Réglages admin servis par `/api/admin/config` (ou le bloc `admin` d'un substitut).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    pub fy_start_month: u32,
    pub due_soon_miles: u32,
    pub due_soon_days: u32,
    pub utilization_threshold: f64,
    pub odometer_precedence: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            fy_start_month: 7,
            due_soon_miles: 500,
            due_soon_days: 15,
            utilization_threshold: 1.0,
            odometer_precedence: String::new(),
        }
    }
}

impl AdminConfig {
    /// Lit un objet admin, avec les défauts pour les champs absents ou nuls.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        let positive = |key: &str| number(value, key).filter(|n| *n > 0.0);
        let precedence = text(value, "odometer_precedence");

        Self {
            fy_start_month: positive("fy_start_month").map_or(defaults.fy_start_month, |n| n as u32),
            due_soon_miles: positive("due_soon_miles").map_or(defaults.due_soon_miles, |n| n as u32),
            due_soon_days: positive("due_soon_days").map_or(defaults.due_soon_days, |n| n as u32),
            utilization_threshold: positive("utilization_threshold")
                .unwrap_or(defaults.utilization_threshold),
            odometer_precedence: precedence,
        }
    }
}

/// Données de détail d'un asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetDetail {
    pub asset: Asset,
    pub miles: Vec<MileageRecord>,
    pub faults: Vec<FaultRecord>,
    pub services: Vec<MaintenanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts() -> SnapshotParts {
        SnapshotParts {
            info: json!({"last_snapshot_utc": "2025-08-01T12:00:00Z"}),
            kpis: json!({"fleet_size": 2}),
            assets: json!([{"id": "a1", "name": "Vehicle-01", "vin": "VIN01"}]),
            maintenance: json!([]),
            faults: Value::Null,
            miles: json!([{"asset_name": "Vehicle-01", "month": "2025-08", "miles": 1000}]),
        }
    }

    #[test]
    fn test_null_payloads_become_empty_containers() {
        let snapshot = Snapshot::from_parts(SnapshotParts::default()).unwrap();
        assert!(snapshot.info.is_empty());
        assert!(snapshot.assets.is_empty());
        assert!(snapshot.faults.is_empty());
        // kpis porte toujours ses séries imbriquées
        for key in KPI_SERIES_KEYS {
            assert_eq!(snapshot.kpis[key], json!([]));
        }
        assert_eq!(snapshot.kpis[KPI_COMPLIANCE_KEY], json!({}));
    }

    #[test]
    fn test_wrong_container_is_rejected() {
        let mut bad = parts();
        bad.assets = json!({"id": "a1"});
        let err = Snapshot::from_parts(bad).unwrap_err();
        assert_eq!(err.field, "assets");
        assert_eq!(err.expected, "array");
        assert_eq!(err.found, "object");
    }

    #[test]
    fn test_existing_kpi_series_are_kept() {
        let mut p = parts();
        p.kpis = json!({"daily_miles_60d": [{"date": "2025-08-01", "miles": 12.5}], "top_movers_mtd": null});
        let snapshot = Snapshot::from_parts(p).unwrap();
        let kpis = snapshot.kpis();
        assert_eq!(kpis.daily_miles_60d.len(), 1);
        assert_eq!(kpis.daily_miles_60d[0].miles, 12.5);
        assert!(kpis.top_movers_mtd.is_empty());
    }

    #[test]
    fn test_last_snapshot_utc() {
        let snapshot = Snapshot::from_parts(parts()).unwrap();
        let ts = snapshot.last_snapshot_utc().unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-08-01T12:00:00+00:00");
    }

    #[test]
    fn test_lenient_asset_view() {
        let asset = Asset::from_value(&json!({
            "id": 7, "name": "Truck", "vin": "", "last_known_odo": "1500",
            "miles_7d": -3, "active_faults": 2, "maint_status": "OK"
        }));
        assert_eq!(asset.id, "7");
        assert_eq!(asset.last_known_odo, 1500.0);
        assert_eq!(asset.miles_7d, 0.0);
        assert_eq!(asset.active_faults, 2);
    }

    #[test]
    fn test_asset_detail_filters_by_name() {
        let snapshot = Snapshot::from_parts(parts()).unwrap();
        let asset = snapshot.find_asset("a1").unwrap();
        let detail = snapshot.asset_detail(&asset);
        assert_eq!(detail.miles.len(), 1);
        assert!(detail.faults.is_empty());
        assert!(snapshot.find_asset("missing").is_none());
    }

    #[test]
    fn test_admin_defaults() {
        let admin = AdminConfig::from_value(&json!({"due_soon_days": 30, "fy_start_month": 0}));
        assert_eq!(admin.due_soon_days, 30);
        assert_eq!(admin.fy_start_month, 7);
        assert_eq!(admin.due_soon_miles, 500);
        assert_eq!(admin.odometer_precedence, "");
    }
}
