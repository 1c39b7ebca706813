/**
 * SUBSTITUTE SCHEMA - Validation stricte des jeux de données substituts
 *
 * RÔLE :
 * Barrière entre un document JSON fourni par l'utilisateur et le SnapshotStore.
 * Un `SubstituteDocument` ne se construit que par `SubstituteDocument::parse`,
 * qui passe d'abord par `validate` : aucun document non validé n'atteint le store.
 *
 * RÈGLES (toutes les violations sont cumulées, seule la règle 1 interrompt) :
 * 1. la racine est un objet (pas un tableau), sinon une seule erreur
 * 2. `info` est un objet
 * 3. `kpis` est un objet
 * 4. `assets` est un tableau et chaque élément porte les sept champs asset
 *    (présence seulement : 0, "" et false sont valides)
 * 5. `maintenance`, `faults`, `miles` sont des tableaux
 */

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{AdminConfig, Snapshot, SnapshotParts};

/// Champs obligatoires de chaque asset d'un document substitut.
pub const REQUIRED_ASSET_FIELDS: [&str; 7] = [
    "id",
    "name",
    "vin",
    "last_known_odo",
    "miles_7d",
    "active_faults",
    "maint_status",
];

const REQUIRED_OBJECTS: [&str; 2] = ["info", "kpis"];
const REQUIRED_TABLES: [&str; 3] = ["maintenance", "faults", "miles"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.valid {
            Ok(())
        } else {
            Err(ValidationError { errors: self.errors })
        }
    }
}

/// Document substitut rejeté ; un message par règle violée.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("substitute document rejected: {}", .errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// Valide un document non fiable contre le contrat de données de production.
pub fn validate(document: &Value) -> ValidationReport {
    let Some(root) = document.as_object() else {
        return ValidationReport::from_errors(vec!["Root must be an object".to_string()]);
    };

    let mut errors = Vec::new();

    for key in REQUIRED_OBJECTS {
        if !root.get(key).is_some_and(Value::is_object) {
            errors.push(format!("Missing object: {key}"));
        }
    }

    match root.get("assets").and_then(Value::as_array) {
        None => errors.push("Missing array: assets".to_string()),
        Some(assets) => {
            for (index, asset) in assets.iter().enumerate() {
                for field in REQUIRED_ASSET_FIELDS {
                    if asset.get(field).is_none() {
                        errors.push(format!("assets[{index}].{field} is required"));
                    }
                }
            }
        }
    }

    for key in REQUIRED_TABLES {
        if !root.get(key).is_some_and(Value::is_array) {
            errors.push(format!("Missing array: {key}"));
        }
    }

    ValidationReport::from_errors(errors)
}

/// Jeu substitut validé par `validate`, conservé pour la session seulement.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstituteDocument {
    snapshot: Snapshot,
    admin: Option<AdminConfig>,
}

impl SubstituteDocument {
    pub fn parse(document: Value) -> Result<Self, ValidationError> {
        validate(&document).into_result()?;

        let Value::Object(mut root) = document else {
            return Err(ValidationError { errors: vec!["Root must be an object".to_string()] });
        };

        let admin = match root.remove("admin") {
            Some(value @ Value::Object(_)) => Some(AdminConfig::from_value(&value)),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::warn!(kind = crate::models::json_kind(&other), "ignoring non-object admin block in substitute document");
                None
            }
        };

        let mut take = |key: &str| root.remove(key).unwrap_or(Value::Null);
        let parts = SnapshotParts {
            info: take("info"),
            kpis: take("kpis"),
            assets: take("assets"),
            maintenance: take("maintenance"),
            faults: take("faults"),
            miles: take("miles"),
        };

        let snapshot = Snapshot::from_parts(parts)
            .map_err(|e| ValidationError { errors: vec![e.to_string()] })?;

        Ok(Self { snapshot, admin })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn admin(&self) -> Option<&AdminConfig> {
        self.admin.as_ref()
    }
}

/// Document complet qui passe `validate`, fourni comme modèle aux utilisateurs.
pub fn sample_document(now: DateTime<Utc>) -> Value {
    let now_iso = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    json!({
        "info": { "last_snapshot_utc": now_iso },
        "kpis": {
            "fleet_size": 2,
            "mtd_miles": 1200,
            "ytd_miles": 15400,
            "fytd_miles": 9000,
            "active_assets_7d": 2,
            "utilization_pct_7d": 65.2,
            "avg_mi_asset_day_7d": 14.3,
            "faults_active_vehicle": 1,
            "faults_active_telematics": 0,
            "maint_overdue": 0,
            "maint_due_soon": 1,
            "daily_miles_60d": [],
            "monthly_fleet_miles_12m": [],
            "top_recurring_faults": [],
            "compliance": { "missing_snapshots": 0, "device_swaps_fy": 0 }
        },
        "assets": [
            { "id": "a1", "name": "Vehicle-01", "vin": "VIN01", "last_known_odo": 15000, "miles_7d": 320, "active_faults": 1, "maint_status": "OK" },
            { "id": "a2", "name": "Vehicle-02", "vin": "VIN02", "last_known_odo": 7400, "miles_7d": 120, "active_faults": 0, "maint_status": "DUE_SOON" }
        ],
        "maintenance": [
            { "asset_name": "Vehicle-02", "service_type": "Oil Change", "last_service_date": "2025-08-01", "last_service_odo": 5000, "miles_to_due": 200, "days_to_due": 10, "status": "DUE_SOON" }
        ],
        "faults": [
            { "asset_name": "Vehicle-01", "code": "P0300", "description": "Random Misfire Detected", "severity": "High", "last_seen_utc": now_iso, "is_active": true }
        ],
        "miles": [
            { "asset_name": "Vehicle-01", "month": "2025-08", "start_odo": 14000, "end_odo": 15000, "miles": 1000, "quality": "OK" },
            { "asset_name": "Vehicle-02", "month": "2025-08", "start_odo": 7000, "end_odo": 7400, "miles": 400, "quality": "OK" }
        ],
        "admin": {
            "fy_start_month": 7,
            "due_soon_miles": 500,
            "due_soon_days": 15,
            "utilization_threshold": 1,
            "odometer_precedence": "Engine,Transmission,ABS"
        }
    })
}
