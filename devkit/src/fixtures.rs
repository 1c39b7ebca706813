/*!
Fixtures de payloads flotte

Construit les payloads backend et les documents substituts conformes au contrat
de données de production, et les installe sur un StubBackend.
*/

use crate::stub_backend::{StubBackend, StubResponse};
use chrono::{DateTime, Utc};
use fleet_dashboard::api::endpoints;
use fleet_dashboard::schema::sample_document;
use serde_json::{json, Value};

/// Payloads servis par un backend en bonne santé.
#[derive(Debug, Clone)]
pub struct FleetPayloads {
    pub info: Value,
    pub kpis: Value,
    pub assets: Value,
    pub maintenance: Value,
    pub faults: Value,
    pub miles: Value,
    pub admin: Value,
}

impl FleetPayloads {
    /// Deux véhicules, un service à prévoir, un fault actif.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let mut doc = sample_document(now);
        let mut take = |key: &str| doc.get_mut(key).map(Value::take).unwrap_or(Value::Null);
        Self {
            info: take("info"),
            kpis: take("kpis"),
            assets: take("assets"),
            maintenance: take("maintenance"),
            faults: take("faults"),
            miles: take("miles"),
            admin: take("admin"),
        }
    }

    /// Sert toutes les lectures requises, la config admin et les deux cibles POST.
    pub fn install(&self, stub: &StubBackend) {
        stub.get(endpoints::INFO, StubResponse::ok(self.info.clone()))
            .get(endpoints::KPIS, StubResponse::ok(self.kpis.clone()))
            .get(endpoints::ASSETS, StubResponse::ok(self.assets.clone()))
            .get(endpoints::MAINTENANCE_DUE, StubResponse::ok(self.maintenance.clone()))
            .get(endpoints::FAULTS_ACTIVE, StubResponse::ok(self.faults.clone()))
            .get(endpoints::MILES_MONTHLY, StubResponse::ok(self.miles.clone()))
            .get(endpoints::ADMIN_CONFIG, StubResponse::ok(self.admin.clone()))
            .post(endpoints::ADMIN_CONFIG, StubResponse::ok(json!({ "ok": true })))
            .post(endpoints::REFRESH_NOW, StubResponse::ok(json!({ "ok": true })));
    }

    /// Routes de détail pour `asset_id`, construites depuis ces payloads.
    pub fn install_asset_detail(&self, stub: &StubBackend, asset_id: &str) {
        let name = self
            .assets
            .as_array()
            .and_then(|assets| assets.iter().find(|a| a["id"] == asset_id))
            .and_then(|a| a["name"].as_str())
            .unwrap_or_default()
            .to_string();
        let rows_of = |payload: &Value| -> Value {
            let rows: Vec<Value> = payload
                .as_array()
                .map(|rows| rows.iter().filter(|r| r["asset_name"] == name.as_str()).cloned().collect())
                .unwrap_or_default();
            Value::Array(rows)
        };

        stub.get(&endpoints::asset_miles(asset_id), StubResponse::ok(rows_of(&self.miles)))
            .get(&endpoints::asset_faults(asset_id), StubResponse::ok(rows_of(&self.faults)))
            .get(&endpoints::asset_maintenance(asset_id), StubResponse::ok(rows_of(&self.maintenance)));
    }
}

/// Document de config client.
pub fn config_document(api_base: &str) -> Value {
    json!({ "API_BASE": api_base, "REQUEST_TIMEOUT_SECS": 5 })
}

/// Document substitut complet (données d'exemple et bloc admin).
pub fn substitute_document(now: DateTime<Utc>) -> Value {
    sample_document(now)
}

/// Document substitut auquel il manque un champ asset obligatoire.
pub fn substitute_missing_field(now: DateTime<Utc>, index: usize, field: &str) -> Value {
    let mut doc = sample_document(now);
    if let Some(asset) = doc["assets"].get_mut(index).and_then(Value::as_object_mut) {
        asset.remove(field);
    }
    doc
}
