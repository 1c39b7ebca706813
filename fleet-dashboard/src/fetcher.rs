/**
 * SNAPSHOT FETCHER - Sync tout-ou-rien des six endpoints requis
 *
 * RÔLE :
 * Lance les six lectures requises ensemble, attend leur fin et n'assemble un
 * Snapshot que si toutes ont réussi. Un seul endpoint en échec fait échouer le
 * cycle entier, rien de partiel n'est produit.
 *
 * FONCTIONNEMENT :
 * - `tokio::try_join!` mène les six lectures en parallèle ; la première erreur
 *   l'emporte et les lectures restantes sont abandonnées
 * - l'assemblage (et les conteneurs vides par défaut) n'a lieu qu'une fois les six
 *   lectures terminées
 * - config admin, déclencheur refresh et lectures par asset sont des appels séparés,
 *   best-effort côté appelant
 *
 * EXCLUSION :
 * `SyncGate` ne délivre qu'un `SyncTicket` à la fois. Tout écrivain du SnapshotStore
 * tient un ticket pendant son cycle : deux cycles ne peuvent jamais s'écraser dans
 * le désordre, la demande concurrente est rejetée.
 */

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::api::{endpoints, ApiError, FleetApi};
use crate::models::{AdminConfig, Asset, AssetDetail, FaultRecord, MaintenanceRecord, MileageRecord, ShapeMismatch, Snapshot, SnapshotParts};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("required endpoint failed: {0}")]
    Endpoint(#[from] ApiError),
    #[error("unexpected payload shape: {0}")]
    Shape(#[from] ShapeMismatch),
    #[error("a sync cycle is already in flight")]
    InFlight,
    #[error("no API base configured")]
    NotConfigured,
}

#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    api: FleetApi,
}

impl SnapshotFetcher {
    pub fn new(api: FleetApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &FleetApi {
        &self.api
    }

    /// Lance les six lectures requises ; `Ok` seulement si toutes ont réussi.
    pub async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let api = &self.api;
        let (info, kpis, assets, maintenance, faults, miles) = tokio::try_join!(
            api.get_json(endpoints::INFO),
            api.get_json(endpoints::KPIS),
            api.get_json(endpoints::ASSETS),
            api.get_json(endpoints::MAINTENANCE_DUE),
            api.get_json(endpoints::FAULTS_ACTIVE),
            api.get_json(endpoints::MILES_MONTHLY),
        )?;

        let snapshot = Snapshot::from_parts(SnapshotParts { info, kpis, assets, maintenance, faults, miles })?;
        tracing::info!(
            assets = snapshot.assets.len(),
            maintenance = snapshot.maintenance.len(),
            faults = snapshot.faults.len(),
            miles = snapshot.miles.len(),
            "snapshot assembled"
        );
        Ok(snapshot)
    }

    /// Lecture best-effort des réglages admin ; `Ok(None)` si le serveur renvoie `null`.
    pub async fn fetch_admin_config(&self) -> Result<Option<AdminConfig>, ApiError> {
        let value = self.api.get_json(endpoints::ADMIN_CONFIG).await?;
        Ok((!value.is_null()).then(|| AdminConfig::from_value(&value)))
    }

    /// Demande au backend de recharger ses données amont.
    pub async fn trigger_refresh(&self) -> Result<(), ApiError> {
        self.api.post_empty(endpoints::REFRESH_NOW).await
    }

    pub async fn save_admin_config(&self, config: &AdminConfig) -> Result<(), ApiError> {
        self.api.post_json(endpoints::ADMIN_CONFIG, config).await
    }

    /// Détail live d'un asset : miles, historique des faults et services, lus ensemble.
    pub async fn fetch_asset_detail(&self, asset: &Asset) -> Result<AssetDetail, ApiError> {
        let api = &self.api;
        let miles_path = endpoints::asset_miles(&asset.id);
        let faults_path = endpoints::asset_faults(&asset.id);
        let services_path = endpoints::asset_maintenance(&asset.id);
        let (miles, faults, services) = tokio::try_join!(
            api.get_json(&miles_path),
            api.get_json(&faults_path),
            api.get_json(&services_path),
        )?;

        let rows = |value: &serde_json::Value| value.as_array().cloned().unwrap_or_default();
        Ok(AssetDetail {
            asset: asset.clone(),
            miles: rows(&miles).iter().map(MileageRecord::from_value).collect(),
            faults: rows(&faults).iter().map(FaultRecord::from_value).collect(),
            services: rows(&services).iter().map(MaintenanceRecord::from_value).collect(),
        })
    }
}

/// Garde d'exclusion des écrivains du SnapshotStore.
#[derive(Debug, Default)]
pub struct SyncGate {
    busy: AtomicBool,
    issued: AtomicU64,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Un ticket si aucun cycle n'est en cours, `None` sinon.
    pub fn try_acquire(&self) -> Option<SyncTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        let id = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        Some(SyncTicket { gate: self, id })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Nombre de tickets délivrés jusqu'ici.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

/// Tenu pendant un cycle, libéré au drop.
#[derive(Debug)]
pub struct SyncTicket<'a> {
    gate: &'a SyncGate,
    id: u64,
}

impl SyncTicket<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SyncTicket<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_admits_one_ticket_at_a_time() {
        let gate = SyncGate::new();
        let first = gate.try_acquire().unwrap();
        assert_eq!(first.id(), 1);
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());

        drop(first);
        assert!(!gate.is_busy());
        let second = gate.try_acquire().unwrap();
        assert_eq!(second.id(), 2);
        assert_eq!(gate.issued(), 2);
    }

    #[tokio::test]
    async fn test_fetch_fails_when_backend_unreachable() {
        let api = FleetApi::new("http://127.0.0.1:9", Some(std::time::Duration::from_secs(2))).unwrap();
        let fetcher = SnapshotFetcher::new(api);
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Endpoint(_)));
    }

    #[tokio::test]
    async fn test_asset_detail_fails_when_backend_unreachable() {
        let api = FleetApi::new("http://127.0.0.1:9", Some(std::time::Duration::from_secs(2))).unwrap();
        let fetcher = SnapshotFetcher::new(api);
        let asset = Asset { id: "unit/7".into(), name: "Vehicle-07".into(), ..Asset::default() };

        let err = fetcher.fetch_asset_detail(&asset).await.unwrap_err();
        let endpoint = err.endpoint().unwrap();
        assert!(endpoint.contains("unit%2F7"), "{endpoint}");
    }
}
