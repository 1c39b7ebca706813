use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::models::Snapshot;
use crate::schema::SubstituteDocument;

/// Provenance du snapshot affiché.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Substitute,
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: Arc<Snapshot>,
    source: DataSource,
    substitute: Option<Arc<SubstituteDocument>>,
    generation: u64,
}

/// Détient l'unique snapshot courant. Le remplacement se fait en bloc : un lecteur
/// obtient un `Arc` de l'ancien ou du nouveau snapshot, jamais un mélange.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<Inner>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.read().snapshot)
    }

    pub fn current_source(&self) -> DataSource {
        self.inner.read().source
    }

    /// Incrémenté à chaque remplacement.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    pub fn has_data(&self) -> bool {
        !self.inner.read().snapshot.is_empty()
    }

    /// Installe un snapshot fraîchement assemblé. Un snapshot live écarte tout
    /// document substitut en attente.
    pub fn replace(&self, snapshot: Snapshot, source: DataSource) -> u64 {
        let mut inner = self.inner.write();
        inner.snapshot = Arc::new(snapshot);
        inner.source = source;
        if source == DataSource::Live {
            inner.substitute = None;
        }
        inner.generation += 1;
        tracing::debug!(generation = inner.generation, ?source, "snapshot replaced");
        inner.generation
    }

    /// Garde un document validé pour la session sans l'afficher encore.
    pub fn stage_substitute(&self, document: SubstituteDocument) -> Arc<SubstituteDocument> {
        let document = Arc::new(document);
        self.inner.write().substitute = Some(Arc::clone(&document));
        document
    }

    pub fn substitute(&self) -> Option<Arc<SubstituteDocument>> {
        self.inner.read().substitute.clone()
    }

    /// Jette le document de session. Si ses données sont affichées, le store revient
    /// à un snapshot live vide : rien n'en survit à la bascule.
    pub fn clear_substitute(&self) -> Option<Arc<SubstituteDocument>> {
        let mut inner = self.inner.write();
        if inner.source == DataSource::Substitute {
            inner.snapshot = Arc::new(Snapshot::default());
            inner.source = DataSource::Live;
            inner.generation += 1;
        }
        inner.substitute.take()
    }
}
