//! État de connexion de la synchronisation des données du dashboard.
//!
//! Aucun timer : l'état ne bouge que lorsque le contrôleur rapporte l'issue d'un
//! cycle de sync ou d'une bascule du mode substitut. Chaque transition effective
//! est signalée une seule fois au renderer.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Online,
    Offline,
    Substitute,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 4] = [
        ConnectionState::Connecting,
        ConnectionState::Online,
        ConnectionState::Offline,
        ConnectionState::Substitute,
    ];

    /// Libellé affiché par l'indicateur de statut.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Online => "Online",
            ConnectionState::Offline => "Offline",
            ConnectionState::Substitute => "Substitute",
        }
    }

    /// États atteignables depuis `self`. Online/Offline repassent par Connecting quand
    /// un nouveau cycle live démarre (refresh ou nouvel essai).
    pub fn allowed_transitions(self) -> &'static [ConnectionState] {
        use ConnectionState::*;
        match self {
            Connecting => &[Online, Offline, Substitute],
            Online => &[Connecting, Substitute],
            Offline => &[Connecting, Substitute],
            Substitute => &[Connecting],
        }
    }

    pub fn can_transition_to(self, to: ConnectionState) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal connection transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Issue d'une demande de transition légale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed { from: ConnectionState, to: ConnectionState },
    /// Déjà dans l'état demandé, rien à signaler.
    Unchanged,
}

/// État courant et nombre de transitions effectives.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    state: ConnectionState,
    transitions: u64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn transition(&mut self, to: ConnectionState) -> Result<Transition, IllegalTransition> {
        let from = self.state;
        if from == to {
            return Ok(Transition::Unchanged);
        }
        if !from.can_transition_to(to) {
            return Err(IllegalTransition { from, to });
        }
        self.state = to;
        self.transitions += 1;
        Ok(Transition::Changed { from, to })
    }
}
