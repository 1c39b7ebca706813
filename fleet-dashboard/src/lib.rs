//! Cœur client du dashboard flotte.
//!
//! Regroupe les endpoints en lecture du backend dans un [`models::Snapshot`]
//! remplacé en bloc, suit la santé de la sync via [`connection::ConnectionState`],
//! filtre les jeux substituts hors ligne avec [`schema::validate`] et pilote le
//! rendu par onglet à travers le trait [`view::Renderer`].

pub mod api;
pub mod config;
pub mod connection;
pub mod controller;
pub mod fetcher;
pub mod models;
pub mod schema;
pub mod settings;
pub mod store;
pub mod view;

pub use connection::ConnectionState;
pub use controller::{Command, Dashboard, DashboardOptions, Startup};
pub use settings::TabId;
pub use store::DataSource;
pub use view::{Notice, NoticeLevel, Renderer, ViewModel};
