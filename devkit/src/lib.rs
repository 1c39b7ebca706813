/*!
# Fleet DevKit - Stubs et utilitaires de test pour le dashboard flotte

- Backend HTTP simulé servant des payloads flotte (et la config client)
- Renderer enregistreur des statuts, notifications et view models
- Fixtures de payloads et de documents substituts
- TestHarness qui relie le tout à un Dashboard
*/

pub mod fixtures;
pub mod recording;
pub mod stub_backend;
pub mod test_utils;

pub use fixtures::FleetPayloads;
pub use recording::{RecordingRenderer, RenderEvent};
pub use stub_backend::{StubBackend, StubResponse, StubServer};
pub use test_utils::TestHarness;
