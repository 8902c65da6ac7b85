// Data models shared by the probe server and the harness

pub mod probe;
pub mod target;

pub use probe::ProbeResponse;
pub use target::{BackendId, DeploymentScope, ProbeKey};
