//! Sitemirror core: job records, reconciliation and the pure tracking state machine.
mod domain;
mod effect;
mod msg;
mod reconcile;
mod record;
mod registry;
mod state;
mod update;
mod view_model;

pub use domain::resolve_domain;
pub use effect::{Effect, StopReason};
pub use msg::Msg;
pub use reconcile::reconcile;
pub use record::{JobId, JobRecord, JobStatus, StatusFragment, STARTING_MESSAGE};
pub use registry::{JobRegistry, RegistryError};
pub use state::AppState;
pub use update::update;
pub use view_model::AppViewModel;
