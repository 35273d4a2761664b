//! Authorization flow: starting an attempt and validating its callback.

mod begin;
mod callback;
mod store;
mod types;

pub use store::FlowStateStore;
pub use types::{CallbackParams, FlowContextId, FlowState};
