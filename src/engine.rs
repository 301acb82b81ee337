// Thin re-export module: the engine's responsibilities are split into
// submodules (state and queries, link graph, fields, validation, ownership
// cascade, replay).

mod fields;
mod links;
mod ownership;
mod replay;
mod state;
mod validation;

pub use ownership::Revocation;
pub use replay::{BeaconRecord, LinkStamp, RebuildReport, SkipReason, SkippedRecord};
pub use state::{Engine, StateExport};
