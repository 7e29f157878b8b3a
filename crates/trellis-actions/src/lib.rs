//! # trellis-actions
//!
//! Commands that change the trust hierarchy.
//!
//! Every command is an [`Action`] driven through the phases in [`lifecycle`]
//! by [`run_action`]. Actions only touch the stores in their `run` phase.

#![warn(clippy::all)]

pub mod actions;
pub mod context;
pub mod entity;
pub mod errors;
pub mod lifecycle;
pub mod prompts;
pub mod report;

pub use actions::*;
pub use context::ExecContext;
pub use entity::{Entity, Signer};
pub use errors::{ActionError, LifecycleError, Result};
pub use lifecycle::{run_action, Action, Phase};
pub use report::{Report, ReportEntry, Status};
