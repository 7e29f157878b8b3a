//! # trellis-sync
//!
//! Pulls operator and account claims from the operator's account server and
//! reconciles them with the local claim store.
//!
//! Fetching goes through the [`Fetcher`] trait so the transport can be
//! replaced; [`HttpFetcher`] is the `reqwest` implementation.

#![warn(clippy::all)]

pub mod errors;
pub mod fetch;
pub mod job;
pub mod pull;

pub use errors::{Result, SyncError};
pub use fetch::{FetchResponse, Fetcher, HttpFetcher, FETCH_TIMEOUT};
pub use job::{PullJob, Pulled};
pub use pull::Pull;
