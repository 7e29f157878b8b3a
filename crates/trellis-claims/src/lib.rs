//! Signed claims for the trellis trust hierarchy.
//!
//! A [`Claim`] binds an entity's public key to its name, validity window and
//! kind-specific attributes. Claims are sealed into compact tokens signed by
//! the parent entity's key; [`chain`] holds the rules for who may sign what.

pub mod chain;
pub mod claim;
pub mod edit;
pub mod errors;
pub mod number;
pub mod time;

pub use claim::{
    armor, decode_generic, extract_token, AccountClaim, AccountLimits, Claim, ClaimBody,
    ClusterClaim, GenericClaim, OperatorClaim, Permissions, ServerClaim, UserClaim, NO_LIMIT,
};
pub use edit::{
    AccountEdit, ClaimEditor, ClusterEdit, OperatorEdit, PermissionEdit, ServerEdit, UserEdit,
};
pub use errors::*;
pub use number::parse_number;
pub use time::{current_timestamp, parse_time, TimeParams};
