//! # trellis-storage
//!
//! Filesystem storage for trellis.
//!
//! The [`ClaimStore`] holds signed claim tokens in a directory tree rooted at
//! the operator. The [`KeyStore`] holds private seeds in a separate owner-only
//! tree, indexed by public key and by entity name.

#![warn(clippy::all)]

pub mod claim_store;
pub mod errors;
pub mod fs;
pub mod key_store;
pub mod layout;

pub use claim_store::{ClaimStore, OperatorContext, StoreInfo, STORE_VERSION};
pub use errors::{Result, StoreError};
pub use key_store::{KeyRef, KeyStore};
pub use layout::validate_name;
