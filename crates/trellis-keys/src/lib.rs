//! # trellis-keys
//!
//! Identity keys for the trellis trust hierarchy.
//!
//! Every identity (operator, account, user, cluster, server) is an Ed25519
//! key pair tagged with a [`KeyKind`]. The public half is the entity's
//! permanent identifier and is encoded with a one-letter kind prefix so a key
//! string always says what it is for.
//!
//! ## Security Properties
//!
//! - Seeds are zeroized on drop and never printed by `Debug`
//! - Encoded keys carry a checksum; corrupted strings are rejected
//! - Resolution always checks the key kind against the expected kind

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod encoding;
pub mod errors;
pub mod keys;
pub mod kinds;
pub mod prompt;
pub mod resolver;
pub mod signatures;

pub use constants::*;
pub use encoding::extract_armored;
pub use errors::{KeyError, Result};
pub use keys::{KeyPair, PublicKey};
pub use kinds::KeyKind;
pub use prompt::{Answer, PromptError, Prompter, ScriptedPrompter, Validator};
pub use resolver::{key_validator, KeyResolver, KeySpec, Resolution, ResolveMode, ResolvedKey};
pub use signatures::{sign_message, verify_signature};
