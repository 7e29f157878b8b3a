//! Seed storage, kept apart from the claim tree.
//!
//! ```text
//! <keys>/seeds/<kind prefix>/<pub[1..3]>/<pub>.nk     seed, mode 0600
//! <keys>/<operator>/Accounts/<name>/<name>.pub        name index
//! ```
//!
//! The name index mirrors the claim store layout and holds the public key of
//! each named entity, so a seed can be found either by public key or by name.
//! All directories are created owner-only.

use crate::{
    errors::*,
    fs::{create_private_dir, read_optional, write_atomic, PRIVATE_FILE_MODE},
    layout::{entity_path, PUBLIC_KEY_EXTENSION},
};
use std::path::{Path, PathBuf};
use tracing::debug;
use trellis_keys::{KeyKind, KeyPair, PublicKey, ResolvedKey, SEED_FILE_EXTENSION};

/// Directory holding seeds, relative to the key store root
pub const SEEDS_DIR: &str = "seeds";

/// How to find a stored key
#[derive(Debug, Clone, Copy)]
pub enum KeyRef<'a> {
    /// By public key
    Public(&'a PublicKey),
    /// By entity name; `parent` names the account or cluster of users and servers
    Name {
        kind: KeyKind,
        parent: Option<&'a str>,
        name: &'a str,
    },
}

/// Key store for one operator
#[derive(Debug, Clone)]
pub struct KeyStore {
    root: PathBuf,
    operator: String,
}

impl KeyStore {
    pub fn new(root: impl Into<PathBuf>, operator: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            operator: operator.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the seed for `public` lives
    pub fn seed_path(&self, public: &PublicKey) -> PathBuf {
        let encoded = public.encode();
        let shard: String = encoded.chars().skip(1).take(2).collect();
        self.root
            .join(SEEDS_DIR)
            .join(public.kind().prefix().to_string())
            .join(shard)
            .join(format!("{}.{}", encoded, SEED_FILE_EXTENSION))
    }

    fn index_path(&self, kind: KeyKind, parent: Option<&str>, name: &str) -> Result<PathBuf> {
        entity_path(
            &self.root.join(&self.operator),
            kind,
            parent,
            name,
            PUBLIC_KEY_EXTENSION,
        )
    }

    /// Persist the seed of `key` and index it under `name`.
    ///
    /// Returns the seed path for display. Public-only keys are not stored and
    /// return `Ok(None)`.
    pub fn store(
        &self,
        name: &str,
        key: &ResolvedKey,
        parent: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        let Some(pair) = key.key_pair() else {
            debug!(name, "public-only key, nothing to store");
            return Ok(None);
        };
        let public = pair.public_key();

        let seed_path = self.seed_path(&public);
        let index_path = self.index_path(public.kind(), parent, name)?;
        for dir in [seed_path.parent(), index_path.parent()].into_iter().flatten() {
            create_private_dir(dir)?;
        }

        let seed = pair.encoded_seed();
        write_atomic(&seed_path, seed.as_bytes(), Some(PRIVATE_FILE_MODE))?;
        write_atomic(&index_path, public.encode().as_bytes(), None)?;

        debug!(kind = %public.kind(), name, path = %seed_path.display(), "stored seed");
        Ok(Some(seed_path))
    }

    /// Find a stored key pair
    pub fn lookup(&self, key: KeyRef<'_>) -> Result<Option<KeyPair>> {
        match key {
            KeyRef::Public(public) => self.lookup_public(public),
            KeyRef::Name { kind, parent, name } => {
                let index_path = self.index_path(kind, parent, name)?;
                match read_optional(&index_path)? {
                    Some(text) => {
                        let public: PublicKey = text.trim().parse()?;
                        self.lookup_public(&public)
                    }
                    None => Ok(None),
                }
            }
        }
    }

    fn lookup_public(&self, public: &PublicKey) -> Result<Option<KeyPair>> {
        let Some(seed) = read_optional(&self.seed_path(public))? else {
            return Ok(None);
        };
        let pair = KeyPair::from_encoded_seed(seed.trim())?;
        if pair.public_key() != *public {
            return Err(trellis_keys::KeyError::KeyMismatch {
                expected: public.kind(),
                found: pair.kind(),
            }
            .into());
        }
        Ok(Some(pair))
    }
}
