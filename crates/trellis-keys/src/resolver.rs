//! Key resolution.
//!
//! A key specification given by the user is one of:
//!
//! - an encoded seed (`SA...`), giving a full key pair
//! - an encoded public key (`A...`), enough to reference an entity but not to sign
//! - a path to a file holding either of the above, optionally armoured
//! - the keyword `generate`, or nothing at all
//!
//! Whatever the source, the resolved key must be of the kind the caller
//! expects. When nothing is given, interactive callers are offered a freshly
//! generated key; non-interactive callers fail with [`KeyError::MissingKey`].

use crate::{
    constants::GENERATE_KEYWORD,
    encoding::{decode_public, extract_armored, looks_like_seed},
    errors::*,
    keys::{KeyPair, PublicKey},
    kinds::KeyKind,
    prompt::Prompter,
};
use std::path::PathBuf;
use tracing::debug;

/// Where a key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    /// Encoded seed literal
    Seed(String),
    /// Encoded public key literal
    Public(String),
    /// File containing a seed or public key
    Path(PathBuf),
    /// Explicit request for a new key pair
    Generate,
}

impl KeySpec {
    /// Classify a user-supplied key string
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case(GENERATE_KEYWORD) {
            KeySpec::Generate
        } else if looks_like_seed(input) {
            KeySpec::Seed(input.to_string())
        } else if decode_public(input).is_ok() {
            KeySpec::Public(input.to_string())
        } else {
            KeySpec::Path(PathBuf::from(input))
        }
    }

    /// Classify an optional key string; blank input counts as absent
    pub fn from_option(input: Option<&str>) -> Option<Self> {
        input
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
    }

    /// Load the key this specification points at.
    ///
    /// Returns `Ok(None)` for [`KeySpec::Generate`].
    pub fn load(&self) -> Result<Option<ResolvedKey>> {
        match self {
            KeySpec::Seed(seed) => Ok(Some(ResolvedKey::Pair(KeyPair::from_encoded_seed(seed)?))),
            KeySpec::Public(public) => Ok(Some(ResolvedKey::Public(public.parse()?))),
            KeySpec::Path(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| KeyError::Io {
                    path: path.clone(),
                    source,
                })?;
                let text = extract_armored(&contents);
                let key = if looks_like_seed(&text) {
                    ResolvedKey::Pair(KeyPair::from_encoded_seed(&text)?)
                } else {
                    ResolvedKey::Public(text.parse()?)
                };
                Ok(Some(key))
            }
            KeySpec::Generate => Ok(None),
        }
    }
}

/// A key that has been resolved from a [`KeySpec`]
#[derive(Debug, Clone)]
pub enum ResolvedKey {
    /// Public and private halves are known
    Pair(KeyPair),
    /// Only the public half is known; usable as an identifier, not for signing
    Public(PublicKey),
}

impl ResolvedKey {
    /// Kind of the key
    pub fn kind(&self) -> KeyKind {
        match self {
            ResolvedKey::Pair(kp) => kp.kind(),
            ResolvedKey::Public(pk) => pk.kind(),
        }
    }

    /// Public half
    pub fn public_key(&self) -> PublicKey {
        match self {
            ResolvedKey::Pair(kp) => kp.public_key(),
            ResolvedKey::Public(pk) => *pk,
        }
    }

    /// The key pair, if the private half is known
    pub fn key_pair(&self) -> Option<&KeyPair> {
        match self {
            ResolvedKey::Pair(kp) => Some(kp),
            ResolvedKey::Public(_) => None,
        }
    }

    /// Whether only the public half is known
    pub fn is_public_only(&self) -> bool {
        matches!(self, ResolvedKey::Public(_))
    }

    /// Fail with [`KeyError::KeyMismatch`] unless the key is of `expected` kind
    pub fn expect_kind(&self, expected: KeyKind) -> Result<()> {
        self.public_key().expect_kind(expected)
    }

    /// The key pair, or [`KeyError::PublicOnly`] if only the public half is known
    pub fn into_pair(self) -> Result<KeyPair> {
        match self {
            ResolvedKey::Pair(kp) => Ok(kp),
            ResolvedKey::Public(pk) => Err(KeyError::PublicOnly(pk.encode())),
        }
    }
}

/// Result of resolving a key
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved key
    pub key: ResolvedKey,
    /// Whether the key was generated during resolution; callers report this to the user
    pub generated: bool,
}

impl Resolution {
    fn generated(kind: KeyKind) -> Self {
        debug!(%kind, "generated new key pair");
        Self {
            key: ResolvedKey::Pair(KeyPair::generate(kind)),
            generated: true,
        }
    }
}

/// Whether the resolver may ask the user questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Prompt for anything missing
    Interactive,
    /// Never prompt; missing keys are errors
    NonInteractive,
}

/// Resolves key specifications into keys of an expected kind
pub struct KeyResolver<'a> {
    mode: ResolveMode,
    prompter: &'a dyn Prompter,
}

impl<'a> KeyResolver<'a> {
    /// Create a resolver
    pub fn new(mode: ResolveMode, prompter: &'a dyn Prompter) -> Self {
        Self { mode, prompter }
    }

    /// Resolve `spec` into a key of kind `expected`.
    ///
    /// `label` names the key in prompts (e.g. "account").
    pub fn resolve(&self, spec: Option<&str>, expected: KeyKind, label: &str) -> Result<Resolution> {
        match KeySpec::from_option(spec) {
            Some(KeySpec::Generate) => Ok(Resolution::generated(expected)),
            Some(spec) => Self::load_expected(&spec, expected),
            None => match self.mode {
                ResolveMode::NonInteractive => Err(KeyError::MissingKey { kind: expected }),
                ResolveMode::Interactive => self.resolve_interactively(expected, label),
            },
        }
    }

    fn resolve_interactively(&self, expected: KeyKind, label: &str) -> Result<Resolution> {
        if self
            .prompter
            .confirm(&format!("generate an {} key", label), true)?
        {
            return Ok(Resolution::generated(expected));
        }

        let validator = key_validator(expected);
        let path = self.prompter.prompt(
            &format!("path to the {} key", label),
            "",
            Some(&validator),
        )?;
        Self::load_expected(&KeySpec::parse(&path), expected)
    }

    fn load_expected(spec: &KeySpec, expected: KeyKind) -> Result<Resolution> {
        let key = spec
            .load()?
            .ok_or(KeyError::MissingKey { kind: expected })?;
        key.expect_kind(expected)?;
        Ok(Resolution {
            key,
            generated: false,
        })
    }
}

/// Validator for prompts asking for a key of `kind`
pub fn key_validator(kind: KeyKind) -> impl Fn(&str) -> std::result::Result<(), String> + Sync {
    move |value: &str| {
        let key = KeySpec::parse(value)
            .load()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("a {} key is required", kind))?;
        key.expect_kind(kind).map_err(|e| e.to_string())
    }
}
