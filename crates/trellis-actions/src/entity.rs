//! Shared state of create/edit actions.

use crate::{context::ExecContext, errors::*, prompts, report::Report};
use std::path::PathBuf;
use tracing::info;
use trellis_claims::{Claim, ClaimBody, ClaimEditor};
use trellis_keys::{key_validator, KeyError, KeyKind, KeyPair, KeySpec, PublicKey, Resolution};
use trellis_storage::{validate_name, ClaimStore, KeyRef, KeyStore};

/// The entity an action creates or edits
#[derive(Debug, Clone)]
pub struct Entity {
    /// Entity name, unique under its parent
    pub name: String,
    /// Key specification given by the user
    pub key_spec: Option<String>,
    pub kind: KeyKind,
    /// Creating a new entity rather than editing one
    pub create: bool,
    resolution: Option<Resolution>,
    key_path: Option<PathBuf>,
}

impl Entity {
    pub fn new(kind: KeyKind) -> Self {
        Self {
            name: String::new(),
            key_spec: None,
            kind,
            create: false,
            resolution: None,
            key_path: None,
        }
    }

    /// Prompt for the name and, when creating, the identity key
    pub fn edit(&mut self, ctx: &ExecContext) -> Result<()> {
        self.name = prompts::prompt_name(ctx, &format!("{} name", self.kind), &self.name)?;
        if self.create {
            self.resolve_key(ctx)?;
        }
        Ok(())
    }

    /// Resolve the identity key once
    pub fn resolve_key(&mut self, ctx: &ExecContext) -> Result<&Resolution> {
        if self.resolution.is_none() {
            let resolution =
                ctx.resolver()
                    .resolve(self.key_spec.as_deref(), self.kind, self.kind.as_str())?;
            self.resolution = Some(resolution);
        }
        self.resolution
            .as_ref()
            .ok_or(ActionError::Key(KeyError::MissingKey { kind: self.kind }))
    }

    /// Check the name and, when creating, that a key of the right kind resolves
    pub fn valid(&mut self, ctx: &ExecContext) -> Result<()> {
        if self.name.is_empty() {
            return Err(ActionError::usage(format!("{} name is required", self.kind)));
        }
        validate_name(&self.name)?;
        if self.create {
            self.resolve_key(ctx)?;
        }
        Ok(())
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        self.resolution.as_ref().map(|r| r.key.public_key())
    }

    /// Whether the key was generated during resolution
    pub fn generated(&self) -> bool {
        self.resolution.as_ref().map_or(false, |r| r.generated)
    }

    /// Persist the resolved seed, if there is one.
    ///
    /// Actions call this once their claim is written.
    pub fn store_keys(&mut self, keys: &KeyStore, parent: Option<&str>) -> Result<Option<PathBuf>> {
        let Some(resolution) = &self.resolution else {
            return Ok(None);
        };
        self.key_path = keys.store(&self.name, &resolution.key, parent)?;
        Ok(self.key_path.clone())
    }

    /// Build, edit and sign a claim, returning it with its token.
    ///
    /// With `previous` the new claim starts from the previous version and
    /// gets a strictly later `iat`.
    pub fn seal_claim(
        &self,
        signer: &KeyPair,
        editor: &dyn ClaimEditor,
        previous: Option<&Claim>,
    ) -> Result<(Claim, String)> {
        let mut claim = match previous {
            Some(previous) => previous.clone(),
            None => {
                let subject = self
                    .public_key()
                    .ok_or(ActionError::Key(KeyError::MissingKey { kind: self.kind }))?;
                Claim::new(&self.name, &subject, ClaimBody::default_for(self.kind))
            }
        };
        editor.edit(&mut claim)?;
        claim.touch(previous.map(|p| p.iat));
        let token = claim.encode(signer)?;
        Ok((claim, token))
    }

    /// Seal a claim and write it to `store`
    pub fn generate_claim(
        &self,
        signer: &KeyPair,
        editor: &dyn ClaimEditor,
        previous: Option<&Claim>,
        store: &ClaimStore,
    ) -> Result<Claim> {
        let (claim, token) = self.seal_claim(signer, editor, previous)?;
        let path = store.write_raw(&token)?;
        info!(kind = %self.kind, name = %claim.name, path = %path.display(), "stored claim");
        Ok(claim)
    }

    /// Report lines for a completed create or edit
    pub fn report(&self, verb: &str) -> Report {
        let mut report = Report::new();
        if self.generated() {
            if let Some(path) = &self.key_path {
                report.ok(format!(
                    "generated {} key - private key stored {:?}",
                    self.kind,
                    path.display().to_string()
                ));
            }
        }
        report.ok(format!("{} {} {:?}", verb, self.kind, self.name));
        report.generated_key_path = self.key_path.clone().filter(|_| self.generated());
        report
    }
}

/// The key that signs an entity's claim.
///
/// Comes from an explicit key specification or from the key store. Signer
/// keys are never generated.
#[derive(Debug, Clone)]
pub struct Signer {
    /// Key specification given by the user
    pub spec: Option<String>,
    kind: KeyKind,
    pair: Option<KeyPair>,
}

impl Signer {
    pub fn new(kind: KeyKind) -> Self {
        Self {
            spec: None,
            kind,
            pair: None,
        }
    }

    /// Find the key for `expected` without prompting
    pub fn load(&mut self, keys: &KeyStore, expected: &PublicKey) -> Result<()> {
        if self.pair.is_some() {
            return Ok(());
        }
        self.pair = match self.spec.as_deref() {
            Some(spec) => Some(self.from_spec(spec, expected)?),
            None => keys.lookup(KeyRef::Public(expected))?,
        };
        Ok(())
    }

    /// Ask for a key file if none was found (interactive only)
    pub fn prompt(&mut self, ctx: &ExecContext, expected: &PublicKey) -> Result<()> {
        if self.pair.is_some() {
            return Ok(());
        }
        let validator = key_validator(self.kind);
        let path = ctx.prompter().prompt(
            &format!("path to the {} signing key", self.kind),
            "",
            Some(&validator),
        )?;
        self.pair = Some(self.from_spec(&path, expected)?);
        self.spec = Some(path);
        Ok(())
    }

    fn from_spec(&self, spec: &str, expected: &PublicKey) -> Result<KeyPair> {
        let spec = KeySpec::parse(spec);
        if spec == KeySpec::Generate {
            return Err(ActionError::usage("signing keys cannot be generated"));
        }
        let key = spec
            .load()?
            .ok_or(KeyError::MissingKey { kind: self.kind })?;
        key.expect_kind(self.kind)?;
        let pair = key.into_pair()?;
        if pair.public_key() != *expected {
            return Err(ActionError::usage(format!(
                "signing key {} does not belong to {}",
                pair.public_key(),
                expected
            )));
        }
        Ok(pair)
    }

    /// The signing key, or [`KeyError::MissingKey`]
    pub fn require(&self) -> Result<&KeyPair> {
        self.pair
            .as_ref()
            .ok_or(ActionError::Key(KeyError::MissingKey { kind: self.kind }))
    }
}
