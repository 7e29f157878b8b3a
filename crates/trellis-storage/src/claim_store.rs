//! Hierarchical claim store.
//!
//! One directory per operator, laid out as described in [`crate::layout`].
//! Every token is verified when read; writes replace files atomically.

use crate::{
    errors::*,
    fs::{create_dir, read_optional, write_atomic},
    layout::{entity_path, kind_dir, validate_name, CLAIM_EXTENSION, INFO_FILE},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use trellis_claims::{chain, decode_generic, extract_token, Claim, ClaimError};
use trellis_keys::KeyKind;

/// Current store format version
pub const STORE_VERSION: u32 = 1;

/// Contents of the store info file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Operator name, also the store directory name
    pub name: String,
    /// Operator public key
    pub operator: String,
    /// Layout version
    pub version: u32,
}

/// The operator a command targets.
///
/// Built once when a command starts and passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorContext {
    store_root: PathBuf,
    operator: String,
}

impl OperatorContext {
    pub fn new(store_root: impl Into<PathBuf>, operator: impl Into<String>) -> Self {
        Self {
            store_root: store_root.into(),
            operator: operator.into(),
        }
    }

    pub fn store_root(&self) -> &Path {
        &self.store_root
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Open the claim store for this operator
    pub fn open_store(&self) -> Result<ClaimStore> {
        ClaimStore::open(&self.store_root, &self.operator)
    }
}

/// Claim store for a single operator
#[derive(Debug, Clone)]
pub struct ClaimStore {
    dir: PathBuf,
    info: StoreInfo,
}

impl ClaimStore {
    /// Create the store for operator `name` under `root`, seeded with its claim
    pub fn create(root: &Path, name: &str, operator_token: &str) -> Result<Self> {
        validate_name(name)?;
        let token = extract_token(operator_token);
        let claim = Claim::decode(&token)?;
        if claim.kind() != KeyKind::Operator {
            return Err(ClaimError::TypeMismatch {
                expected: KeyKind::Operator,
                found: claim.kind(),
            }
            .into());
        }

        let dir = root.join(name);
        if dir.join(INFO_FILE).exists() {
            return Err(StoreError::AlreadyExists {
                kind: KeyKind::Operator,
                name: name.to_string(),
            });
        }
        create_dir(&dir)?;

        let info = StoreInfo {
            name: name.to_string(),
            operator: claim.sub.clone(),
            version: STORE_VERSION,
        };
        let store = Self { dir, info };
        store.write_token(KeyKind::Operator, None, name, &token)?;
        write_atomic(
            &store.dir.join(INFO_FILE),
            &serde_json::to_vec_pretty(&store.info)?,
            None,
        )?;
        debug!(operator = %name, dir = %store.dir.display(), "created claim store");
        Ok(store)
    }

    /// Open the store for operator `name` under `root`
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        validate_name(name)?;
        let dir = root.join(name);
        let info_path = dir.join(INFO_FILE);
        let info = read_optional(&info_path)?.ok_or_else(|| StoreError::NotAStore(dir.clone()))?;
        let info: StoreInfo = serde_json::from_str(&info)?;
        Ok(Self { dir, info })
    }

    /// Operator name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Operator public key
    pub fn operator_key(&self) -> &str {
        &self.info.operator
    }

    /// Operator directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn info(&self) -> &StoreInfo {
        &self.info
    }

    /// File holding the claim for `name`
    pub fn path_for(&self, kind: KeyKind, parent: Option<&str>, name: &str) -> Result<PathBuf> {
        entity_path(&self.dir, kind, parent, name, CLAIM_EXTENSION)
    }

    /// Whether a claim exists for `name`
    pub fn has(&self, kind: KeyKind, parent: Option<&str>, name: &str) -> bool {
        self.path_for(kind, parent, name)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// The stored token, exactly as written
    pub fn read_raw(&self, kind: KeyKind, parent: Option<&str>, name: &str) -> Result<String> {
        let path = self.path_for(kind, parent, name)?;
        read_optional(&path)?.ok_or_else(|| StoreError::NotFound {
            kind,
            name: name.to_string(),
        })
    }

    /// Read and verify a claim.
    ///
    /// The signature is checked against the token's issuer, and the issuer
    /// must be the subject of the parent entity in this store.
    pub fn read(&self, kind: KeyKind, parent: Option<&str>, name: &str) -> Result<Claim> {
        let claim = Claim::decode(&extract_token(&self.read_raw(kind, parent, name)?))?;
        if claim.kind() != kind {
            return Err(ClaimError::TypeMismatch {
                expected: kind,
                found: claim.kind(),
            }
            .into());
        }

        let parent_claim = match kind {
            KeyKind::Operator => None,
            KeyKind::Account | KeyKind::Cluster => Some(self.decode_stored(
                KeyKind::Operator,
                None,
                &self.info.name,
            )?),
            KeyKind::User => Some(self.decode_stored(KeyKind::Account, None, parent.unwrap_or_default())?),
            KeyKind::Server => Some(self.decode_stored(KeyKind::Cluster, None, parent.unwrap_or_default())?),
        };
        chain::verify_issuer(&claim, parent_claim.as_ref())?;
        Ok(claim)
    }

    fn decode_stored(&self, kind: KeyKind, parent: Option<&str>, name: &str) -> Result<Claim> {
        Ok(Claim::decode(&extract_token(&self.read_raw(kind, parent, name)?))?)
    }

    pub fn read_operator_claim(&self) -> Result<Claim> {
        self.read(KeyKind::Operator, None, &self.info.name)
    }

    pub fn read_account_claim(&self, name: &str) -> Result<Claim> {
        self.read(KeyKind::Account, None, name)
    }

    pub fn read_user_claim(&self, account: &str, name: &str) -> Result<Claim> {
        self.read(KeyKind::User, Some(account), name)
    }

    pub fn read_cluster_claim(&self, name: &str) -> Result<Claim> {
        self.read(KeyKind::Cluster, None, name)
    }

    pub fn read_server_claim(&self, cluster: &str, name: &str) -> Result<Claim> {
        self.read(KeyKind::Server, Some(cluster), name)
    }

    /// Names of entities of `kind`, sorted
    pub fn list(&self, kind: KeyKind, parent: Option<&str>) -> Result<Vec<String>> {
        if kind == KeyKind::Operator {
            return Ok(vec![self.info.name.clone()]);
        }
        let dir = kind_dir(&self.dir, kind, parent)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir)(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_error(&dir))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            match kind {
                KeyKind::Account | KeyKind::Cluster => {
                    if self.has(kind, None, &name) {
                        names.push(name);
                    }
                }
                _ => {
                    if let Some(stem) = name.strip_suffix(&format!(".{}", CLAIM_EXTENSION)) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Name of the entity of `kind` whose subject is `subject`
    pub fn find_by_subject(&self, kind: KeyKind, subject: &str) -> Result<Option<String>> {
        for name in self.list(kind, None)? {
            let generic = decode_generic(&extract_token(&self.read_raw(kind, None, &name)?))?;
            if generic.sub == subject {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    /// Store a signed token, replacing any claim already at its place.
    ///
    /// The token is decoded to find where it belongs. Accounts and clusters
    /// must be issued by this store's operator; users and servers go under
    /// the account or cluster whose subject issued them. The token text is
    /// stored unchanged.
    pub fn write_raw(&self, token: &str) -> Result<PathBuf> {
        let generic = decode_generic(&extract_token(token))?;
        let (parent, name) = match generic.kind {
            KeyKind::Operator => {
                if generic.sub != self.info.operator {
                    return Err(ClaimError::ChainViolation(format!(
                        "operator {} is not the operator of store {:?}",
                        generic.sub, self.info.name
                    ))
                    .into());
                }
                (None, self.info.name.clone())
            }
            KeyKind::Account | KeyKind::Cluster => {
                if generic.iss != self.info.operator {
                    return Err(ClaimError::ChainViolation(format!(
                        "{} {:?} was not issued by operator {:?}",
                        generic.kind, generic.name, self.info.name
                    ))
                    .into());
                }
                (None, generic.name.clone())
            }
            KeyKind::User | KeyKind::Server => {
                let parent_kind = generic.kind.issuer_kind();
                let parent = self
                    .find_by_subject(parent_kind, &generic.iss)?
                    .ok_or_else(|| StoreError::UnknownIssuer {
                        kind: parent_kind,
                        issuer: generic.iss.clone(),
                    })?;
                (Some(parent), generic.name.clone())
            }
        };
        self.write_token(generic.kind, parent.as_deref(), &name, token)
    }

    fn write_token(
        &self,
        kind: KeyKind,
        parent: Option<&str>,
        name: &str,
        token: &str,
    ) -> Result<PathBuf> {
        let path = self.path_for(kind, parent, name)?;
        if let Some(dir) = path.parent() {
            create_dir(dir)?;
        }
        write_atomic(&path, token.as_bytes(), None)?;
        debug!(%kind, name, path = %path.display(), "wrote claim");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_claims::{AccountClaim, ClaimBody, OperatorClaim, UserClaim};
    use trellis_keys::KeyPair;

    fn token(name: &str, subject: &KeyPair, signer: &KeyPair, body: ClaimBody) -> String {
        Claim::new(name, &subject.public_key(), body)
            .encode(signer)
            .unwrap()
    }

    fn new_store(root: &Path) -> (KeyPair, ClaimStore) {
        let op = KeyPair::generate(KeyKind::Operator);
        let op_token = token(
            "acme",
            &op,
            &op,
            ClaimBody::Operator(OperatorClaim::default()),
        );
        let store = ClaimStore::create(root, "acme", &op_token).unwrap();
        (op, store)
    }

    #[test]
    fn test_create_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let (op, store) = new_store(dir.path());
        assert_eq!(store.operator_key(), op.public_key().encode());

        let opened = ClaimStore::open(dir.path(), "acme").unwrap();
        assert_eq!(opened.info(), store.info());
        assert_eq!(opened.read_operator_claim().unwrap().name, "acme");
    }

    #[test]
    fn test_create_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (op, _) = new_store(dir.path());
        let again = token("acme", &op, &op, ClaimBody::Operator(OperatorClaim::default()));
        assert!(matches!(
            ClaimStore::create(dir.path(), "acme", &again),
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_open_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ClaimStore::open(dir.path(), "nobody"),
            Err(StoreError::NotAStore(_))
        ));
    }

    #[test]
    fn test_write_raw_places_users_under_issuer() {
        let dir = tempfile::tempdir().unwrap();
        let (op, store) = new_store(dir.path());

        let billing = KeyPair::generate(KeyKind::Account);
        let ops = KeyPair::generate(KeyKind::Account);
        store
            .write_raw(&token("billing", &billing, &op, ClaimBody::Account(AccountClaim::default())))
            .unwrap();
        store
            .write_raw(&token("ops", &ops, &op, ClaimBody::Account(AccountClaim::default())))
            .unwrap();

        let alice = KeyPair::generate(KeyKind::User);
        let path = store
            .write_raw(&token("alice", &alice, &ops, ClaimBody::User(UserClaim::default())))
            .unwrap();

        assert_eq!(path, store.path_for(KeyKind::User, Some("ops"), "alice").unwrap());
        assert!(store.has(KeyKind::User, Some("ops"), "alice"));
        assert!(!store.has(KeyKind::User, Some("billing"), "alice"));
        assert_eq!(store.list(KeyKind::Account, None).unwrap(), vec!["billing", "ops"]);
        assert_eq!(store.list(KeyKind::User, Some("ops")).unwrap(), vec!["alice"]);

        let claim = store.read_user_claim("ops", "alice").unwrap();
        assert_eq!(claim.iss, ops.public_key().encode());
    }

    #[test]
    fn test_write_raw_rejects_foreign_account() {
        let dir = tempfile::tempdir().unwrap();
        let (_, store) = new_store(dir.path());
        let stranger = KeyPair::generate(KeyKind::Operator);
        let account = KeyPair::generate(KeyKind::Account);

        let err = store
            .write_raw(&token("billing", &account, &stranger, ClaimBody::Account(AccountClaim::default())))
            .unwrap_err();
        assert!(matches!(err, StoreError::Claim(ClaimError::ChainViolation(_))));
        assert!(!store.has(KeyKind::Account, None, "billing"));
    }

    #[test]
    fn test_write_raw_orphan_user() {
        let dir = tempfile::tempdir().unwrap();
        let (_, store) = new_store(dir.path());
        let account = KeyPair::generate(KeyKind::Account);
        let user = KeyPair::generate(KeyKind::User);

        assert!(matches!(
            store.write_raw(&token("alice", &user, &account, ClaimBody::User(UserClaim::default()))),
            Err(StoreError::UnknownIssuer {
                kind: KeyKind::Account,
                ..
            })
        ));
    }

    #[test]
    fn test_read_raw_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let (op, store) = new_store(dir.path());
        let account = KeyPair::generate(KeyKind::Account);
        let raw = token("billing", &account, &op, ClaimBody::Account(AccountClaim::default()));
        store.write_raw(&raw).unwrap();

        assert_eq!(store.read_raw(KeyKind::Account, None, "billing").unwrap(), raw);
    }

    #[test]
    fn test_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (_, store) = new_store(dir.path());
        assert!(matches!(
            store.read_account_claim("nope"),
            Err(StoreError::NotFound {
                kind: KeyKind::Account,
                ..
            })
        ));
        assert!(store.list(KeyKind::Cluster, None).unwrap().is_empty());
    }
}
