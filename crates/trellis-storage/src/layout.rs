//! On-disk layout shared by the claim store and the key store name index.
//!
//! ```text
//! <operator>/<operator>.<ext>
//! <operator>/Accounts/<account>/<account>.<ext>
//! <operator>/Accounts/<account>/Users/<user>.<ext>
//! <operator>/Clusters/<cluster>/<cluster>.<ext>
//! <operator>/Clusters/<cluster>/Servers/<server>.<ext>
//! ```

use crate::errors::*;
use std::path::{Path, PathBuf};
use trellis_keys::KeyKind;

/// Directory holding account subtrees
pub const ACCOUNTS_DIR: &str = "Accounts";

/// Directory holding user claims within an account
pub const USERS_DIR: &str = "Users";

/// Directory holding cluster subtrees
pub const CLUSTERS_DIR: &str = "Clusters";

/// Directory holding server claims within a cluster
pub const SERVERS_DIR: &str = "Servers";

/// Extension of claim files
pub const CLAIM_EXTENSION: &str = "jwt";

/// Extension of key store name index files
pub const PUBLIC_KEY_EXTENSION: &str = "pub";

/// Store info file name
pub const INFO_FILE: &str = ".trellis";

/// Reject names that are not a single plain path component
pub fn validate_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0']);
    if !plain {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn require_parent(kind: KeyKind, parent: Option<&str>) -> Result<&str> {
    let parent = parent.ok_or(StoreError::MissingParent { kind })?;
    validate_name(parent)?;
    Ok(parent)
}

/// Directory listing entities of `kind` (under `parent` for users and servers)
pub fn kind_dir(base: &Path, kind: KeyKind, parent: Option<&str>) -> Result<PathBuf> {
    Ok(match kind {
        KeyKind::Operator => base.to_path_buf(),
        KeyKind::Account => base.join(ACCOUNTS_DIR),
        KeyKind::Cluster => base.join(CLUSTERS_DIR),
        KeyKind::User => base
            .join(ACCOUNTS_DIR)
            .join(require_parent(kind, parent)?)
            .join(USERS_DIR),
        KeyKind::Server => base
            .join(CLUSTERS_DIR)
            .join(require_parent(kind, parent)?)
            .join(SERVERS_DIR),
    })
}

/// File for entity `name` of `kind`, relative to the operator directory `base`
pub fn entity_path(
    base: &Path,
    kind: KeyKind,
    parent: Option<&str>,
    name: &str,
    extension: &str,
) -> Result<PathBuf> {
    validate_name(name)?;
    let file = format!("{}.{}", name, extension);
    let dir = kind_dir(base, kind, parent)?;
    Ok(match kind {
        KeyKind::Operator | KeyKind::User | KeyKind::Server => dir.join(file),
        KeyKind::Account | KeyKind::Cluster => dir.join(name).join(file),
    })
}
