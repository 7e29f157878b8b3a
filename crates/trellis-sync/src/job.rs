//! A single pull and its reconciliation against the local store.

use crate::{errors::*, fetch::FetchResponse};
use tracing::{debug, warn};
use trellis_claims::{extract_token, Claim};
use trellis_keys::KeyKind;
use trellis_storage::ClaimStore;

/// One remote token to fetch, with the local version it would replace
#[derive(Debug)]
pub struct PullJob {
    /// Local name of the entity
    pub name: String,
    pub kind: KeyKind,
    /// Subject of the local claim
    pub subject: String,
    /// `iat` of the local claim
    pub local_iat: i64,
    pub url: String,
    /// Set once the fetch completes
    pub result: Option<Result<FetchResponse>>,
}

impl PullJob {
    /// Job for the operator claim at `<server>/operator`
    pub fn operator(claim: &Claim, server_url: &str) -> Self {
        Self::new(claim, format!("{}/operator", trim_url(server_url)))
    }

    /// Job for an account claim at `<server>/accounts/<subject>`
    pub fn account(claim: &Claim, server_url: &str) -> Self {
        Self::new(
            claim,
            format!("{}/accounts/{}", trim_url(server_url), claim.sub),
        )
    }

    fn new(claim: &Claim, url: String) -> Self {
        Self {
            name: claim.name.clone(),
            kind: claim.kind(),
            subject: claim.sub.clone(),
            local_iat: claim.iat,
            url,
            result: None,
        }
    }

    /// Apply the fetched token to `store`.
    ///
    /// The remote token must carry the same subject and name as the local
    /// claim. A local claim issued after the remote one is kept unless
    /// `overwrite` is set.
    pub fn reconcile(self, store: &ClaimStore, overwrite: bool) -> Result<Pulled> {
        let url = self.url;
        let response = self.result.ok_or_else(|| SyncError::Aborted { url: url.clone() })??;
        if !response.is_success() {
            return Err(SyncError::Status {
                url,
                status: response.status,
            });
        }
        let token = extract_token(&response.body);
        if token.is_empty() {
            return Err(SyncError::NoData { url });
        }
        let remote = Claim::decode(&token).map_err(|source| SyncError::Decode {
            url: url.clone(),
            source,
        })?;
        let kind = remote.kind();
        if !matches!(kind, KeyKind::Operator | KeyKind::Account) {
            return Err(SyncError::UnsupportedType { url, kind });
        }
        if remote.sub != self.subject {
            return Err(SyncError::SubjectMismatch {
                url,
                kind,
                expected: self.subject,
                found: remote.sub,
            });
        }
        if remote.name != self.name {
            return Err(SyncError::Renamed {
                kind,
                local: self.name,
                remote: remote.name,
            });
        }
        let replaced_newer = self.local_iat > remote.iat;
        if replaced_newer && !overwrite {
            warn!(kind = %kind, name = %self.name, local = self.local_iat, remote = remote.iat, "local claim is newer");
            return Err(SyncError::Conflict {
                kind,
                name: self.name,
            });
        }
        let path = store.write_raw(&token)?;
        debug!(url = %url, path = %path.display(), "stored pulled claim");
        Ok(Pulled {
            message: format!("pulled {} {:?} from the remote server", kind, remote.name),
            replaced_newer,
        })
    }
}

/// Outcome of a reconciled job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pulled {
    pub message: String,
    /// The local claim was newer and `--overwrite` replaced it
    pub replaced_newer: bool,
}

fn trim_url(url: &str) -> &str {
    url.trim_end_matches('/')
}
