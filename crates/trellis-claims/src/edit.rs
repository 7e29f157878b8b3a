//! Per-kind claim editors.
//!
//! An editor holds the caller's requested changes and applies them to a
//! claim in progress. Handing an editor a claim of another kind fails with
//! [`ClaimError::TypeMismatch`].

use crate::{
    claim::{Claim, ClaimBody, Permissions},
    errors::*,
    time::TimeParams,
};
use trellis_keys::{KeyKind, PublicKey};

/// Applies caller-supplied changes to a claim
pub trait ClaimEditor: Send + Sync {
    /// Kind of claim this editor understands
    fn kind(&self) -> KeyKind;

    /// Apply the changes
    fn edit(&self, claim: &mut Claim) -> Result<()>;
}

fn mismatch(expected: KeyKind, claim: &Claim) -> ClaimError {
    ClaimError::TypeMismatch {
        expected,
        found: claim.kind(),
    }
}

fn add_unique(list: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !list.contains(value) {
            list.push(value.clone());
        }
    }
}

fn remove_all(list: &mut Vec<String>, values: &[String]) {
    list.retain(|v| !values.contains(v));
}

/// Changes to publish/subscribe permissions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionEdit {
    pub allow_publish: Vec<String>,
    pub allow_subscribe: Vec<String>,
    /// Subjects removed from both lists
    pub remove: Vec<String>,
}

impl PermissionEdit {
    pub fn apply(&self, permissions: &mut Permissions) {
        add_unique(&mut permissions.publish, &self.allow_publish);
        add_unique(&mut permissions.subscribe, &self.allow_subscribe);
        remove_all(&mut permissions.publish, &self.remove);
        remove_all(&mut permissions.subscribe, &self.remove);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorEdit {
    pub time: TimeParams,
    /// `Some("")` clears the URL
    pub account_server_url: Option<String>,
    pub add_service_urls: Vec<String>,
    pub remove_service_urls: Vec<String>,
}

impl ClaimEditor for OperatorEdit {
    fn kind(&self) -> KeyKind {
        KeyKind::Operator
    }

    fn edit(&self, claim: &mut Claim) -> Result<()> {
        if claim.kind() != KeyKind::Operator {
            return Err(mismatch(KeyKind::Operator, claim));
        }
        self.time.apply(claim)?;
        if let ClaimBody::Operator(operator) = &mut claim.body {
            if let Some(url) = &self.account_server_url {
                operator.account_server_url = (!url.is_empty()).then(|| url.clone());
            }
            add_unique(&mut operator.operator_service_urls, &self.add_service_urls);
            remove_all(&mut operator.operator_service_urls, &self.remove_service_urls);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountEdit {
    pub time: TimeParams,
    pub description: Option<String>,
    pub max_subscriptions: Option<i64>,
    pub max_connections: Option<i64>,
    pub max_data: Option<i64>,
    pub max_payload: Option<i64>,
}

impl ClaimEditor for AccountEdit {
    fn kind(&self) -> KeyKind {
        KeyKind::Account
    }

    fn edit(&self, claim: &mut Claim) -> Result<()> {
        if claim.kind() != KeyKind::Account {
            return Err(mismatch(KeyKind::Account, claim));
        }
        self.time.apply(claim)?;
        if let ClaimBody::Account(account) = &mut claim.body {
            if let Some(description) = &self.description {
                account.description = (!description.is_empty()).then(|| description.clone());
            }
            let limits = &mut account.limits;
            if let Some(v) = self.max_subscriptions {
                limits.subs = v;
            }
            if let Some(v) = self.max_connections {
                limits.conn = v;
            }
            if let Some(v) = self.max_data {
                limits.data = v;
            }
            if let Some(v) = self.max_payload {
                limits.payload = v;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEdit {
    pub time: TimeParams,
    pub permissions: PermissionEdit,
}

impl ClaimEditor for UserEdit {
    fn kind(&self) -> KeyKind {
        KeyKind::User
    }

    fn edit(&self, claim: &mut Claim) -> Result<()> {
        if claim.kind() != KeyKind::User {
            return Err(mismatch(KeyKind::User, claim));
        }
        self.time.apply(claim)?;
        if let ClaimBody::User(user) = &mut claim.body {
            self.permissions.apply(&mut user.permissions);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterEdit {
    pub time: TimeParams,
    /// Operators the cluster trusts
    pub trust: Vec<PublicKey>,
    pub cluster_urls: Vec<String>,
}

impl ClaimEditor for ClusterEdit {
    fn kind(&self) -> KeyKind {
        KeyKind::Cluster
    }

    fn edit(&self, claim: &mut Claim) -> Result<()> {
        if claim.kind() != KeyKind::Cluster {
            return Err(mismatch(KeyKind::Cluster, claim));
        }
        for key in &self.trust {
            key.expect_kind(KeyKind::Operator)?;
        }
        self.time.apply(claim)?;
        if let ClaimBody::Cluster(cluster) = &mut claim.body {
            let trust: Vec<String> = self.trust.iter().map(PublicKey::encode).collect();
            add_unique(&mut cluster.trust, &trust);
            add_unique(&mut cluster.cluster_urls, &self.cluster_urls);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerEdit {
    pub time: TimeParams,
    pub permissions: PermissionEdit,
}

impl ClaimEditor for ServerEdit {
    fn kind(&self) -> KeyKind {
        KeyKind::Server
    }

    fn edit(&self, claim: &mut Claim) -> Result<()> {
        if claim.kind() != KeyKind::Server {
            return Err(mismatch(KeyKind::Server, claim));
        }
        self.time.apply(claim)?;
        if let ClaimBody::Server(server) = &mut claim.body {
            self.permissions.apply(&mut server.permissions);
        }
        Ok(())
    }
}
