//! Identity kinds and their key prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of identity a key belongs to.
///
/// The hierarchy is Operator → Account → User and Operator → Cluster → Server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Root of the trust hierarchy, self-signed
    Operator,
    /// Signed by an operator, signs users
    Account,
    /// Signed by an account
    User,
    /// Signed by an operator, signs servers
    Cluster,
    /// Signed by a cluster
    Server,
}

impl KeyKind {
    /// All kinds, in hierarchy order.
    pub const ALL: [KeyKind; 5] = [
        KeyKind::Operator,
        KeyKind::Account,
        KeyKind::User,
        KeyKind::Cluster,
        KeyKind::Server,
    ];

    /// One-letter prefix of encoded public keys of this kind
    pub fn prefix(self) -> char {
        match self {
            KeyKind::Operator => 'O',
            KeyKind::Account => 'A',
            KeyKind::User => 'U',
            KeyKind::Cluster => 'C',
            KeyKind::Server => 'N',
        }
    }

    /// Look up a kind by its public prefix
    pub fn from_prefix(prefix: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.prefix() == prefix)
    }

    /// Lowercase name, as used in claim tokens
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Operator => "operator",
            KeyKind::Account => "account",
            KeyKind::User => "user",
            KeyKind::Cluster => "cluster",
            KeyKind::Server => "server",
        }
    }

    /// The kind that signs identities of this kind.
    ///
    /// Operators sign themselves.
    pub fn issuer_kind(self) -> KeyKind {
        match self {
            KeyKind::Operator | KeyKind::Account | KeyKind::Cluster => KeyKind::Operator,
            KeyKind::User => KeyKind::Account,
            KeyKind::Server => KeyKind::Cluster,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
