//! Claim model and token codec.
//!
//! A token is `header.payload.signature`, each part base64url without
//! padding. The header is fixed (`{"typ":"JWT","alg":"ed25519"}`), the
//! payload holds the common claim fields plus `type` and `data`, and the
//! signature is Ed25519 over `header.payload` by the key named in `iss`.

use crate::{chain, errors::*, time::current_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use trellis_keys::{
    encoding::{base64_url_decode, base64_url_encode},
    extract_armored, sign_message, verify_signature, KeyKind, KeyPair, PublicKey,
};

/// Token type written in every header
pub const TOKEN_TYPE: &str = "JWT";

/// Signing algorithm written in every header
pub const SIGNING_ALGORITHM: &str = "ed25519";

/// Limit value meaning "no limit"
pub const NO_LIMIT: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenHeader {
    typ: String,
    alg: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            typ: TOKEN_TYPE.to_string(),
            alg: SIGNING_ALGORITHM.to_string(),
        }
    }
}

/// Operator attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorClaim {
    /// Base URL of the service publishing account claims; pull fetches from here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_server_url: Option<String>,
    /// URLs of services run by the operator
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operator_service_urls: Vec<String>,
}

/// Account resource limits; [`NO_LIMIT`] means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountLimits {
    /// Maximum subscriptions
    pub subs: i64,
    /// Maximum connections
    pub conn: i64,
    /// Maximum data in bytes
    pub data: i64,
    /// Maximum message payload in bytes
    pub payload: i64,
}

impl Default for AccountLimits {
    fn default() -> Self {
        Self {
            subs: NO_LIMIT,
            conn: NO_LIMIT,
            data: NO_LIMIT,
            payload: NO_LIMIT,
        }
    }
}

/// Account attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountClaim {
    pub limits: AccountLimits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Publish/subscribe permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publish: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subscribe: Vec<String>,
}

/// User attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserClaim {
    pub permissions: Permissions,
}

/// Cluster attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterClaim {
    /// Operator public keys trusted by the cluster
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trust: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cluster_urls: Vec<String>,
}

/// Server attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerClaim {
    pub permissions: Permissions,
}

/// Kind-specific part of a claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimBody {
    Operator(OperatorClaim),
    Account(AccountClaim),
    User(UserClaim),
    Cluster(ClusterClaim),
    Server(ServerClaim),
}

impl ClaimBody {
    /// Kind of entity this body describes
    pub fn kind(&self) -> KeyKind {
        match self {
            ClaimBody::Operator(_) => KeyKind::Operator,
            ClaimBody::Account(_) => KeyKind::Account,
            ClaimBody::User(_) => KeyKind::User,
            ClaimBody::Cluster(_) => KeyKind::Cluster,
            ClaimBody::Server(_) => KeyKind::Server,
        }
    }

    /// Empty body for `kind`
    pub fn default_for(kind: KeyKind) -> Self {
        match kind {
            KeyKind::Operator => ClaimBody::Operator(OperatorClaim::default()),
            KeyKind::Account => ClaimBody::Account(AccountClaim::default()),
            KeyKind::User => ClaimBody::User(UserClaim::default()),
            KeyKind::Cluster => ClaimBody::Cluster(ClusterClaim::default()),
            KeyKind::Server => ClaimBody::Server(ServerClaim::default()),
        }
    }

    fn to_data(&self) -> Result<Value> {
        let data = match self {
            ClaimBody::Operator(body) => serde_json::to_value(body)?,
            ClaimBody::Account(body) => serde_json::to_value(body)?,
            ClaimBody::User(body) => serde_json::to_value(body)?,
            ClaimBody::Cluster(body) => serde_json::to_value(body)?,
            ClaimBody::Server(body) => serde_json::to_value(body)?,
        };
        Ok(data)
    }

    fn from_data(kind: KeyKind, data: Value) -> Result<Self> {
        if data.is_null() {
            return Ok(Self::default_for(kind));
        }
        let body = match kind {
            KeyKind::Operator => ClaimBody::Operator(serde_json::from_value(data)?),
            KeyKind::Account => ClaimBody::Account(serde_json::from_value(data)?),
            KeyKind::User => ClaimBody::User(serde_json::from_value(data)?),
            KeyKind::Cluster => ClaimBody::Cluster(serde_json::from_value(data)?),
            KeyKind::Server => ClaimBody::Server(serde_json::from_value(data)?),
        };
        Ok(body)
    }
}

/// Common claim fields, readable without interpreting the kind-specific data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericClaim {
    #[serde(default)]
    pub jti: String,
    pub iat: i64,
    pub iss: String,
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(rename = "type")]
    pub kind: KeyKind,
}

impl GenericClaim {
    /// Subject public key
    pub fn subject_key(&self) -> Result<PublicKey> {
        Ok(self.sub.parse()?)
    }

    /// Issuer public key
    pub fn issuer_key(&self) -> Result<PublicKey> {
        Ok(self.iss.parse()?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    #[serde(flatten)]
    common: GenericClaim,
    #[serde(default)]
    data: Value,
}

/// A trust assertion binding a subject key to a name and attributes.
///
/// Once encoded the claim is final; an edit decodes it, changes fields and
/// encodes a new token with a later `iat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Content hash of the claim
    pub jti: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Issuer public key
    pub iss: String,
    /// Subject public key
    pub sub: String,
    /// Entity name
    pub name: String,
    /// Not valid before
    pub nbf: Option<i64>,
    /// Not valid after
    pub exp: Option<i64>,
    /// Kind-specific attributes
    pub body: ClaimBody,
}

impl Claim {
    /// Start a claim for `subject` with an empty issuer
    pub fn new(name: impl Into<String>, subject: &PublicKey, body: ClaimBody) -> Self {
        Self {
            jti: String::new(),
            iat: current_timestamp(),
            iss: String::new(),
            sub: subject.encode(),
            name: name.into(),
            nbf: None,
            exp: None,
            body,
        }
    }

    /// Kind of entity described
    pub fn kind(&self) -> KeyKind {
        self.body.kind()
    }

    /// Subject public key
    pub fn subject_key(&self) -> Result<PublicKey> {
        Ok(self.sub.parse()?)
    }

    /// Issuer public key
    pub fn issuer_key(&self) -> Result<PublicKey> {
        Ok(self.iss.parse()?)
    }

    /// Common fields
    pub fn generic(&self) -> GenericClaim {
        GenericClaim {
            jti: self.jti.clone(),
            iat: self.iat,
            iss: self.iss.clone(),
            sub: self.sub.clone(),
            name: self.name.clone(),
            nbf: self.nbf,
            exp: self.exp,
            kind: self.kind(),
        }
    }

    /// Set `iat` to now, or to one past the previous version's `iat` if that is later
    pub fn touch(&mut self, previous_iat: Option<i64>) {
        let now = current_timestamp();
        self.iat = match previous_iat {
            Some(previous) => now.max(previous.saturating_add(1)),
            None => now,
        };
    }

    /// Sign the claim with `signer` and return the token.
    ///
    /// Sets `iss` to the signer and `jti` to the content hash. The signer must
    /// be of the kind that issues this claim's kind; operators sign themselves.
    pub fn encode(&mut self, signer: &KeyPair) -> Result<String> {
        let subject = self.subject_key()?;
        let issuer = signer.public_key();
        chain::verify_subject_kind(self.kind(), &subject)?;
        chain::verify_signer(&subject, &issuer)?;

        self.iss = issuer.encode();
        self.jti = String::new();
        let unsigned = serde_json::to_vec(&self.payload()?)?;
        self.jti = base64_url_encode(&Sha256::digest(&unsigned));

        let header = base64_url_encode(&serde_json::to_vec(&TokenHeader::default())?);
        let payload = base64_url_encode(&serde_json::to_vec(&self.payload()?)?);
        let signing_input = format!("{}.{}", header, payload);
        let signature = sign_message(signer, signing_input.as_bytes());

        Ok(format!("{}.{}", signing_input, base64_url_encode(&signature)))
    }

    /// Decode a token, verifying its signature and subject/issuer kinds
    pub fn decode(token: &str) -> Result<Claim> {
        let Payload { common, data } = decode_payload(token)?;
        let body = ClaimBody::from_data(common.kind, data)?;
        Ok(Claim {
            jti: common.jti,
            iat: common.iat,
            iss: common.iss,
            sub: common.sub,
            name: common.name,
            nbf: common.nbf,
            exp: common.exp,
            body,
        })
    }

    fn payload(&self) -> Result<Payload> {
        Ok(Payload {
            common: self.generic(),
            data: self.body.to_data()?,
        })
    }
}

/// Decode the common fields of a token without interpreting its data.
///
/// The signature is verified the same way as [`Claim::decode`].
pub fn decode_generic(token: &str) -> Result<GenericClaim> {
    Ok(decode_payload(token)?.common)
}

fn b64(part: &str) -> Result<Vec<u8>> {
    base64_url_decode(part).map_err(|e| ClaimError::Decode(e.to_string()))
}

fn split_token(token: &str) -> Result<(&str, &str, &str)> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(ClaimError::Decode(
            "expected three dot-separated parts".to_string(),
        )),
    }
}

fn decode_payload(token: &str) -> Result<Payload> {
    let token = token.trim();
    let (header_part, payload_part, signature_part) = split_token(token)?;

    let header: TokenHeader = serde_json::from_slice(&b64(header_part)?)
        .map_err(|e| ClaimError::Decode(format!("header: {}", e)))?;
    if header.typ != TOKEN_TYPE || !header.alg.eq_ignore_ascii_case(SIGNING_ALGORITHM) {
        return Err(ClaimError::UnsupportedHeader(format!(
            "typ={} alg={}",
            header.typ, header.alg
        )));
    }

    let payload: Payload = serde_json::from_slice(&b64(payload_part)?)
        .map_err(|e| ClaimError::Decode(format!("payload: {}", e)))?;
    let issuer = payload
        .common
        .issuer_key()
        .map_err(|e| ClaimError::Decode(format!("issuer: {}", e)))?;
    let subject = payload
        .common
        .subject_key()
        .map_err(|e| ClaimError::Decode(format!("subject: {}", e)))?;

    let signing_input = &token[..header_part.len() + 1 + payload_part.len()];
    verify_signature(&issuer, signing_input.as_bytes(), &b64(signature_part)?).map_err(|_| {
        ClaimError::InvalidSignature {
            issuer: payload.common.iss.clone(),
        }
    })?;

    chain::verify_subject_kind(payload.common.kind, &subject)?;
    chain::verify_signer(&subject, &issuer)?;
    Ok(payload)
}

/// Strip armour and whitespace from text holding a token
pub fn extract_token(text: &str) -> String {
    extract_armored(text)
}

/// Wrap a token in `-----BEGIN <KIND> JWT-----` armour
pub fn armor(kind: KeyKind, token: &str) -> String {
    let label = kind.as_str().to_uppercase();
    format!(
        "-----BEGIN {label} JWT-----\n{token}\n------END {label} JWT------\n\n",
        label = label,
        token = token
    )
}
