//! Trust chain rules.
//!
//! Accounts and clusters are issued by the operator, users by their account
//! and servers by their cluster. The operator issues its own claim.

use crate::{claim::Claim, errors::*};
use trellis_keys::{KeyKind, PublicKey};

/// The subject key of a claim must be of the claim's kind
pub fn verify_subject_kind(kind: KeyKind, subject: &PublicKey) -> Result<()> {
    if subject.kind() != kind {
        return Err(ClaimError::ChainViolation(format!(
            "subject {} is a {} key but the claim is a {} claim",
            subject,
            subject.kind(),
            kind
        )));
    }
    Ok(())
}

/// `signer` must be allowed to issue claims for `subject`
pub fn verify_signer(subject: &PublicKey, signer: &PublicKey) -> Result<()> {
    let expected = subject.kind().issuer_kind();
    if signer.kind() != expected {
        return Err(ClaimError::ChainViolation(format!(
            "{} claims must be signed by an {} key, not a {} key",
            subject.kind(),
            expected,
            signer.kind()
        )));
    }
    if subject.kind() == KeyKind::Operator && signer != subject {
        return Err(ClaimError::ChainViolation(
            "operator claims must be self-signed".to_string(),
        ));
    }
    Ok(())
}

/// Check that `claim` was issued by `parent`.
///
/// `parent` is `None` only for operator claims.
pub fn verify_issuer(claim: &Claim, parent: Option<&Claim>) -> Result<()> {
    let subject = claim.subject_key()?;
    let issuer = claim.issuer_key()?;
    verify_subject_kind(claim.kind(), &subject)?;
    verify_signer(&subject, &issuer)?;

    match (claim.kind(), parent) {
        (KeyKind::Operator, None) => Ok(()),
        (KeyKind::Operator, Some(_)) => Err(ClaimError::ChainViolation(
            "operators have no parent".to_string(),
        )),
        (kind, None) => Err(ClaimError::ChainViolation(format!(
            "{} {:?} has no parent",
            kind, claim.name
        ))),
        (kind, Some(parent)) => {
            if parent.kind() != kind.issuer_kind() {
                return Err(ClaimError::ChainViolation(format!(
                    "a {} cannot be the parent of a {}",
                    parent.kind(),
                    kind
                )));
            }
            if claim.iss != parent.sub {
                return Err(ClaimError::ChainViolation(format!(
                    "{} {:?} was issued by {}, not by {} {:?}",
                    kind,
                    claim.name,
                    claim.iss,
                    parent.kind(),
                    parent.name
                )));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{AccountClaim, ClaimBody, OperatorClaim};
    use trellis_keys::KeyPair;

    fn operator() -> (KeyPair, Claim) {
        let kp = KeyPair::generate(KeyKind::Operator);
        let mut claim = Claim::new(
            "acme",
            &kp.public_key(),
            ClaimBody::Operator(OperatorClaim::default()),
        );
        claim.encode(&kp).unwrap();
        (kp, claim)
    }

    #[test]
    fn test_account_issued_by_operator() {
        let (op_kp, op) = operator();
        let account = KeyPair::generate(KeyKind::Account);
        let mut claim = Claim::new(
            "billing",
            &account.public_key(),
            ClaimBody::Account(AccountClaim::default()),
        );
        claim.encode(&op_kp).unwrap();

        assert!(verify_issuer(&op, None).is_ok());
        assert!(verify_issuer(&claim, Some(&op)).is_ok());
        assert!(verify_issuer(&claim, None).is_err());
    }

    #[test]
    fn test_account_from_other_operator_rejected() {
        let (_, op) = operator();
        let (other_kp, _) = operator();
        let account = KeyPair::generate(KeyKind::Account);
        let mut claim = Claim::new(
            "billing",
            &account.public_key(),
            ClaimBody::Account(AccountClaim::default()),
        );
        claim.encode(&other_kp).unwrap();

        assert!(matches!(
            verify_issuer(&claim, Some(&op)),
            Err(ClaimError::ChainViolation(_))
        ));
    }

    #[test]
    fn test_signer_kind() {
        let user = KeyPair::generate(KeyKind::User).public_key();
        let account = KeyPair::generate(KeyKind::Account).public_key();
        let cluster = KeyPair::generate(KeyKind::Cluster).public_key();

        assert!(verify_signer(&user, &account).is_ok());
        assert!(verify_signer(&user, &cluster).is_err());
    }
}
