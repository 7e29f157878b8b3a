//! Text encoding of keys.
//!
//! Public keys are `<kind prefix><base64url(key || checksum)>` and seeds are
//! `S<kind prefix><base64url(seed || checksum)>`. The checksum is the first
//! [`CHECKSUM_SIZE`] bytes of SHA-256 over the prefix characters followed by
//! the raw key bytes.

use crate::{constants::*, errors::*, kinds::KeyKind};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// URL-safe base64 encoding without padding
pub fn base64_url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// URL-safe base64 decoding without padding
pub fn base64_url_decode(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| KeyError::InvalidEncoding(e.to_string()))
}

fn checksum(prefix: &str, payload: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(payload);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

fn encode_with_prefix(prefix: &str, key: &[u8; 32]) -> String {
    let mut payload = Zeroizing::new(Vec::with_capacity(32 + CHECKSUM_SIZE));
    payload.extend_from_slice(key);
    payload.extend_from_slice(&checksum(prefix, key));
    format!("{}{}", prefix, base64_url_encode(&payload))
}

fn decode_payload(prefix: &str, body: &str) -> Result<Zeroizing<[u8; 32]>> {
    let raw = Zeroizing::new(base64_url_decode(body)?);
    if raw.len() != 32 + CHECKSUM_SIZE {
        return Err(KeyError::InvalidKeySize {
            expected: 32 + CHECKSUM_SIZE,
            actual: raw.len(),
        });
    }
    let (key, sum) = raw.split_at(32);
    if checksum(prefix, key) != sum {
        return Err(KeyError::ChecksumMismatch);
    }
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(key);
    Ok(out)
}

fn split_prefix(input: &str) -> Result<(char, &str)> {
    let mut chars = input.chars();
    let first = chars
        .next()
        .ok_or_else(|| KeyError::InvalidEncoding("empty key".to_string()))?;
    Ok((first, chars.as_str()))
}

/// Encode a public key
pub fn encode_public(kind: KeyKind, key: &[u8; PUBLIC_KEY_SIZE]) -> String {
    encode_with_prefix(&kind.prefix().to_string(), key)
}

/// Decode an encoded public key into its kind and raw bytes
pub fn decode_public(input: &str) -> Result<(KeyKind, [u8; PUBLIC_KEY_SIZE])> {
    let (first, body) = split_prefix(input.trim())?;
    let kind = KeyKind::from_prefix(first).ok_or(KeyError::UnknownPrefix(first))?;
    let key = decode_payload(&first.to_string(), body)?;
    Ok((kind, *key))
}

/// Encode a seed. The returned string is zeroized on drop.
pub fn encode_seed(kind: KeyKind, seed: &[u8; SEED_SIZE]) -> Zeroizing<String> {
    let prefix = format!("{}{}", SEED_PREFIX, kind.prefix());
    Zeroizing::new(encode_with_prefix(&prefix, seed))
}

/// Decode an encoded seed into its kind and raw bytes
pub fn decode_seed(input: &str) -> Result<(KeyKind, Zeroizing<[u8; SEED_SIZE]>)> {
    let input = input.trim();
    let (first, rest) = split_prefix(input)?;
    if first != SEED_PREFIX {
        return Err(KeyError::InvalidEncoding(
            "seeds must start with 'S'".to_string(),
        ));
    }
    let (kind_char, body) = split_prefix(rest)?;
    let kind = KeyKind::from_prefix(kind_char).ok_or(KeyError::UnknownPrefix(kind_char))?;
    let seed = decode_payload(&format!("{}{}", SEED_PREFIX, kind_char), body)?;
    Ok((kind, seed))
}

/// Whether the string looks like an encoded seed (it may still fail to decode)
pub fn looks_like_seed(input: &str) -> bool {
    let mut chars = input.trim().chars();
    chars.next() == Some(SEED_PREFIX) && chars.next().and_then(KeyKind::from_prefix).is_some()
}

/// Pull the payload out of armoured text.
///
/// Accepts text like
///
/// ```text
/// -----BEGIN ACCOUNT JWT-----
/// eyJ0eXAi...
/// ------END ACCOUNT JWT------
/// ```
///
/// and returns the first non-empty line between the markers. Text without
/// markers is returned with all whitespace removed.
pub fn extract_armored(text: &str) -> String {
    let mut inside = false;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("---") {
            if line.contains("BEGIN") {
                inside = true;
            } else if line.contains("END") {
                inside = false;
            }
            continue;
        }
        if inside && !line.is_empty() {
            return line.to_string();
        }
    }
    text.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_round_trip() {
        let key = [7u8; 32];
        let encoded = encode_public(KeyKind::Account, &key);
        assert!(encoded.starts_with('A'));

        let (kind, decoded) = decode_public(&encoded).unwrap();
        assert_eq!(kind, KeyKind::Account);
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_seed_round_trip() {
        let seed = [9u8; 32];
        let encoded = encode_seed(KeyKind::Server, &seed);
        assert!(encoded.starts_with("SN"));
        assert!(looks_like_seed(&encoded));

        let (kind, decoded) = decode_seed(&encoded).unwrap();
        assert_eq!(kind, KeyKind::Server);
        assert_eq!(*decoded, seed);
    }

    #[test]
    fn test_corrupted_key_rejected() {
        let encoded = encode_public(KeyKind::User, &[1u8; 32]);
        // Swap the kind prefix: the checksum covers it
        let tampered = format!("A{}", &encoded[1..]);
        assert!(matches!(
            decode_public(&tampered),
            Err(KeyError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let encoded = encode_public(KeyKind::User, &[1u8; 32]);
        let tampered = format!("X{}", &encoded[1..]);
        assert!(matches!(
            decode_public(&tampered),
            Err(KeyError::UnknownPrefix('X'))
        ));
    }

    #[test]
    fn test_public_key_is_not_a_seed() {
        let encoded = encode_public(KeyKind::Operator, &[3u8; 32]);
        assert!(!looks_like_seed(&encoded));
        assert!(decode_seed(&encoded).is_err());
    }

    #[test]
    fn test_extract_armored() {
        let text = "-----BEGIN ACCOUNT JWT-----\n  abc.def.ghi  \n------END ACCOUNT JWT------\n\n";
        assert_eq!(extract_armored(text), "abc.def.ghi");

        assert_eq!(extract_armored("  abc.def.ghi\n"), "abc.def.ghi");
    }
}
