//! Key sizes and encoding constants.

/// Size of Ed25519 public keys in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of Ed25519 seeds in bytes
pub const SEED_SIZE: usize = 32;

/// Size of Ed25519 signatures in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Size of the checksum appended to encoded keys
pub const CHECKSUM_SIZE: usize = 2;

/// Leading character of every encoded seed
pub const SEED_PREFIX: char = 'S';

/// Key specification keyword that explicitly requests a fresh key pair
pub const GENERATE_KEYWORD: &str = "generate";

/// File extension used for seed files
pub const SEED_FILE_EXTENSION: &str = "nk";
