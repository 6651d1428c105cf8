//! Utility functions and helpers
//!
//! This module contains cryptographic utilities, encoding functions,
//! and the canonical text encoding used for hashing and signing.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, check_key_pair, current_timestamp,
    ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    parse_public_key_hex, public_key_coordinates, ripemd160_digest, sha256_array, sha256_digest,
    P256_FIELD_LEN, P256_PUBLIC_KEY_LEN,
};

pub use serialization::{format_amount, write_json_string, write_key, CanonicalEncode};
