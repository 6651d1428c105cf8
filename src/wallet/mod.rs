//! Wallet management and cryptographic operations
//!
//! This module handles key generation, address derivation and
//! transaction signing for the ledger.

pub mod secret_key;
#[allow(clippy::module_inception)]
pub mod wallet;

pub use secret_key::SecretKey;
pub use wallet::{
    convert_address, hash_pub_key, validate_address, Wallet, ADDRESS_CHECK_SUM_LEN,
    ADDRESS_PAYLOAD_LEN,
};
