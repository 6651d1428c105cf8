use crate::error::{BlockchainError, Result};
use crate::utils::P256_FIELD_LEN;
use data_encoding::HEXLOWER;
use zeroize::ZeroizeOnDrop;

/// Private scalar wrapper that zeros its memory on drop
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct SecretKey {
    key: Vec<u8>,
}

impl SecretKey {
    pub fn new(key: Vec<u8>) -> Result<Self> {
        if key.len() != P256_FIELD_LEN {
            return Err(BlockchainError::Wallet(format!(
                "Private key must be {P256_FIELD_LEN} bytes, got {}",
                key.len()
            )));
        }
        Ok(Self { key })
    }

    /// Get key bytes (use carefully)
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Fixed-width lowercase hex, 64 characters
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.key)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("length", &self.key.len())
            .finish()
    }
}
