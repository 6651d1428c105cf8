use crate::core::SignedTransaction;
use crate::error::{BlockchainError, Result};
use crate::utils::{
    base58_decode, base58_encode, check_key_pair, ecdsa_p256_sha256_sign_digest, new_key_pair,
    parse_public_key_hex, public_key_coordinates, ripemd160_digest, sha256_digest,
};
use crate::wallet::SecretKey;
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Serialize, Serializer};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;
const PUB_KEY_HASH_LEN: usize = 20;
/// version + RIPEMD-160 hash + checksum
pub const ADDRESS_PAYLOAD_LEN: usize = 1 + PUB_KEY_HASH_LEN + ADDRESS_CHECK_SUM_LEN;

#[derive(Clone, Debug)]
pub struct Wallet {
    private_key: SecretKey,
    public_key: Vec<u8>,
    address: String,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let (private_key, public_key) = new_key_pair()?;
        Self::from_parts(SecretKey::new(private_key)?, public_key)
    }

    /// Rebuilds a wallet from its hex keys; the two halves must belong together.
    pub fn from_key_hex(private_key_hex: &str, public_key_hex: &str) -> Result<Wallet> {
        let private_key = HEXLOWER_PERMISSIVE
            .decode(private_key_hex.trim().as_bytes())
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key hex: {e}")))?;
        let private_key = SecretKey::new(private_key)?;
        let public_key = parse_public_key_hex(public_key_hex)?;
        check_key_pair(private_key.as_bytes(), &public_key)
            .map_err(|e| BlockchainError::Wallet(format!("Keys do not form a pair: {e}")))?;
        Self::from_parts(private_key, public_key)
    }

    fn from_parts(private_key: SecretKey, public_key: Vec<u8>) -> Result<Wallet> {
        let address = convert_address(&hash_pub_key(&public_key));
        Ok(Wallet {
            private_key,
            public_key,
            address,
        })
    }

    pub fn get_address(&self) -> &str {
        &self.address
    }

    /// Uncompressed SEC1 public key (0x04 || X || Y)
    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn private_key_hex(&self) -> String {
        self.private_key.to_hex()
    }

    /// X || Y as 128 lowercase hex characters
    pub fn public_key_hex(&self) -> String {
        HEXLOWER.encode(public_key_coordinates(&self.public_key))
    }

    /// Raw ECDSA P-256 / SHA-256 signature over `message`, as `r || s`.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign_digest(self.private_key.as_bytes(), &self.public_key, message)
    }

    pub fn sign_transaction(&self, recipient: &str, amount: f64) -> Result<SignedTransaction> {
        SignedTransaction::sign(self, recipient, amount)
    }
}

impl Serialize for Wallet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct WalletView<'a> {
            private_key: String,
            public_key: String,
            blockchain_address: &'a str,
        }

        WalletView {
            private_key: self.private_key_hex(),
            public_key: self.public_key_hex(),
            blockchain_address: &self.address,
        }
        .serialize(serializer)
    }
}

/// RIPEMD-160(SHA-256(X || Y)); the SEC1 tag byte is not hashed.
pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = sha256_digest(public_key_coordinates(pub_key));
    ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first_sha = sha256_digest(payload);
    let second_sha = sha256_digest(first_sha.as_slice());
    second_sha[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

pub fn validate_address(address: &str) -> bool {
    let payload = match base58_decode(address) {
        Ok(payload) => payload,
        Err(_) => return false,
    };

    if payload.len() != ADDRESS_PAYLOAD_LEN || payload[0] != VERSION {
        return false;
    }

    let (versioned, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    checksum(versioned).as_slice() == actual_checksum
}

pub fn convert_address(pub_hash_key: &[u8]) -> String {
    let mut payload: Vec<u8> = Vec::with_capacity(ADDRESS_PAYLOAD_LEN);
    payload.push(VERSION);
    payload.extend(pub_hash_key);
    let checksum = checksum(payload.as_slice());
    payload.extend(checksum.as_slice());
    // version + pub_key_hash + checksum
    base58_encode(payload.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_deterministic() {
        let wallet = Wallet::new().unwrap();
        let again = convert_address(&hash_pub_key(wallet.get_public_key()));
        assert_eq!(wallet.get_address(), again);
        assert!(validate_address(wallet.get_address()));
    }

    #[test]
    fn test_address_pipeline_byte_layout() {
        let wallet = Wallet::new().unwrap();
        let payload = base58_decode(wallet.get_address()).unwrap();
        assert_eq!(payload.len(), ADDRESS_PAYLOAD_LEN);
        assert_eq!(payload[0], 0x00);

        let coordinates = &wallet.get_public_key()[1..];
        let expected_hash = ripemd160_digest(&sha256_digest(coordinates));
        assert_eq!(&payload[1..21], expected_hash.as_slice());

        let double_sha = sha256_digest(&sha256_digest(&payload[..21]));
        assert_eq!(&payload[21..], &double_sha[..4]);
        // Version byte 0x00 always renders as a leading '1'
        assert!(wallet.get_address().starts_with('1'));
    }

    #[test]
    fn test_validate_address_rejects_tampering() {
        let wallet = Wallet::new().unwrap();
        let mut payload = base58_decode(wallet.get_address()).unwrap();
        payload[5] ^= 0x01;
        assert!(!validate_address(&base58_encode(&payload)));
        assert!(!validate_address("THE BLOCKCHAIN"));
        assert!(!validate_address(""));
    }

    #[test]
    fn test_hex_accessors_are_fixed_width() {
        let wallet = Wallet::new().unwrap();
        assert_eq!(wallet.private_key_hex().len(), 64);
        assert_eq!(wallet.public_key_hex().len(), 128);
    }

    #[test]
    fn test_wallet_round_trips_through_hex_keys() {
        let wallet = Wallet::new().unwrap();
        let restored =
            Wallet::from_key_hex(&wallet.private_key_hex(), &wallet.public_key_hex()).unwrap();
        assert_eq!(restored.get_address(), wallet.get_address());
        assert_eq!(restored.get_public_key(), wallet.get_public_key());
    }

    #[test]
    fn test_from_key_hex_rejects_mismatched_keys() {
        let wallet = Wallet::new().unwrap();
        let other = Wallet::new().unwrap();
        let result = Wallet::from_key_hex(&wallet.private_key_hex(), &other.public_key_hex());
        assert!(matches!(result, Err(BlockchainError::Wallet(_))));
    }

    #[test]
    fn test_wallet_json_shape() {
        let wallet = Wallet::new().unwrap();
        let json = serde_json::to_value(&wallet).unwrap();
        assert_eq!(json["blockchain_address"], wallet.get_address());
        assert_eq!(json["public_key"], wallet.public_key_hex());
        assert_eq!(json["private_key"], wallet.private_key_hex());
    }
}
