use ring::digest::{digest, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED,
    ECDSA_P256_SHA256_FIXED_SIGNING,
};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER_PERMISSIVE;
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of a P-256 scalar or coordinate in bytes
pub const P256_FIELD_LEN: usize = 32;
/// Uncompressed SEC1 point: 0x04 || X || Y
pub const P256_PUBLIC_KEY_LEN: usize = 1 + 2 * P256_FIELD_LEN;

const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

// ECPrivateKey version 1 followed by the 32-byte OCTET STRING header
const PKCS8_PRIVATE_KEY_MARKER: [u8; 5] = [0x02, 0x01, 0x01, 0x04, 0x20];

/// Wall-clock time in nanoseconds since the unix epoch
pub fn current_timestamp() -> Result<i64> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Crypto(format!("clock is before the unix epoch: {e}")))?
        .as_nanos();
    i64::try_from(nanos).map_err(|_| {
        BlockchainError::Crypto("nanosecond timestamp does not fit in i64".to_string())
    })
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

/// SHA-256 into a fixed array, for block hashes
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    Ripemd160::digest(data).to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| BlockchainError::InvalidAddress(format!("not base58: {e}")))
}

/// Generates a fresh P-256 key pair and returns `(private scalar, uncompressed public key)`.
pub fn new_key_pair() -> Result<(Vec<u8>, Vec<u8>)> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?;
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
        .map_err(|e| {
            BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    let private_key = private_key_from_pkcs8(pkcs8.as_ref())?;
    let public_key = key_pair.public_key().as_ref().to_vec();
    Ok((private_key, public_key))
}

/// ring only hands out PKCS#8 documents, so the raw scalar is read back out of
/// the embedded ECPrivateKey structure.
// This relies on the fixed template ring uses for P-256 PKCS#8 output; the
// scalar is the first 32-byte OCTET STRING after version 1. If a ring upgrade
// changes that layout, `check_key_pair` in `test_new_key_pair_shapes` fails.
fn private_key_from_pkcs8(pkcs8: &[u8]) -> Result<Vec<u8>> {
    let start = pkcs8
        .windows(PKCS8_PRIVATE_KEY_MARKER.len())
        .position(|window| window == PKCS8_PRIVATE_KEY_MARKER)
        .map(|idx| idx + PKCS8_PRIVATE_KEY_MARKER.len())
        .ok_or_else(|| {
            BlockchainError::Crypto("PKCS8 document carries no EC private key".to_string())
        })?;
    pkcs8
        .get(start..start + P256_FIELD_LEN)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| BlockchainError::Crypto("Truncated EC private key".to_string()))
}

fn key_pair_from_parts(private_key: &[u8], public_key: &[u8]) -> Result<EcdsaKeyPair> {
    let rng = SystemRandom::new();
    EcdsaKeyPair::from_private_key_and_public_key(
        &ECDSA_P256_SHA256_FIXED_SIGNING,
        private_key,
        public_key,
        &rng,
    )
    .map_err(|e| BlockchainError::Crypto(format!("Rejected key pair: {e}")))
}

/// Checks that a private scalar and public point belong together.
pub fn check_key_pair(private_key: &[u8], public_key: &[u8]) -> Result<()> {
    key_pair_from_parts(private_key, public_key).map(|_| ())
}

/// Signs `message` with ECDSA P-256. ring hashes the message with SHA-256
/// first; the result is the fixed-width `r || s` encoding.
pub fn ecdsa_p256_sha256_sign_digest(
    private_key: &[u8],
    public_key: &[u8],
    message: &[u8],
) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = key_pair_from_parts(private_key, public_key)?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| BlockchainError::Crypto(format!("ECDSA signing failed: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

pub fn ecdsa_p256_sha256_sign_verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key)
        .verify(message, signature)
        .is_ok()
}

/// Parses a hex public key into its uncompressed SEC1 form. Accepts the bare
/// `X || Y` form (128 hex chars) and the tagged `04 || X || Y` form.
pub fn parse_public_key_hex(public_key_hex: &str) -> Result<Vec<u8>> {
    let bytes = HEXLOWER_PERMISSIVE
        .decode(public_key_hex.trim().as_bytes())
        .map_err(|e| BlockchainError::Crypto(format!("Invalid public key hex: {e}")))?;
    match bytes.len() {
        len if len == 2 * P256_FIELD_LEN => {
            let mut public_key = Vec::with_capacity(P256_PUBLIC_KEY_LEN);
            public_key.push(SEC1_UNCOMPRESSED_TAG);
            public_key.extend_from_slice(&bytes);
            Ok(public_key)
        }
        P256_PUBLIC_KEY_LEN if bytes[0] == SEC1_UNCOMPRESSED_TAG => Ok(bytes),
        len => Err(BlockchainError::Crypto(format!(
            "Public key must be {} bytes, got {len}",
            2 * P256_FIELD_LEN
        ))),
    }
}

/// Drops the SEC1 tag, leaving the concatenated big-endian coordinates.
pub fn public_key_coordinates(public_key: &[u8]) -> &[u8] {
    match public_key.first() {
        Some(&SEC1_UNCOMPRESSED_TAG) if public_key.len() == P256_PUBLIC_KEY_LEN => &public_key[1..],
        _ => public_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_encoding::HEXLOWER;

    #[test]
    fn test_sha256_known_vector() {
        let digest = sha256_digest(b"abc");
        assert_eq!(
            HEXLOWER.encode(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_array(b"abc").to_vec(), digest);
    }

    #[test]
    fn test_ripemd160_known_vector() {
        let digest = ripemd160_digest(b"abc");
        assert_eq!(
            HEXLOWER.encode(&digest),
            "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"
        );
    }

    #[test]
    fn test_base58_round_trip() {
        let data = [0u8, 1, 2, 3, 255];
        let encoded = base58_encode(&data);
        assert!(encoded.starts_with('1'));
        assert_eq!(base58_decode(&encoded).unwrap(), data.to_vec());
        assert!(base58_decode("0OIl").is_err());
    }

    #[test]
    fn test_new_key_pair_shapes() {
        let (private_key, public_key) = new_key_pair().unwrap();
        assert_eq!(private_key.len(), P256_FIELD_LEN);
        assert_eq!(public_key.len(), P256_PUBLIC_KEY_LEN);
        assert_eq!(public_key[0], 0x04);
        assert!(check_key_pair(&private_key, &public_key).is_ok());
    }

    #[test]
    fn test_sign_and_verify() {
        let (private_key, public_key) = new_key_pair().unwrap();
        let message = b"pay 1.0";
        let signature = ecdsa_p256_sha256_sign_digest(&private_key, &public_key, message).unwrap();
        assert_eq!(signature.len(), 2 * P256_FIELD_LEN);
        assert!(ecdsa_p256_sha256_sign_verify(&public_key, &signature, message));
        assert!(!ecdsa_p256_sha256_sign_verify(&public_key, &signature, b"pay 2.0"));
    }

    #[test]
    fn test_mismatched_key_pair_rejected() {
        let (private_key, _) = new_key_pair().unwrap();
        let (_, other_public) = new_key_pair().unwrap();
        assert!(check_key_pair(&private_key, &other_public).is_err());
    }

    #[test]
    fn test_parse_public_key_hex_forms() {
        let (_, public_key) = new_key_pair().unwrap();
        let bare = HEXLOWER.encode(&public_key[1..]);
        let tagged = HEXLOWER.encode(&public_key);
        assert_eq!(parse_public_key_hex(&bare).unwrap(), public_key);
        assert_eq!(parse_public_key_hex(&tagged).unwrap(), public_key);
        assert!(parse_public_key_hex("abcd").is_err());
        assert!(parse_public_key_hex("zz").is_err());
        assert_eq!(public_key_coordinates(&public_key), &public_key[1..]);
    }
}
