// This file holds the value-transfer model: the plain transaction triple that
// gets sealed into blocks, the detached signature a wallet produces over it,
// and the request shape an outside caller uses to submit one.

use crate::core::MINING_SENDER;
use crate::error::{BlockchainError, Result};
use crate::utils::{
    ecdsa_p256_sha256_sign_verify, format_amount, parse_public_key_hex, public_key_coordinates,
    write_json_string, write_key, CanonicalEncode, P256_FIELD_LEN,
};
use crate::wallet::Wallet;
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Serialize};
use std::fmt;

// A transfer of `value` from one address to another. Field names double as the
// wire names and the canonical encoding keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    sender_blockchain_address: String,
    recipient_blockchain_address: String,
    value: f64,
}

impl Transaction {
    pub fn new(sender: &str, recipient: &str, value: f64) -> Transaction {
        Transaction {
            sender_blockchain_address: sender.to_string(),
            recipient_blockchain_address: recipient.to_string(),
            value,
        }
    }

    // When the ledger pays itself for sealing a block, the sender is the reserved issuer
    pub fn new_reward_tx(to: &str, reward: f64) -> Transaction {
        Transaction::new(MINING_SENDER, to, reward)
    }

    pub fn get_sender(&self) -> &str {
        &self.sender_blockchain_address
    }

    pub fn get_recipient(&self) -> &str {
        &self.recipient_blockchain_address
    }

    pub fn get_value(&self) -> f64 {
        self.value
    }

    pub fn is_reward(&self) -> bool {
        self.sender_blockchain_address == MINING_SENDER
    }
}

impl CanonicalEncode for Transaction {
    fn write_canonical(&self, out: &mut String) {
        out.push('{');
        write_key(out, "sender_blockchain_address");
        write_json_string(out, &self.sender_blockchain_address);
        out.push(',');
        write_key(out, "recipient_blockchain_address");
        write_json_string(out, &self.recipient_blockchain_address);
        out.push(',');
        write_key(out, "value");
        out.push_str(&format_amount(self.value));
        out.push('}');
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(
            f,
            " sender_blockchain_address      {}",
            self.sender_blockchain_address
        )?;
        writeln!(
            f,
            " recipient_blockchain_address   {}",
            self.recipient_blockchain_address
        )?;
        write!(f, " value                          {:.1}", self.value)
    }
}

/// Amounts must be finite and non-negative.
pub fn validate_amount(value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(BlockchainError::Transaction(format!(
            "Amount must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// ECDSA signature pair, each half a 32-byte big-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: [u8; P256_FIELD_LEN],
    s: [u8; P256_FIELD_LEN],
}

impl Signature {
    /// Splits a fixed-width `r || s` encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != 2 * P256_FIELD_LEN {
            return Err(BlockchainError::Crypto(format!(
                "Signature must be {} bytes, got {}",
                2 * P256_FIELD_LEN,
                bytes.len()
            )));
        }
        let mut r = [0u8; P256_FIELD_LEN];
        let mut s = [0u8; P256_FIELD_LEN];
        r.copy_from_slice(&bytes[..P256_FIELD_LEN]);
        s.copy_from_slice(&bytes[P256_FIELD_LEN..]);
        Ok(Signature { r, s })
    }

    pub fn from_hex(signature_hex: &str) -> Result<Signature> {
        let bytes = HEXLOWER_PERMISSIVE
            .decode(signature_hex.trim().as_bytes())
            .map_err(|e| BlockchainError::Crypto(format!("Invalid signature hex: {e}")))?;
        Signature::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 * P256_FIELD_LEN);
        bytes.extend_from_slice(&self.r);
        bytes.extend_from_slice(&self.s);
        bytes
    }

    /// `r` then `s`, each as 64 lowercase hex characters
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.to_bytes())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Checks `signature` over `transaction` against `public_key`. A bad key or a
/// bad signature is an ordinary `false`, never an error.
pub fn verify_signature(
    public_key: &[u8],
    signature: &Signature,
    transaction: &Transaction,
) -> bool {
    ecdsa_p256_sha256_sign_verify(
        public_key,
        &signature.to_bytes(),
        &transaction.canonical_bytes(),
    )
}

/// A transaction together with the sender's public key and the detached
/// signature the sender's wallet produced over it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    transaction: Transaction,
    sender_public_key: Vec<u8>,
    signature: Signature,
}

impl SignedTransaction {
    // Only a wallet holding the sender's private key can produce one of these
    pub(crate) fn sign(wallet: &Wallet, recipient: &str, amount: f64) -> Result<SignedTransaction> {
        validate_amount(amount)?;
        let transaction = Transaction::new(wallet.get_address(), recipient, amount);
        // ring hashes the canonical bytes with SHA-256 before signing
        let raw = wallet.sign(&transaction.canonical_bytes())?;
        Ok(SignedTransaction {
            transaction,
            sender_public_key: wallet.get_public_key().to_vec(),
            signature: Signature::from_bytes(&raw)?,
        })
    }

    pub fn get_transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn get_sender_public_key(&self) -> &[u8] {
        &self.sender_public_key
    }

    pub fn get_signature(&self) -> &Signature {
        &self.signature
    }

    pub fn verify(&self) -> bool {
        verify_signature(&self.sender_public_key, &self.signature, &self.transaction)
    }
}

/// Submission request as an outside caller sends it. Every field is optional
/// on the wire so a missing one can be reported instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_blockchain_address: Option<String>,
    pub recipient_blockchain_address: Option<String>,
    pub sender_public_key: Option<String>,
    pub value: Option<f64>,
    pub signature: Option<String>,
}

impl TransactionRequest {
    pub fn from_signed(signed: &SignedTransaction) -> TransactionRequest {
        TransactionRequest {
            sender_blockchain_address: Some(signed.transaction.get_sender().to_string()),
            recipient_blockchain_address: Some(signed.transaction.get_recipient().to_string()),
            sender_public_key: Some(HEXLOWER.encode(public_key_coordinates(
                &signed.sender_public_key,
            ))),
            value: Some(signed.transaction.get_value()),
            signature: Some(signed.signature.to_hex()),
        }
    }

    pub fn validate(&self) -> bool {
        self.missing_fields().is_empty()
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender_blockchain_address.is_none() {
            missing.push("sender_blockchain_address");
        }
        if self.recipient_blockchain_address.is_none() {
            missing.push("recipient_blockchain_address");
        }
        if self.sender_public_key.is_none() {
            missing.push("sender_public_key");
        }
        if self.value.is_none() {
            missing.push("value");
        }
        if self.signature.is_none() {
            missing.push("signature");
        }
        missing
    }

    /// Parses the request into a signed transaction. Says nothing about whether
    /// the signature verifies; that is the ledger's admission check.
    pub fn to_signed(&self) -> Result<SignedTransaction> {
        let (Some(sender), Some(recipient), Some(public_key), Some(value), Some(signature)) = (
            self.sender_blockchain_address.as_deref(),
            self.recipient_blockchain_address.as_deref(),
            self.sender_public_key.as_deref(),
            self.value,
            self.signature.as_deref(),
        ) else {
            return Err(BlockchainError::MalformedRequest(format!(
                "missing fields: {}",
                self.missing_fields().join(", ")
            )));
        };

        let sender_public_key = parse_public_key_hex(public_key)
            .map_err(|e| BlockchainError::MalformedRequest(e.to_string()))?;
        let signature = Signature::from_hex(signature)
            .map_err(|e| BlockchainError::MalformedRequest(e.to_string()))?;

        Ok(SignedTransaction {
            transaction: Transaction::new(sender, recipient, value),
            sender_public_key,
            signature,
        })
    }
}
