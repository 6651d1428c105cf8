use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{current_timestamp, sha256_array, write_json_string, write_key, CanonicalEncode};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type BlockHash = [u8; 32];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    timestamp: i64,
    nonce: u64,
    #[serde(with = "hex_hash")]
    previous_hash: BlockHash,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Stamps the current time. `transactions` is taken by value so the block
    /// keeps its own copy of whatever the pool held at sealing time.
    pub fn new(nonce: u64, previous_hash: BlockHash, transactions: Vec<Transaction>) -> Result<Block> {
        Ok(Block::with_timestamp(
            current_timestamp()?,
            nonce,
            previous_hash,
            transactions,
        ))
    }

    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: BlockHash,
        transactions: Vec<Transaction>,
    ) -> Block {
        Block {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// Hash of the empty default block, which the genesis block points back to.
    pub fn genesis_previous_hash() -> BlockHash {
        Block::default().hash()
    }

    pub fn hash(&self) -> BlockHash {
        sha256_array(&self.canonical_bytes())
    }

    pub fn hash_hex(&self) -> String {
        HEXLOWER.encode(&self.hash())
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_previous_hash(&self) -> &BlockHash {
        &self.previous_hash
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    // The canonical form is split around the nonce so proof-of-work can build
    // the fixed parts once and only re-render the number per attempt.
    pub(crate) fn write_canonical_head(out: &mut String, timestamp: i64) {
        out.push('{');
        write_key(out, "timestamp");
        out.push_str(&timestamp.to_string());
        out.push(',');
        write_key(out, "nonce");
    }

    pub(crate) fn write_canonical_tail(
        out: &mut String,
        previous_hash: &BlockHash,
        transactions: &[Transaction],
    ) {
        out.push(',');
        write_key(out, "previous_hash");
        write_json_string(out, &HEXLOWER.encode(previous_hash));
        out.push(',');
        write_key(out, "transactions");
        out.push('[');
        for (idx, transaction) in transactions.iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            transaction.write_canonical(out);
        }
        out.push_str("]}");
    }
}

impl CanonicalEncode for Block {
    fn write_canonical(&self, out: &mut String) {
        Block::write_canonical_head(out, self.timestamp);
        out.push_str(&self.nonce.to_string());
        Block::write_canonical_tail(out, &self.previous_hash, &self.transactions);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "timestamp       {}", self.timestamp)?;
        writeln!(f, "nonce           {}", self.nonce)?;
        write!(f, "previous_hash   {}", HEXLOWER.encode(&self.previous_hash))?;
        for transaction in &self.transactions {
            write!(f, "\n{transaction}")?;
        }
        Ok(())
    }
}

/// Hashes travel as lowercase hex strings on the wire.
mod hex_hash {
    use super::BlockHash;
    use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &BlockHash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&HEXLOWER.encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BlockHash, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = HEXLOWER_PERMISSIVE
            .decode(text.as_bytes())
            .map_err(D::Error::custom)?;
        BlockHash::try_from(bytes.as_slice())
            .map_err(|_| D::Error::custom(format!("hash must be 32 bytes, got {}", bytes.len())))
    }
}
