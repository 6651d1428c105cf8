use crate::core::block::BlockHash;
use crate::core::{Block, Transaction};
use crate::utils::sha256_array;
use data_encoding::HEXLOWER;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};

/// Hex characters in a SHA-256 digest
pub const MAX_DIFFICULTY: usize = 64;

// Proof-of-work candidates are hashed with a zero timestamp; the sealed block
// carries the real time and is not re-checked against the puzzle.
const CANDIDATE_TIMESTAMP: i64 = 0;

pub struct ProofOfWork {
    head: String,
    tail: String,
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new_proof_of_work(
        previous_hash: &BlockHash,
        transactions: &[Transaction],
        difficulty: usize,
    ) -> ProofOfWork {
        let mut head = String::new();
        Block::write_canonical_head(&mut head, CANDIDATE_TIMESTAMP);
        let mut tail = String::new();
        Block::write_canonical_tail(&mut tail, previous_hash, transactions);
        ProofOfWork {
            head,
            tail,
            difficulty,
        }
    }

    /// True iff the candidate block for `nonce` hashes to `difficulty` leading hex zeros.
    pub fn valid_proof(
        nonce: u64,
        previous_hash: &BlockHash,
        transactions: &[Transaction],
        difficulty: usize,
    ) -> bool {
        let guess_block = Block::with_timestamp(
            CANDIDATE_TIMESTAMP,
            nonce,
            *previous_hash,
            transactions.to_vec(),
        );
        meets_difficulty(&guess_block.hash(), difficulty)
    }

    /// Re-checks a sealed block's nonce against its own previous hash and transactions.
    pub fn validate(block: &Block, difficulty: usize) -> bool {
        Self::valid_proof(
            block.get_nonce(),
            block.get_previous_hash(),
            block.get_transactions(),
            difficulty,
        )
    }

    pub fn get_difficulty(&self) -> usize {
        self.difficulty
    }

    fn hash_with_nonce(&self, nonce: u64) -> BlockHash {
        let mut data = String::with_capacity(self.head.len() + 20 + self.tail.len());
        data.push_str(&self.head);
        data.push_str(&nonce.to_string());
        data.push_str(&self.tail);
        sha256_array(data.as_bytes())
    }

    /// Linear search from nonce 0, so the first hit is the smallest valid nonce.
    /// `cancel` is polled every `check_interval` attempts; `None` means the
    /// search was cancelled before a nonce was found.
    pub fn run(&self, cancel: &AtomicBool, check_interval: u64) -> Option<u64> {
        let check_interval = check_interval.max(1);
        info!("Mining the block (difficulty: {})", self.difficulty);
        for nonce in 0..=u64::MAX {
            if nonce % check_interval == 0 && cancel.load(Ordering::Relaxed) {
                info!("Proof-of-work cancelled after {nonce} attempts");
                return None;
            }
            let hash = self.hash_with_nonce(nonce);
            if meets_difficulty(&hash, self.difficulty) {
                debug!("Found nonce {nonce}: {}", HEXLOWER.encode(&hash));
                return Some(nonce);
            }
        }
        None
    }
}

/// Checks the leading `difficulty` nibbles of `hash` are zero, the same as
/// comparing the first `difficulty` characters of its hex form against '0'.
pub fn meets_difficulty(hash: &BlockHash, difficulty: usize) -> bool {
    if difficulty > MAX_DIFFICULTY {
        return false;
    }
    (0..difficulty).all(|idx| {
        let byte = hash[idx / 2];
        let nibble = if idx % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        nibble == 0
    })
}
