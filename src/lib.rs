//! # pow-ledger - a single-node proof-of-work ledger
//!
//! An append-only chain of blocks, each sealing the pool of signed transfers
//! that was pending when it was mined, plus the wallet side that creates
//! identities and signs transfers.
//!
//! ## How the code is organized
//! - `core/`: blocks, transactions, the ledger, proof-of-work, the mining cadence
//! - `wallet/`: P-256 key pairs, base58check addresses, signing
//! - `storage/`: the in-memory pending-transaction pool
//! - `config/`: mining and admission settings
//! - `utils/`: hashing, encoding and the canonical text form that gets hashed
//! - `cli/`: command-line parsing for the `pow-ledger` binary
//!
//! ## Flow
//! A [`Wallet`] signs a transfer, [`Blockchain::submit_transaction`] admits it
//! after checking the signature, and a mining round (run directly with
//! [`Blockchain::mine`] or on a timer by [`MiningScheduler`]) snapshots the
//! pool, solves the puzzle against the tip and appends the new block.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::{AdmissionPolicy, Config, Settings, GLOBAL_CONFIG};
pub use core::{
    verify_signature, AmountResponse, Block, BlockHash, Blockchain, ChainSnapshot,
    MiningOutcome, MiningScheduler, ProofOfWork, Signature, SignedTransaction, Transaction,
    TransactionRequest, MINING_DIFFICULTY, MINING_REWARD, MINING_SENDER, MINING_TIMER_SEC,
};
pub use error::{BlockchainError, Result};
pub use storage::MemoryPool;
pub use utils::{base58_decode, base58_encode, ripemd160_digest, sha256_digest, CanonicalEncode};
pub use wallet::{
    convert_address, hash_pub_key, validate_address, Wallet, ADDRESS_CHECK_SUM_LEN,
};
