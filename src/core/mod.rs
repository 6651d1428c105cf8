//! Core ledger functionality
//!
//! This module contains the fundamental ledger components including
//! blocks, transactions, the chain itself, proof-of-work and the
//! background mining cadence.

pub mod block;
pub mod blockchain;
pub mod miner;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, BlockHash};
pub use blockchain::{AmountResponse, Blockchain, ChainSnapshot, MiningOutcome};
pub use miner::MiningScheduler;
pub use monetary::{
    CANCEL_CHECK_INTERVAL, MINING_DIFFICULTY, MINING_REWARD, MINING_SENDER, MINING_TIMER_SEC,
};
pub use proof_of_work::{meets_difficulty, ProofOfWork, MAX_DIFFICULTY};
pub use transaction::{
    validate_amount, verify_signature, Signature, SignedTransaction, Transaction,
    TransactionRequest,
};
