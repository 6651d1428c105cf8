//! Mining constants
//!
//! Defaults for the mining protocol. Each one can be overridden through
//! [`crate::config::Settings`].

/// Reserved sender identity for reward transactions issued by the ledger itself
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Amount credited to the ledger's own address for every sealed block
pub const MINING_REWARD: f64 = 1.0;

/// Leading hexadecimal zeros a block hash needs
pub const MINING_DIFFICULTY: usize = 3;

/// Seconds between scheduled mining rounds
pub const MINING_TIMER_SEC: u64 = 20;

/// Proof-of-work attempts between cancellation checks
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;
