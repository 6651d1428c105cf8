//! Test utilities for ledger testing

use crate::config::Settings;
use crate::core::{Blockchain, MiningOutcome};
use crate::wallet::Wallet;
use std::thread;
use std::time::{Duration, Instant};

/// Difficulty 1 keeps proof-of-work to a handful of attempts
pub fn fast_settings() -> Settings {
    Settings {
        difficulty: 1,
        mining_interval_secs: 1,
        ..Settings::default()
    }
}

/// A ledger whose mining address belongs to the returned wallet, after one
/// sealed round. The wallet holds exactly one mining reward.
pub fn funded_ledger(settings: Settings) -> (Blockchain, Wallet) {
    let miner = Wallet::new().expect("wallet creation");
    let blockchain =
        Blockchain::with_settings(miner.get_address(), settings).expect("ledger creation");

    let bystander = Wallet::new().expect("wallet creation");
    let zero_transfer = bystander
        .sign_transaction(miner.get_address(), 0.0)
        .expect("signing");
    blockchain
        .submit_signed(&zero_transfer)
        .expect("zero-value transfer admitted");

    match blockchain.mine().expect("mining round") {
        MiningOutcome::Sealed(_) => {}
        other => panic!("expected a sealed block, got {other:?}"),
    }
    (blockchain, miner)
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_for<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
