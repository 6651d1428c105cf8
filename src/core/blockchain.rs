// This is the ledger - the chain of sealed blocks plus the pool of admitted
// transactions waiting for the next one. Everything lives in memory for the
// lifetime of the process and is shared between callers through cheap clones.

use crate::config::{AdmissionPolicy, Settings};
use crate::core::{
    validate_amount, verify_signature, Block, ProofOfWork, Signature, SignedTransaction,
    Transaction, TransactionRequest, MINING_SENDER,
};
use crate::error::{BlockchainError, Result};
use crate::storage::MemoryPool;
use crate::wallet::{convert_address, hash_pub_key};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

// The chain and the pool change together, so they sit behind one mutex
struct LedgerState {
    chain: Vec<Block>,
    pool: MemoryPool,
}

/// What a mining round did.
#[derive(Debug, Clone, PartialEq)]
pub enum MiningOutcome {
    /// A block was sealed and appended to the chain
    Sealed(Block),
    /// The pool was empty; nothing changed
    NothingToMine,
    /// Proof-of-work was cancelled; chain and pool are as they were
    Cancelled,
}

impl MiningOutcome {
    pub fn is_sealed(&self) -> bool {
        matches!(self, MiningOutcome::Sealed(_))
    }
}

#[derive(Clone)]
pub struct Blockchain {
    state: Arc<Mutex<LedgerState>>,
    // Held for a whole mining round so two rounds never build on the same tip
    mining_lock: Arc<Mutex<()>>,
    blockchain_address: String,
    settings: Arc<Settings>,
}

impl Blockchain {
    // When I want a fresh ledger with the reference mining parameters
    pub fn new(blockchain_address: &str) -> Result<Blockchain> {
        Self::with_settings(blockchain_address, Settings::default())
    }

    pub fn with_settings(blockchain_address: &str, settings: Settings) -> Result<Blockchain> {
        settings.validate()?;

        info!("Creating genesis block for address: {blockchain_address}");
        let genesis = Block::new(0, Block::genesis_previous_hash(), Vec::new())?;

        if settings.admission_policy == AdmissionPolicy::SignatureOnly {
            warn!("Balance check is disabled: admission verifies signatures only and does not reject double spends");
        }
        if !settings.require_key_ownership {
            warn!("Key ownership check is disabled: any valid signature is accepted for any sender address");
        }

        Ok(Blockchain {
            state: Arc::new(Mutex::new(LedgerState {
                chain: vec![genesis],
                pool: MemoryPool::new(),
            })),
            mining_lock: Arc::new(Mutex::new(())),
            blockchain_address: blockchain_address.to_string(),
            settings: Arc::new(settings),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, LedgerState> {
        self.state
            .lock()
            .expect("Failed to acquire ledger state lock - this should never happen")
    }

    pub fn get_blockchain_address(&self) -> &str {
        &self.blockchain_address
    }

    pub fn get_settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get_chain(&self) -> Vec<Block> {
        self.lock_state().chain.clone()
    }

    pub fn get_transaction_pool(&self) -> Vec<Transaction> {
        self.lock_state().pool.get_all()
    }

    pub fn last_block(&self) -> Block {
        let state = self.lock_state();
        state
            .chain
            .last()
            .cloned()
            .expect("Chain always holds the genesis block")
    }

    /// Height of the tip; the genesis block is height 0.
    pub fn get_best_height(&self) -> usize {
        self.lock_state().chain.len() - 1
    }

    // This is the boundary an outside caller goes through: every field must be
    // present and parsable before the signature is even looked at
    pub fn create_transaction(&self, request: &TransactionRequest) -> Result<()> {
        let signed = request.to_signed().map_err(|e| {
            error!("Rejected transaction request: {e}");
            e
        })?;
        self.submit_signed(&signed)
    }

    pub fn submit_signed(&self, signed: &SignedTransaction) -> Result<()> {
        let transaction = signed.get_transaction();
        self.submit_transaction(
            transaction.get_sender(),
            transaction.get_recipient(),
            transaction.get_value(),
            signed.get_sender_public_key(),
            signed.get_signature(),
        )
    }

    /// Admits a signed transfer into the pool. The reserved issuer identity is
    /// refused here; reward transactions only come from the mining round.
    pub fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        value: f64,
        sender_public_key: &[u8],
        signature: &Signature,
    ) -> Result<()> {
        validate_amount(value)?;

        if sender == MINING_SENDER {
            error!("Rejected transaction claiming the reserved sender identity");
            return Err(BlockchainError::Transaction(format!(
                "Sender '{MINING_SENDER}' is reserved for mining rewards"
            )));
        }

        if self.settings.require_key_ownership
            && convert_address(&hash_pub_key(sender_public_key)) != sender
        {
            error!("ERROR: Verify Transaction - public key does not belong to {sender}");
            return Err(BlockchainError::SenderKeyMismatch(format!(
                "public key does not derive address {sender}"
            )));
        }

        let transaction = Transaction::new(sender, recipient, value);
        if !verify_signature(sender_public_key, signature, &transaction) {
            error!("ERROR: Verify Transaction");
            return Err(BlockchainError::InvalidSignature(format!(
                "signature does not match transaction from {sender}"
            )));
        }

        let mut state = self.lock_state();
        if self.settings.admission_policy == AdmissionPolicy::RequireBalance {
            let available =
                total_amount_in(&state.chain, sender) - state.pool.pending_outflow(sender);
            if available < value {
                error!("ERROR: Not enough balance in a wallet");
                return Err(BlockchainError::InsufficientFunds {
                    required: value,
                    available,
                });
            }
        }
        state.pool.add(transaction);
        debug!(
            "Admitted transaction from {sender} to {recipient} ({value}); pool size {}",
            state.pool.len()
        );
        Ok(())
    }

    // When I want to run one mining round to completion
    pub fn mine(&self) -> Result<MiningOutcome> {
        self.mine_with_cancel(&AtomicBool::new(false))
    }

    /// One mining round. The pool is snapshotted under the state lock, the
    /// puzzle is solved without it, and only the snapshotted transactions are
    /// removed when the block is appended. Transactions admitted meanwhile wait
    /// for the next round.
    pub fn mine_with_cancel(&self, cancel: &AtomicBool) -> Result<MiningOutcome> {
        let _round = self
            .mining_lock
            .lock()
            .expect("Failed to acquire mining lock - this should never happen");

        let (previous_hash, transactions, sealed_count) = {
            let state = self.lock_state();
            if state.pool.is_empty() {
                debug!("action=mining, status=nothing to mine");
                return Ok(MiningOutcome::NothingToMine);
            }
            let mut transactions = state.pool.get_all();
            let sealed_count = transactions.len();
            // The reward always goes last, after everything already queued
            transactions.push(Transaction::new_reward_tx(
                &self.blockchain_address,
                self.settings.mining_reward,
            ));
            let previous_hash = state
                .chain
                .last()
                .map(Block::hash)
                .expect("Chain always holds the genesis block");
            (previous_hash, transactions, sealed_count)
        };

        let pow = ProofOfWork::new_proof_of_work(
            &previous_hash,
            &transactions,
            self.settings.difficulty,
        );
        let nonce = match pow.run(cancel, self.settings.cancel_check_interval) {
            Some(nonce) => nonce,
            None => {
                warn!("action=mining, status=cancelled");
                return Ok(MiningOutcome::Cancelled);
            }
        };

        let block = Block::new(nonce, previous_hash, transactions)?;
        {
            let mut state = self.lock_state();
            let tip = state.chain.last().map(Block::hash);
            if tip != Some(previous_hash) {
                return Err(BlockchainError::Mining(
                    "chain tip moved during proof-of-work".to_string(),
                ));
            }
            state.chain.push(block.clone());
            state.pool.remove_sealed(sealed_count);
        }

        info!(
            "action=mining, status=success, nonce={nonce}, transactions={}, hash={}",
            block.get_transactions().len(),
            block.hash_hex()
        );
        Ok(MiningOutcome::Sealed(block))
    }

    /// Net amount `address` has received minus sent across every sealed block.
    pub fn calculate_total_amount(&self, address: &str) -> f64 {
        total_amount_in(&self.lock_state().chain, address)
    }

    /// Re-checks linkage and proof-of-work for the whole chain.
    pub fn is_chain_valid(&self) -> bool {
        let state = self.lock_state();
        let Some(genesis) = state.chain.first() else {
            return false;
        };
        if *genesis.get_previous_hash() != Block::genesis_previous_hash() {
            return false;
        }
        state.chain.windows(2).all(|pair| {
            *pair[1].get_previous_hash() == pair[0].hash()
                && ProofOfWork::validate(&pair[1], self.settings.difficulty)
        })
    }

    pub fn get_snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            chains: self.get_chain(),
        }
    }

    /// `{"chains": [...]}`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.get_snapshot())?)
    }
}

fn total_amount_in(chain: &[Block], address: &str) -> f64 {
    let mut total_amount = 0.0;
    for block in chain {
        for transaction in block.get_transactions() {
            let value = transaction.get_value();
            if address == transaction.get_recipient() {
                total_amount += value;
            }
            if address == transaction.get_sender() {
                total_amount -= value;
            }
        }
    }
    total_amount
}

/// Point-in-time copy of the chain, in its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chains: Vec<Block>,
}

impl fmt::Display for ChainSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.chains.iter().enumerate() {
            writeln!(f, "{} Chain {} {}", "=".repeat(25), i, "=".repeat(25))?;
            writeln!(f, "{block}")?;
        }
        write!(f, "{}", "*".repeat(25))
    }
}

/// Balance query response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountResponse {
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{fast_settings, funded_ledger, wait_for};
    use crate::utils::CanonicalEncode;
    use crate::wallet::Wallet;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_ledger_has_genesis_only() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let chain = blockchain.get_chain();

        assert_eq!(chain.len(), 1);
        assert_eq!(blockchain.get_best_height(), 0);
        assert_eq!(chain[0].get_nonce(), 0);
        assert_eq!(*chain[0].get_previous_hash(), Block::genesis_previous_hash());
        assert!(chain[0].get_transactions().is_empty());
        assert!(blockchain.get_transaction_pool().is_empty());
        assert!(blockchain.is_chain_valid());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            difficulty: 100,
            ..fast_settings()
        };
        assert!(Blockchain::with_settings("miner", settings).is_err());
    }

    #[test]
    fn test_mine_empty_pool_is_noop() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        assert_eq!(blockchain.mine().unwrap(), MiningOutcome::NothingToMine);
        assert_eq!(blockchain.get_chain().len(), 1);
    }

    #[test]
    fn test_reserved_sender_refused() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let wallet = Wallet::new().unwrap();
        let signed = wallet.sign_transaction("bob", 1.0).unwrap();

        let result = blockchain.submit_transaction(
            MINING_SENDER,
            "bob",
            1.0,
            wallet.get_public_key(),
            signed.get_signature(),
        );
        assert!(matches!(result, Err(BlockchainError::Transaction(_))));
        assert!(blockchain.get_transaction_pool().is_empty());
    }

    // Signed by `signer` over a transfer that claims to come from `owner`
    fn foreign_key_transfer(owner: &Wallet, signer: &Wallet) -> (Transaction, Signature) {
        let transaction = Transaction::new(owner.get_address(), signer.get_address(), 5.0);
        let raw = signer.sign(&transaction.canonical_bytes()).unwrap();
        (transaction, Signature::from_bytes(&raw).unwrap())
    }

    #[test]
    fn test_foreign_key_admitted_by_default() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let alice = Wallet::new().unwrap();
        let mallory = Wallet::new().unwrap();
        let (transaction, signature) = foreign_key_transfer(&alice, &mallory);
        assert!(verify_signature(mallory.get_public_key(), &signature, &transaction));

        blockchain
            .submit_transaction(
                alice.get_address(),
                mallory.get_address(),
                5.0,
                mallory.get_public_key(),
                &signature,
            )
            .unwrap();
        assert_eq!(blockchain.get_transaction_pool(), vec![transaction]);
    }

    #[test]
    fn test_key_ownership_check_refuses_foreign_key() {
        let settings = Settings {
            require_key_ownership: true,
            ..fast_settings()
        };
        let blockchain = Blockchain::with_settings("miner", settings).unwrap();
        let alice = Wallet::new().unwrap();
        let mallory = Wallet::new().unwrap();
        let (_, signature) = foreign_key_transfer(&alice, &mallory);

        let result = blockchain.submit_transaction(
            alice.get_address(),
            mallory.get_address(),
            5.0,
            mallory.get_public_key(),
            &signature,
        );
        assert!(matches!(result, Err(BlockchainError::SenderKeyMismatch(_))));
        assert!(blockchain.get_transaction_pool().is_empty());

        // The owner's own key still goes through
        blockchain
            .submit_signed(&alice.sign_transaction("bob", 1.0).unwrap())
            .unwrap();
        assert_eq!(blockchain.get_transaction_pool().len(), 1);
    }

    #[test]
    fn test_duplicate_submissions_each_queue() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let wallet = Wallet::new().unwrap();
        let signed = wallet.sign_transaction("bob", 1.0).unwrap();

        blockchain.submit_signed(&signed).unwrap();
        blockchain.submit_signed(&signed).unwrap();
        assert_eq!(blockchain.get_transaction_pool().len(), 2);
    }

    #[test]
    fn test_mined_block_layout() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let first = Wallet::new().unwrap();
        let second = Wallet::new().unwrap();
        blockchain
            .submit_signed(&first.sign_transaction("bob", 1.0).unwrap())
            .unwrap();
        blockchain
            .submit_signed(&second.sign_transaction("carol", 2.0).unwrap())
            .unwrap();
        let previous = blockchain.last_block();

        let block = match blockchain.mine().unwrap() {
            MiningOutcome::Sealed(block) => block,
            other => panic!("expected a sealed block, got {other:?}"),
        };

        let txs = block.get_transactions();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].get_sender(), first.get_address());
        assert_eq!(txs[1].get_sender(), second.get_address());
        assert!(txs[2].is_reward());
        assert_eq!(txs[2].get_recipient(), "miner");
        assert_eq!(*block.get_previous_hash(), previous.hash());
        assert!(ProofOfWork::validate(&block, 1));
        assert!(blockchain.get_transaction_pool().is_empty());
        assert_eq!(blockchain.last_block(), block);
        assert!(blockchain.is_chain_valid());
    }

    #[test]
    fn test_transfer_admitted_mid_round_waits_for_next_block() {
        let settings = Settings {
            difficulty: 4,
            ..fast_settings()
        };
        let blockchain = Blockchain::with_settings("miner", settings).unwrap();
        let first = Wallet::new().unwrap();
        let second = Wallet::new().unwrap();
        blockchain
            .submit_signed(&first.sign_transaction("bob", 1.0).unwrap())
            .unwrap();

        let miner = blockchain.clone();
        let round = thread::spawn(move || miner.mine());

        // The mining lock is taken before the pool snapshot
        assert!(wait_for(Duration::from_secs(10), || {
            blockchain.mining_lock.try_lock().is_err() || blockchain.get_chain().len() == 2
        }));
        thread::sleep(Duration::from_millis(20));
        let late = second.sign_transaction("carol", 2.0).unwrap();
        blockchain.submit_signed(&late).unwrap();

        let sealed = match round.join().unwrap().unwrap() {
            MiningOutcome::Sealed(block) => block,
            other => panic!("expected a sealed block, got {other:?}"),
        };
        let txs = sealed.get_transactions();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].get_sender(), first.get_address());
        assert!(txs[1].is_reward());
        assert_eq!(
            blockchain.get_transaction_pool(),
            vec![late.get_transaction().clone()]
        );

        let next = match blockchain.mine().unwrap() {
            MiningOutcome::Sealed(block) => block,
            other => panic!("expected a sealed block, got {other:?}"),
        };
        assert_eq!(next.get_transactions()[0].get_sender(), second.get_address());
        assert!(blockchain.get_transaction_pool().is_empty());
        assert!(blockchain.is_chain_valid());
    }

    #[test]
    fn test_cancelled_round_leaves_state_untouched() {
        let settings = Settings {
            difficulty: 64,
            cancel_check_interval: 1,
            ..fast_settings()
        };
        let blockchain = Blockchain::with_settings("miner", settings).unwrap();
        let wallet = Wallet::new().unwrap();
        blockchain
            .submit_signed(&wallet.sign_transaction("bob", 1.0).unwrap())
            .unwrap();

        let outcome = blockchain.mine_with_cancel(&AtomicBool::new(true)).unwrap();
        assert_eq!(outcome, MiningOutcome::Cancelled);
        assert_eq!(blockchain.get_chain().len(), 1);
        assert_eq!(blockchain.get_transaction_pool().len(), 1);
    }

    #[test]
    fn test_balance_policy_rejects_overspend() {
        let settings = Settings {
            admission_policy: AdmissionPolicy::RequireBalance,
            ..fast_settings()
        };
        let (blockchain, funded) = funded_ledger(settings);
        let recipient = Wallet::new().unwrap();
        assert_eq!(blockchain.calculate_total_amount(funded.get_address()), 1.0);

        let spend = funded
            .sign_transaction(recipient.get_address(), 0.75)
            .unwrap();
        blockchain.submit_signed(&spend).unwrap();

        // The queued 0.75 already counts against the remaining 1.0
        let again = funded
            .sign_transaction(recipient.get_address(), 0.5)
            .unwrap();
        match blockchain.submit_signed(&again) {
            Err(BlockchainError::InsufficientFunds {
                required,
                available,
            }) => {
                assert_eq!(required, 0.5);
                assert_eq!(available, 0.25);
            }
            other => panic!("expected insufficient funds, got {other:?}"),
        }
        assert_eq!(blockchain.get_transaction_pool().len(), 1);
    }

    #[test]
    fn test_signature_only_policy_allows_overspend() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let broke = Wallet::new().unwrap();
        let signed = broke.sign_transaction("bob", 1000.0).unwrap();
        blockchain.submit_signed(&signed).unwrap();
        blockchain.mine().unwrap();
        assert_eq!(blockchain.calculate_total_amount(broke.get_address()), -1000.0);
    }

    #[test]
    fn test_chain_json_shape() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&blockchain.to_json().unwrap()).unwrap();
        let chains = json["chains"].as_array().unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0]["nonce"], 0);
        assert_eq!(
            chains[0]["previous_hash"],
            data_encoding::HEXLOWER.encode(&Block::genesis_previous_hash())
        );

        let response = serde_json::to_string(&AmountResponse { amount: 1.5 }).unwrap();
        assert_eq!(response, r#"{"amount":1.5}"#);
    }

    #[test]
    fn test_snapshot_display() {
        let blockchain = Blockchain::with_settings("miner", fast_settings()).unwrap();
        let printed = blockchain.get_snapshot().to_string();
        assert!(printed.contains("Chain 0"));
        assert!(printed.ends_with(&"*".repeat(25)));
    }
}
