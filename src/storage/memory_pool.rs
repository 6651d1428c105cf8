use crate::core::Transaction;

/// Admitted transactions waiting for the next block, in admission order.
///
/// The pool has no lock of its own; it lives inside the ledger state and is
/// only touched while the ledger's state mutex is held.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    inner: Vec<Transaction>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool { inner: Vec::new() }
    }

    /// Appends at the tail. Identical transactions are kept as separate entries.
    pub fn add(&mut self, tx: Transaction) {
        self.inner.push(tx);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        self.inner.clone()
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.inner
    }

    /// Drops the first `count` entries, the ones a mining round just sealed.
    /// Anything admitted after the round's snapshot stays queued.
    pub fn remove_sealed(&mut self, count: usize) {
        let count = count.min(self.inner.len());
        self.inner.drain(..count);
    }

    /// Total value `address` is already sending in queued transactions.
    pub fn pending_outflow(&self, address: &str) -> f64 {
        self.inner
            .iter()
            .filter(|tx| tx.get_sender() == address)
            .map(Transaction::get_value)
            .sum()
    }
}
