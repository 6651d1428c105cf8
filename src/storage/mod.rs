//! In-memory storage
//!
//! The chain lives only for the lifetime of the process; this module holds
//! the pending-transaction pool the ledger seals from.

pub mod memory_pool;

pub use memory_pool::MemoryPool;
