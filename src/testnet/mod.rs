//! Test fixtures for ledger tests
//!
//! Fast mining settings, pre-funded ledgers and polling helpers shared by
//! the unit tests.

pub mod test_utils;

pub use test_utils::*;
