//! Configuration management
//!
//! This module handles the ledger's mining and admission settings and the
//! process-level values read from the environment.

pub mod settings;

pub use settings::{AdmissionPolicy, Config, Settings, GLOBAL_CONFIG};
