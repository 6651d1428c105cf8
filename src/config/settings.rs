use crate::core::{
    CANCEL_CHECK_INTERVAL, MAX_DIFFICULTY, MINING_DIFFICULTY, MINING_REWARD, MINING_TIMER_SEC,
};
use crate::error::{BlockchainError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::Duration;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

const MINING_ADDRESS_KEY: &str = "MINING_ADDRESS";
const CONFIG_PATH_KEY: &str = "LEDGER_CONFIG";

const DIFFICULTY_ENV: &str = "MINING_DIFFICULTY";
const REWARD_ENV: &str = "MINING_REWARD";
const INTERVAL_ENV: &str = "MINING_TIMER_SEC";
const POLICY_ENV: &str = "ADMISSION_POLICY";
const KEY_OWNERSHIP_ENV: &str = "REQUIRE_KEY_OWNERSHIP";

/// Process-level values picked up from the environment at startup.
pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        for key in [MINING_ADDRESS_KEY, CONFIG_PATH_KEY] {
            if let Ok(value) = env::var(key) {
                map.insert(String::from(key), value);
            }
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    pub fn set_mining_addr(&self, addr: String) {
        let mut inner = self.inner.write().expect("process config lock poisoned");
        let _ = inner.insert(String::from(MINING_ADDRESS_KEY), addr);
    }

    pub fn get_mining_addr(&self) -> Option<String> {
        let inner = self.inner.read().expect("process config lock poisoned");
        inner.get(MINING_ADDRESS_KEY).cloned()
    }

    pub fn get_config_path(&self) -> Option<String> {
        let inner = self.inner.read().expect("process config lock poisoned");
        inner.get(CONFIG_PATH_KEY).cloned()
    }
}

/// Whether admission checks the sender's balance on top of the signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissionPolicy {
    /// Signature only. Double spends are not caught.
    #[default]
    SignatureOnly,
    /// Signature, and the sender must hold at least the amount (sealed balance
    /// minus what it already has queued in the pool).
    RequireBalance,
}

impl FromStr for AdmissionPolicy {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "signature-only" => Ok(AdmissionPolicy::SignatureOnly),
            "require-balance" => Ok(AdmissionPolicy::RequireBalance),
            _ => Err(BlockchainError::Config(format!(
                "Invalid admission policy: {s}. Valid options: signature-only, require-balance"
            ))),
        }
    }
}

impl fmt::Display for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionPolicy::SignatureOnly => write!(f, "signature-only"),
            AdmissionPolicy::RequireBalance => write!(f, "require-balance"),
        }
    }
}

/// Ledger tuning. Loaded from defaults, then an optional TOML file, then the
/// environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: usize,
    pub mining_reward: f64,
    pub mining_interval_secs: u64,
    pub cancel_check_interval: u64,
    pub admission_policy: AdmissionPolicy,
    /// Refuse a transfer unless the signing key derives the sender address
    pub require_key_ownership: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            difficulty: MINING_DIFFICULTY,
            mining_reward: MINING_REWARD,
            mining_interval_secs: MINING_TIMER_SEC,
            cancel_check_interval: CANCEL_CHECK_INTERVAL,
            admission_policy: AdmissionPolicy::default(),
            require_key_ownership: false,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then the file named by `LEDGER_CONFIG` if any, then env overrides.
    pub fn from_environment() -> Result<Settings> {
        let settings = match GLOBAL_CONFIG.get_config_path() {
            Some(path) => Self::load(Path::new(&path))?,
            None => Settings::default(),
        };
        settings.with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Settings> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DIFFICULTY_ENV) {
            self.difficulty = parse_env(DIFFICULTY_ENV, &value)?;
        }
        if let Some(value) = lookup(REWARD_ENV) {
            self.mining_reward = parse_env(REWARD_ENV, &value)?;
        }
        if let Some(value) = lookup(INTERVAL_ENV) {
            self.mining_interval_secs = parse_env(INTERVAL_ENV, &value)?;
        }
        if let Some(value) = lookup(POLICY_ENV) {
            self.admission_policy = value.parse()?;
        }
        if let Some(value) = lookup(KEY_OWNERSHIP_ENV) {
            self.require_key_ownership = parse_env(KEY_OWNERSHIP_ENV, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty must be at most {MAX_DIFFICULTY}, got {}",
                self.difficulty
            )));
        }
        if !self.mining_reward.is_finite() || self.mining_reward < 0.0 {
            return Err(BlockchainError::Config(format!(
                "mining_reward must be a non-negative number, got {}",
                self.mining_reward
            )));
        }
        if self.mining_interval_secs == 0 {
            return Err(BlockchainError::Config(
                "mining_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn mining_interval(&self) -> Duration {
        Duration::from_secs(self.mining_interval_secs)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| BlockchainError::Config(format!("{key}={value}: {e}")))
}
