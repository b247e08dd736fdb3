//! Server configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::crypto::BCRYPT_COST;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// SQLite database file; in-memory stores are used when unset
    pub database_path: Option<String>,

    /// Load the demo doctor, patient, availability and appointment at startup.
    /// Never enable in production.
    pub seed_demo: bool,

    /// bcrypt cost used when hashing new credentials
    pub bcrypt_cost: u32,

    /// Deadline applied to every request
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_path: None,
            seed_demo: false,
            bcrypt_cost: BCRYPT_COST,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Build configuration from `MEDIQ_*` environment variables, keeping
    /// defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            port: parse_var(&lookup, "MEDIQ_PORT").unwrap_or(defaults.port),
            database_path: lookup("MEDIQ_DATABASE").filter(|p| !p.is_empty()),
            seed_demo: parse_var(&lookup, "MEDIQ_SEED_DEMO").unwrap_or(defaults.seed_demo),
            bcrypt_cost: parse_var(&lookup, "MEDIQ_BCRYPT_COST").unwrap_or(defaults.bcrypt_cost),
            request_timeout_secs: parse_var(&lookup, "MEDIQ_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}
