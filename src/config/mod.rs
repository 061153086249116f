//! Configuration module for the volunteer backend server.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! The engine itself never reads the environment; it receives [`Rules`] from here.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::validation::{OpportunityRules, Rules, ValidationRules};

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid value for {}: {:?}", self.variable, self.value)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication
    pub api_psk: Option<String>,
    /// Path to the JSON data file
    pub data_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Validation rules handed to the engine
    pub rules: Rules,
}

impl Config {
    /// Load configuration from `.env` and environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("VMS_API_PSK").ok().filter(|k| !k.is_empty());

        let data_path = env::var("VMS_DATA_PATH")
            .unwrap_or_else(|_| "./data/data.json".to_string())
            .into();

        let bind_addr_raw =
            env::var("VMS_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_addr_raw.parse().map_err(|_| ConfigError {
            variable: "VMS_BIND_ADDR",
            value: bind_addr_raw.clone(),
        })?;

        let log_level = env::var("VMS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let ruleset = env::var("VMS_RULESET").unwrap_or_else(|_| "standard".to_string());
        let fields = ValidationRules::preset(&ruleset).ok_or(ConfigError {
            variable: "VMS_RULESET",
            value: ruleset.clone(),
        })?;

        let enforce_raw =
            env::var("VMS_ENFORCE_POSTING_RULES").unwrap_or_else(|_| "true".to_string());
        let enforce = parse_bool(&enforce_raw).ok_or(ConfigError {
            variable: "VMS_ENFORCE_POSTING_RULES",
            value: enforce_raw.clone(),
        })?;

        Ok(Self {
            api_psk,
            data_path,
            bind_addr,
            log_level,
            rules: Rules {
                fields,
                opportunities: OpportunityRules {
                    enforce,
                    ..OpportunityRules::default()
                },
            },
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
