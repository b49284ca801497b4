//! Escalation configuration

use crate::escalation::error::{EscalationError, EscalationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the Escalation Engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Failed attempts allowed at `retry` before moving to `agent_fix`
    pub max_retries: u32,
    /// Failed attempts allowed overall before forcing `human`
    pub max_total_attempts: u32,
    /// Start critical errors at `agent_fix` instead of `retry`
    pub auto_escalate_critical: bool,
    /// Skip `agent_fix` for low-severity errors once retries run out
    pub skip_agent_for_simple: bool,
    /// Snapshot every attempt into the human ticket (otherwise only the latest)
    pub include_full_context: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_total_attempts: 5,
            auto_escalate_critical: true,
            skip_agent_for_simple: false,
            include_full_context: true,
        }
    }
}

impl EscalationConfig {
    /// Create config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ESCALATION_MAX_RETRIES") {
            if let Ok(n) = val.parse() {
                config.max_retries = n;
            }
        }
        if let Ok(val) = std::env::var("ESCALATION_MAX_TOTAL_ATTEMPTS") {
            if let Ok(n) = val.parse() {
                config.max_total_attempts = n;
            }
        }
        if let Ok(val) = std::env::var("ESCALATION_AUTO_ESCALATE_CRITICAL") {
            config.auto_escalate_critical = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("ESCALATION_SKIP_AGENT_FOR_SIMPLE") {
            config.skip_agent_for_simple = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("ESCALATION_INCLUDE_FULL_CONTEXT") {
            config.include_full_context = parse_flag(&val);
        }

        config
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> EscalationResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> EscalationResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> EscalationResult<()> {
        if self.max_retries == 0 {
            return Err(EscalationError::invalid_config(
                "max_retries must be at least 1",
            ));
        }
        if self.max_total_attempts == 0 {
            return Err(EscalationError::invalid_config(
                "max_total_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}
