//! Quorum operator configuration file handling
//!
//! Configuration files are TOML. They hold OPERATOR settings (logging) and
//! the template used to generate a genesis document.
//!
//! Chain governance parameters are not operator configuration once the chain
//! runs: they live in module state, are set by `InitGenesis`, and change only
//! through a passed proposal carrying an `UpdateParams` message.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quorum::gov::params::{
    DEFAULT_DEPOSIT_PERIOD_MS, DEFAULT_MIN_DEPOSIT_TOKENS, DEFAULT_QUORUM, DEFAULT_THRESHOLD,
    DEFAULT_VETO_THRESHOLD, DEFAULT_VOTING_PERIOD_MS,
};
use quorum::gov::{Coin, GenesisState, Params};
use quorum::math::Amount;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default bond denom
const DEFAULT_BOND_DENOM: &str = "stake";

/// Quorum configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Genesis template
    #[serde(default)]
    pub genesis: GenesisConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

/// Genesis template. Periods are human-readable durations ("48h", "2days").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub bond_denom: String,
    pub starting_proposal_id: u64,
    /// Integer amount of `bond_denom`
    pub min_deposit: String,
    pub max_deposit_period: String,
    pub voting_period: String,
    pub quorum: String,
    pub threshold: String,
    pub veto_threshold: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
            starting_proposal_id: 1,
            min_deposit: DEFAULT_MIN_DEPOSIT_TOKENS.to_string(),
            max_deposit_period: format_ms(DEFAULT_DEPOSIT_PERIOD_MS),
            voting_period: format_ms(DEFAULT_VOTING_PERIOD_MS),
            quorum: DEFAULT_QUORUM.to_string(),
            threshold: DEFAULT_THRESHOLD.to_string(),
            veto_threshold: DEFAULT_VETO_THRESHOLD.to_string(),
        }
    }
}

fn format_ms(ms: u64) -> String {
    humantime::format_duration(Duration::from_millis(ms)).to_string()
}

fn parse_ms(field: &str, value: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let duration = humantime::parse_duration(value)
        .map_err(|e| format!("Invalid duration for {} ('{}'): {}", field, value, e))?;
    u64::try_from(duration.as_millis())
        .map_err(|_| format!("Duration for {} is too large", field).into())
}

impl GenesisConfig {
    /// Build chain params from this template.
    pub fn params(&self) -> Result<Params, Box<dyn std::error::Error>> {
        let min_deposit = self
            .min_deposit
            .parse::<Amount>()
            .map_err(|e| format!("Invalid min_deposit '{}': {}", self.min_deposit, e))?;

        let params = Params {
            min_deposit: vec![Coin::new(self.bond_denom.clone(), min_deposit)],
            max_deposit_period: parse_ms("max_deposit_period", &self.max_deposit_period)?,
            voting_period: parse_ms("voting_period", &self.voting_period)?,
            quorum: self.quorum.clone(),
            threshold: self.threshold.clone(),
            veto_threshold: self.veto_threshold.clone(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Build an empty genesis document from this template.
    pub fn to_genesis(&self) -> Result<GenesisState, Box<dyn std::error::Error>> {
        let mut genesis = GenesisState::default_for(&self.bond_denom);
        genesis.starting_proposal_id = self.starting_proposal_id;
        genesis.params = self.params()?;
        Ok(genesis)
    }
}

impl QuorumConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: QuorumConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Load from `path` if given, else from the default path if it exists,
    /// else built-in defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => Self::load(Path::new(path)),
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file
    #[allow(dead_code)]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        write_creating_parent(path, &contents)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        let genesis = GenesisConfig::default();
        format!(
            r#"# Quorum Configuration
#
# [genesis] is only a template for `quorum genesis`. Once a chain is running,
# governance parameters change only through passed proposals.

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "{level}"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/quorum/quorum.log"

[genesis]
# Deposit and voting-power denom
bond_denom = "{bond_denom}"
starting_proposal_id = {starting_proposal_id}

# A proposal enters voting once its deposit is strictly greater than this
min_deposit = "{min_deposit}"

# Human-readable durations, e.g. "48h", "2days", "90min"
max_deposit_period = "{max_deposit_period}"
voting_period = "{voting_period}"

# Decimal fractions in [0, 1]
quorum = "{quorum}"
threshold = "{threshold}"
veto_threshold = "{veto_threshold}"
"#,
            level = DEFAULT_LOG_LEVEL,
            bond_denom = genesis.bond_denom,
            starting_proposal_id = genesis.starting_proposal_id,
            min_deposit = genesis.min_deposit,
            max_deposit_period = genesis.max_deposit_period,
            voting_period = genesis.voting_period,
            quorum = genesis.quorum,
            threshold = genesis.threshold,
            veto_threshold = genesis.veto_threshold,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        write_creating_parent(config_path, &Self::generate_default_toml())
    }
}

fn write_creating_parent(path: &Path, contents: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    fs::write(path, contents)
        .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

    Ok(())
}

/// Get the default config file path: `<config dir>/quorum/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quorum")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = QuorumConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.genesis.bond_denom, "stake");
        assert_eq!(config.genesis.voting_period, "2days");
    }

    #[test]
    fn test_default_genesis_matches_chain_defaults() {
        let genesis = GenesisConfig::default().to_genesis().unwrap();
        assert_eq!(genesis, GenesisState::default_for("stake"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = QuorumConfig::default();
        config.genesis.bond_denom = "uatom".to_string();
        config.save(&config_path).unwrap();

        let loaded = QuorumConfig::load(&config_path).unwrap();
        assert_eq!(loaded.genesis.bond_denom, "uatom");
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_create_default_config_loads() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        QuorumConfig::create_default(&config_path).unwrap();
        let config = QuorumConfig::load(&config_path).unwrap();

        assert_eq!(config.genesis.min_deposit, "10000000");
        config.genesis.to_genesis().unwrap();
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let minimal_config = r#"
[genesis]
voting_period = "90min"
"#;
        fs::write(&config_path, minimal_config).unwrap();

        let config = QuorumConfig::load(&config_path).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.genesis.params().unwrap().voting_period, 5_400_000);
        assert_eq!(config.genesis.bond_denom, "stake");
    }

    #[test]
    fn test_min_deposit_uses_bond_denom() {
        let mut genesis = GenesisConfig::default();
        genesis.bond_denom = "uatom".to_string();
        genesis.min_deposit = "250000000000000000000".to_string();

        let params = genesis.params().unwrap();
        let expected: Amount = "250000000000000000000".parse().unwrap();
        assert_eq!(params.min_deposit, vec![Coin::new("uatom", expected)]);
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let mut genesis = GenesisConfig::default();
        genesis.voting_period = "soon".to_string();
        assert!(genesis.params().is_err());

        let mut genesis = GenesisConfig::default();
        genesis.quorum = "1.2".to_string();
        assert!(genesis.params().is_err());

        let mut genesis = GenesisConfig::default();
        genesis.min_deposit = "-5".to_string();
        assert!(genesis.params().is_err());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("quorum/config.toml"));
    }
}
