//! Deployment configuration.
//!
//! Values are layered, later layers winning:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `CAIRUP_*` environment variables (e.g. `CAIRUP_RPC_URL`)
//!
//! The binary applies command-line flags on top.

use std::{fmt, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{chain::PollConfig, record::DEFAULT_RECORD_PATH};

/// Default Starknet RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://alpha4.starknet.io";

/// Default network label written to the deployment record.
pub const DEFAULT_NETWORK: &str = "testnet";

/// Default location of the compiled contract.
pub const DEFAULT_ARTIFACT_PATH: &str = "target/dev/daobitat_RentalContract.sierra.json";

/// Default platform fee passed to the constructor (2.5%).
pub const DEFAULT_FEE_BASIS_POINTS: u16 = 250;

/// Longest accepted finality timeout (one week).
pub const MAX_FINALITY_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Prefix of the environment variables read by [`DeployConfig::load`].
pub const ENV_PREFIX: &str = "CAIRUP_";

/// Everything a deployment run needs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// URL of the Starknet JSON-RPC endpoint.
    pub rpc_url: String,
    /// Raw private key of the deployer account.
    pub private_key: Option<String>,
    /// Raw address of the deployer account.
    pub account_address: Option<String>,
    /// Network label recorded in the deployment record.
    pub network: String,
    /// Path to the compiled Sierra class.
    pub artifact: PathBuf,
    /// Path to the compiled CASM class, if not next to the artifact.
    pub casm: Option<PathBuf>,
    /// Path of the deployment record.
    pub output: PathBuf,
    /// Platform fee passed to the constructor, in basis points.
    pub fee_basis_points: u16,
    /// Interval between two transaction status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum time to wait for a transaction to be final, in seconds.
    pub finality_timeout_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            private_key: None,
            account_address: None,
            network: DEFAULT_NETWORK.to_string(),
            artifact: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            casm: None,
            output: PathBuf::from(DEFAULT_RECORD_PATH),
            fee_basis_points: DEFAULT_FEE_BASIS_POINTS,
            poll_interval_ms: poll.interval.as_millis() as u64,
            finality_timeout_secs: poll.timeout.as_secs(),
        }
    }
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("account_address", &self.account_address)
            .field("network", &self.network)
            .field("artifact", &self.artifact)
            .field("casm", &self.casm)
            .field("output", &self.output)
            .field("fee_basis_points", &self.fee_basis_points)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("finality_timeout_secs", &self.finality_timeout_secs)
            .finish()
    }
}

impl DeployConfig {
    /// Load the configuration from defaults, an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Failed to load deployment configuration")?;

        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Check the values a run depends on, once every layer is applied.
    pub fn validate(&self) -> Result<()> {
        self.rpc_url()?;

        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }
        if self.finality_timeout_secs > MAX_FINALITY_TIMEOUT_SECS {
            anyhow::bail!(
                "finality_timeout_secs must be at most {MAX_FINALITY_TIMEOUT_SECS}, got {}",
                self.finality_timeout_secs
            );
        }

        Ok(())
    }

    /// The RPC endpoint, validated.
    pub fn rpc_url(&self) -> Result<Url> {
        Url::parse(&self.rpc_url).context(format!("Invalid RPC URL: {}", self.rpc_url))
    }

    /// Polling parameters for finality waits.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.finality_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();

        assert_eq!(config.network, "testnet");
        assert_eq!(config.fee_basis_points, 250);
        assert_eq!(config.output, PathBuf::from("deployment-info.json"));
        assert_eq!(config.poll_config(), PollConfig::default());
        assert!(config.rpc_url().is_ok());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = TempDir::new("config").unwrap();
        let path = dir.path().join("cairup.toml");
        std::fs::write(
            &path,
            r#"
                network = "mainnet"
                rpc_url = "http://localhost:5050"
                fee_basis_points = 100
                finality_timeout_secs = 30
            "#,
        )
        .unwrap();

        let config = DeployConfig::load(Some(path.as_path())).unwrap();

        assert_eq!(config.network, "mainnet");
        assert_eq!(config.rpc_url().unwrap().port(), Some(5050));
        assert_eq!(config.fee_basis_points, 100);
        assert_eq!(config.poll_config().timeout, Duration::from_secs(30));
        assert_eq!(config.artifact, PathBuf::from(DEFAULT_ARTIFACT_PATH));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new("config").unwrap();

        assert!(DeployConfig::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = DeployConfig {
            private_key: Some("0xabc123".to_string()),
            ..Default::default()
        };

        let debug = format!("{config:?}");
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_validate_poll_bounds() {
        assert!(DeployConfig::default().validate().is_ok());

        let busy = DeployConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(busy.validate().is_err());

        let endless = DeployConfig {
            finality_timeout_secs: u64::MAX,
            ..Default::default()
        };
        let err = endless.validate().unwrap_err();
        assert!(err.to_string().contains("finality_timeout_secs"));
    }

    #[test]
    fn test_invalid_rpc_url() {
        let config = DeployConfig {
            rpc_url: "not a url".to_string(),
            ..Default::default()
        };

        assert!(config.rpc_url().is_err());
    }
}
