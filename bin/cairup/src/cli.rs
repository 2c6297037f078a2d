use std::path::PathBuf;

use cairup_deploy::DeployConfig;
use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "cairup")]
#[command(
    author,
    version,
    about = "Declare and deploy a compiled Starknet contract in one go"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "CAIRUP_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a TOML configuration file.
    ///
    /// Command-line flags and environment variables take precedence over the file.
    #[arg(long, alias = "conf", env = "CAIRUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// The URL of the Starknet JSON-RPC endpoint.
    #[arg(long, alias = "rpc", env = "STARKNET_RPC_URL")]
    pub rpc_url: Option<String>,

    /// The private key of the deployer account.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// The address of the deployer account.
    #[arg(long, alias = "account", env = "ACCOUNT_ADDRESS")]
    pub account_address: Option<String>,

    /// The network label written to the deployment record.
    ///
    /// Defaults to "testnet".
    #[arg(short, long, env = "STARKNET_NETWORK")]
    pub network: Option<String>,

    /// Path to the compiled Sierra contract class.
    #[arg(long, env = "CAIRUP_ARTIFACT")]
    pub artifact: Option<PathBuf>,

    /// Path to the compiled CASM class.
    ///
    /// If not provided, the file scarb writes next to the artifact is used.
    #[arg(long, env = "CAIRUP_CASM")]
    pub casm: Option<PathBuf>,

    /// Where to save the deployment record.
    ///
    /// Defaults to ./deployment-info.json
    #[arg(short, long, env = "CAIRUP_OUTPUT")]
    pub output: Option<PathBuf>,

    /// The platform fee passed to the constructor, in basis points.
    ///
    /// Defaults to 250 (2.5%).
    #[arg(long, env = "CAIRUP_FEE_BPS")]
    pub fee_bps: Option<u16>,

    /// Interval between two transaction status polls, in milliseconds.
    #[arg(long, env = "CAIRUP_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Maximum time to wait for a transaction to be final, in seconds.
    #[arg(long, env = "CAIRUP_FINALITY_TIMEOUT_SECS")]
    pub finality_timeout_secs: Option<u64>,
}

impl Cli {
    /// Override the loaded configuration with the values given on the command line.
    pub fn apply(self, config: &mut DeployConfig) {
        if let Some(rpc_url) = self.rpc_url {
            config.rpc_url = rpc_url;
        }
        if self.private_key.is_some() {
            config.private_key = self.private_key;
        }
        if self.account_address.is_some() {
            config.account_address = self.account_address;
        }
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(artifact) = self.artifact {
            config.artifact = artifact;
        }
        if self.casm.is_some() {
            config.casm = self.casm;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(fee_bps) = self.fee_bps {
            config.fee_basis_points = fee_bps;
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            config.poll_interval_ms = poll_interval_ms;
        }
        if let Some(finality_timeout_secs) = self.finality_timeout_secs {
            config.finality_timeout_secs = finality_timeout_secs;
        }
    }
}
