//! cairup-deploy - Declare and deploy compiled Starknet contracts.
//!
//! This crate provides the deployment workflow used by the `cairup` CLI: resolve
//! the deployer credentials, load the compiled contract, declare its class, wait
//! for finality, deploy an instance, wait again and save a deployment record.

mod artifact;
pub mod chain;
mod config;
mod credentials;
mod error;
mod orchestrator;
mod record;
mod state;

pub use artifact::{CompiledArtifact, companion_casm_path};
pub use chain::{
    ChainClient, ChainError, ConstructorArguments, Declared, Deployed, PollConfig,
    STUB_DECLARE_TX_HASH, STUB_DEPLOY_TX_HASH, StarknetChainClient, StubCall, StubChainClient,
    StubFinality, StubSubmission, TerminalStatus, TransactionHandle, TransactionKind,
};
pub use config::{
    DEFAULT_ARTIFACT_PATH, DEFAULT_FEE_BASIS_POINTS, DEFAULT_NETWORK, DEFAULT_RPC_URL, DeployConfig,
    ENV_PREFIX, MAX_FINALITY_TIMEOUT_SECS,
};
pub use credentials::{Credentials, HEX_PREFIX, SecretString};
pub use error::{DeployError, FailureKind};
pub use orchestrator::Orchestrator;
pub use record::{DEFAULT_RECORD_PATH, DeploymentRecord, JsonFileRecordWriter, RecordWriter};
pub use state::DeploymentState;
