//! Chain capability consumed by the deployment workflow.
//!
//! The workflow only needs three operations from the network: submit a class
//! declaration, submit an instance deployment, and wait for a submitted
//! transaction to become final. [`ChainClient`] captures exactly these.
//!
//! - [`StarknetChainClient`] talks to a Starknet JSON-RPC node.
//! - [`StubChainClient`] is an in-memory client with scripted outcomes.

use std::{future::Future, time::Duration};

use derive_more::{Deref, From};

use crate::{CompiledArtifact, Credentials};

pub mod poll;
mod network;
mod stub;

pub use poll::PollConfig;
pub use network::StarknetChainClient;
pub use stub::{
    STUB_DECLARE_TX_HASH, STUB_DEPLOY_TX_HASH, StubCall, StubChainClient, StubFinality,
    StubSubmission,
};

/// The kind of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransactionKind {
    Declare,
    Deploy,
}

/// A submitted, not yet final, transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    pub transaction_hash: String,
    pub kind: TransactionKind,
}

/// Terminal status of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalStatus {
    /// The transaction was accepted and executed successfully.
    Accepted,
    /// The transaction was rejected or its execution reverted.
    Rejected { reason: String },
}

/// Result of a class declaration submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declared {
    pub handle: TransactionHandle,
    /// The class hash assigned by the network.
    pub class_hash: String,
}

/// Result of an instance deployment submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    pub handle: TransactionHandle,
    pub contract_address: String,
}

/// Positional constructor arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From)]
pub struct ConstructorArguments(Vec<String>);

impl ConstructorArguments {
    /// Arguments of the rental contract constructor: admin address, then fee in basis points.
    pub fn admin_and_fee(admin: &str, fee_basis_points: u16) -> Self {
        Self(vec![admin.to_string(), fee_basis_points.to_string()])
    }
}

/// Errors raised by a [`ChainClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The node could not be reached.
    #[error("{0}")]
    Network(String),
    /// The chain refused the operation.
    #[error("{0}")]
    Rejected(String),
    /// The transaction did not reach a terminal state in time.
    #[error("Timeout after {}s waiting for {transaction_hash} to be final", timeout.as_secs_f64())]
    Timeout {
        transaction_hash: String,
        timeout: Duration,
    },
    /// A declaration could not be built from the artifact.
    #[error("{0}")]
    InvalidArtifact(String),
    /// A credential could not be used to sign.
    #[error("{name}: {reason}")]
    InvalidCredential { name: &'static str, reason: String },
    /// The transaction could not be encoded or signed. Nothing was sent.
    #[error("{0}")]
    InvalidTransaction(String),
}

/// Capability to declare, deploy and track transactions on a chain.
pub trait ChainClient: Send + Sync {
    /// Submit a class declaration signed by `credentials`.
    ///
    /// Returns as soon as the transaction is accepted by the node, without
    /// waiting for it to be final.
    fn declare(
        &self,
        credentials: &Credentials,
        artifact: &CompiledArtifact,
    ) -> impl Future<Output = Result<Declared, ChainError>> + Send;

    /// Submit a deployment of `class_hash` with the given constructor arguments.
    fn deploy(
        &self,
        credentials: &Credentials,
        class_hash: &str,
        constructor_args: &ConstructorArguments,
    ) -> impl Future<Output = Result<Deployed, ChainError>> + Send;

    /// Poll the transaction until it is accepted or rejected.
    ///
    /// Fails with [`ChainError::Timeout`] once `poll.timeout` has elapsed.
    fn await_finality(
        &self,
        handle: &TransactionHandle,
        poll: &PollConfig,
    ) -> impl Future<Output = Result<TerminalStatus, ChainError>> + Send;
}

impl<T: ChainClient> ChainClient for &T {
    fn declare(
        &self,
        credentials: &Credentials,
        artifact: &CompiledArtifact,
    ) -> impl Future<Output = Result<Declared, ChainError>> + Send {
        (**self).declare(credentials, artifact)
    }

    fn deploy(
        &self,
        credentials: &Credentials,
        class_hash: &str,
        constructor_args: &ConstructorArguments,
    ) -> impl Future<Output = Result<Deployed, ChainError>> + Send {
        (**self).deploy(credentials, class_hash, constructor_args)
    }

    fn await_finality(
        &self,
        handle: &TransactionHandle,
        poll: &PollConfig,
    ) -> impl Future<Output = Result<TerminalStatus, ChainError>> + Send {
        (**self).await_finality(handle, poll)
    }
}
