//! In-memory chain client with scripted outcomes.

use std::sync::{Mutex, PoisonError};

use super::{
    ChainClient, ChainError, ConstructorArguments, Declared, Deployed, PollConfig,
    TerminalStatus, TransactionHandle, TransactionKind,
    poll::{Status, poll_until},
};
use crate::{CompiledArtifact, Credentials};

/// Transaction hash returned for every declaration.
pub const STUB_DECLARE_TX_HASH: &str = "0x1de";
/// Transaction hash returned for every deployment.
pub const STUB_DEPLOY_TX_HASH: &str = "0x2de";

const DEFAULT_CLASS_HASH: &str = "0x5c1a55";
const DEFAULT_CONTRACT_ADDRESS: &str = "0xc0ffee";

/// Scripted outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubSubmission {
    Accept,
    NetworkError(String),
    Reject(String),
}

/// Scripted outcome of waiting for finality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubFinality {
    /// Accepted on the first poll.
    Accepted,
    /// Accepted after the given number of pending polls.
    AcceptedAfter(u32),
    /// Final but rejected or reverted.
    Rejected(String),
    /// Never final.
    Pending,
}

/// A call received by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubCall {
    Declare {
        account_address: String,
        embedded_class_hash: Option<String>,
    },
    Deploy {
        account_address: String,
        class_hash: String,
        constructor_args: Vec<String>,
    },
    AwaitFinality {
        transaction_hash: String,
        kind: TransactionKind,
    },
}

/// A [`ChainClient`] that never touches the network.
///
/// By default every submission is accepted and every transaction becomes final
/// on the first poll.
#[derive(Debug)]
pub struct StubChainClient {
    class_hash: String,
    contract_address: String,
    declare: StubSubmission,
    deploy: StubSubmission,
    declare_finality: StubFinality,
    deploy_finality: StubFinality,
    calls: Mutex<Vec<StubCall>>,
}

impl Default for StubChainClient {
    fn default() -> Self {
        Self {
            class_hash: DEFAULT_CLASS_HASH.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            declare: StubSubmission::Accept,
            deploy: StubSubmission::Accept,
            declare_finality: StubFinality::Accepted,
            deploy_finality: StubFinality::Accepted,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StubChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the class hash the "network" assigns on declare.
    pub fn class_hash(mut self, class_hash: impl Into<String>) -> Self {
        self.class_hash = class_hash.into();
        self
    }

    /// Set the address the "network" assigns on deploy.
    pub fn contract_address(mut self, contract_address: impl Into<String>) -> Self {
        self.contract_address = contract_address.into();
        self
    }

    pub fn on_declare(mut self, outcome: StubSubmission) -> Self {
        self.declare = outcome;
        self
    }

    pub fn on_deploy(mut self, outcome: StubSubmission) -> Self {
        self.deploy = outcome;
        self
    }

    pub fn on_declare_finality(mut self, outcome: StubFinality) -> Self {
        self.declare_finality = outcome;
        self
    }

    pub fn on_deploy_finality(mut self, outcome: StubFinality) -> Self {
        self.deploy_finality = outcome;
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<StubCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a deployment was submitted.
    pub fn deploy_attempted(&self) -> bool {
        self.calls()
            .iter()
            .any(|call| matches!(call, StubCall::Deploy { .. }))
    }

    fn record(&self, call: StubCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

fn submit(outcome: &StubSubmission) -> Result<(), ChainError> {
    match outcome {
        StubSubmission::Accept => Ok(()),
        StubSubmission::NetworkError(reason) => Err(ChainError::Network(reason.clone())),
        StubSubmission::Reject(reason) => Err(ChainError::Rejected(reason.clone())),
    }
}

impl ChainClient for StubChainClient {
    async fn declare(
        &self,
        credentials: &Credentials,
        artifact: &CompiledArtifact,
    ) -> Result<Declared, ChainError> {
        self.record(StubCall::Declare {
            account_address: credentials.account_address.clone(),
            embedded_class_hash: artifact.class_hash.clone(),
        });
        submit(&self.declare)?;

        Ok(Declared {
            handle: TransactionHandle {
                transaction_hash: STUB_DECLARE_TX_HASH.to_string(),
                kind: TransactionKind::Declare,
            },
            class_hash: self.class_hash.clone(),
        })
    }

    async fn deploy(
        &self,
        credentials: &Credentials,
        class_hash: &str,
        constructor_args: &ConstructorArguments,
    ) -> Result<Deployed, ChainError> {
        self.record(StubCall::Deploy {
            account_address: credentials.account_address.clone(),
            class_hash: class_hash.to_string(),
            constructor_args: constructor_args.to_vec(),
        });
        submit(&self.deploy)?;

        Ok(Deployed {
            handle: TransactionHandle {
                transaction_hash: STUB_DEPLOY_TX_HASH.to_string(),
                kind: TransactionKind::Deploy,
            },
            contract_address: self.contract_address.clone(),
        })
    }

    async fn await_finality(
        &self,
        handle: &TransactionHandle,
        poll: &PollConfig,
    ) -> Result<TerminalStatus, ChainError> {
        self.record(StubCall::AwaitFinality {
            transaction_hash: handle.transaction_hash.clone(),
            kind: handle.kind,
        });

        let outcome = match handle.kind {
            TransactionKind::Declare => self.declare_finality.clone(),
            TransactionKind::Deploy => self.deploy_finality.clone(),
        };
        let mut pending_polls = match outcome {
            StubFinality::AcceptedAfter(polls) => polls,
            _ => 0,
        };

        poll_until(&handle.transaction_hash, poll, || {
            let status = match &outcome {
                StubFinality::Pending => Status::Pending,
                _ if pending_polls > 0 => {
                    pending_polls -= 1;
                    Status::Pending
                }
                StubFinality::Accepted | StubFinality::AcceptedAfter(_) => {
                    Status::Done(TerminalStatus::Accepted)
                }
                StubFinality::Rejected(reason) => Status::Done(TerminalStatus::Rejected {
                    reason: reason.clone(),
                }),
            };
            std::future::ready(Ok(status))
        })
        .await
    }
}
