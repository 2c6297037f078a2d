//! Error types for the deployment workflow.

use std::path::PathBuf;

use crate::{
    chain::{ChainError, TransactionKind},
    record::DeploymentRecord,
};

/// Discriminant of a [`DeployError`], used by the failed workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum FailureKind {
    MissingCredential,
    InvalidCredential,
    ArtifactNotFound,
    ArtifactParseError,
    NetworkError,
    RejectedTransaction,
    InvalidTransaction,
    PersistenceError,
}

/// A fatal error that halts the deployment workflow.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A credential was not provided.
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// A credential was provided but is not a valid felt.
    #[error("Invalid credential: {name} {reason}")]
    InvalidCredential { name: &'static str, reason: String },

    /// The compiled contract file does not exist.
    #[error("Contract file not found at {}. Did you run 'scarb build'?", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// The compiled contract file could not be parsed.
    #[error("Failed to parse compiled contract at {}: {reason}", path.display())]
    ArtifactParse { path: PathBuf, reason: String },

    /// The network could not be reached or did not answer in time.
    #[error("Network error during {kind}: {reason}")]
    Network {
        kind: TransactionKind,
        reason: String,
    },

    /// The chain rejected the transaction.
    #[error("{kind} transaction rejected: {reason}")]
    Rejected {
        kind: TransactionKind,
        reason: String,
    },

    /// The transaction could not be built locally and was never sent.
    #[error("Failed to build {kind} transaction: {reason}")]
    InvalidTransaction {
        kind: TransactionKind,
        reason: String,
    },

    /// The contract is deployed but its record could not be saved.
    #[error(
        "Contract deployed at {} (tx {}) but the deployment record could not be saved to {}: {reason}",
        record.contract_address,
        record.transaction_hash,
        path.display()
    )]
    Persistence {
        record: Box<DeploymentRecord>,
        path: PathBuf,
        reason: String,
    },
}

impl DeployError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingCredential(_) => FailureKind::MissingCredential,
            Self::InvalidCredential { .. } => FailureKind::InvalidCredential,
            Self::ArtifactNotFound { .. } => FailureKind::ArtifactNotFound,
            Self::ArtifactParse { .. } => FailureKind::ArtifactParseError,
            Self::Network { .. } => FailureKind::NetworkError,
            Self::Rejected { .. } => FailureKind::RejectedTransaction,
            Self::InvalidTransaction { .. } => FailureKind::InvalidTransaction,
            Self::Persistence { .. } => FailureKind::PersistenceError,
        }
    }

    /// The on-chain deployment, if it completed before the error occurred.
    pub fn deployed_record(&self) -> Option<&DeploymentRecord> {
        match self {
            Self::Persistence { record, .. } => Some(record.as_ref()),
            _ => None,
        }
    }

    /// Map a chain capability error raised while handling a `kind` transaction.
    pub(crate) fn from_chain(
        kind: TransactionKind,
        artifact_path: &std::path::Path,
        err: ChainError,
    ) -> Self {
        match err {
            ChainError::Network(reason) => Self::Network { kind, reason },
            ChainError::Timeout { .. } => Self::Network {
                kind,
                reason: err.to_string(),
            },
            ChainError::Rejected(reason) => Self::Rejected { kind, reason },
            ChainError::InvalidArtifact(reason) => Self::ArtifactParse {
                path: artifact_path.to_path_buf(),
                reason,
            },
            ChainError::InvalidCredential { name, reason } => {
                Self::InvalidCredential { name, reason }
            }
            ChainError::InvalidTransaction(reason) => Self::InvalidTransaction { kind, reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_chain_error_classification() {
        let path = Path::new("c.sierra.json");
        let cases = [
            (ChainError::Network("refused".to_string()), FailureKind::NetworkError),
            (ChainError::Rejected("reverted".to_string()), FailureKind::RejectedTransaction),
            (
                ChainError::InvalidArtifact("no CASM".to_string()),
                FailureKind::ArtifactParseError,
            ),
            (
                ChainError::InvalidCredential {
                    name: "private key",
                    reason: "not a valid felt".to_string(),
                },
                FailureKind::InvalidCredential,
            ),
            (
                ChainError::InvalidTransaction("fee calculation overflow".to_string()),
                FailureKind::InvalidTransaction,
            ),
        ];

        for (err, kind) in cases {
            let mapped = DeployError::from_chain(TransactionKind::Declare, path, err.clone());
            assert_eq!(mapped.kind(), kind, "{err:?}");
        }
    }

    #[test]
    fn test_invalid_key_message_is_not_a_rejection() {
        let err = DeployError::from_chain(
            TransactionKind::Declare,
            Path::new("c.sierra.json"),
            ChainError::InvalidCredential {
                name: "private key",
                reason: "not a valid felt".to_string(),
            },
        );

        assert!(!err.to_string().contains("rejected"));
    }
}
