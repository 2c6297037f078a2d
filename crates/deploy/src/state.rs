//! Deployment workflow states.
//!
//! The order is fixed: credentials -> artifact -> declare -> deploy -> record.
//! Every stage gates the next one and any stage may fail.

use crate::FailureKind;

/// State of a deployment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum DeploymentState {
    #[default]
    Start,
    CredentialsResolved,
    ArtifactLoaded,
    Declared,
    DeclareConfirmed,
    Deployed,
    DeployConfirmed,
    RecordPersisted,
    #[strum(to_string = "Failed({0})")]
    Failed(FailureKind),
}

impl DeploymentState {
    /// The state following this one on success, `None` for terminal states.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::CredentialsResolved),
            Self::CredentialsResolved => Some(Self::ArtifactLoaded),
            Self::ArtifactLoaded => Some(Self::Declared),
            Self::Declared => Some(Self::DeclareConfirmed),
            Self::DeclareConfirmed => Some(Self::Deployed),
            Self::Deployed => Some(Self::DeployConfirmed),
            Self::DeployConfirmed => Some(Self::RecordPersisted),
            Self::RecordPersisted | Self::Failed(_) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}
