//! The declare -> deploy workflow.

use std::path::Path;

use crate::{
    CompiledArtifact, Credentials, DeployConfig, DeployError, DeploymentRecord, DeploymentState,
    RecordWriter,
    chain::{
        ChainClient, ConstructorArguments, PollConfig, TerminalStatus, TransactionHandle,
        TransactionKind,
    },
};

/// Runs one deployment: resolve credentials, load the artifact, declare, wait,
/// deploy, wait, then persist the record.
///
/// No step is retried and nothing is rolled back: declarations and deployments
/// are irreversible once submitted.
///
/// # Example
///
/// ```no_run
/// use cairup_deploy::{DeployConfig, JsonFileRecordWriter, Orchestrator, StarknetChainClient};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = DeployConfig::load(None)?;
/// let client = StarknetChainClient::new(config.rpc_url()?)?;
/// let writer = JsonFileRecordWriter::new(&config.output);
///
/// let record = Orchestrator::new(config, client, writer).run().await?;
/// println!("{}", record.contract_address);
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<C, W> {
    config: DeployConfig,
    client: C,
    writer: W,
    state: DeploymentState,
}

impl<C, W> Orchestrator<C, W>
where
    C: ChainClient,
    W: RecordWriter,
{
    pub fn new(config: DeployConfig, client: C, writer: W) -> Self {
        Self {
            config,
            client,
            writer,
            state: DeploymentState::Start,
        }
    }

    /// The current workflow state.
    pub fn state(&self) -> DeploymentState {
        self.state
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Run the workflow from the start.
    ///
    /// On failure the state becomes [`DeploymentState::Failed`] with the kind of
    /// the returned error.
    pub async fn run(&mut self) -> Result<DeploymentRecord, DeployError> {
        self.state = DeploymentState::Start;

        match self.execute().await {
            Ok(record) => Ok(record),
            Err(err) => {
                tracing::error!(
                    reached = %self.state,
                    kind = %err.kind(),
                    error = %err,
                    "Deployment failed"
                );
                self.state = DeploymentState::Failed(err.kind());
                Err(err)
            }
        }
    }

    async fn execute(&mut self) -> Result<DeploymentRecord, DeployError> {
        let credentials = Credentials::resolve(
            self.config.private_key.as_deref(),
            self.config.account_address.as_deref(),
        )?;
        self.advance(DeploymentState::CredentialsResolved);
        tracing::info!(account_address = %credentials.account_address, "Account initialized");

        tracing::info!(path = %self.config.artifact.display(), "Loading compiled contract...");
        let artifact = CompiledArtifact::load(&self.config.artifact, self.config.casm.as_deref())?;
        self.advance(DeploymentState::ArtifactLoaded);

        let poll = self.config.poll_config();

        tracing::info!("Declaring contract...");
        let declared = self
            .client
            .declare(&credentials, &artifact)
            .await
            .map_err(|e| DeployError::from_chain(TransactionKind::Declare, &artifact.path, e))?;
        self.advance(DeploymentState::Declared);

        tracing::info!(
            transaction_hash = %declared.handle.transaction_hash,
            "Waiting for declaration transaction..."
        );
        self.confirm(&declared.handle, &poll, &artifact.path).await?;
        self.advance(DeploymentState::DeclareConfirmed);
        tracing::info!(class_hash = %declared.class_hash, "Contract declared");

        if let Some(embedded) = &artifact.class_hash {
            if !same_hex(embedded, &declared.class_hash) {
                tracing::warn!(
                    embedded = %embedded,
                    assigned = %declared.class_hash,
                    "Class hash in the artifact differs from the declared one, using the declared hash"
                );
            }
        }

        let constructor_args = ConstructorArguments::admin_and_fee(
            &credentials.account_address,
            self.config.fee_basis_points,
        );

        tracing::info!(constructor_args = ?constructor_args.as_slice(), "Deploying contract...");
        let deployed = self
            .client
            .deploy(&credentials, &declared.class_hash, &constructor_args)
            .await
            .map_err(|e| DeployError::from_chain(TransactionKind::Deploy, &artifact.path, e))?;
        self.advance(DeploymentState::Deployed);

        tracing::info!(
            transaction_hash = %deployed.handle.transaction_hash,
            "Waiting for deployment transaction..."
        );
        self.confirm(&deployed.handle, &poll, &artifact.path).await?;
        self.advance(DeploymentState::DeployConfirmed);
        tracing::info!(
            contract_address = %deployed.contract_address,
            "Contract deployed successfully!"
        );

        let record = DeploymentRecord::new(
            deployed.contract_address,
            declared.class_hash,
            deployed.handle.transaction_hash,
            self.config.network.clone(),
        );

        match self.writer.write(&record) {
            Ok(path) => {
                self.advance(DeploymentState::RecordPersisted);
                tracing::info!(path = %path.display(), "Deployment info saved");
                Ok(record)
            }
            Err(e) => Err(DeployError::Persistence {
                record: Box::new(record),
                path: self.writer.destination().to_path_buf(),
                reason: format!("{e:#}"),
            }),
        }
    }

    /// Wait for `handle` to be final and turn a rejection into an error.
    async fn confirm(
        &self,
        handle: &TransactionHandle,
        poll: &PollConfig,
        artifact_path: &Path,
    ) -> Result<(), DeployError> {
        let status = self
            .client
            .await_finality(handle, poll)
            .await
            .map_err(|e| DeployError::from_chain(handle.kind, artifact_path, e))?;

        match status {
            TerminalStatus::Accepted => Ok(()),
            TerminalStatus::Rejected { reason } => Err(DeployError::Rejected {
                kind: handle.kind,
                reason,
            }),
        }
    }

    fn advance(&mut self, to: DeploymentState) {
        debug_assert_eq!(self.state.next(), Some(to), "invalid transition from {}", self.state);
        tracing::debug!(from = %self.state, to = %to, "Deployment state changed");
        self.state = to;
    }
}

/// Compare two hex strings as numbers: case, prefix and leading zeros are ignored.
fn same_hex(a: &str, b: &str) -> bool {
    fn normalize(value: &str) -> String {
        let digits = value.trim().trim_start_matches("0x").trim_start_matches('0');
        digits.to_ascii_lowercase()
    }

    normalize(a) == normalize(b)
}
