//! [`ChainClient`] backed by a Starknet JSON-RPC node.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use rand::Rng;
use starknet::{
    accounts::{Account, AccountError, ExecutionEncoding, SingleOwnerAccount},
    contract::ContractFactory,
    core::types::{
        BlockId, BlockTag, ExecutionResult, Felt, StarknetError,
        contract::{CompiledClass, SierraClass},
    },
    providers::{
        Provider, ProviderError,
        jsonrpc::{HttpTransport, JsonRpcClient},
    },
    signers::{LocalWallet, SigningKey},
};
use tokio::sync::OnceCell;
use url::Url;

use super::{
    ChainClient, ChainError, ConstructorArguments, Declared, Deployed, PollConfig,
    TerminalStatus, TransactionHandle, TransactionKind,
    poll::{Status, poll_until},
};
use crate::{CompiledArtifact, Credentials, credentials::ensure_hex_prefix};

type RpcProvider = JsonRpcClient<HttpTransport>;
type RpcAccount = SingleOwnerAccount<RpcProvider, LocalWallet>;

/// Timeout of a single JSON-RPC request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Chain client talking to a Starknet node over JSON-RPC.
///
/// Creating the client performs no network I/O. The chain id is fetched on the
/// first submission and cached. Every request is bounded by a fixed timeout.
pub struct StarknetChainClient {
    rpc_url: Url,
    http: reqwest::Client,
    provider: RpcProvider,
    chain_id: OnceCell<Felt>,
}

impl StarknetChainClient {
    pub fn new(rpc_url: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            provider: JsonRpcClient::new(HttpTransport::new_with_client(
                rpc_url.clone(),
                http.clone(),
            )),
            rpc_url,
            http,
            chain_id: OnceCell::new(),
        })
    }

    async fn chain_id(&self) -> Result<Felt, ChainError> {
        self.chain_id
            .get_or_try_init(|| async {
                let chain_id = self.provider.chain_id().await.map_err(provider_error)?;
                tracing::debug!(chain_id = %format!("{chain_id:#x}"), "Fetched chain id");
                Ok::<_, ChainError>(chain_id)
            })
            .await
            .copied()
    }

    /// Build a single-owner account signing with `credentials`.
    async fn account(&self, credentials: &Credentials) -> Result<RpcAccount, ChainError> {
        let signing_key = Felt::from_hex(&ensure_hex_prefix(credentials.signing_key.expose()))
            .map_err(|_| ChainError::InvalidCredential {
                name: "private key",
                reason: "not a valid felt".to_string(),
            })?;
        let address = Felt::from_hex(&credentials.account_address).map_err(|_| {
            ChainError::InvalidCredential {
                name: "account address",
                reason: format!("{} is not a valid felt", credentials.account_address),
            }
        })?;
        let chain_id = self.chain_id().await?;

        let signer = LocalWallet::from(SigningKey::from_secret_scalar(signing_key));
        let provider = JsonRpcClient::new(HttpTransport::new_with_client(
            self.rpc_url.clone(),
            self.http.clone(),
        ));

        let mut account =
            SingleOwnerAccount::new(provider, signer, address, chain_id, ExecutionEncoding::New);
        account.set_block_id(BlockId::Tag(BlockTag::Pending));

        Ok(account)
    }
}

impl ChainClient for StarknetChainClient {
    async fn declare(
        &self,
        credentials: &Credentials,
        artifact: &CompiledArtifact,
    ) -> Result<Declared, ChainError> {
        let casm = artifact.casm.as_ref().ok_or_else(|| {
            ChainError::InvalidArtifact(
                "no compiled CASM class found; set `casm = true` under \
                 [[target.starknet-contract]] in Scarb.toml or pass --casm"
                    .to_string(),
            )
        })?;
        let compiled: CompiledClass = serde_json::from_value(casm.clone())
            .map_err(|e| ChainError::InvalidArtifact(format!("not a CASM class: {e}")))?;
        let compiled_class_hash = compiled.class_hash().map_err(|e| {
            ChainError::InvalidArtifact(format!("failed to compute compiled class hash: {e}"))
        })?;

        let sierra: SierraClass = serde_json::from_value(artifact.class_definition.clone())
            .map_err(|e| ChainError::InvalidArtifact(format!("not a Sierra contract class: {e}")))?;
        let flattened = sierra
            .flatten()
            .map_err(|e| ChainError::InvalidArtifact(format!("failed to flatten class: {e}")))?;

        let account = self.account(credentials).await?;

        tracing::debug!(
            compiled_class_hash = %format!("{compiled_class_hash:#x}"),
            "Sending declare transaction"
        );

        let result = account
            .declare_v3(Arc::new(flattened), compiled_class_hash)
            .send()
            .await
            .map_err(account_error)?;

        Ok(Declared {
            handle: TransactionHandle {
                transaction_hash: format!("{:#x}", result.transaction_hash),
                kind: TransactionKind::Declare,
            },
            class_hash: format!("{:#x}", result.class_hash),
        })
    }

    async fn deploy(
        &self,
        credentials: &Credentials,
        class_hash: &str,
        constructor_args: &ConstructorArguments,
    ) -> Result<Deployed, ChainError> {
        let class_hash = parse_hex(class_hash, "class hash")?;
        let calldata = constructor_args
            .iter()
            .map(|arg| parse_felt(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let salt = Felt::from(rand::rng().random::<u64>());

        let account = self.account(credentials).await?;
        let factory = ContractFactory::new(class_hash, account);
        let deployment = factory.deploy_v3(calldata, salt, true);
        let contract_address = deployment.deployed_address();

        tracing::debug!(
            salt = %format!("{salt:#x}"),
            contract_address = %format!("{contract_address:#x}"),
            "Sending deploy transaction"
        );

        let result = deployment.send().await.map_err(account_error)?;

        Ok(Deployed {
            handle: TransactionHandle {
                transaction_hash: format!("{:#x}", result.transaction_hash),
                kind: TransactionKind::Deploy,
            },
            contract_address: format!("{contract_address:#x}"),
        })
    }

    async fn await_finality(
        &self,
        handle: &TransactionHandle,
        poll: &PollConfig,
    ) -> Result<TerminalStatus, ChainError> {
        let transaction_hash = Felt::from_hex(&handle.transaction_hash).map_err(|_| {
            ChainError::Network(format!(
                "invalid transaction hash {}",
                handle.transaction_hash
            ))
        })?;

        poll_until(&handle.transaction_hash, poll, || async move {
            match self.provider.get_transaction_receipt(transaction_hash).await {
                Ok(receipt) => Ok(Status::Done(match receipt.receipt.execution_result() {
                    ExecutionResult::Succeeded => TerminalStatus::Accepted,
                    ExecutionResult::Reverted { reason } => TerminalStatus::Rejected {
                        reason: reason.clone(),
                    },
                })),
                Err(ProviderError::StarknetError(StarknetError::TransactionHashNotFound)) => {
                    Ok(Status::Pending)
                }
                Err(e) => Err(provider_error(e)),
            }
        })
        .await
    }
}

fn parse_hex(value: &str, what: &str) -> Result<Felt, ChainError> {
    Felt::from_hex(value)
        .map_err(|_| ChainError::InvalidTransaction(format!("{what} {value} is not a valid felt")))
}

/// Parse a constructor value: `0x`-prefixed values are hex, others decimal.
fn parse_felt(value: &str) -> Result<Felt, ChainError> {
    let parsed = if value.starts_with("0x") {
        Felt::from_hex(value)
    } else {
        Felt::from_dec_str(value)
    };

    parsed.map_err(|_| {
        ChainError::InvalidTransaction(format!("constructor argument {value} is not a valid felt"))
    })
}

/// Errors reported by the node itself are rejections, anything else is a network failure.
fn provider_error(err: ProviderError) -> ChainError {
    match err {
        ProviderError::StarknetError(err) => ChainError::Rejected(format!("{err:?}")),
        other => ChainError::Network(other.to_string()),
    }
}

/// Signing and fee computation happen locally, nothing reached the chain.
fn account_error<S: std::fmt::Display>(err: AccountError<S>) -> ChainError {
    match err {
        AccountError::Provider(err) => provider_error(err),
        other => ChainError::InvalidTransaction(other.to_string()),
    }
}
