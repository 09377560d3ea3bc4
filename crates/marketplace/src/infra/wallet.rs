//! Signing authorities for orders.

use {
    crate::signer::{SigningError, TypedDataSigner},
    alloy::{
        dyn_abi::TypedData,
        primitives::{Address, B256, Bytes},
        providers::Provider,
        signers::{Signer, local::PrivateKeySigner},
        transports::{RpcError, TransportError},
    },
    anyhow::{Context, anyhow},
    ethrpc::{AlloyProvider, alloy::errors::USER_REJECTED_REQUEST},
};

/// Signs with a private key held in memory.
#[derive(Clone, Debug)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn ensure_account(&self, account: Address) -> Result<(), SigningError> {
        if account != self.signer.address() {
            return Err(SigningError::Unavailable(anyhow!(
                "no key for account {account}"
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TypedDataSigner for LocalWallet {
    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &serde_json::Value,
    ) -> Result<Bytes, SigningError> {
        self.ensure_account(account)?;
        let typed_data: TypedData = serde_json::from_value(payload.clone())
            .context("invalid typed data payload")
            .map_err(SigningError::Unavailable)?;
        let digest = typed_data
            .eip712_signing_hash()
            .context("cannot hash typed data payload")
            .map_err(SigningError::Unavailable)?;
        let signature = self
            .signer
            .sign_hash(&digest)
            .await
            .map_err(|err| SigningError::Unavailable(err.into()))?;
        Ok(signature.as_bytes().into())
    }

    async fn sign_digest(&self, account: Address, digest: B256) -> Result<Bytes, SigningError> {
        self.ensure_account(account)?;
        let signature = self
            .signer
            .sign_message(digest.as_slice())
            .await
            .map_err(|err| SigningError::Unavailable(err.into()))?;
        Ok(signature.as_bytes().into())
    }
}

/// Forwards signing requests to the node, or to whatever wallet answers its
/// JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcWallet {
    provider: AlloyProvider,
}

impl RpcWallet {
    pub fn new(provider: AlloyProvider) -> Self {
        Self { provider }
    }
}

fn signing_error(err: TransportError) -> SigningError {
    match &err {
        RpcError::ErrorResp(payload) if payload.code == USER_REJECTED_REQUEST => {
            SigningError::Rejected
        }
        _ => SigningError::Unavailable(err.into()),
    }
}

#[async_trait::async_trait]
impl TypedDataSigner for RpcWallet {
    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &serde_json::Value,
    ) -> Result<Bytes, SigningError> {
        self.provider
            .raw_request::<(Address, String), Bytes>(
                "eth_signTypedData_v4".into(),
                (account, payload.to_string()),
            )
            .await
            .map_err(signing_error)
    }

    async fn sign_digest(&self, account: Address, digest: B256) -> Result<Bytes, SigningError> {
        self.provider
            .raw_request::<(Address, B256), Bytes>("eth_sign".into(), (account, digest))
            .await
            .map_err(signing_error)
    }
}
