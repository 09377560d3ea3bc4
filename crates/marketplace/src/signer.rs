use {
    crate::Error,
    alloy::primitives::{Address, B256, Bytes},
    model::{
        Domain,
        eip712,
        order::Order,
        signature::{Signature, SigningScheme},
    },
    std::sync::Arc,
    thiserror::Error,
    tracing::instrument,
};

#[derive(Debug, Error)]
pub enum SigningError {
    /// The key holder declined the request.
    #[error("signing request rejected")]
    Rejected,
    /// No key holder could be reached.
    #[error("signing authority unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

/// Capability of a wallet to sign on behalf of `account`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TypedDataSigner: Send + Sync {
    /// Signs an `eth_signTypedData_v4` payload and returns the raw 65 byte
    /// signature.
    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &serde_json::Value,
    ) -> Result<Bytes, SigningError>;

    /// Signs a 32 byte digest as an EIP-191 personal message.
    async fn sign_digest(&self, account: Address, digest: B256) -> Result<Bytes, SigningError>;
}

/// Requests order signatures for one exchange domain.
#[derive(Clone)]
pub struct OrderSigner {
    signer: Arc<dyn TypedDataSigner>,
    domain: Domain,
    scheme: SigningScheme,
}

impl OrderSigner {
    pub fn new(signer: Arc<dyn TypedDataSigner>, domain: Domain, scheme: SigningScheme) -> Self {
        Self {
            signer,
            domain,
            scheme,
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Suspends until `account` signed `order` or the request failed.
    #[instrument(skip_all, fields(maker = %account, scheme = %self.scheme))]
    pub async fn request_signature(&self, order: &Order, account: Address) -> Result<Signature, Error> {
        let raw = match self.scheme {
            SigningScheme::Eip712 => {
                let payload = eip712::typed_data(&self.domain, &Order::SCHEMA, &order.message())
                    .expect("order message matches the order schema");
                self.signer.sign_typed_data(account, &payload).await?
            }
            SigningScheme::EthSign => {
                let digest = order.signing_digest(&self.domain.separator());
                self.signer.sign_digest(account, digest).await?
            }
        };
        let signature = Signature::from_bytes(self.scheme, &raw)?;
        tracing::debug!(?signature, "order signed");
        Ok(signature)
    }
}
