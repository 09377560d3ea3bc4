//! Trait definitions for external system boundaries.
//!
//! These traits abstract blockchain interactions to enable unit testing with
//! mocks.

use {
    crate::settlement::Settlement,
    alloy::primitives::{Address, B256, U256},
    ethrpc::alloy::errors::ContractErrorExt,
    model::{order::Order, signature::Signature},
    std::future::Future,
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ChainError {
    /// The node could not be reached or failed to answer.
    #[error("node unavailable: {0:#}")]
    Unavailable(anyhow::Error),
    /// The call reached the contract but reverted or returned garbage.
    #[error("contract error: {0:#}")]
    Contract(anyhow::Error),
}

impl From<alloy::contract::Error> for ChainError {
    fn from(err: alloy::contract::Error) -> Self {
        if err.is_node_error() {
            Self::Unavailable(err.into())
        } else {
            Self::Contract(err.into())
        }
    }
}

impl From<alloy::providers::PendingTransactionError> for ChainError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        if err.is_node_error() {
            Self::Unavailable(err.into())
        } else {
            Self::Contract(err.into())
        }
    }
}

/// Sender and execution ceiling of a chain write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TxOptions {
    pub from: Address,
    pub gas_limit: u64,
}

/// Outcome of a mined transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TxReceipt {
    pub hash: B256,
    pub success: bool,
}

/// Abstracts blockchain read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChainRead: Send + Sync {
    /// Numeric id of the connected chain.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Proxy registered for `owner`, the zero address if there is none.
    async fn proxy_of(&self, owner: Address) -> Result<Address, ChainError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    async fn is_approved_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> Result<bool, ChainError>;

    /// The exchange's `validateOrderParameters_`.
    async fn validate_order_parameters(&self, order: &Order) -> Result<bool, ChainError>;

    /// The exchange's `hashOrder_`.
    async fn hash_order(&self, order: &Order) -> Result<B256, ChainError>;

    /// The exchange's `validateOrderAuthorization_`.
    async fn validate_order_authorization(
        &self,
        order_hash: B256,
        maker: Address,
        signature: &Signature,
    ) -> Result<bool, ChainError>;
}

/// Abstracts blockchain write operations. Every write resolves once the
/// transaction is mined.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChainWrite: Send + Sync {
    async fn register_proxy(&self, tx: TxOptions) -> Result<TxReceipt, ChainError>;

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        tx: TxOptions,
    ) -> Result<TxReceipt, ChainError>;

    async fn set_approval_for_all(
        &self,
        collection: Address,
        operator: Address,
        tx: TxOptions,
    ) -> Result<TxReceipt, ChainError>;

    async fn atomic_match(
        &self,
        settlement: Settlement,
        tx: TxOptions,
    ) -> Result<TxReceipt, ChainError>;
}

/// Runs a chain write on its own task. Once called the write is no longer
/// tied to the caller: dropping the returned future leaves it running until
/// it is mined.
pub async fn submit<F>(action: &'static str, write: F) -> Result<TxReceipt, ChainError>
where
    F: Future<Output = Result<TxReceipt, ChainError>> + Send + 'static,
{
    tracing::debug!(action, "submitting transaction");
    let receipt = tokio::spawn(write)
        .await
        .map_err(|err| ChainError::Unavailable(anyhow::anyhow!("{action} task failed: {err}")))??;
    tracing::info!(action, tx = %receipt.hash, success = receipt.success, "transaction mined");
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        ethrpc::alloy::errors::{testing_alloy_contract_error, testing_alloy_node_error},
    };

    #[test]
    fn classifies_contract_errors() {
        assert!(matches!(
            ChainError::from(testing_alloy_node_error()),
            ChainError::Unavailable(_)
        ));
        assert!(matches!(
            ChainError::from(testing_alloy_contract_error()),
            ChainError::Contract(_)
        ));
    }

    #[tokio::test]
    async fn submitted_writes_survive_the_caller() {
        let (sender, receiver) = tokio::sync::oneshot::channel();
        let write = async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let _ = sender.send(());
            Ok(TxReceipt {
                hash: B256::repeat_byte(1),
                success: true,
            })
        };

        let submission = tokio::spawn(submit("test", write));
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        submission.abort();

        tokio::time::timeout(std::time::Duration::from_secs(1), receiver)
            .await
            .unwrap()
            .unwrap();
    }
}
