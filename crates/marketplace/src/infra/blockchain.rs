use {
    crate::{
        boundary::{ChainError, ChainRead, ChainWrite, TxOptions, TxReceipt},
        deployment::Deployment,
        settlement::Settlement,
    },
    alloy::{
        network::Ethereum,
        primitives::{Address, B256, U256},
        providers::{PendingTransactionBuilder, Provider},
    },
    contracts::alloy::{ERC20, ERC721, WyvernExchange, WyvernRegistry},
    ethrpc::AlloyProvider,
    model::{order::Order, signature::Signature},
};

/// Chain access through the exchange and asset contracts of one deployment.
#[derive(Clone)]
pub struct Blockchain {
    provider: AlloyProvider,
    exchange: WyvernExchange::Instance,
    registry: WyvernRegistry::Instance,
}

impl Blockchain {
    pub fn new(provider: AlloyProvider, deployment: &Deployment) -> Self {
        Self {
            exchange: WyvernExchange::Instance::new(deployment.exchange, provider.clone()),
            registry: WyvernRegistry::Instance::new(deployment.registry, provider.clone()),
            provider,
        }
    }

    fn erc20(&self, token: Address) -> ERC20::Instance {
        ERC20::Instance::new(token, self.provider.clone())
    }

    fn erc721(&self, collection: Address) -> ERC721::Instance {
        ERC721::Instance::new(collection, self.provider.clone())
    }
}

/// Waits until the transaction is mined.
async fn mined(pending: PendingTransactionBuilder<Ethereum>) -> Result<TxReceipt, ChainError> {
    let hash = *pending.tx_hash();
    tracing::debug!(tx = %hash, "waiting for receipt");
    let receipt = pending.get_receipt().await?;
    Ok(TxReceipt {
        hash: receipt.transaction_hash,
        success: receipt.status(),
    })
}

#[async_trait::async_trait]
impl ChainRead for Blockchain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|err| ChainError::Unavailable(err.into()))
    }

    async fn proxy_of(&self, owner: Address) -> Result<Address, ChainError> {
        Ok(self.registry.proxies(owner).call().await?)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        Ok(self.erc20(token).balanceOf(owner).call().await?)
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        Ok(self.erc20(token).decimals().call().await?)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        Ok(self.erc20(token).allowance(owner, spender).call().await?)
    }

    async fn is_approved_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> Result<bool, ChainError> {
        Ok(self
            .erc721(collection)
            .isApprovedForAll(owner, operator)
            .call()
            .await?)
    }

    async fn validate_order_parameters(&self, order: &Order) -> Result<bool, ChainError> {
        Ok(self
            .exchange
            .validateOrderParameters_(
                order.registry,
                order.maker,
                order.static_target,
                order.static_selector,
                order.static_extradata.clone(),
                order.maximum_fill,
                order.listing_time,
                order.expiration_time,
                order.salt,
            )
            .call()
            .await?)
    }

    async fn hash_order(&self, order: &Order) -> Result<B256, ChainError> {
        Ok(self
            .exchange
            .hashOrder_(
                order.registry,
                order.maker,
                order.static_target,
                order.static_selector,
                order.static_extradata.clone(),
                order.maximum_fill,
                order.listing_time,
                order.expiration_time,
                order.salt,
            )
            .call()
            .await?)
    }

    async fn validate_order_authorization(
        &self,
        order_hash: B256,
        maker: Address,
        signature: &Signature,
    ) -> Result<bool, ChainError> {
        Ok(self
            .exchange
            .validateOrderAuthorization_(order_hash, maker, signature.encode_for_exchange())
            .call()
            .await?)
    }
}

#[async_trait::async_trait]
impl ChainWrite for Blockchain {
    async fn register_proxy(&self, tx: TxOptions) -> Result<TxReceipt, ChainError> {
        let pending = self
            .registry
            .registerProxy()
            .from(tx.from)
            .gas(tx.gas_limit)
            .send()
            .await?;
        mined(pending).await
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        tx: TxOptions,
    ) -> Result<TxReceipt, ChainError> {
        let pending = self
            .erc20(token)
            .approve(spender, amount)
            .from(tx.from)
            .gas(tx.gas_limit)
            .send()
            .await?;
        mined(pending).await
    }

    async fn set_approval_for_all(
        &self,
        collection: Address,
        operator: Address,
        tx: TxOptions,
    ) -> Result<TxReceipt, ChainError> {
        let pending = self
            .erc721(collection)
            .setApprovalForAll(operator, true)
            .from(tx.from)
            .gas(tx.gas_limit)
            .send()
            .await?;
        mined(pending).await
    }

    async fn atomic_match(
        &self,
        settlement: Settlement,
        tx: TxOptions,
    ) -> Result<TxReceipt, ChainError> {
        let call = settlement.into_call();
        let pending = self
            .exchange
            .atomicMatch_(
                call.uints,
                call.staticSelectors,
                call.firstExtradata,
                call.firstCalldata,
                call.secondExtradata,
                call.secondCalldata,
                call.howToCalls,
                call.metadata,
                call.signatures,
            )
            .from(tx.from)
            .gas(tx.gas_limit)
            .send()
            .await?;
        mined(pending).await
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{
            primitives::FixedBytes,
            providers::mock::Asserter,
            rpc::json_rpc::ErrorPayload,
            sol_types::SolValue,
        },
        contracts::alloy::networks,
        ethrpc::alloy::mocked_provider,
        model::signature::SigningScheme,
    };

    fn blockchain(asserter: &Asserter) -> Blockchain {
        Blockchain::new(
            mocked_provider(asserter.clone()),
            &Deployment::known(networks::RINKEBY).unwrap(),
        )
    }

    #[tokio::test]
    async fn reads_token_state() {
        let asserter = Asserter::new();
        let chain = blockchain(&asserter);
        let token = Address::repeat_byte(1);
        let owner = Address::repeat_byte(2);

        asserter.push_success(&U256::from(1337).abi_encode());
        asserter.push_success(&U256::from(18).abi_encode());
        asserter.push_success(&Address::repeat_byte(3).abi_encode());
        asserter.push_success(&true.abi_encode());

        assert_eq!(
            chain.token_balance(token, owner).await.unwrap(),
            U256::from(1337)
        );
        assert_eq!(chain.token_decimals(token).await.unwrap(), 18);
        assert_eq!(
            chain.proxy_of(owner).await.unwrap(),
            Address::repeat_byte(3)
        );
        assert!(
            chain
                .is_approved_for_all(token, owner, Address::repeat_byte(3))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn asks_the_exchange_about_orders() {
        let asserter = Asserter::new();
        let chain = blockchain(&asserter);
        let order = Order {
            maker: Address::repeat_byte(1),
            static_selector: FixedBytes([1, 2, 3, 4]),
            ..Default::default()
        };
        let signature = Signature::from_bytes(SigningScheme::EthSign, &[1; 65]).unwrap();

        asserter.push_success(&true.abi_encode());
        asserter.push_success(&B256::repeat_byte(9).abi_encode());
        asserter.push_success(&false.abi_encode());

        assert!(chain.validate_order_parameters(&order).await.unwrap());
        assert_eq!(
            chain.hash_order(&order).await.unwrap(),
            B256::repeat_byte(9)
        );
        assert!(
            !chain
                .validate_order_authorization(B256::repeat_byte(9), order.maker, &signature)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn node_failures_are_unavailable() {
        let asserter = Asserter::new();
        let chain = blockchain(&asserter);

        asserter.push_failure_msg("connection reset");
        asserter.push_failure(ErrorPayload {
            code: -32000,
            message: "header not found".into(),
            data: None,
        });

        assert!(matches!(
            chain.token_decimals(Address::repeat_byte(1)).await,
            Err(ChainError::Unavailable(_))
        ));
        assert!(matches!(
            chain.proxy_of(Address::repeat_byte(1)).await,
            Err(ChainError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn fetches_chain_id() {
        let asserter = Asserter::new();
        let chain = blockchain(&asserter);
        asserter.push_success(&"0x4");
        assert_eq!(chain.chain_id().await.unwrap(), 4);
    }
}
