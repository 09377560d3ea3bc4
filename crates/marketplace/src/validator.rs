use {
    crate::{Error, Side, boundary::ChainRead},
    alloy::primitives::B256,
    model::{
        order::{MalformedOrder, Order},
        signature::Signature,
    },
    std::sync::Arc,
    tracing::instrument,
};

/// Asks the exchange whether it would accept an order. The exchange's
/// answer is authoritative, nothing here is checked locally except that both
/// sides agree on the order hash.
#[derive(Clone)]
pub struct Validator {
    read: Arc<dyn ChainRead>,
}

impl Validator {
    pub fn new(read: Arc<dyn ChainRead>) -> Self {
        Self { read }
    }

    /// Checks parameters, hash and authorization in that order and returns
    /// the order hash.
    #[instrument(skip(self, order, signature), fields(maker = %order.maker))]
    pub async fn validate(
        &self,
        order: &Order,
        signature: &Signature,
        side: Side,
    ) -> Result<B256, Error> {
        if !self.read.validate_order_parameters(order).await? {
            return Err(Error::InvalidOrderParameters(side));
        }

        let local = order.hash_struct();
        let onchain = self.read.hash_order(order).await?;
        if local != onchain {
            return Err(Error::MalformedOrder(
                side,
                MalformedOrder::HashMismatch { local, onchain },
            ));
        }

        if !self
            .read
            .validate_order_authorization(onchain, order.maker, signature)
            .await?
        {
            return Err(Error::InvalidOrderAuthorization(side));
        }

        tracing::debug!(hash = %onchain, "order accepted by exchange");
        Ok(onchain)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::boundary::MockChainRead,
        alloy::primitives::{Address, U256},
        mockall::{Sequence, predicate::eq},
        model::signature::SigningScheme,
    };

    fn order() -> Order {
        Order {
            registry: Address::repeat_byte(1),
            maker: Address::repeat_byte(2),
            static_target: Address::repeat_byte(3),
            maximum_fill: U256::ONE,
            expiration_time: U256::from(10),
            salt: U256::from(5),
            ..Default::default()
        }
    }

    fn signature() -> Signature {
        Signature::from_bytes(SigningScheme::Eip712, &[1; 65]).unwrap()
    }

    #[tokio::test]
    async fn accepts_orders_in_order() {
        let hash = order().hash_struct();
        let mut sequence = Sequence::new();
        let mut read = MockChainRead::new();
        read.expect_validate_order_parameters()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(true));
        read.expect_hash_order()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_| Ok(hash));
        read.expect_validate_order_authorization()
            .with(eq(hash), eq(Address::repeat_byte(2)), eq(signature()))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(true));

        let validator = Validator::new(Arc::new(read));
        assert_eq!(
            validator
                .validate(&order(), &signature(), Side::Listing)
                .await
                .unwrap(),
            hash
        );
    }

    #[tokio::test]
    async fn rejected_parameters_skip_remaining_checks() {
        let mut read = MockChainRead::new();
        read.expect_validate_order_parameters()
            .returning(|_| Ok(false));
        read.expect_hash_order().never();
        read.expect_validate_order_authorization().never();

        let validator = Validator::new(Arc::new(read));
        assert!(matches!(
            validator.validate(&order(), &signature(), Side::Counter).await,
            Err(Error::InvalidOrderParameters(Side::Counter))
        ));
    }

    #[tokio::test]
    async fn hash_disagreement_is_malformed_order() {
        let mut read = MockChainRead::new();
        read.expect_validate_order_parameters()
            .returning(|_| Ok(true));
        read.expect_hash_order()
            .returning(|_| Ok(B256::repeat_byte(0xff)));
        read.expect_validate_order_authorization().never();

        let validator = Validator::new(Arc::new(read));
        let err = validator
            .validate(&order(), &signature(), Side::Listing)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedOrder(Side::Listing, MalformedOrder::HashMismatch { .. })
        ));
        assert!(err.is_protocol_bug());
    }

    #[tokio::test]
    async fn rejected_authorization_names_the_side() {
        let hash = order().hash_struct();
        let mut read = MockChainRead::new();
        read.expect_validate_order_parameters()
            .returning(|_| Ok(true));
        read.expect_hash_order().returning(move |_| Ok(hash));
        read.expect_validate_order_authorization()
            .returning(|_, _, _| Ok(false));

        let validator = Validator::new(Arc::new(read));
        assert!(matches!(
            validator.validate(&order(), &signature(), Side::Listing).await,
            Err(Error::InvalidOrderAuthorization(Side::Listing))
        ));
    }
}
