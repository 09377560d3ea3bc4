//! Contains the order type as described by the exchange contract.

use {
    crate::eip712::{
        DomainSeparator,
        Field,
        FieldType,
        Message,
        Schema,
        Value,
        hashed_eip712_message,
    },
    alloy::{
        primitives::{Address, B256, Bytes, FixedBytes, U256},
        sol_types::SolValue,
    },
    number::serialization::HexOrDecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
    thiserror::Error,
};

/// Expiration time used when a listing has no explicit end.
pub const NEVER_EXPIRES: u64 = 10_000_000_000;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MalformedOrder {
    #[error("order {0} must not be the zero address")]
    ZeroAddress(&'static str),
    #[error("order expires at {expiration} which is not after its listing time {listing}")]
    EmptyValidity { listing: U256, expiration: U256 },
    #[error("static extradata is not an encoded asset swap")]
    Extradata,
    #[error("exchange hashes the order to {onchain} but it hashes locally to {local}")]
    HashMismatch { local: B256, onchain: B256 },
}

/// A maker's trade intent.
///
/// Two orders with identical fields have identical hashes, the `salt` is
/// what keeps otherwise equal orders apart.
#[serde_as]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub registry: Address,
    pub maker: Address,
    pub static_target: Address,
    pub static_selector: FixedBytes<4>,
    pub static_extradata: Bytes,
    #[serde_as(as = "HexOrDecimalU256")]
    pub maximum_fill: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub listing_time: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub expiration_time: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub salt: U256,
}

impl Order {
    pub const SCHEMA: Schema = Schema {
        name: "Order",
        fields: &[
            Field {
                name: "registry",
                ty: FieldType::Address,
            },
            Field {
                name: "maker",
                ty: FieldType::Address,
            },
            Field {
                name: "staticTarget",
                ty: FieldType::Address,
            },
            Field {
                name: "staticSelector",
                ty: FieldType::Bytes4,
            },
            Field {
                name: "staticExtradata",
                ty: FieldType::Bytes,
            },
            Field {
                name: "maximumFill",
                ty: FieldType::Uint256,
            },
            Field {
                name: "listingTime",
                ty: FieldType::Uint256,
            },
            Field {
                name: "expirationTime",
                ty: FieldType::Uint256,
            },
            Field {
                name: "salt",
                ty: FieldType::Uint256,
            },
        ],
    };

    pub fn builder() -> OrderBuilder {
        OrderBuilder::default()
    }

    pub fn message(&self) -> Message {
        [
            ("registry", Value::Address(self.registry)),
            ("maker", Value::Address(self.maker)),
            ("staticTarget", Value::Address(self.static_target)),
            ("staticSelector", Value::Bytes4(self.static_selector)),
            ("staticExtradata", Value::Bytes(self.static_extradata.clone())),
            ("maximumFill", Value::Uint256(self.maximum_fill)),
            ("listingTime", Value::Uint256(self.listing_time)),
            ("expirationTime", Value::Uint256(self.expiration_time)),
            ("salt", Value::Uint256(self.salt)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    /// The order hash, which is what the exchange's `hashOrder_` returns.
    pub fn hash_struct(&self) -> B256 {
        Self::SCHEMA
            .hash_struct(&self.message())
            .expect("order message matches the order schema")
    }

    /// The digest a maker signs for the exchange with the given domain.
    pub fn signing_digest(&self, domain_separator: &DomainSeparator) -> B256 {
        hashed_eip712_message(domain_separator, &self.hash_struct())
    }

    pub fn validate(&self) -> Result<(), MalformedOrder> {
        for (name, address) in [
            ("registry", self.registry),
            ("maker", self.maker),
            ("static target", self.static_target),
        ] {
            if address.is_zero() {
                return Err(MalformedOrder::ZeroAddress(name));
            }
        }
        if self.expiration_time <= self.listing_time {
            return Err(MalformedOrder::EmptyValidity {
                listing: self.listing_time,
                expiration: self.expiration_time,
            });
        }
        Ok(())
    }
}

/// A fresh 256 bit nonce.
pub fn random_salt() -> U256 {
    U256::from_be_bytes(rand::random::<[u8; 32]>())
}

#[derive(Debug, Clone)]
pub struct OrderBuilder(Order);

impl Default for OrderBuilder {
    fn default() -> Self {
        Self(Order {
            maximum_fill: U256::ONE,
            expiration_time: U256::from(NEVER_EXPIRES),
            salt: random_salt(),
            ..Default::default()
        })
    }
}

impl OrderBuilder {
    pub fn with_registry(mut self, registry: Address) -> Self {
        self.0.registry = registry;
        self
    }

    pub fn with_maker(mut self, maker: Address) -> Self {
        self.0.maker = maker;
        self
    }

    pub fn with_static_call(mut self, target: Address, selector: FixedBytes<4>) -> Self {
        self.0.static_target = target;
        self.0.static_selector = selector;
        self
    }

    pub fn with_static_extradata(mut self, extradata: Bytes) -> Self {
        self.0.static_extradata = extradata;
        self
    }

    pub fn with_maximum_fill(mut self, maximum_fill: U256) -> Self {
        self.0.maximum_fill = maximum_fill;
        self
    }

    pub fn with_validity(mut self, listing_time: u64, expiration_time: u64) -> Self {
        self.0.listing_time = U256::from(listing_time);
        self.0.expiration_time = U256::from(expiration_time);
        self
    }

    pub fn with_salt(mut self, salt: U256) -> Self {
        self.0.salt = salt;
        self
    }

    pub fn build(self) -> Result<Order, MalformedOrder> {
        self.0.validate()?;
        Ok(self.0)
    }
}

/// Arguments the static `any` routine receives for swapping one
/// non-fungible token against an amount of a fungible token:
/// `abi.encode(address[2] [give, take], uint256[2] [tokenId, price])`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwapTerms {
    /// Asset the order's maker hands over.
    pub give: Address,
    /// Asset the order's maker receives.
    pub take: Address,
    pub token_id: U256,
    pub price: U256,
}

impl SwapTerms {
    pub fn encode(&self) -> Bytes {
        ([self.give, self.take], [self.token_id, self.price])
            .abi_encode_params()
            .into()
    }

    pub fn decode(extradata: &[u8]) -> Result<Self, MalformedOrder> {
        let ([give, take], [token_id, price]) =
            <([Address; 2], [U256; 2])>::abi_decode_params(extradata)
                .map_err(|_| MalformedOrder::Extradata)?;
        Ok(Self {
            give,
            take,
            token_id,
            price,
        })
    }

    /// Terms as seen from the counterparty.
    pub fn mirrored(&self) -> Self {
        Self {
            give: self.take,
            take: self.give,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::eip712::Domain,
        alloy::{
            primitives::{address, fixed_bytes},
            sol_types::{Eip712Domain, SolStruct},
        },
        serde_json::json,
    };

    mod reference {
        alloy::sol! {
            struct Order {
                address registry;
                address maker;
                address staticTarget;
                bytes4 staticSelector;
                bytes staticExtradata;
                uint256 maximumFill;
                uint256 listingTime;
                uint256 expirationTime;
                uint256 salt;
            }
        }
    }

    const EXCHANGE: Address = address!("0x8Ce1A397639BdB10262036925cc57886bC095324");
    const NFT: Address = address!("0x60735D512ddfAF40512e013398fFFc6B428F2F63");
    const TOKEN: Address = address!("0xF6436e7EF8C879F97e4B28De5Fd00d9c003A8FC5");

    fn listing() -> Order {
        let terms = SwapTerms {
            give: NFT,
            take: TOKEN,
            token_id: U256::from(42),
            price: U256::from(1_000_000_000_000_000_000_u64),
        };
        Order::builder()
            .with_registry(address!("0xbb036f8b125EFd51884Cd281384E93F80AADB3Be"))
            .with_maker(Address::repeat_byte(0x11))
            .with_static_call(
                address!("0x1958861493c4F556e3E0156C7853452d06aC2417"),
                fixed_bytes!("0x837b54ad"),
            )
            .with_static_extradata(terms.encode())
            .with_salt(U256::from(1234))
            .build()
            .unwrap()
    }

    fn solidity_order(order: &Order) -> reference::Order {
        reference::Order {
            registry: order.registry,
            maker: order.maker,
            staticTarget: order.static_target,
            staticSelector: order.static_selector,
            staticExtradata: order.static_extradata.clone(),
            maximumFill: order.maximum_fill,
            listingTime: order.listing_time,
            expirationTime: order.expiration_time,
            salt: order.salt,
        }
    }

    #[test]
    fn hashes_like_solidity() {
        let order = listing();
        let domain = Eip712Domain::new(
            Some("Wyvern Exchange".into()),
            Some("3.1".into()),
            Some(U256::from(4)),
            Some(EXCHANGE),
            None,
        );

        assert_eq!(
            order.hash_struct(),
            solidity_order(&order).eip712_hash_struct()
        );
        assert_eq!(
            order.signing_digest(&Domain::exchange(4, EXCHANGE).separator()),
            solidity_order(&order).eip712_signing_hash(&domain)
        );
        assert_eq!(Order::SCHEMA.encode_type(), reference::Order::eip712_encode_type());
    }

    #[test]
    fn hash_is_deterministic_and_sensitive_to_every_field() {
        let order = listing();
        assert_eq!(order.hash_struct(), order.clone().hash_struct());

        let changes: Vec<fn(&mut Order)> = vec![
            |o| o.registry = Address::repeat_byte(1),
            |o| o.maker = Address::repeat_byte(2),
            |o| o.static_target = Address::repeat_byte(3),
            |o| o.static_selector = fixed_bytes!("0x00000001"),
            |o| o.static_extradata = Bytes::from_static(&[1]),
            |o| o.maximum_fill = U256::from(2),
            |o| o.listing_time = U256::from(1),
            |o| o.expiration_time = U256::from(2),
            |o| o.salt += U256::ONE,
        ];
        for change in changes {
            let mut modified = order.clone();
            change(&mut modified);
            assert_ne!(modified.hash_struct(), order.hash_struct(), "{modified:?}");
        }
    }

    #[test]
    fn builder_draws_fresh_salts() {
        let first = Order::builder().build_unchecked();
        let second = Order::builder().build_unchecked();
        assert_ne!(first.salt, second.salt);
        assert_eq!(first.maximum_fill, U256::ONE);
        assert_eq!(first.expiration_time, U256::from(NEVER_EXPIRES));
    }

    #[test]
    fn rejects_malformed_orders() {
        assert_eq!(
            Order::builder().build().unwrap_err(),
            MalformedOrder::ZeroAddress("registry")
        );

        let mut order = listing();
        order.static_target = Address::ZERO;
        assert_eq!(
            order.validate().unwrap_err(),
            MalformedOrder::ZeroAddress("static target")
        );

        let mut order = listing();
        order.listing_time = U256::from(10);
        order.expiration_time = U256::from(10);
        assert!(matches!(
            order.validate(),
            Err(MalformedOrder::EmptyValidity { .. })
        ));
    }

    #[test]
    fn swap_terms_layout() {
        let terms = SwapTerms::decode(&listing().static_extradata).unwrap();
        assert_eq!(terms.give, NFT);
        assert_eq!(terms.take, TOKEN);

        let encoded = terms.mirrored().encode();
        assert_eq!(encoded.len(), 128);
        assert_eq!(&encoded[12..32], TOKEN.as_slice());
        assert_eq!(&encoded[44..64], NFT.as_slice());
        assert_eq!(encoded[95], 42);

        assert_eq!(
            SwapTerms::decode(&[0u8; 64]).unwrap_err(),
            MalformedOrder::Extradata
        );
    }

    #[test]
    fn serializes_numbers_as_decimal_strings() {
        let order = listing();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["maximumFill"], json!("1"));
        assert_eq!(json["listingTime"], json!("0"));
        assert_eq!(json["expirationTime"], json!("10000000000"));
        assert_eq!(json["salt"], json!("1234"));
        assert_eq!(json["staticSelector"], json!("0x837b54ad"));
        assert_eq!(serde_json::from_value::<Order>(json).unwrap(), order);
    }

    impl OrderBuilder {
        fn build_unchecked(self) -> Order {
            self.0
        }
    }
}
