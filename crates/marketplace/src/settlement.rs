//! Assembly of the exchange's `atomicMatch_` arguments.

use {
    alloy::{
        primitives::{Address, B256, Bytes, FixedBytes, U256},
        sol_types::SolCall,
    },
    contracts::alloy::{ERC20, ERC721, WyvernExchange},
    model::{
        interaction::{Call, HowToCall},
        order::{Order, SwapTerms},
        signature::{self, Signature},
    },
};

/// One side of a match: an order, its signature and the call it authorizes.
#[derive(Clone, Copy, Debug)]
pub struct Leg<'a> {
    pub order: &'a Order,
    pub signature: &'a Signature,
    pub call: &'a Call,
}

/// Arguments of a single `atomicMatch_` invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settlement {
    /// Both orders' scalar fields, each followed by its call's target.
    pub uints: [U256; 16],
    pub static_selectors: [FixedBytes<4>; 2],
    pub first_extradata: Bytes,
    pub first_calldata: Bytes,
    pub second_extradata: Bytes,
    pub second_calldata: Bytes,
    pub how_to_calls: [u8; 2],
    pub metadata: B256,
    /// `abi.encode(bytes, bytes)` of both encoded signatures.
    pub signatures: Bytes,
}

impl Settlement {
    pub fn new(first: Leg, second: Leg) -> Self {
        let mut uints = [U256::ZERO; 16];
        uints[..8].copy_from_slice(&order_uints(first.order, first.call));
        uints[8..].copy_from_slice(&order_uints(second.order, second.call));

        Self {
            uints,
            static_selectors: [first.order.static_selector, second.order.static_selector],
            first_extradata: first.order.static_extradata.clone(),
            first_calldata: first.call.data.clone(),
            second_extradata: second.order.static_extradata.clone(),
            second_calldata: second.call.data.clone(),
            how_to_calls: [first.call.how_to_call.into(), second.call.how_to_call.into()],
            metadata: B256::ZERO,
            signatures: signature::encode_pair(first.signature, second.signature),
        }
    }

    pub fn into_call(self) -> WyvernExchange::WyvernExchange::atomicMatch_Call {
        WyvernExchange::WyvernExchange::atomicMatch_Call {
            uints: self.uints,
            staticSelectors: self.static_selectors,
            firstExtradata: self.first_extradata,
            firstCalldata: self.first_calldata,
            secondExtradata: self.second_extradata,
            secondCalldata: self.second_calldata,
            howToCalls: self.how_to_calls,
            metadata: self.metadata,
            signatures: self.signatures,
        }
    }
}

fn order_uints(order: &Order, call: &Call) -> [U256; 8] {
    [
        address_word(order.registry),
        address_word(order.maker),
        address_word(order.static_target),
        order.maximum_fill,
        order.listing_time,
        order.expiration_time,
        order.salt,
        address_word(call.target),
    ]
}

fn address_word(address: Address) -> U256 {
    U256::from_be_bytes(address.into_word().0)
}

/// The transfers a swap of `terms.give` (non-fungible) for `terms.take`
/// (fungible) performs: the token moves from `seller` to `buyer` and the
/// price moves back.
pub fn swap_calls(terms: &SwapTerms, seller: Address, buyer: Address) -> (Call, Call) {
    let nft_transfer = ERC721::ERC721::transferFromCall {
        from: seller,
        to: buyer,
        tokenId: terms.token_id,
    };
    let payment = ERC20::ERC20::transferFromCall {
        from: buyer,
        to: seller,
        amount: terms.price,
    };
    (
        Call {
            target: terms.give,
            how_to_call: HowToCall::Call,
            data: nft_transfer.abi_encode().into(),
        },
        Call {
            target: terms.take,
            how_to_call: HowToCall::Call,
            data: payment.abi_encode().into(),
        },
    )
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::keccak256,
        model::signature::SigningScheme,
    };

    fn order(maker: Address, salt: u64) -> Order {
        Order {
            registry: Address::repeat_byte(0xaa),
            maker,
            static_target: Address::repeat_byte(0xbb),
            static_selector: FixedBytes::from([1, 2, 3, 4]),
            static_extradata: Bytes::from(vec![salt as u8; 3]),
            maximum_fill: U256::from(salt * 10),
            listing_time: U256::from(salt * 100),
            expiration_time: U256::from(salt * 1000),
            salt: U256::from(salt),
        }
    }

    #[test]
    fn interleaves_orders_and_call_targets() {
        let seller = Address::repeat_byte(0x11);
        let buyer = Address::repeat_byte(0x22);
        let terms = SwapTerms {
            give: Address::repeat_byte(0x33),
            take: Address::repeat_byte(0x44),
            token_id: U256::from(42),
            price: U256::from(1000),
        };
        let (first_call, second_call) = swap_calls(&terms, seller, buyer);
        let listing = order(seller, 1);
        let counter = order(buyer, 2);
        let listing_signature = Signature::from_bytes(SigningScheme::Eip712, &[1; 65]).unwrap();
        let counter_signature = Signature::from_bytes(SigningScheme::EthSign, &[2; 65]).unwrap();

        let settlement = Settlement::new(
            Leg {
                order: &listing,
                signature: &listing_signature,
                call: &first_call,
            },
            Leg {
                order: &counter,
                signature: &counter_signature,
                call: &second_call,
            },
        );

        let expected = [
            address_word(Address::repeat_byte(0xaa)),
            address_word(seller),
            address_word(Address::repeat_byte(0xbb)),
            U256::from(10),
            U256::from(100),
            U256::from(1000),
            U256::from(1),
            address_word(terms.give),
            address_word(Address::repeat_byte(0xaa)),
            address_word(buyer),
            address_word(Address::repeat_byte(0xbb)),
            U256::from(20),
            U256::from(200),
            U256::from(2000),
            U256::from(2),
            address_word(terms.take),
        ];
        assert_eq!(settlement.uints, expected);
        assert_eq!(settlement.first_extradata, listing.static_extradata);
        assert_eq!(settlement.second_extradata, counter.static_extradata);
        assert_eq!(settlement.first_calldata, first_call.data);
        assert_eq!(settlement.second_calldata, second_call.data);
        assert_eq!(settlement.how_to_calls, [0, 0]);
        assert_eq!(settlement.metadata, B256::ZERO);
        assert_eq!(
            settlement.signatures,
            signature::encode_pair(&listing_signature, &counter_signature)
        );

        let call = settlement.into_call();
        assert_eq!(call.uints, expected);
    }

    #[test]
    fn swap_calls_move_token_and_payment() {
        let seller = Address::repeat_byte(0x11);
        let buyer = Address::repeat_byte(0x22);
        let terms = SwapTerms {
            give: Address::repeat_byte(0x33),
            take: Address::repeat_byte(0x44),
            token_id: U256::from(42),
            price: U256::from(1000),
        };
        let (nft, payment) = swap_calls(&terms, seller, buyer);
        let transfer_from = &keccak256("transferFrom(address,address,uint256)")[..4];

        assert_eq!(nft.target, terms.give);
        assert_eq!(&nft.data[..4], transfer_from);
        assert_eq!(&nft.data[16..36], seller.as_slice());
        assert_eq!(&nft.data[48..68], buyer.as_slice());
        assert_eq!(nft.data[99], 42);

        assert_eq!(payment.target, terms.take);
        assert_eq!(&payment.data[..4], transfer_from);
        assert_eq!(&payment.data[16..36], buyer.as_slice());
        assert_eq!(&payment.data[48..68], seller.as_slice());
        assert_eq!(U256::from_be_slice(&payment.data[68..100]), U256::from(1000));
    }
}
