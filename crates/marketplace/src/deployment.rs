use {
    alloy::{
        primitives::{Address, FixedBytes},
        sol_types::SolCall,
    },
    contracts::alloy::{WyvernExchange, WyvernRegistry, WyvernStatic, assets},
    model::Domain,
};

/// Contracts and assets the marketplace trades through on one chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deployment {
    pub chain_id: u64,
    pub exchange: Address,
    pub registry: Address,
    pub static_target: Address,
    /// The non-fungible collection listed on the marketplace.
    pub collection: Address,
    /// The fungible token listings are priced in.
    pub payment_token: Address,
}

impl Deployment {
    /// The reference deployment for `chain_id`, if there is one.
    pub fn known(chain_id: u64) -> Option<Self> {
        Some(Self {
            chain_id,
            exchange: WyvernExchange::deployment_address(chain_id)?,
            registry: WyvernRegistry::deployment_address(chain_id)?,
            static_target: WyvernStatic::deployment_address(chain_id)?,
            collection: assets::collection(chain_id)?,
            payment_token: assets::payment_token(chain_id)?,
        })
    }

    pub fn domain(&self) -> Domain {
        Domain::exchange(self.chain_id, self.exchange)
    }

    /// Selector of the static routine both orders of a swap are checked by.
    pub fn static_selector() -> FixedBytes<4> {
        FixedBytes(WyvernStatic::WyvernStatic::anyCall::SELECTOR)
    }
}
