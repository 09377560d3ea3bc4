//! The maker side of a trade: offers one token of the collection for a price
//! in the payment token and records the signed listing in the order book.

use {
    crate::{
        Error,
        Side,
        boundary::{ChainRead, ChainWrite},
        deployment::Deployment,
        order_book::OrderBook,
        preconditions::Preconditions,
        signer::OrderSigner,
        validator::Validator,
    },
    alloy::primitives::{Address, U256},
    model::{
        order::{NEVER_EXPIRES, Order, SwapTerms},
        trade::{AssetMetadata, TradeRecord},
    },
    std::{
        sync::Arc,
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
    tracing::instrument,
};

/// How long a listing can be matched.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidityWindow {
    /// From the epoch until [`NEVER_EXPIRES`].
    #[default]
    Unbounded,
    /// From now for the given duration.
    For(Duration),
}

impl ValidityWindow {
    /// Listing and expiration time in seconds since the epoch.
    fn bounds(&self, now: u64) -> (u64, u64) {
        match self {
            Self::Unbounded => (0, NEVER_EXPIRES),
            Self::For(duration) => (now, now.saturating_add(duration.as_secs())),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListingRequest {
    pub token_id: U256,
    /// In the smallest unit of the payment token.
    pub price: U256,
    /// Symbol of the payment token.
    pub currency: String,
    pub metadata: AssetMetadata,
}

pub struct Lister {
    deployment: Deployment,
    preconditions: Preconditions,
    validator: Validator,
    signer: OrderSigner,
    order_book: Arc<dyn OrderBook>,
    validity: ValidityWindow,
}

impl Lister {
    pub fn new(
        deployment: Deployment,
        read: Arc<dyn ChainRead>,
        write: Arc<dyn ChainWrite>,
        signer: OrderSigner,
        order_book: Arc<dyn OrderBook>,
        gas_limit: u64,
    ) -> Self {
        Self {
            deployment,
            preconditions: Preconditions::new(read.clone(), write, gas_limit),
            validator: Validator::new(read),
            signer,
            order_book,
            validity: ValidityWindow::default(),
        }
    }

    pub fn with_validity(mut self, validity: ValidityWindow) -> Self {
        self.validity = validity;
        self
    }

    /// Lists `request.token_id` on behalf of `maker`.
    #[instrument(skip_all, fields(%maker, token_id = %request.token_id, price = %request.price))]
    pub async fn list(&self, maker: Address, request: ListingRequest) -> Result<TradeRecord, Error> {
        let proxy = self.preconditions.ensure_proxy(maker).await?;
        self.preconditions
            .ensure_approval_for_all(maker, self.deployment.collection, proxy)
            .await?;

        let order = self.build_order(maker, &request)?;
        let signature = self.signer.request_signature(&order, maker).await?;
        let order_hash = self
            .validator
            .validate(&order, &signature, Side::Listing)
            .await?;

        let record = TradeRecord {
            order,
            signature,
            metadata: AssetMetadata {
                token_id: request.token_id,
                ..request.metadata
            },
            order_hash,
            price: request.price,
            currency: request.currency,
            cancelled_or_finalized: false,
        };
        self.order_book.create(record.clone()).await?;
        tracing::info!(%order_hash, "listed");
        Ok(record)
    }

    fn build_order(&self, maker: Address, request: &ListingRequest) -> Result<Order, Error> {
        let terms = SwapTerms {
            give: self.deployment.collection,
            take: self.deployment.payment_token,
            token_id: request.token_id,
            price: request.price,
        };
        let (listing_time, expiration_time) = self.validity.bounds(now());
        Order::builder()
            .with_registry(self.deployment.registry)
            .with_maker(maker)
            .with_static_call(self.deployment.static_target, Deployment::static_selector())
            .with_static_extradata(terms.encode())
            .with_maximum_fill(U256::ONE)
            .with_validity(listing_time, expiration_time)
            .build()
            .map_err(|err| Error::MalformedOrder(Side::Listing, err))
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
