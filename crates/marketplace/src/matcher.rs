//! The taker side of a trade: pairs a listing with a freshly signed
//! counter-order and settles both in one `atomicMatch_` transaction.
//!
//! A match is a single linear sequence of steps. Any failure aborts it and
//! nothing is retried. Dropping the future before the settlement transaction
//! is submitted cancels the match without side effects beyond precondition
//! transactions that already went out.

use {
    crate::{
        Error,
        Side,
        boundary::{ChainRead, ChainWrite, TxOptions, submit},
        open_orders::OpenOrders,
        order_book::OrderBook,
        preconditions::Preconditions,
        settlement::{Leg, Settlement, swap_calls},
        signer::OrderSigner,
        validator::Validator,
    },
    alloy::primitives::{Address, B256},
    model::{
        order::{MalformedOrder, NEVER_EXPIRES, Order, SwapTerms},
        signature::Signature,
        trade::TradeRecord,
    },
    std::sync::Arc,
    thiserror::Error,
    tracing::instrument,
};

/// Progress of a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchState {
    Idle,
    ProxyEnsured,
    Approved,
    CounterOrderBuilt,
    CounterOrderSigned,
    BothOrdersValidated,
    Settled,
}

/// A match that stopped before completing.
#[derive(Debug, Error)]
#[error("match aborted in state {state:?}: {error}")]
pub struct Aborted {
    /// The last state the match reached.
    pub state: MatchState,
    #[source]
    pub error: Error,
}

#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub tx: B256,
    pub counter_order: Order,
    pub counter_signature: Signature,
}

pub struct Matcher {
    read: Arc<dyn ChainRead>,
    write: Arc<dyn ChainWrite>,
    preconditions: Preconditions,
    validator: Validator,
    signer: OrderSigner,
    order_book: Arc<dyn OrderBook>,
    open_orders: OpenOrders,
    gas_limit: u64,
}

impl Matcher {
    pub fn new(
        read: Arc<dyn ChainRead>,
        write: Arc<dyn ChainWrite>,
        signer: OrderSigner,
        order_book: Arc<dyn OrderBook>,
        open_orders: OpenOrders,
        gas_limit: u64,
    ) -> Self {
        Self {
            preconditions: Preconditions::new(read.clone(), write.clone(), gas_limit),
            validator: Validator::new(read.clone()),
            read,
            write,
            signer,
            order_book,
            open_orders,
            gas_limit,
        }
    }

    /// Buys the listing in `record` for `taker`.
    #[instrument(skip_all, fields(order_hash = %record.order_hash, %taker))]
    pub async fn buy(&self, record: &TradeRecord, taker: Address) -> Result<MatchOutcome, Aborted> {
        let mut state = MatchState::Idle;
        self.run(record, taker, &mut state).await.map_err(|error| {
            if error.is_protocol_bug() {
                tracing::error!(?state, %error, "match aborted by a protocol error");
            } else {
                tracing::warn!(?state, %error, "match aborted");
            }
            Aborted { state, error }
        })
    }

    async fn run(
        &self,
        record: &TradeRecord,
        taker: Address,
        state: &mut MatchState,
    ) -> Result<MatchOutcome, Error> {
        if !record.is_open() {
            return Err(Error::OrderClosed(record.order_hash));
        }
        let listing = &record.order;
        // The signed extradata is what the exchange enforces, so it is the
        // source of truth for the traded assets and price.
        let terms = SwapTerms::decode(&listing.static_extradata)
            .map_err(|err| Error::MalformedOrder(Side::Listing, err))?;
        if terms.price != record.price {
            tracing::warn!(signed = %terms.price, listed = %record.price, "listed price differs from signed price");
        }

        let available = self.read.token_balance(terms.take, taker).await?;
        if available < terms.price {
            return Err(Error::InsufficientBalance {
                required: terms.price,
                available,
            });
        }

        let proxy = self.preconditions.ensure_proxy(taker).await?;
        advance(state, MatchState::ProxyEnsured);

        self.preconditions
            .ensure_allowance(taker, proxy, terms.take, terms.price)
            .await?;
        advance(state, MatchState::Approved);

        let counter_order = Order::builder()
            .with_registry(listing.registry)
            .with_maker(taker)
            .with_static_call(listing.static_target, listing.static_selector)
            .with_static_extradata(terms.mirrored().encode())
            .with_maximum_fill(terms.price)
            .with_validity(0, NEVER_EXPIRES)
            .build()
            .map_err(|err| Error::MalformedOrder(Side::Counter, err))?;
        advance(state, MatchState::CounterOrderBuilt);

        let counter_signature = self.signer.request_signature(&counter_order, taker).await?;
        advance(state, MatchState::CounterOrderSigned);

        let listing_hash = self
            .validator
            .validate(listing, &record.signature, Side::Listing)
            .await?;
        // The stored hash decides which record gets finalized.
        if listing_hash != record.order_hash {
            return Err(Error::MalformedOrder(
                Side::Listing,
                MalformedOrder::HashMismatch {
                    local: record.order_hash,
                    onchain: listing_hash,
                },
            ));
        }
        self.validator
            .validate(&counter_order, &counter_signature, Side::Counter)
            .await?;
        advance(state, MatchState::BothOrdersValidated);

        let (first_call, second_call) = swap_calls(&terms, listing.maker, taker);
        let settlement = Settlement::new(
            Leg {
                order: listing,
                signature: &record.signature,
                call: &first_call,
            },
            Leg {
                order: &counter_order,
                signature: &counter_signature,
                call: &second_call,
            },
        );
        let write = self.write.clone();
        let tx = TxOptions {
            from: taker,
            gas_limit: self.gas_limit,
        };
        let receipt = submit("atomic match", async move {
            write.atomic_match(settlement, tx).await
        })
        .await?;
        if !receipt.success {
            return Err(Error::SettlementReverted(receipt.hash));
        }
        advance(state, MatchState::Settled);

        tracing::info!(tx = %receipt.hash, "trade settled");
        self.open_orders.remove(record.order_hash);
        // The trade happened on chain whatever the store says, so the outcome
        // is reported either way.
        if let Err(err) = self.order_book.finalize(record.order_hash).await {
            tracing::error!(tx = %receipt.hash, ?err, "failed to finalize settled trade");
        }

        Ok(MatchOutcome {
            tx: receipt.hash,
            counter_order,
            counter_signature,
        })
    }
}

fn advance(state: &mut MatchState, next: MatchState) {
    tracing::debug!(from = ?state, to = ?next, "match state transition");
    *state = next;
}
