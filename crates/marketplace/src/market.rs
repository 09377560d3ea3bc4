use {
    crate::{
        Error,
        boundary::{ChainRead, ChainWrite},
        deployment::Deployment,
        listing::{Lister, ListingRequest, ValidityWindow},
        matcher::{Aborted, MatchOutcome, MatchState, Matcher},
        open_orders::OpenOrders,
        order_book::{OrderBook, OrderBookError},
        session::{Session, Subscription},
        signer::OrderSigner,
    },
    alloy::primitives::{Address, B256, U256},
    model::trade::TradeRecord,
    std::{fmt, sync::Arc},
};

/// Settings shared by every flow of a market.
#[derive(Clone, Copy, Debug)]
pub struct MarketConfig {
    pub deployment: Deployment,
    /// Gas ceiling of every transaction the market sends.
    pub gas_limit: u64,
    pub listing_validity: ValidityWindow,
}

/// Token balance in the smallest unit together with the token's decimals.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Balance {
    pub raw: U256,
    pub decimals: u8,
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match number::units::format_token_amount(self.raw, self.decimals) {
            Ok(amount) => f.write_str(&amount),
            Err(_) => write!(f, "{} (raw)", self.raw),
        }
    }
}

/// Entry point of the marketplace: the flows a connected user can run
/// against one deployment.
pub struct Market {
    session: Session,
    deployment: Deployment,
    read: Arc<dyn ChainRead>,
    order_book: Arc<dyn OrderBook>,
    open_orders: OpenOrders,
    lister: Lister,
    matcher: Matcher,
    _chain_changes: Subscription,
}

impl Market {
    pub fn new(
        session: Session,
        config: MarketConfig,
        read: Arc<dyn ChainRead>,
        write: Arc<dyn ChainWrite>,
        signer: OrderSigner,
        order_book: Arc<dyn OrderBook>,
    ) -> Self {
        let open_orders = OpenOrders::default();
        let lister = Lister::new(
            config.deployment,
            read.clone(),
            write.clone(),
            signer.clone(),
            order_book.clone(),
            config.gas_limit,
        )
        .with_validity(config.listing_validity);
        let matcher = Matcher::new(
            read.clone(),
            write,
            signer,
            order_book.clone(),
            open_orders.clone(),
            config.gas_limit,
        );

        // Records cached for one chain say nothing about another.
        let cached = open_orders.clone();
        let chain_changes = session.on_chain_changed(move |chain_id| {
            tracing::debug!(chain_id, dropped = cached.len(), "clearing open orders");
            cached.clear();
        });

        Self {
            session,
            deployment: config.deployment,
            read,
            order_book,
            open_orders,
            lister,
            matcher,
            _chain_changes: chain_changes,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// The cached open orders, as of the last refresh.
    pub fn open_orders(&self) -> Vec<TradeRecord> {
        self.open_orders.all()
    }

    pub async fn refresh_open_orders(&self) -> Result<Vec<TradeRecord>, Error> {
        self.session.ensure_network()?;
        Ok(self.open_orders.refresh(self.order_book.as_ref()).await?)
    }

    /// Lists a token of the collection for the connected account.
    pub async fn list(&self, request: ListingRequest) -> Result<TradeRecord, Error> {
        self.session.ensure_network()?;
        let maker = self.session.account()?;
        let record = self.lister.list(maker, request).await?;
        self.open_orders.insert(record.clone());
        Ok(record)
    }

    /// Buys the listing with `order_hash` for the connected account.
    pub async fn buy(&self, order_hash: B256) -> Result<MatchOutcome, Aborted> {
        let (record, taker) = self
            .prepare_buy(order_hash)
            .await
            .map_err(|error| Aborted {
                state: MatchState::Idle,
                error,
            })?;
        self.matcher.buy(&record, taker).await
    }

    async fn prepare_buy(&self, order_hash: B256) -> Result<(TradeRecord, Address), Error> {
        self.session.ensure_network()?;
        let taker = self.session.account()?;
        let record = match self.open_orders.get(order_hash) {
            Some(record) => record,
            None => self
                .order_book
                .find(order_hash)
                .await?
                .ok_or(OrderBookError::NotFound(order_hash))?,
        };
        Ok((record, taker))
    }

    pub async fn payment_token_decimals(&self) -> Result<u8, Error> {
        Ok(self
            .read
            .token_decimals(self.deployment.payment_token)
            .await?)
    }

    /// Payment token balance of `account`, the connected account by default.
    pub async fn balance(&self, account: Option<Address>) -> Result<Balance, Error> {
        let account = match account {
            Some(account) => account,
            None => self.session.account()?,
        };
        let token = self.deployment.payment_token;
        let raw = self.read.token_balance(token, account).await?;
        let decimals = self.payment_token_decimals().await?;
        Ok(Balance { raw, decimals })
    }
}
