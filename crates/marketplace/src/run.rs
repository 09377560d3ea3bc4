use {
    crate::{
        arguments::{Arguments, Command},
        infra::{
            blockchain::Blockchain,
            store::FileOrderBook,
            wallet::{LocalWallet, RpcWallet},
        },
        listing::{ListingRequest, ValidityWindow},
        market::{Market, MarketConfig},
        session::Session,
        signer::{OrderSigner, TypedDataSigner},
    },
    alloy::primitives::Address,
    anyhow::{Context, Result},
    ethrpc::AlloyProvider,
    model::trade::AssetMetadata,
    std::sync::Arc,
};

/// Connects to the node and runs the requested command.
pub async fn run(args: Arguments) -> Result<()> {
    let deployment = args.deployment()?;
    let (provider, wallet, account) = connect(&args);
    let blockchain = Arc::new(Blockchain::new(provider, &deployment));
    let session = Session::connect(blockchain.as_ref(), args.chain_id, account)
        .await
        .context("connecting to the node")?;

    let market = Market::new(
        session,
        MarketConfig {
            deployment,
            gas_limit: args.gas_limit,
            listing_validity: args
                .listing_validity
                .map(ValidityWindow::For)
                .unwrap_or_default(),
        },
        blockchain.clone(),
        blockchain,
        OrderSigner::new(wallet, deployment.domain(), args.signing_scheme),
        Arc::new(FileOrderBook::new(&args.order_book)),
    );

    match args.command {
        Command::Orders => {
            let records = market.refresh_open_orders().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::List {
            token_id,
            price,
            currency,
            name,
            description,
            image,
        } => {
            let decimals = market.payment_token_decimals().await?;
            let price = number::units::parse_token_amount(&price, decimals)?;
            let record = market
                .list(ListingRequest {
                    token_id,
                    price,
                    currency,
                    metadata: AssetMetadata {
                        token_id,
                        name,
                        description,
                        image,
                    },
                })
                .await?;
            println!("{}", record.order_hash);
        }
        Command::Buy { order_hash } => {
            market.refresh_open_orders().await?;
            let outcome = market.buy(order_hash).await?;
            println!("{}", outcome.tx);
        }
        Command::Balance { account } => {
            let balance = market.balance(account).await?;
            println!("{balance}");
        }
    }
    Ok(())
}

/// With a private key everything is signed locally, otherwise the node is
/// asked to sign.
fn connect(args: &Arguments) -> (AlloyProvider, Arc<dyn TypedDataSigner>, Option<Address>) {
    match &args.private_key {
        Some(key) => {
            if args.account.is_some_and(|account| account != key.address()) {
                tracing::warn!("ignoring account argument, it does not belong to the private key");
            }
            (
                ethrpc::alloy::provider_with_signer(&args.node_url, key.clone()),
                Arc::new(LocalWallet::new(key.clone())),
                Some(key.address()),
            )
        }
        None => {
            let provider = ethrpc::alloy::provider(&args.node_url);
            (
                provider.clone(),
                Arc::new(RpcWallet::new(provider)),
                args.account,
            )
        }
    }
}
