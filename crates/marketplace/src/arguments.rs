use {
    crate::deployment::Deployment,
    alloy::{
        primitives::{Address, B256, U256},
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result},
    model::signature::SigningScheme,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

#[derive(clap::Parser)]
pub struct Arguments {
    /// Tracing filter directives.
    #[clap(long, env, default_value = "warn,marketplace=debug")]
    pub log_filter: String,

    /// Emit log events as JSON.
    #[clap(long, env)]
    pub log_json: bool,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Private key that signs orders and transactions. Without one, signing
    /// requests and transactions are forwarded to the node.
    #[clap(long, env)]
    pub private_key: Option<PrivateKeySigner>,

    /// Account to act for when the node holds the key.
    #[clap(long, env)]
    pub account: Option<Address>,

    /// Chain every flow refuses to run outside of.
    #[clap(long, env, default_value = "4")]
    pub chain_id: u64,

    #[clap(long, env)]
    pub exchange_address: Option<Address>,

    #[clap(long, env)]
    pub registry_address: Option<Address>,

    /// Contract implementing the static order check.
    #[clap(long, env)]
    pub static_address: Option<Address>,

    /// Non-fungible collection traded on the marketplace.
    #[clap(long, env)]
    pub collection_address: Option<Address>,

    /// Fungible token listings are priced in.
    #[clap(long, env)]
    pub payment_token_address: Option<Address>,

    /// Gas ceiling of every transaction.
    #[clap(long, env, default_value = "285000")]
    pub gas_limit: u64,

    /// How long new listings stay valid, e.g. "7d". Listings never expire if
    /// unset.
    #[clap(long, env, value_parser = humantime::parse_duration)]
    pub listing_validity: Option<Duration>,

    /// File the order book is kept in.
    #[clap(long, env, default_value = "orders.json")]
    pub order_book: PathBuf,

    /// How orders are signed: "eip712" or "ethsign".
    #[clap(long, env, default_value = "eip712")]
    pub signing_scheme: SigningScheme,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Prints the open trade records.
    Orders,
    /// Lists a token of the collection for sale.
    List {
        #[clap(long)]
        token_id: U256,
        /// Price in whole payment tokens, e.g. "1.5".
        #[clap(long)]
        price: String,
        #[clap(long, default_value = "SB")]
        currency: String,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        image: Option<String>,
    },
    /// Buys a listed token.
    Buy {
        #[clap(long)]
        order_hash: B256,
    },
    /// Prints the payment token balance.
    Balance {
        /// Defaults to the connected account.
        #[clap(long)]
        account: Option<Address>,
    },
}

impl Arguments {
    /// The deployment on the configured chain with every explicitly given
    /// address taking precedence.
    pub fn deployment(&self) -> Result<Deployment> {
        let known = Deployment::known(self.chain_id);
        let resolve = |explicit: Option<Address>, name: &str, field: fn(&Deployment) -> Address| {
            explicit
                .or_else(|| known.as_ref().map(field))
                .with_context(|| format!("no {name} address known for chain {}", self.chain_id))
        };
        Ok(Deployment {
            chain_id: self.chain_id,
            exchange: resolve(self.exchange_address, "exchange", |d| d.exchange)?,
            registry: resolve(self.registry_address, "registry", |d| d.registry)?,
            static_target: resolve(self.static_address, "static", |d| d.static_target)?,
            collection: resolve(self.collection_address, "collection", |d| d.collection)?,
            payment_token: resolve(self.payment_token_address, "payment token", |d| {
                d.payment_token
            })?,
        })
    }
}

fn display_option(f: &mut Formatter<'_>, name: &str, option: &Option<impl Display>) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_json,
            node_url,
            private_key,
            account,
            chain_id,
            exchange_address,
            registry_address,
            static_address,
            collection_address,
            payment_token_address,
            gas_limit,
            listing_validity,
            order_book,
            signing_scheme,
            command,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_json: {log_json}")?;
        writeln!(f, "node_url: {node_url}")?;
        display_option(f, "private_key", &private_key.as_ref().map(|_| "SECRET"))?;
        display_option(f, "account", account)?;
        writeln!(f, "chain_id: {chain_id}")?;
        display_option(f, "exchange_address", exchange_address)?;
        display_option(f, "registry_address", registry_address)?;
        display_option(f, "static_address", static_address)?;
        display_option(f, "collection_address", collection_address)?;
        display_option(f, "payment_token_address", payment_token_address)?;
        writeln!(f, "gas_limit: {gas_limit}")?;
        display_option(
            f,
            "listing_validity",
            &listing_validity.map(humantime::format_duration),
        )?;
        writeln!(f, "order_book: {}", order_book.display())?;
        writeln!(f, "signing_scheme: {signing_scheme}")?;
        writeln!(f, "command: {command:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address, clap::Parser};

    const KEY: &str = "0x4242424242424242424242424242424242424242424242424242424242424242";

    #[test]
    fn defaults_to_the_known_deployment() {
        let args = Arguments::try_parse_from(["marketplace", "orders"]).unwrap();
        assert_eq!(args.chain_id, 4);
        assert_eq!(args.gas_limit, 285_000);
        assert_eq!(args.signing_scheme, SigningScheme::Eip712);
        assert_eq!(args.deployment().unwrap(), Deployment::known(4).unwrap());
    }

    #[test]
    fn overrides_addresses() {
        let args = Arguments::try_parse_from([
            "marketplace",
            "--chain-id",
            "1337",
            "--exchange-address",
            "0x0101010101010101010101010101010101010101",
            "--registry-address",
            "0x0202020202020202020202020202020202020202",
            "--static-address",
            "0x0303030303030303030303030303030303030303",
            "--collection-address",
            "0x0404040404040404040404040404040404040404",
            "--payment-token-address",
            "0x0505050505050505050505050505050505050505",
            "--signing-scheme",
            "ethsign",
            "--listing-validity",
            "7d",
            "buy",
            "--order-hash",
            "0x0909090909090909090909090909090909090909090909090909090909090909",
        ])
        .unwrap();

        let deployment = args.deployment().unwrap();
        assert_eq!(deployment.chain_id, 1337);
        assert_eq!(
            deployment.payment_token,
            address!("0x0505050505050505050505050505050505050505")
        );
        assert_eq!(args.signing_scheme, SigningScheme::EthSign);
        assert_eq!(
            args.listing_validity,
            Some(Duration::from_secs(7 * 24 * 60 * 60))
        );
        assert!(matches!(
            args.command,
            Command::Buy { order_hash } if order_hash == B256::repeat_byte(9)
        ));
    }

    #[test]
    fn unknown_chains_need_every_address() {
        let args =
            Arguments::try_parse_from(["marketplace", "--chain-id", "1337", "orders"]).unwrap();
        assert!(args.deployment().is_err());
    }

    #[test]
    fn never_prints_the_private_key() {
        let args =
            Arguments::try_parse_from(["marketplace", "--private-key", KEY, "balance"]).unwrap();
        let printed = args.to_string();
        assert!(printed.contains("private_key: SECRET"));
        assert!(!printed.contains(&KEY[2..]));
    }
}
