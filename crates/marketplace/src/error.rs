use {
    crate::{boundary::ChainError, order_book::OrderBookError, signer::SigningError},
    alloy::primitives::{Address, B256, U256},
    model::{order::MalformedOrder, signature::MalformedSignature},
    std::fmt,
    thiserror::Error,
};

/// Which of the two orders of a match an error is about.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// The maker's listing.
    Listing,
    /// The order the taker signs at match time.
    Counter,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Listing => "listing order",
            Self::Counter => "counter-order",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("signing request was rejected")]
    UserRejected,
    #[error("authority unavailable: {0:#}")]
    AuthorityUnavailable(anyhow::Error),
    #[error(transparent)]
    MalformedSignature(#[from] MalformedSignature),
    #[error("{0} is malformed: {1}")]
    MalformedOrder(Side, #[source] MalformedOrder),
    #[error("balance of {available} is below the price of {required}")]
    InsufficientBalance { required: U256, available: U256 },
    #[error("exchange rejected the parameters of the {0}")]
    InvalidOrderParameters(Side),
    #[error("exchange rejected the authorization of the {0}")]
    InvalidOrderAuthorization(Side),
    #[error("settlement transaction {0} reverted")]
    SettlementReverted(B256),
    #[error("{action} transaction {tx} reverted")]
    PreconditionReverted { action: &'static str, tx: B256 },
    #[error("no proxy registered for {0} after registration")]
    ProxyMissing(Address),
    #[error("connected to chain {actual} but expected chain {expected}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("no account connected")]
    NoAccount,
    #[error("trade {0} is no longer open")]
    OrderClosed(B256),
    #[error("contract call failed: {0:#}")]
    Contract(anyhow::Error),
    #[error(transparent)]
    OrderBook(#[from] OrderBookError),
}

impl Error {
    /// Errors that can only be caused by this client encoding something the
    /// exchange disagrees with, as opposed to ordinary rejections.
    pub fn is_protocol_bug(&self) -> bool {
        matches!(
            self,
            Self::InvalidOrderAuthorization(Side::Counter)
                | Self::MalformedOrder(_, MalformedOrder::HashMismatch { .. })
        )
    }

    /// Whether the user may simply try again, possibly after reconnecting or
    /// topping up their balance.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UserRejected
                | Self::AuthorityUnavailable(_)
                | Self::InsufficientBalance { .. }
                | Self::WrongNetwork { .. }
                | Self::NoAccount
        )
    }
}

impl From<SigningError> for Error {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::Rejected => Self::UserRejected,
            SigningError::Unavailable(err) => Self::AuthorityUnavailable(err),
        }
    }
}

impl From<ChainError> for Error {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Unavailable(err) => Self::AuthorityUnavailable(err),
            ChainError::Contract(err) => Self::Contract(err),
        }
    }
}
