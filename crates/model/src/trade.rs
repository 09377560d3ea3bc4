use {
    crate::{order::Order, signature::Signature},
    alloy::primitives::{B256, U256},
    number::serialization::HexOrDecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

/// Display data of the listed asset.
#[serde_as]
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    #[serde_as(as = "HexOrDecimalU256")]
    pub token_id: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A signed listing as kept in the order book.
#[serde_as]
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub order: Order,
    pub signature: Signature,
    pub metadata: AssetMetadata,
    pub order_hash: B256,
    /// In the smallest unit of the payment token.
    #[serde_as(as = "HexOrDecimalU256")]
    pub price: U256,
    /// Symbol of the payment token.
    pub currency: String,
    pub cancelled_or_finalized: bool,
}

impl TradeRecord {
    pub fn is_open(&self) -> bool {
        !self.cancelled_or_finalized
    }
}
