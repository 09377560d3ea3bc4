use {
    alloy::primitives::{Address, Bytes},
    serde::{Deserialize, Serialize},
};

/// How the maker's proxy invokes a [`Call`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum HowToCall {
    #[default]
    Call = 0,
    DelegateCall = 1,
}

impl From<HowToCall> for u8 {
    fn from(how_to_call: HowToCall) -> Self {
        how_to_call as u8
    }
}

/// The contract invocation an order authorizes at settlement. It is only
/// known once both sides of a trade are.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub target: Address,
    pub how_to_call: HowToCall,
    pub data: Bytes,
}
