use alloy::{
    contract::Error as ContractError,
    providers::PendingTransactionError,
    transports::RpcError,
};

/// EIP-1193 error code a wallet answers with when the user declines a
/// request.
pub const USER_REJECTED_REQUEST: i64 = 4001;

pub trait ContractErrorExt {
    /// Returns whether a given error is a node error.
    fn is_node_error(&self) -> bool;
}

impl ContractErrorExt for ContractError {
    fn is_node_error(&self) -> bool {
        // Some contract errors are "hidden" inside transport errors, as such we
        // need to check if transport errors have revert data to rule out
        // contract errors.
        match self {
            // Revert data can be present but empty (e.g. a call to a missing
            // function) so look at the raw payload instead of decoding it.
            ContractError::TransportError(RpcError::ErrorResp(err)) => {
                let no_revert_data = err.as_revert_data().is_none();
                tracing::debug!(?err, %no_revert_data, "transport rpc error");
                no_revert_data
            }
            ContractError::TransportError(_) => true,
            _ => false,
        }
    }
}

impl ContractErrorExt for PendingTransactionError {
    /// Waiting for a receipt only ever fails because of the node.
    fn is_node_error(&self) -> bool {
        true
    }
}

/// Create an arbitrary alloy error that will convert into a "contract" error.
/// Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_contract_error() -> alloy::contract::Error {
    alloy::contract::Error::NotADeploymentTransaction
}

/// Create an arbitrary alloy error that will convert into a "node" error.
/// Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_node_error() -> alloy::contract::Error {
    alloy::contract::Error::TransportError(alloy::transports::TransportError::ErrorResp(
        alloy::rpc::json_rpc::ErrorPayload::internal_error(),
    ))
}

#[cfg(test)]
mod tests {
    use crate::alloy::errors::{
        ContractErrorExt,
        testing_alloy_contract_error,
        testing_alloy_node_error,
    };

    #[test]
    fn test_node_error() {
        assert!(!testing_alloy_contract_error().is_node_error());
        assert!(testing_alloy_node_error().is_node_error());
    }
}
