pub mod networks {
    pub const MAINNET: u64 = 1;
    pub const RINKEBY: u64 = 4;
}

crate::bindings!(
    WyvernExchange {
        function validateOrderParameters_(
            address registry,
            address maker,
            address staticTarget,
            bytes4 staticSelector,
            bytes calldata staticExtradata,
            uint256 maximumFill,
            uint256 listingTime,
            uint256 expirationTime,
            uint256 salt
        ) external view returns (bool);

        function hashOrder_(
            address registry,
            address maker,
            address staticTarget,
            bytes4 staticSelector,
            bytes calldata staticExtradata,
            uint256 maximumFill,
            uint256 listingTime,
            uint256 expirationTime,
            uint256 salt
        ) external pure returns (bytes32 hash);

        function validateOrderAuthorization_(
            bytes32 hash,
            address maker,
            bytes calldata signature
        ) external view returns (bool);

        function atomicMatch_(
            uint256[16] calldata uints,
            bytes4[2] calldata staticSelectors,
            bytes calldata firstExtradata,
            bytes calldata firstCalldata,
            bytes calldata secondExtradata,
            bytes calldata secondCalldata,
            uint8[2] calldata howToCalls,
            bytes32 metadata,
            bytes calldata signatures
        ) external payable;
    },
    maplit::hashmap! {
        RINKEBY => address!("0x8Ce1A397639BdB10262036925cc57886bC095324"),
    }
);

crate::bindings!(
    WyvernRegistry {
        function proxies(address owner) external view returns (address);
        function registerProxy() external returns (address proxy);
    },
    maplit::hashmap! {
        RINKEBY => address!("0xbb036f8b125EFd51884Cd281384E93F80AADB3Be"),
    }
);

crate::bindings!(
    WyvernStatic {
        function any(
            bytes memory extra,
            address[7] memory addresses,
            uint8[2] memory howToCalls,
            uint256[6] memory uints,
            bytes memory data,
            bytes memory counterdata
        ) external pure returns (uint256);
    },
    maplit::hashmap! {
        RINKEBY => address!("0x1958861493c4F556e3E0156C7853452d06aC2417"),
    }
);

crate::bindings!(
    ERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }
);

crate::bindings!(
    ERC721 {
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
    }
);

/// Assets of the reference marketplace deployment.
pub mod assets {
    use {
        super::networks::RINKEBY,
        alloy::primitives::{Address, address},
    };

    /// Non-fungible collection listed on the marketplace for the given chain.
    pub fn collection(chain_id: u64) -> Option<Address> {
        match chain_id {
            RINKEBY => Some(address!("0x60735D512ddfAF40512e013398fFFc6B428F2F63")),
            _ => None,
        }
    }

    /// Fungible token used to pay for listings on the given chain.
    pub fn payment_token(chain_id: u64) -> Option<Address> {
        match chain_id {
            RINKEBY => Some(address!("0xF6436e7EF8C879F97e4B28De5Fd00d9c003A8FC5")),
            _ => None,
        }
    }
}

#[macro_export]
macro_rules! bindings {
    ($contract:ident { $($interface:tt)* } $(, $deployment_info:expr)? $(,)?) => {
        paste::paste! {
            // Generate the main bindings in a private module. That allows
            // us to re-export all items in our own module while also adding
            // some items ourselves.
            #[allow(non_snake_case)]
            mod [<$contract Private>] {
                alloy::sol! {
                    #[allow(missing_docs)]
                    #[sol(rpc)]
                    interface $contract {
                        $($interface)*
                    }
                }
            }

            #[allow(non_snake_case)]
            pub mod $contract {
                use alloy::providers::DynProvider;

                pub use super::[<$contract Private>]::*;
                pub type Instance = $contract::[<$contract Instance>]<DynProvider>;

                $(
                use {
                    std::{sync::LazyLock, collections::HashMap},
                    alloy::primitives::{address, Address},
                    $crate::alloy::networks::*,
                };

                pub static DEPLOYMENT_INFO: LazyLock<HashMap<u64, Address>> = LazyLock::new(|| {
                    $deployment_info
                });

                /// Address of the contract on the given chain, if known.
                pub fn deployment_address(chain_id: u64) -> Option<Address> {
                    DEPLOYMENT_INFO.get(&chain_id).copied()
                }
                )*
            }
        }
    };
}
