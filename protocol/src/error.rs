//! Error types for vault governance.
//!
//! Every failing vault call returns a [`VaultError`]. Each variant maps to
//! one error of the `IArrakisMetaVault` ABI so that a failure can be
//! surfaced as EVM revert data with [`VaultError::revert_data`].

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolError;
use thiserror::Error;

use crate::abi::IArrakisMetaVault;

/// Errors that can occur during vault governance calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The caller does not hold the role the operation requires.
    ///
    /// The name is kept from the ABI even on owner-only paths, where
    /// `expected` is the owner.
    #[error("only {expected} may call this operation (caller {caller})")]
    OnlyManager {
        /// Address that attempted the call.
        caller: Address,
        /// Address holding the required role.
        expected: Address,
    },

    /// A required address argument was zero.
    #[error("address zero: {0}")]
    AddressZero(&'static str),

    /// The requested module is already the active one.
    #[error("module is already active")]
    SameModule,

    /// The requested manager is already the manager.
    #[error("manager is unchanged")]
    SameManager,

    /// `token0` sorts after `token1`.
    #[error("token0 must sort before token1")]
    Token0GtToken1,

    /// `token0` equals `token1`.
    #[error("token0 and token1 are the same token")]
    Token0EqToken1,

    /// A deposit or withdrawal asked for a zero proportion.
    #[error("proportion is zero")]
    ProportionZero,

    /// A withdrawal asked for more than the whole position.
    #[error("proportion exceeds BASE")]
    ProportionGtBase,

    /// The module is already whitelisted.
    #[error("module {0} is already whitelisted")]
    AlreadyWhitelisted(Address),

    /// The module is not whitelisted.
    #[error("module {0} is not whitelisted")]
    NotWhitelistedModule(Address),

    /// The active module cannot be blacklisted.
    #[error("the active module cannot be blacklisted")]
    ActiveModule,

    /// The outgoing module still holds funds.
    #[error("module not empty: amount0 {amount0}, amount1 {amount1}")]
    ModuleNotEmpty {
        /// Token0 still held by the module.
        amount0: U256,
        /// Token1 still held by the module.
        amount1: U256,
    },

    /// A call into a module failed.
    #[error("call to module {module} failed: {reason}")]
    CallFailed {
        /// Module that was called.
        module: Address,
        /// Why the call failed.
        reason: String,
    },

    /// Calldata did not start with a known selector.
    #[error("unknown selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    /// Calldata had a known selector but could not be decoded.
    #[error("invalid calldata: {0}")]
    InvalidCalldata(String),
}

impl VaultError {
    /// ABI-encoded revert data (selector followed by arguments).
    ///
    /// Dispatch errors have no ABI counterpart and revert with empty data,
    /// as the EVM does for a fallback-less contract.
    pub fn revert_data(&self) -> Bytes {
        let encoded = match self {
            VaultError::OnlyManager { caller, expected } => IArrakisMetaVault::OnlyManager {
                caller: *caller,
                manager: *expected,
            }
            .abi_encode(),
            VaultError::AddressZero(property) => IArrakisMetaVault::AddressZero {
                property: (*property).to_string(),
            }
            .abi_encode(),
            VaultError::SameModule => IArrakisMetaVault::SameModule {}.abi_encode(),
            VaultError::SameManager => IArrakisMetaVault::SameManager {}.abi_encode(),
            VaultError::Token0GtToken1 => IArrakisMetaVault::Token0GtToken1 {}.abi_encode(),
            VaultError::Token0EqToken1 => IArrakisMetaVault::Token0EqToken1 {}.abi_encode(),
            VaultError::ProportionZero => IArrakisMetaVault::ProportionZero {}.abi_encode(),
            VaultError::ProportionGtBase => IArrakisMetaVault::ProportionGtBASE {}.abi_encode(),
            VaultError::AlreadyWhitelisted(module) => {
                IArrakisMetaVault::AlreadyWhitelisted { module: *module }.abi_encode()
            }
            VaultError::NotWhitelistedModule(module) => {
                IArrakisMetaVault::NotWhitelistedModule { module: *module }.abi_encode()
            }
            VaultError::ActiveModule => IArrakisMetaVault::ActiveModule {}.abi_encode(),
            VaultError::ModuleNotEmpty { amount0, amount1 } => {
                IArrakisMetaVault::ModuleNotEmpty {
                    amount0: *amount0,
                    amount1: *amount1,
                }
                .abi_encode()
            }
            VaultError::CallFailed { .. } => IArrakisMetaVault::CallFailed {}.abi_encode(),
            VaultError::UnknownSelector(_) | VaultError::InvalidCalldata(_) => Vec::new(),
        };
        Bytes::from(encoded)
    }

    /// The ABI error name, used as a metrics label and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            VaultError::OnlyManager { .. } => "OnlyManager",
            VaultError::AddressZero(_) => "AddressZero",
            VaultError::SameModule => "SameModule",
            VaultError::SameManager => "SameManager",
            VaultError::Token0GtToken1 => "Token0GtToken1",
            VaultError::Token0EqToken1 => "Token0EqToken1",
            VaultError::ProportionZero => "ProportionZero",
            VaultError::ProportionGtBase => "ProportionGtBASE",
            VaultError::AlreadyWhitelisted(_) => "AlreadyWhitelisted",
            VaultError::NotWhitelistedModule(_) => "NotWhitelistedModule",
            VaultError::ActiveModule => "ActiveModule",
            VaultError::ModuleNotEmpty { .. } => "ModuleNotEmpty",
            VaultError::CallFailed { .. } => "CallFailed",
            VaultError::UnknownSelector(_) => "UnknownSelector",
            VaultError::InvalidCalldata(_) => "InvalidCalldata",
        }
    }
}
