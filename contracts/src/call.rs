//! Typed mutating calls, shared by the ABI dispatcher, scenario files and
//! the node's JSON-RPC surface.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::access::Operation;

/// A mutating vault call and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VaultCall {
    SetManager {
        new_manager: Address,
    },
    SetModule {
        module: Address,
        #[serde(default)]
        payloads: Vec<Bytes>,
    },
    WhitelistModules {
        modules: Vec<Address>,
    },
    BlacklistModules {
        modules: Vec<Address>,
    },
    Deposit {
        proportion: U256,
    },
    Withdraw {
        proportion: U256,
        receiver: Address,
    },
    WithdrawManagerBalance,
}

impl VaultCall {
    /// The operation this call performs.
    pub fn operation(&self) -> Operation {
        match self {
            VaultCall::SetManager { .. } => Operation::SetManager,
            VaultCall::SetModule { .. } => Operation::SetModule,
            VaultCall::WhitelistModules { .. } => Operation::WhitelistModules,
            VaultCall::BlacklistModules { .. } => Operation::BlacklistModules,
            VaultCall::Deposit { .. } => Operation::Deposit,
            VaultCall::Withdraw { .. } => Operation::Withdraw,
            VaultCall::WithdrawManagerBalance => Operation::WithdrawManagerBalance,
        }
    }
}
