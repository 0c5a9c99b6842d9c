//! # Access Policy
//!
//! Maps every mutating vault operation to the role allowed to perform it.
//! Authorization is a plain function of `(operation, caller, roles)`; the
//! vault keeps `owner` and `manager` as ordinary fields and checks them on
//! each call.
//!
//! | Operation                | Role    |
//! |--------------------------|---------|
//! | `setManager`             | Owner   |
//! | `whitelistModules`       | Owner   |
//! | `blacklistModules`       | Owner   |
//! | `setModule`              | Manager |
//! | `deposit`                | Manager |
//! | `withdraw`               | Manager |
//! | `withdrawManagerBalance` | Manager |

use alloy_primitives::Address;
use metavault_protocol::VaultError;
use serde::{Deserialize, Serialize};

/// A governance role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Sets the manager and curates the module whitelist.
    Owner,
    /// Switches modules and drives deposits, withdrawals and fee collection.
    Manager,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "Owner"),
            Role::Manager => write!(f, "Manager"),
        }
    }
}

/// A mutating vault operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    SetManager,
    SetModule,
    WhitelistModules,
    BlacklistModules,
    Deposit,
    Withdraw,
    WithdrawManagerBalance,
}

impl Operation {
    /// Every operation, in ABI declaration order.
    pub const ALL: [Operation; 7] = [
        Operation::SetManager,
        Operation::SetModule,
        Operation::WhitelistModules,
        Operation::BlacklistModules,
        Operation::Deposit,
        Operation::Withdraw,
        Operation::WithdrawManagerBalance,
    ];

    /// The role allowed to perform this operation.
    pub fn required_role(self) -> Role {
        match self {
            Operation::SetManager | Operation::WhitelistModules | Operation::BlacklistModules => {
                Role::Owner
            }
            Operation::SetModule
            | Operation::Deposit
            | Operation::Withdraw
            | Operation::WithdrawManagerBalance => Role::Manager,
        }
    }

    /// The ABI function name.
    pub fn name(self) -> &'static str {
        match self {
            Operation::SetManager => "setManager",
            Operation::SetModule => "setModule",
            Operation::WhitelistModules => "whitelistModules",
            Operation::BlacklistModules => "blacklistModules",
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
            Operation::WithdrawManagerBalance => "withdrawManagerBalance",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Current holders of each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    pub owner: Address,
    pub manager: Address,
}

impl Roles {
    /// Address currently holding `role`.
    pub fn holder(&self, role: Role) -> Address {
        match role {
            Role::Owner => self.owner,
            Role::Manager => self.manager,
        }
    }
}

/// Checks that `caller` holds the role `operation` requires.
///
/// # Errors
///
/// Returns [`VaultError::OnlyManager`] carrying the caller and the address
/// that holds the required role. The same error is used for owner-only and
/// manager-only operations.
pub fn authorize(operation: Operation, caller: Address, roles: &Roles) -> Result<(), VaultError> {
    let expected = roles.holder(operation.required_role());
    if caller != expected {
        return Err(VaultError::OnlyManager { caller, expected });
    }
    Ok(())
}
