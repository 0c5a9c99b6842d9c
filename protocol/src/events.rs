//! # Vault Events
//!
//! Notifications emitted by successful vault calls. Variant and field names
//! follow the `IArrakisMetaVault` events exactly, and
//! [`VaultEvent::encode_log_data`] produces the EVM log an on-chain vault
//! would have emitted (topic0 = event signature hash, ABI-encoded data).

use alloy_primitives::{Address, Bytes, LogData, B256, U256};
use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};

use crate::abi::IArrakisMetaVault;

/// An event emitted by the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all_fields = "camelCase")]
pub enum VaultEvent {
    /// The active module took in `proportion` of a position.
    LogDeposit {
        proportion: U256,
        amount0: U256,
        amount1: U256,
    },
    /// The active module released `proportion` of the position.
    LogWithdraw {
        proportion: U256,
        amount0: U256,
        amount1: U256,
    },
    /// The manager's accrued fees were paid out.
    LogWithdrawManagerBalance { amount0: U256, amount1: U256 },
    /// The owner replaced the manager.
    LogSetManager {
        old_manager: Address,
        new_manager: Address,
    },
    /// The manager switched the active module.
    LogSetModule { module: Address, payloads: Vec<Bytes> },
    /// The vault was created with its first module.
    LogSetFirstModule { module: Address },
    /// A batch of modules was whitelisted.
    LogWhiteListedModules { modules: Vec<Address> },
    /// A single module was whitelisted at construction.
    LogWhitelistedModule { module: Address },
    /// A batch of modules was blacklisted.
    LogBlackListedModules { modules: Vec<Address> },
}

impl VaultEvent {
    /// The event name as it appears in the ABI.
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::LogDeposit { .. } => "LogDeposit",
            VaultEvent::LogWithdraw { .. } => "LogWithdraw",
            VaultEvent::LogWithdrawManagerBalance { .. } => "LogWithdrawManagerBalance",
            VaultEvent::LogSetManager { .. } => "LogSetManager",
            VaultEvent::LogSetModule { .. } => "LogSetModule",
            VaultEvent::LogSetFirstModule { .. } => "LogSetFirstModule",
            VaultEvent::LogWhiteListedModules { .. } => "LogWhiteListedModules",
            VaultEvent::LogWhitelistedModule { .. } => "LogWhitelistedModule",
            VaultEvent::LogBlackListedModules { .. } => "LogBlackListedModules",
        }
    }

    /// keccak-256 of the canonical event signature (log topic 0).
    pub fn signature_hash(&self) -> B256 {
        match self {
            VaultEvent::LogDeposit { .. } => IArrakisMetaVault::LogDeposit::SIGNATURE_HASH,
            VaultEvent::LogWithdraw { .. } => IArrakisMetaVault::LogWithdraw::SIGNATURE_HASH,
            VaultEvent::LogWithdrawManagerBalance { .. } => {
                IArrakisMetaVault::LogWithdrawManagerBalance::SIGNATURE_HASH
            }
            VaultEvent::LogSetManager { .. } => IArrakisMetaVault::LogSetManager::SIGNATURE_HASH,
            VaultEvent::LogSetModule { .. } => IArrakisMetaVault::LogSetModule::SIGNATURE_HASH,
            VaultEvent::LogSetFirstModule { .. } => {
                IArrakisMetaVault::LogSetFirstModule::SIGNATURE_HASH
            }
            VaultEvent::LogWhiteListedModules { .. } => {
                IArrakisMetaVault::LogWhiteListedModules::SIGNATURE_HASH
            }
            VaultEvent::LogWhitelistedModule { .. } => {
                IArrakisMetaVault::LogWhitelistedModule::SIGNATURE_HASH
            }
            VaultEvent::LogBlackListedModules { .. } => {
                IArrakisMetaVault::LogBlackListedModules::SIGNATURE_HASH
            }
        }
    }

    /// Encodes the event as an EVM log.
    pub fn encode_log_data(&self) -> LogData {
        match self.clone() {
            VaultEvent::LogDeposit {
                proportion,
                amount0,
                amount1,
            } => IArrakisMetaVault::LogDeposit {
                proportion,
                amount0,
                amount1,
            }
            .encode_log_data(),
            VaultEvent::LogWithdraw {
                proportion,
                amount0,
                amount1,
            } => IArrakisMetaVault::LogWithdraw {
                proportion,
                amount0,
                amount1,
            }
            .encode_log_data(),
            VaultEvent::LogWithdrawManagerBalance { amount0, amount1 } => {
                IArrakisMetaVault::LogWithdrawManagerBalance { amount0, amount1 }.encode_log_data()
            }
            VaultEvent::LogSetManager {
                old_manager,
                new_manager,
            } => IArrakisMetaVault::LogSetManager {
                oldManager: old_manager,
                newManager: new_manager,
            }
            .encode_log_data(),
            VaultEvent::LogSetModule { module, payloads } => {
                IArrakisMetaVault::LogSetModule { module, payloads }.encode_log_data()
            }
            VaultEvent::LogSetFirstModule { module } => {
                IArrakisMetaVault::LogSetFirstModule { module }.encode_log_data()
            }
            VaultEvent::LogWhiteListedModules { modules } => {
                IArrakisMetaVault::LogWhiteListedModules { modules }.encode_log_data()
            }
            VaultEvent::LogWhitelistedModule { module } => {
                IArrakisMetaVault::LogWhitelistedModule { module }.encode_log_data()
            }
            VaultEvent::LogBlackListedModules { modules } => {
                IArrakisMetaVault::LogBlackListedModules { modules }.encode_log_data()
            }
        }
    }
}

impl std::fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
