//! # MetaVault Contracts
//!
//! Governance logic of the meta vault, executed in memory with the same
//! rules, errors and events as the on-chain `IArrakisMetaVault`:
//!
//! - **Meta Vault**: the governance state machine: manager replacement,
//!   module whitelist curation, module switches with atomic initialization
//!   payloads, and manager-driven deposits and withdrawals.
//! - **Access**: the role each operation requires.
//! - **Registry**: addresses at which modules are deployed.
//! - **Reserve Module**: a reference custody module.
//! - **Dispatch**: raw ABI calldata in, return or revert data out.
//!
//! ## Design Principles
//!
//! 1. Validate everything first, then mutate. A failed call changes nothing.
//! 2. Module calls run against staged clones and are committed on success.
//! 3. Events are appended only by successful calls, in the order they occur.
//! 4. The vault never computes token amounts; the active module does.

pub mod access;
pub mod call;
pub mod dispatch;
pub mod meta_vault;
pub mod registry;
pub mod reserve_module;

pub use access::{Operation, Role};
pub use call::VaultCall;
pub use meta_vault::{MetaVault, VaultInit, VaultSnapshot};
pub use registry::{ModuleRegistry, RegistryError};
pub use reserve_module::{ReserveModule, VaultKind};
