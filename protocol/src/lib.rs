// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # MetaVault Protocol Core Library
//!
//! Shared vocabulary for the meta vault governance simulator: the ABI the
//! vault speaks, the events it emits, the errors it reverts with, and the
//! contract a custody module has to honour.
//!
//! ## Architecture
//!
//! - **abi**: `sol!` declarations. Selectors and topics come from here.
//! - **config**: Fixed-point denominators, vault type tags, node defaults.
//! - **error**: [`VaultError`] and its revert-data encoding.
//! - **events**: [`VaultEvent`] and its EVM log encoding.
//! - **module**: The [`Module`] trait implemented by custody strategies.
//!
//! The governance state machine itself lives in `metavault-contracts`.

pub mod abi;
pub mod config;
pub mod error;
pub mod events;
pub mod module;

pub use alloy_primitives::{aliases::U160, Address, Bytes, B256, U256};
pub use error::VaultError;
pub use events::VaultEvent;
pub use module::{Amounts, Module, ModuleCallError};
