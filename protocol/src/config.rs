//! # Protocol Configuration & Constants
//!
//! Fixed-point denominators, vault type tags, and the default network
//! parameters of the node. Anything that looks like a magic number in the
//! vault or its modules is declared here.

use alloy_primitives::{aliases::U160, keccak256, B256, U256};

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Version of the governance model exposed by the node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Fixed-point arithmetic
// ---------------------------------------------------------------------------

/// Denominator for proportions: `BASE` means "the whole position".
pub const BASE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// `1.0` in Q64.96 fixed point (`2^96`), the unit price for `priceX96`.
pub const PRICE_X96_ONE: U160 = U160::from_limbs([0, 1 << 32, 0]);

// ---------------------------------------------------------------------------
// Vault types
// ---------------------------------------------------------------------------

/// Tag hashed into the vault type of modules serving a public vault.
pub const PUBLIC_VAULT_TAG: &str = "PublicType";

/// Tag hashed into the vault type of modules serving a private vault.
pub const PRIVATE_VAULT_TAG: &str = "PrivateType";

/// `keccak256("PublicType")`.
pub fn public_vault_type() -> B256 {
    keccak256(PUBLIC_VAULT_TAG)
}

/// `keccak256("PrivateType")`.
pub fn private_vault_type() -> B256 {
    keccak256(PRIVATE_VAULT_TAG)
}

// ---------------------------------------------------------------------------
// AddressZero properties
// ---------------------------------------------------------------------------

/// Property names reported by `AddressZero`. They are part of the revert
/// data, so they never change once published.
pub mod property {
    pub const TOKEN0: &str = "token0";
    pub const OWNER: &str = "owner";
    pub const MANAGER: &str = "manager";
    pub const MODULE: &str = "module";
    pub const RECEIVER: &str = "receiver";
}

// ---------------------------------------------------------------------------
// Node defaults
// ---------------------------------------------------------------------------

/// Default JSON-RPC / REST port of `metavault-node serve`.
pub const DEFAULT_RPC_PORT: u16 = 9841;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// Capacity of the event broadcast channel feeding WebSocket subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
