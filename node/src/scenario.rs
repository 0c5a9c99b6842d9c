//! # Genesis & Scenario Files
//!
//! JSON inputs of the node. A genesis file describes a vault and the modules
//! deployed next to it; a scenario file is a genesis plus an ordered list of
//! calls to replay against it.
//!
//! ```json
//! {
//!   "vault": { "owner": "0x..a1", "manager": "0x..a2",
//!              "token0": "0x..0a", "token1": "0x..0b", "module": "0x..100" },
//!   "modules": [ { "address": "0x..100", "module": { "inits": ["0x1", "0x1"] } } ],
//!   "calls": [ { "caller": "0x..a1", "op": "whitelistModules", "modules": ["0x..101"] } ]
//! }
//! ```

use std::path::Path;

use alloy_primitives::{Address, Bytes};
use anyhow::{Context, Result};
use metavault_contracts::{MetaVault, ModuleRegistry, ReserveModule, VaultCall, VaultInit, VaultSnapshot};
use metavault_protocol::VaultEvent;
use serde::{Deserialize, Serialize};

use crate::metrics::NodeMetrics;

/// A module deployed at genesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDeployment {
    pub address: Address,
    pub module: ReserveModule,
}

/// Vault parameters and deployed modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genesis {
    pub vault: VaultInit,
    #[serde(default)]
    pub modules: Vec<ModuleDeployment>,
}

impl Genesis {
    /// Deploys the modules and constructs the vault.
    pub fn build(&self) -> Result<MetaVault> {
        let mut registry = ModuleRegistry::new();
        for deployment in &self.modules {
            registry
                .deploy(deployment.address, Box::new(deployment.module.clone()))
                .with_context(|| format!("failed to deploy module at {}", deployment.address))?;
        }
        let vault = MetaVault::new(self.vault.clone(), registry).context("vault construction failed")?;
        Ok(vault)
    }
}

/// One call of a scenario: who calls, and what.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCall {
    pub caller: Address,
    #[serde(flatten)]
    pub call: VaultCall,
}

/// A genesis plus the calls to replay against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub genesis: Genesis,
    #[serde(default)]
    pub calls: Vec<ScenarioCall>,
}

/// What happened to one replayed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CallStatus {
    Accepted {
        events: Vec<VaultEvent>,
    },
    Rejected {
        error: String,
        reason: String,
        revert_data: Bytes,
    },
}

/// Outcome of one replayed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOutcome {
    pub index: usize,
    pub caller: Address,
    pub op: String,
    #[serde(flatten)]
    pub status: CallStatus,
}

/// Result of replaying a whole scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub outcomes: Vec<CallOutcome>,
    pub accepted: usize,
    pub rejected: usize,
    pub vault: VaultSnapshot,
    pub events: Vec<VaultEvent>,
}

/// Reads and parses a JSON file.
fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {} file {}", what, path.display()))
}

pub fn load_genesis(path: &Path) -> Result<Genesis> {
    load_json(path, "genesis")
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    load_json(path, "scenario")
}

/// Builds the scenario's vault and runs every call in order.
///
/// Rejected calls are reported and skipped; they never stop the replay.
pub fn replay(scenario: Scenario, metrics: Option<&NodeMetrics>) -> Result<ReplayReport> {
    let mut vault = scenario.genesis.build()?;
    let mut outcomes = Vec::with_capacity(scenario.calls.len());

    for (index, ScenarioCall { caller, call }) in scenario.calls.into_iter().enumerate() {
        let op = call.operation().name().to_string();
        let result = vault.execute(caller, call);
        if let Some(metrics) = metrics {
            metrics.record_call(&result);
            metrics.observe_vault(&vault);
        }

        let status = match result {
            Ok(events) => CallStatus::Accepted { events },
            Err(err) => CallStatus::Rejected {
                error: err.name().to_string(),
                reason: err.to_string(),
                revert_data: err.revert_data(),
            },
        };
        outcomes.push(CallOutcome {
            index,
            caller,
            op,
            status,
        });
    }

    let accepted = outcomes
        .iter()
        .filter(|o| matches!(o.status, CallStatus::Accepted { .. }))
        .count();
    tracing::info!(
        calls = outcomes.len(),
        accepted,
        rejected = outcomes.len() - accepted,
        "scenario replayed"
    );

    Ok(ReplayReport {
        accepted,
        rejected: outcomes.len() - accepted,
        outcomes,
        vault: vault.snapshot(),
        events: vault.events().to_vec(),
    })
}
