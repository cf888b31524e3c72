//! Wallet configuration: parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.
//!
//! ```toml
//! [wallet]
//! network = "bitcoin"
//!
//! [psbt]
//! version = 2
//! lock_time = 0
//! sequence = 4294967293
//!
//! [descriptors]
//! external = "wsh(multi(2,...))"
//! internal = "wsh(multi(2,...))"
//! ```

use crate::create::PsbtParams;
use crate::descriptor::{to_descriptor_map, DescriptorMap};
use anyhow::{Context, Result};
use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Network, Sequence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub wallet: WalletSection,

    /// Transaction defaults for the PSBT builder
    #[serde(default)]
    pub psbt: PsbtSection,

    /// Descriptor name -> descriptor string
    #[serde(default)]
    pub descriptors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSection {
    /// Bitcoin network: "bitcoin", "testnet", "testnet4", "signet", "regtest"
    #[serde(default = "default_network")]
    pub network: String,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            network: default_network(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsbtSection {
    /// Transaction version (1 or 2)
    #[serde(default = "default_version")]
    pub version: i32,

    /// Transaction locktime (block height or timestamp)
    #[serde(default)]
    pub lock_time: u32,

    /// Default input sequence
    #[serde(default = "default_sequence")]
    pub sequence: u32,
}

impl Default for PsbtSection {
    fn default() -> Self {
        Self {
            version: default_version(),
            lock_time: 0,
            sequence: default_sequence(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_network() -> String {
    "bitcoin".to_string()
}

fn default_version() -> i32 {
    2
}

fn default_sequence() -> u32 {
    0xFFFF_FFFD // replaceable, non-final
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "Failed to parse TOML config")
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `UTXO_DESCRIPTOR_NETWORK`
    /// - `UTXO_DESCRIPTOR_LOCK_TIME`
    /// - `UTXO_DESCRIPTOR_SEQUENCE`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("UTXO_DESCRIPTOR_NETWORK") {
            self.wallet.network = v;
        }
        if let Ok(v) = std::env::var("UTXO_DESCRIPTOR_LOCK_TIME") {
            if let Ok(lock_time) = v.parse::<u32>() {
                self.psbt.lock_time = lock_time;
            }
        }
        if let Ok(v) = std::env::var("UTXO_DESCRIPTOR_SEQUENCE") {
            if let Ok(sequence) = v.parse::<u32>() {
                self.psbt.sequence = sequence;
            }
        }
    }

    /// Parse the network string to a `bitcoin::Network`.
    ///
    /// Unknown names are an error; they never fall back to mainnet.
    pub fn network(&self) -> Result<Network> {
        match self.wallet.network.as_str() {
            "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" | "testnet3" => Ok(Network::Testnet),
            "testnet4" => Ok(Network::Testnet4),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            other => anyhow::bail!("unknown network: {}", other),
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        self.network().with_context(|| "wallet.network is invalid")?;

        anyhow::ensure!(
            !self.descriptors.is_empty(),
            "at least one descriptor must be configured"
        );

        for (name, descriptor) in &self.descriptors {
            anyhow::ensure!(
                !descriptor.trim().is_empty(),
                "descriptors.{} must not be empty",
                name
            );
        }

        anyhow::ensure!(
            self.psbt.version == 1 || self.psbt.version == 2,
            "psbt.version must be 1 or 2"
        );

        Ok(())
    }

    /// Parse the configured descriptors.
    pub fn descriptor_map(&self) -> Result<DescriptorMap> {
        to_descriptor_map(&self.descriptors).with_context(|| "Invalid descriptor in config")
    }

    /// Builder parameters from the `[wallet]` and `[psbt]` sections.
    pub fn psbt_params(&self) -> Result<PsbtParams> {
        Ok(PsbtParams {
            network: self.network()?,
            version: Version(self.psbt.version),
            lock_time: LockTime::from_consensus(self.psbt.lock_time),
            sequence: Sequence::from_consensus(self.psbt.sequence),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
