//! Shared fixtures for unit tests.
//!
//! Keys are derived from fixed seeds so every test sees the same scripts.

use crate::descriptor::{derive_descriptor, to_descriptor_map, DescriptorMap};
use crate::wallet_output::{DescriptorWalletOutput, DerivedDescriptorWalletOutput, PrevOutput};
use bitcoin::bip32::{DerivationPath, Xpriv, Xpub};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, Amount, Network, OutPoint, ScriptBuf, Txid};
use std::str::FromStr;
use utxo_core::Output;

/// Account path every fixture key lives under
pub const ACCOUNT_PATH: &str = "m/48'/0'/0'/2'";

/// Foreign P2WPKH address used as the external destination
pub const EXTERNAL_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

pub fn test_xpriv(seed: u8) -> Xpriv {
    Xpriv::new_master(Network::Bitcoin, &[seed; 32]).unwrap()
}

/// `[fingerprint/48'/0'/0'/2']xpub/<branch>/*`
pub fn test_key(seed: u8, branch: u32) -> String {
    let secp = Secp256k1::new();
    let master = test_xpriv(seed);
    let path = DerivationPath::from_str(ACCOUNT_PATH).unwrap();
    let account = master.derive_priv(&secp, &path).unwrap();
    let xpub = Xpub::from_priv(&secp, &account);
    format!(
        "[{}/48'/0'/0'/2']{}/{}/*",
        master.fingerprint(&secp),
        xpub,
        branch
    )
}

/// 2-of-3 wsh multisig over seeds 1, 2, 3
pub fn multisig_descriptor_string(branch: u32) -> String {
    format!(
        "wsh(multi(2,{},{},{}))",
        test_key(1, branch),
        test_key(2, branch),
        test_key(3, branch)
    )
}

/// Single-key wsh script gated on an absolute block height
pub fn timelocked_descriptor_string(height: u32) -> String {
    format!("wsh(and_v(v:pk({}),after({})))", test_key(1, 0), height)
}

/// Taproot with key-path seed 1 and two script leaves (seeds 2 and 3)
pub fn taproot_descriptor_string() -> String {
    format!(
        "tr({},{{pk({}),pk({})}})",
        test_key(1, 0),
        test_key(2, 0),
        test_key(3, 0)
    )
}

/// `{ external: multisig/0/*, internal: multisig/1/* }`
pub fn test_descriptor_map() -> DescriptorMap {
    to_descriptor_map([
        ("external", multisig_descriptor_string(0)),
        ("internal", multisig_descriptor_string(1)),
    ])
    .unwrap()
}

pub fn test_outpoint(n: u8) -> OutPoint {
    OutPoint::new(Txid::from_byte_array([n; 32]), n as u32)
}

pub fn external_script() -> ScriptBuf {
    Address::from_str(EXTERNAL_ADDRESS)
        .unwrap()
        .require_network(Network::Bitcoin)
        .unwrap()
        .script_pubkey()
}

/// A wallet prevout paying to `name` at `index`
pub fn wallet_output(
    map: &DescriptorMap,
    name: &str,
    index: Option<u32>,
    outpoint: OutPoint,
    sat: u64,
) -> DescriptorWalletOutput {
    let derived = derive_descriptor(map.require(name).unwrap(), index).unwrap();
    DescriptorWalletOutput {
        prev_output: PrevOutput {
            outpoint,
            witness_utxo: Output::new(derived.script_pubkey(), Amount::from_sat(sat)),
        },
        descriptor_name: name.to_string(),
        descriptor_index: index,
    }
}

pub fn derived_wallet_output(
    map: &DescriptorMap,
    name: &str,
    index: Option<u32>,
    outpoint: OutPoint,
    sat: u64,
) -> DerivedDescriptorWalletOutput {
    wallet_output(map, name, index, outpoint, sat)
        .derive(map)
        .unwrap()
}
