//! Descriptor-aware PSBT construction
//!
//! Builds an unsigned PSBT from descriptor-tagged inputs and outputs and
//! attaches the signing metadata each descriptor implies (witness scripts,
//! BIP32 derivations, taproot leaves and key origins).
//!
//! # Flow
//!
//! 1. Skeleton transaction with one input per prevout, one output per output
//! 2. Per input: satisfiability check, then descriptor metadata, then
//!    optional tap leaf narrowing
//! 3. Per internal output: descriptor metadata
//!
//! Locktime problems and extended keys encoded for another network are
//! reported before any metadata is attached.

use crate::descriptor::DescriptorExt;
use crate::wallet_output::{DerivedDescriptorWalletOutput, WithOptDescriptor};
use bitcoin::absolute::LockTime;
use bitcoin::psbt::Input as PsbtInput;
use bitcoin::taproot::{LeafVersion, TapLeafHash};
use bitcoin::transaction::Version;
use bitcoin::{Amount, Network, NetworkKind, Psbt, ScriptBuf, Sequence, Transaction, TxIn, Witness};
use log::{debug, trace};
use miniscript::psbt::{PsbtExt, PsbtInputExt};
use miniscript::descriptor::{DefiniteDescriptorKey, DescriptorPublicKey};
use miniscript::{Descriptor, ForEachKey, MiniscriptKey};
use thiserror::Error;
use utxo_core::Output;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SatisfiabilityError {
    #[error("Input {input_index} requires locktime {required} but has a final sequence")]
    FinalSequence { input_index: usize, required: u32 },

    #[error("Input {input_index} requires locktime {required}, transaction has {actual}")]
    LocktimeMismatch {
        input_index: usize,
        required: u32,
        actual: u32,
    },

    #[error("Input index out of bounds: {0}")]
    InputIndexOutOfBounds(usize),

    #[error("Cannot inspect descriptor policy: {0}")]
    Policy(String),
}

#[derive(Error, Debug)]
pub enum CreatePsbtError {
    #[error("PSBT error: {0}")]
    Psbt(String),

    #[error(transparent)]
    Satisfiability(#[from] SatisfiabilityError),

    #[error("Failed to update input {index}: {reason}")]
    InputUpdate { index: usize, reason: String },

    #[error("Failed to update output {index}: {reason}")]
    OutputUpdate { index: usize, reason: String },

    #[error("Descriptor of input {index} has extended keys for another network than {network}")]
    InputNetworkMismatch { index: usize, network: Network },

    #[error("Descriptor of output {index} has extended keys for another network than {network}")]
    OutputNetworkMismatch { index: usize, network: Network },

    #[error("Tap leaf selection for input {index} matched {matches} leaves, expected exactly one")]
    TapLeafSelection { index: usize, matches: usize },
}

/// Global transaction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsbtParams {
    /// Network the descriptors' extended keys must be encoded for
    pub network: Network,
    pub version: Version,
    /// Transaction locktime
    pub lock_time: LockTime,
    /// Sequence for inputs that do not set their own
    pub sequence: Sequence,
}

impl Default for PsbtParams {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
        }
    }
}

/// Identifies one leaf of a taproot script tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapLeafSelector {
    /// The encoded leaf script (tapscript leaf version)
    Script(ScriptBuf),
    /// The leaf hash
    LeafHash(TapLeafHash),
}

impl TapLeafSelector {
    pub fn leaf_hash(&self) -> TapLeafHash {
        match self {
            TapLeafSelector::Script(script) => {
                TapLeafHash::from_script(script, LeafVersion::TapScript)
            }
            TapLeafSelector::LeafHash(hash) => *hash,
        }
    }
}

/// A transaction input: a resolved wallet prevout plus spend options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedDescriptorTransactionInput {
    pub output: DerivedDescriptorWalletOutput,
    /// Overrides [`PsbtParams::sequence`]
    pub sequence: Option<Sequence>,
    /// Script path to spend through, for taproot trees with several leaves
    pub select_tap_leaf: Option<TapLeafSelector>,
}

impl From<DerivedDescriptorWalletOutput> for DerivedDescriptorTransactionInput {
    fn from(output: DerivedDescriptorWalletOutput) -> Self {
        Self {
            output,
            sequence: None,
            select_tap_leaf: None,
        }
    }
}

/// Check that input `input_index` can satisfy the absolute locktime of
/// `descriptor`, if it has one.
///
/// A final sequence (`0xFFFFFFFF`) disables locktime enforcement, and the
/// transaction locktime must equal the required value exactly.
pub fn assert_satisfiable<Pk: MiniscriptKey>(
    psbt: &Psbt,
    input_index: usize,
    descriptor: &Descriptor<Pk>,
) -> Result<(), SatisfiabilityError> {
    let Some(required) = descriptor
        .absolute_locktime()
        .map_err(|e| SatisfiabilityError::Policy(e.to_string()))?
    else {
        return Ok(());
    };

    let txin = psbt
        .unsigned_tx
        .input
        .get(input_index)
        .ok_or(SatisfiabilityError::InputIndexOutOfBounds(input_index))?;

    if txin.sequence == Sequence::MAX {
        return Err(SatisfiabilityError::FinalSequence {
            input_index,
            required,
        });
    }

    let actual = psbt.unsigned_tx.lock_time.to_consensus_u32();
    if actual != required {
        return Err(SatisfiabilityError::LocktimeMismatch {
            input_index,
            required,
            actual,
        });
    }

    Ok(())
}

/// Whether every extended key in `descriptor` is encoded for `network`.
///
/// Single keys carry no network and always pass.
pub fn keys_match_network(
    descriptor: &Descriptor<DefiniteDescriptorKey>,
    network: Network,
) -> bool {
    let kind = NetworkKind::from(network);
    descriptor.for_each_key(|key| match key.as_descriptor_public_key() {
        DescriptorPublicKey::Single(_) => true,
        DescriptorPublicKey::XPub(xkey) => xkey.xkey.network == kind,
        DescriptorPublicKey::MultiXPub(xkey) => xkey.xkey.network == kind,
    })
}

/// Keep only the selected leaf in `tap_scripts` and `tap_key_origins`.
///
/// Returns the number of candidate leaves that matched when it is not one.
fn narrow_tap_leaves(input: &mut PsbtInput, selector: &TapLeafSelector) -> Result<(), usize> {
    if input.tap_scripts.len() <= 1 {
        return Ok(());
    }

    let selected = selector.leaf_hash();
    let matching: Vec<_> = input
        .tap_scripts
        .iter()
        .filter(|(_, (script, version))| TapLeafHash::from_script(script, *version) == selected)
        .map(|(control_block, _)| control_block.clone())
        .collect();
    if matching.len() != 1 {
        return Err(matching.len());
    }

    input
        .tap_scripts
        .retain(|control_block, _| *control_block == matching[0]);
    input.tap_key_origins.retain(|_, (leaf_hashes, _)| {
        // key-path entries carry no leaf hashes
        if leaf_hashes.is_empty() {
            return true;
        }
        leaf_hashes.retain(|h| *h == selected);
        !leaf_hashes.is_empty()
    });
    Ok(())
}

/// Build an annotated, unsigned PSBT.
///
/// # Arguments
/// * `params` - Network, version, locktime and default sequence
/// * `inputs` - Wallet prevouts to spend, with resolved descriptors
/// * `outputs` - Outputs in order; those with a descriptor get its metadata
///
/// # Errors
/// Satisfiability errors are returned before any input metadata is
/// attached for that input.
pub fn create_psbt(
    params: &PsbtParams,
    inputs: &[DerivedDescriptorTransactionInput],
    outputs: &[WithOptDescriptor<Output<Amount>>],
) -> Result<Psbt, CreatePsbtError> {
    let tx = Transaction {
        version: params.version,
        lock_time: params.lock_time,
        input: inputs
            .iter()
            .map(|input| TxIn {
                previous_output: input.output.prev_output.outpoint,
                script_sig: ScriptBuf::new(),
                sequence: input.sequence.unwrap_or(params.sequence),
                witness: Witness::new(),
            })
            .collect(),
        output: outputs.iter().map(|o| o.value.to_txout()).collect(),
    };

    let mut psbt = Psbt::from_unsigned_tx(tx).map_err(|e| CreatePsbtError::Psbt(e.to_string()))?;

    for (index, input) in inputs.iter().enumerate() {
        let descriptor = &input.output.descriptor;
        if !keys_match_network(descriptor, params.network) {
            return Err(CreatePsbtError::InputNetworkMismatch {
                index,
                network: params.network,
            });
        }
        assert_satisfiable(&psbt, index, descriptor)?;

        let psbt_input = &mut psbt.inputs[index];
        psbt_input.witness_utxo = Some(input.output.prev_output.witness_utxo.to_txout());
        psbt_input
            .update_with_descriptor_unchecked(descriptor)
            .map_err(|e| CreatePsbtError::InputUpdate {
                index,
                reason: e.to_string(),
            })?;

        if let Some(selector) = &input.select_tap_leaf {
            narrow_tap_leaves(psbt_input, selector)
                .map_err(|matches| CreatePsbtError::TapLeafSelection { index, matches })?;
            trace!("input {}: selected tap leaf {}", index, selector.leaf_hash());
        }
    }

    for (index, output) in outputs.iter().enumerate() {
        if let Some(descriptor) = &output.descriptor {
            if !keys_match_network(descriptor, params.network) {
                return Err(CreatePsbtError::OutputNetworkMismatch {
                    index,
                    network: params.network,
                });
            }
            psbt.update_output_with_descriptor(index, descriptor)
                .map_err(|e| CreatePsbtError::OutputUpdate {
                    index,
                    reason: e.to_string(),
                })?;
        }
    }

    debug!(
        "created psbt with {} inputs, {} outputs ({} internal)",
        inputs.len(),
        outputs.len(),
        outputs.iter().filter(|o| o.is_internal()).count()
    );

    Ok(psbt)
}
