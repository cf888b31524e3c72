//! Descriptor recovery
//!
//! Given only an output script and the derivation paths attached to a PSBT
//! input or output, find the descriptor (and index) in a [`DescriptorMap`]
//! that produced it.
//!
//! # Search order (first match wins)
//!
//! 1. Descriptors without a wildcard, compared directly
//! 2. Wildcard descriptors, derived at every index found as the last
//!    component of a hint path
//!
//! The search is `descriptors × distinct indices`. It relies on hint paths
//! being present and on no two descriptors sharing a script.

use crate::descriptor::{derive_descriptor, DescriptorError, DescriptorMap};
use bitcoin::bip32::{ChildNumber, DerivationPath};
use bitcoin::{Psbt, Script, TxOut};
use log::{debug, trace};
use miniscript::descriptor::DefiniteDescriptorKey;
use miniscript::Descriptor;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FindDescriptorError {
    #[error("Invalid derivation path hint: {0}")]
    InvalidDerivationPath(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("Input index out of bounds: {0}")]
    InputIndexOutOfBounds(usize),

    #[error("Output index out of bounds: {0}")]
    OutputIndexOutOfBounds(usize),

    #[error("Input {0} has no previous output")]
    MissingPrevOutput(usize),
}

/// A recovered descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorMatch {
    /// Name in the map
    pub name: String,
    /// Derivation index, `None` for descriptors without a wildcard
    pub index: Option<u32>,
    /// The descriptor with the index applied
    pub descriptor: Descriptor<DefiniteDescriptorKey>,
}

/// The last path component as an unhardened index.
///
/// Hardened or empty paths are rejected.
pub fn get_derivation_index(path: &DerivationPath) -> Result<u32, FindDescriptorError> {
    match path.into_iter().last() {
        Some(ChildNumber::Normal { index }) => Ok(*index),
        _ => Err(FindDescriptorError::InvalidDerivationPath(path.to_string())),
    }
}

/// Find the descriptor in `descriptors` whose script equals `script`.
///
/// Returns `Ok(None)` when nothing matches.
pub fn find_descriptor(
    script: &Script,
    hints: &[DerivationPath],
    descriptors: &DescriptorMap,
) -> Result<Option<DescriptorMatch>, FindDescriptorError> {
    for (name, descriptor) in descriptors.iter().filter(|(_, d)| !d.has_wildcard()) {
        let derived = derive_descriptor(descriptor, None)?;
        if derived.script_pubkey().as_script() == script {
            trace!("matched fixed descriptor {}", name);
            return Ok(Some(DescriptorMatch {
                name: name.to_string(),
                index: None,
                descriptor: derived,
            }));
        }
    }

    let indices = hints
        .iter()
        .map(get_derivation_index)
        .collect::<Result<BTreeSet<u32>, _>>()?;

    for index in indices {
        for (name, descriptor) in descriptors.iter().filter(|(_, d)| d.has_wildcard()) {
            let derived = derive_descriptor(descriptor, Some(index))?;
            if derived.script_pubkey().as_script() == script {
                trace!("matched descriptor {} at index {}", name, index);
                return Ok(Some(DescriptorMatch {
                    name: name.to_string(),
                    index: Some(index),
                    descriptor: derived,
                }));
            }
        }
    }

    Ok(None)
}

fn hint_paths<'a, I, J>(bip32: I, taproot: J) -> Vec<DerivationPath>
where
    I: IntoIterator<Item = &'a DerivationPath>,
    J: IntoIterator<Item = &'a DerivationPath>,
{
    bip32
        .into_iter()
        .cloned()
        .chain(taproot.into_iter().filter(|p| !p.is_master()).cloned())
        .collect()
}

/// The output spent by input `index`: `witness_utxo`, or the matching
/// output of `non_witness_utxo`.
pub fn get_prev_output(psbt: &Psbt, index: usize) -> Result<TxOut, FindDescriptorError> {
    let input = psbt
        .inputs
        .get(index)
        .ok_or(FindDescriptorError::InputIndexOutOfBounds(index))?;

    if let Some(utxo) = &input.witness_utxo {
        return Ok(utxo.clone());
    }

    let vout = psbt
        .unsigned_tx
        .input
        .get(index)
        .ok_or(FindDescriptorError::InputIndexOutOfBounds(index))?
        .previous_output
        .vout;
    input
        .non_witness_utxo
        .as_ref()
        .and_then(|tx| tx.output.get(vout as usize))
        .cloned()
        .ok_or(FindDescriptorError::MissingPrevOutput(index))
}

/// Recover the descriptor of input `index`
pub fn find_descriptor_for_input(
    psbt: &Psbt,
    index: usize,
    descriptors: &DescriptorMap,
) -> Result<Option<DescriptorMatch>, FindDescriptorError> {
    let prev_output = get_prev_output(psbt, index)?;
    let input = &psbt.inputs[index];
    let hints = hint_paths(
        input.bip32_derivation.values().map(|(_, path)| path),
        input.tap_key_origins.values().map(|(_, (_, path))| path),
    );

    let found = find_descriptor(&prev_output.script_pubkey, &hints, descriptors)?;
    if let Some(m) = &found {
        debug!("input {}: descriptor {} index {:?}", index, m.name, m.index);
    }
    Ok(found)
}

/// Recover the descriptor of output `index`
pub fn find_descriptor_for_output(
    psbt: &Psbt,
    index: usize,
    descriptors: &DescriptorMap,
) -> Result<Option<DescriptorMatch>, FindDescriptorError> {
    let (Some(txout), Some(output)) = (psbt.unsigned_tx.output.get(index), psbt.outputs.get(index))
    else {
        return Err(FindDescriptorError::OutputIndexOutOfBounds(index));
    };
    let hints = hint_paths(
        output.bip32_derivation.values().map(|(_, path)| path),
        output.tap_key_origins.values().map(|(_, (_, path))| path),
    );

    let found = find_descriptor(&txout.script_pubkey, &hints, descriptors)?;
    if let Some(m) = &found {
        debug!("output {}: descriptor {} index {:?}", index, m.name, m.index);
    }
    Ok(found)
}
