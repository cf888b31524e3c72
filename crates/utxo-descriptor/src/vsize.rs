//! Virtual size estimation
//!
//! Estimates the vsize of a transaction whose inputs are not yet signed,
//! from the maximum satisfaction weight of each input's descriptor.
//!
//! ```text
//! input  = 32 (txid) + 4 (vout) + 4 (sequence) + len prefix + ceil(max_weight / 4)
//! output = 8 (value) + varint(script len) + script len
//! tx     = 11 (version, locktime, counts, segwit marker) + inputs + outputs
//! ```
//!
//! This is an upper bound. Finalized transactions (taproot in particular)
//! can come out a vbyte or so smaller.

use crate::descriptor::{DescriptorError, DescriptorExt, DescriptorKind, DescriptorMap};
use crate::find::{find_descriptor_for_input, FindDescriptorError};
use bitcoin::{Psbt, VarInt};
use miniscript::descriptor::DefiniteDescriptorKey;
use miniscript::{Descriptor, MiniscriptKey};
use thiserror::Error;

/// Version (4) + locktime (4) + input count (1) + output count (1) + segwit marker/flag (rounded up)
pub const TX_OVERHEAD_VSIZE: usize = 11;

const INPUT_FIXED_VSIZE: usize = 32 + 4 + 4;

#[derive(Error, Debug)]
pub enum VsizeError {
    #[error("Output script length is not determinable for descriptor kind {0}")]
    UndeterminedScriptLength(DescriptorKind),

    #[error("Descriptor cannot be satisfied: {0}")]
    Unsatisfiable(String),

    #[error("No descriptor found for input {0}")]
    NoDescriptorForInput(usize),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Find(#[from] FindDescriptorError),
}

/// Input to [`get_virtual_size`]: a resolved descriptor or a name to look up
#[derive(Debug, Clone, Copy)]
pub enum VsizeInput<'a> {
    Descriptor(&'a Descriptor<DefiniteDescriptorKey>),
    Named(&'a str),
}

impl<'a> From<&'a Descriptor<DefiniteDescriptorKey>> for VsizeInput<'a> {
    fn from(descriptor: &'a Descriptor<DefiniteDescriptorKey>) -> Self {
        VsizeInput::Descriptor(descriptor)
    }
}

impl<'a> From<&'a str> for VsizeInput<'a> {
    fn from(name: &'a str) -> Self {
        VsizeInput::Named(name)
    }
}

fn input_vsize_for_weight(max_weight: u64) -> usize {
    let satisfaction_vsize = max_weight.div_ceil(4) as usize;
    let length_prefix = if satisfaction_vsize < 255 { 1 } else { 2 };
    INPUT_FIXED_VSIZE + length_prefix + satisfaction_vsize
}

/// Upper bound on the vsize of an input spending `descriptor`.
///
/// Works on wildcard descriptors too: satisfaction weight does not depend
/// on the derivation index.
pub fn get_input_vsize_for_descriptor<Pk: MiniscriptKey>(
    descriptor: &Descriptor<Pk>,
) -> Result<usize, VsizeError> {
    let weight = descriptor
        .max_weight_to_satisfy()
        .map_err(|e| VsizeError::Unsatisfiable(e.to_string()))?;
    Ok(input_vsize_for_weight(weight.to_wu()))
}

/// Script length of an output produced by a descriptor of `kind`.
///
/// Bare scripts have no fixed length and yield an error.
pub fn get_output_script_length(kind: DescriptorKind) -> Result<usize, VsizeError> {
    match kind {
        DescriptorKind::Wpkh => Ok(22),
        DescriptorKind::Sh => Ok(23),
        DescriptorKind::Pkh => Ok(25),
        DescriptorKind::Wsh | DescriptorKind::Tr => Ok(34),
        DescriptorKind::Bare => Err(VsizeError::UndeterminedScriptLength(kind)),
    }
}

/// Serialized size of an output with a script of `script_length` bytes
pub fn get_output_vsize(script_length: usize) -> usize {
    8 + VarInt(script_length as u64).size() + script_length
}

/// Estimated vsize of a transaction.
///
/// # Arguments
/// * `inputs` - One entry per input; [`VsizeInput::Named`] entries are
///   looked up in `descriptors`
/// * `output_script_lengths` - Script length of each output
/// * `descriptors` - Required only when some input is named
///
/// # Errors
/// [`DescriptorError::UnknownDescriptor`] if a named input is not in the map
/// (or no map was given).
pub fn get_virtual_size(
    inputs: &[VsizeInput<'_>],
    output_script_lengths: &[usize],
    descriptors: Option<&DescriptorMap>,
) -> Result<usize, VsizeError> {
    let mut vsize = TX_OVERHEAD_VSIZE;

    for input in inputs {
        vsize += match input {
            VsizeInput::Descriptor(descriptor) => get_input_vsize_for_descriptor(*descriptor)?,
            VsizeInput::Named(name) => {
                let descriptor = descriptors
                    .and_then(|map| map.get(name))
                    .ok_or_else(|| DescriptorError::UnknownDescriptor(name.to_string()))?;
                get_input_vsize_for_descriptor(descriptor)?
            }
        };
    }

    vsize += output_script_lengths
        .iter()
        .map(|len| get_output_vsize(*len))
        .sum::<usize>();

    Ok(vsize)
}

/// Estimated vsize of an unsigned PSBT, recovering each input's descriptor
/// from `descriptors`.
///
/// Every input must be attributable to a descriptor in the map.
pub fn get_virtual_size_estimate_for_psbt(
    psbt: &Psbt,
    descriptors: &DescriptorMap,
) -> Result<usize, VsizeError> {
    let recovered = (0..psbt.inputs.len())
        .map(|index| {
            find_descriptor_for_input(psbt, index, descriptors)?
                .ok_or(VsizeError::NoDescriptorForInput(index))
        })
        .collect::<Result<Vec<_>, VsizeError>>()?;

    let inputs: Vec<VsizeInput<'_>> = recovered
        .iter()
        .map(|m| VsizeInput::Descriptor(&m.descriptor))
        .collect();
    let output_script_lengths: Vec<usize> = psbt
        .unsigned_tx
        .output
        .iter()
        .map(|o| o.script_pubkey.len())
        .collect();

    get_virtual_size(&inputs, &output_script_lengths, None)
}

/// Script length of the output a descriptor produces, by its kind.
pub fn get_output_script_length_for_descriptor<Pk: MiniscriptKey>(
    descriptor: &Descriptor<Pk>,
) -> Result<usize, VsizeError> {
    get_output_script_length(descriptor.kind())
}
