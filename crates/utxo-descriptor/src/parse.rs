//! Transaction audit
//!
//! Recovers the descriptor behind every input and output of a PSBT and
//! summarizes what the transaction does: how much leaves the wallet, what
//! the miner gets and how large the transaction will be.
//!
//! Every input must belong to a descriptor in the map. Outputs without one
//! are external payments and count toward `spend_amount`.

use crate::create::{assert_satisfiable, SatisfiabilityError};
use crate::descriptor::DescriptorMap;
use crate::find::{
    find_descriptor_for_input, find_descriptor_for_output, get_prev_output, DescriptorMatch,
    FindDescriptorError,
};
use crate::vsize::{get_virtual_size, VsizeError, VsizeInput};
use bitcoin::{Address, Amount, Network, OutPoint, Psbt, ScriptBuf, Sequence, SignedAmount};
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No descriptor found for input {0}")]
    NoDescriptorForInput(usize),

    #[error("Input {index} script has no address: {reason}")]
    Address { index: usize, reason: String },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error(transparent)]
    Find(#[from] FindDescriptorError),

    #[error(transparent)]
    Satisfiability(#[from] SatisfiabilityError),

    #[error(transparent)]
    Vsize(#[from] VsizeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub outpoint: OutPoint,
    pub address: Address,
    pub value: Amount,
    pub script: ScriptBuf,
    pub sequence: Sequence,
    pub descriptor: DescriptorMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    /// `None` for non-standard scripts
    pub address: Option<Address>,
    pub script: ScriptBuf,
    pub value: Amount,
    /// `None` for external outputs
    pub descriptor: Option<DescriptorMatch>,
}

impl ParsedOutput {
    pub fn is_external(&self) -> bool {
        self.descriptor.is_none()
    }
}

/// Summary of a descriptor transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDescriptorTransaction {
    pub inputs: Vec<ParsedInput>,
    pub outputs: Vec<ParsedOutput>,
    /// Sum of external output values
    pub spend_amount: Amount,
    /// Input sum minus output sum. Negative values are reported, not rejected.
    pub miner_fee: SignedAmount,
    /// Estimated vsize, see [`crate::vsize`]
    pub virtual_size: usize,
}

fn to_signed(amount: Amount) -> Result<SignedAmount, ParseError> {
    i64::try_from(amount.to_sat())
        .map(SignedAmount::from_sat)
        .map_err(|_| ParseError::AmountOverflow)
}

fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Result<Amount, ParseError> {
    amounts.into_iter().try_fold(Amount::ZERO, |sum, v| {
        sum.checked_add(v).ok_or(ParseError::AmountOverflow)
    })
}

/// Audit `psbt` against `descriptors`.
///
/// # Errors
/// - An input without a previous output, or without a recoverable descriptor
/// - An input whose descriptor's locktime is not satisfiable
/// - An input script that has no address on `network`
pub fn parse(
    psbt: &Psbt,
    descriptors: &DescriptorMap,
    network: Network,
) -> Result<ParsedDescriptorTransaction, ParseError> {
    let mut inputs = Vec::with_capacity(psbt.inputs.len());
    for (index, txin) in psbt.unsigned_tx.input.iter().enumerate() {
        let prev_output = get_prev_output(psbt, index)?;
        let descriptor = find_descriptor_for_input(psbt, index, descriptors)?
            .ok_or(ParseError::NoDescriptorForInput(index))?;
        assert_satisfiable(psbt, index, &descriptor.descriptor)?;

        let address = Address::from_script(&prev_output.script_pubkey, network).map_err(|e| {
            ParseError::Address {
                index,
                reason: e.to_string(),
            }
        })?;

        inputs.push(ParsedInput {
            outpoint: txin.previous_output,
            address,
            value: prev_output.value,
            script: prev_output.script_pubkey,
            sequence: txin.sequence,
            descriptor,
        });
    }

    let mut outputs = Vec::with_capacity(psbt.outputs.len());
    for (index, txout) in psbt.unsigned_tx.output.iter().enumerate() {
        outputs.push(ParsedOutput {
            address: Address::from_script(&txout.script_pubkey, network).ok(),
            script: txout.script_pubkey.clone(),
            value: txout.value,
            descriptor: find_descriptor_for_output(psbt, index, descriptors)?,
        });
    }

    let input_sum = checked_sum(inputs.iter().map(|i| i.value))?;
    let output_sum = checked_sum(outputs.iter().map(|o| o.value))?;
    let spend_amount = checked_sum(outputs.iter().filter(|o| o.is_external()).map(|o| o.value))?;
    let miner_fee = to_signed(input_sum)?
        .checked_sub(to_signed(output_sum)?)
        .ok_or(ParseError::AmountOverflow)?;

    let vsize_inputs: Vec<VsizeInput<'_>> = inputs
        .iter()
        .map(|i| VsizeInput::Descriptor(&i.descriptor.descriptor))
        .collect();
    let output_script_lengths: Vec<usize> = outputs.iter().map(|o| o.script.len()).collect();
    let virtual_size = get_virtual_size(&vsize_inputs, &output_script_lengths, None)?;

    debug!(
        "parsed psbt: spend {} fee {} vsize {}",
        spend_amount, miner_fee, virtual_size
    );

    Ok(ParsedDescriptorTransaction {
        inputs,
        outputs,
        spend_amount,
        miner_fee,
        virtual_size,
    })
}
