//! PSBT proprietary storage of PayGo proofs

use crate::attestation::check_entropy;
use crate::PayGoError;
use bitcoin::psbt::raw::ProprietaryKey;
use bitcoin::Psbt;
use log::debug;

/// Proprietary key identifier
pub const PAYGO_PROPRIETARY_PREFIX: &[u8] = b"BITGO";

/// Proprietary subtype for address attestation proofs
pub const PAYGO_ADDRESS_ATTESTATION_PROOF: u8 = 0x04;

/// A stored proof: the entropy (key data) and signature (value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayGoProof {
    pub entropy: Vec<u8>,
    pub signature: Vec<u8>,
}

fn is_paygo_key(key: &ProprietaryKey) -> bool {
    key.prefix == PAYGO_PROPRIETARY_PREFIX && key.subtype == PAYGO_ADDRESS_ATTESTATION_PROOF
}

/// Attach a proof to output `output_index`.
///
/// `entropy` must be 65 bytes. Adding the same entropy twice replaces the
/// earlier signature.
pub fn add_paygo_address_proof(
    psbt: &mut Psbt,
    output_index: usize,
    signature: &[u8],
    entropy: &[u8],
) -> Result<(), PayGoError> {
    let output = psbt
        .outputs
        .get_mut(output_index)
        .ok_or(PayGoError::OutputIndexOutOfBounds(output_index))?;
    check_entropy(entropy)?;

    let key = ProprietaryKey {
        prefix: PAYGO_PROPRIETARY_PREFIX.to_vec(),
        subtype: PAYGO_ADDRESS_ATTESTATION_PROOF,
        key: entropy.to_vec(),
    };
    output.proprietary.insert(key, signature.to_vec());
    debug!("added paygo proof to output {}", output_index);
    Ok(())
}

/// All proofs stored on output `output_index`
pub fn get_paygo_address_proofs(
    psbt: &Psbt,
    output_index: usize,
) -> Result<Vec<PayGoProof>, PayGoError> {
    let output = psbt
        .outputs
        .get(output_index)
        .ok_or(PayGoError::OutputIndexOutOfBounds(output_index))?;

    Ok(output
        .proprietary
        .iter()
        .filter(|(key, _)| is_paygo_key(key))
        .map(|(key, value)| PayGoProof {
            entropy: key.key.clone(),
            signature: value.clone(),
        })
        .collect())
}

pub fn output_includes_paygo_proof(psbt: &Psbt, output_index: usize) -> Result<bool, PayGoError> {
    Ok(!get_paygo_address_proofs(psbt, output_index)?.is_empty())
}

/// Index of the first output that carries a proof.
///
/// Any output carrying more than one proof is an error, even if an earlier
/// output already matched.
pub fn get_paygo_address_proof_output_index(psbt: &Psbt) -> Result<Option<usize>, PayGoError> {
    let mut found = None;
    for index in 0..psbt.outputs.len() {
        match get_paygo_address_proofs(psbt, index)?.len() {
            0 => {}
            1 => {
                found.get_or_insert(index);
            }
            _ => return Err(PayGoError::MultiplePayGoProofAtPsbtIndex(index)),
        }
    }
    Ok(found)
}
