//! Verification of a stored PayGo proof against the output it sits on

use crate::attestation::{check_entropy, create_paygo_attestation_buffer, signed_message_hash};
use crate::psbt::get_paygo_address_proofs;
use crate::PayGoError;
use bitcoin::sign_message::MessageSignature;
use bitcoin::{Address, Network, Psbt};
use log::debug;
use secp256k1::{PublicKey, Secp256k1};

/// Verify the single proof on output `output_index` against `pubkey`.
///
/// The message is rebuilt from the stored entropy and the address the
/// output actually pays, so a proof moved to another output fails.
///
/// # Errors
/// - [`PayGoError::NoPayGoProof`] / [`PayGoError::MultiplePayGoProof`]
/// - [`PayGoError::InvalidEntropyLength`] if the stored entropy is not 65 bytes
/// - [`PayGoError::InvalidAddress`] if the output script has no address
/// - [`PayGoError::PayGoAddressProofFailedVerification`] on signature mismatch
pub fn verify_paygo_address_proof(
    psbt: &Psbt,
    output_index: usize,
    pubkey: &PublicKey,
    network: Network,
) -> Result<(), PayGoError> {
    let mut proofs = get_paygo_address_proofs(psbt, output_index)?;
    let proof = match proofs.len() {
        0 => return Err(PayGoError::NoPayGoProof),
        1 => proofs.remove(0),
        _ => return Err(PayGoError::MultiplePayGoProof),
    };
    check_entropy(&proof.entropy)?;

    let script = &psbt
        .unsigned_tx
        .output
        .get(output_index)
        .ok_or(PayGoError::OutputIndexOutOfBounds(output_index))?
        .script_pubkey;
    let address = Address::from_script(script, network)
        .map_err(|e| PayGoError::InvalidAddress(e.to_string()))?;
    let message = create_paygo_attestation_buffer(&address.to_string(), &proof.entropy, network)?;

    let signature = MessageSignature::from_slice(&proof.signature)
        .map_err(|e| PayGoError::InvalidSignature(e.to_string()))?;
    let secp = Secp256k1::verification_only();
    let recovered = signature
        .recover_pubkey(&secp, signed_message_hash(&message))
        .map_err(|_| PayGoError::PayGoAddressProofFailedVerification)?;

    if recovered.inner != *pubkey {
        debug!("paygo proof on output {} signed by another key", output_index);
        return Err(PayGoError::PayGoAddressProofFailedVerification);
    }
    Ok(())
}
