//! Signing and finalization
//!
//! Signing goes through rust-bitcoin's PSBT signer, which finds keys via the
//! BIP32 derivations and taproot key origins that [`crate::create_psbt`]
//! attached. Finalization uses the rust-miniscript finalizer, so any
//! descriptor the builder annotated can be satisfied.

use bitcoin::bip32::Xpriv;
use bitcoin::psbt::SigningKeys;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Psbt, Transaction};
use log::debug;
use miniscript::psbt::PsbtExt;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Finalization failed: {0}")]
    Finalize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    Ecdsa,
    Schnorr,
}

/// Signatures produced for one input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSignatures {
    pub scheme: SignatureScheme,
    pub count: usize,
}

/// Sign every input `xpriv` has keys for.
///
/// `xpriv` must be the key whose fingerprint appears in the key origins
/// (usually the master key). Returns the new signatures per input index;
/// inputs that received none are omitted.
pub fn sign_psbt_with_key(
    psbt: &mut Psbt,
    xpriv: &Xpriv,
) -> Result<BTreeMap<usize, InputSignatures>, SignError> {
    let secp = Secp256k1::new();
    let signed = psbt.sign(xpriv, &secp).map_err(|(_, errors)| {
        let reasons: Vec<String> = errors
            .iter()
            .map(|(index, e)| format!("input {}: {}", index, e))
            .collect();
        SignError::Signing(reasons.join("; "))
    })?;

    let signatures: BTreeMap<usize, InputSignatures> = signed
        .into_iter()
        .filter_map(|(index, keys)| {
            let (scheme, count) = match keys {
                SigningKeys::Ecdsa(keys) => (SignatureScheme::Ecdsa, keys.len()),
                SigningKeys::Schnorr(keys) => (SignatureScheme::Schnorr, keys.len()),
            };
            (count > 0).then_some((index, InputSignatures { scheme, count }))
        })
        .collect();

    debug!("signed {} inputs", signatures.len());
    Ok(signatures)
}

/// Finalize every input and extract the network transaction.
///
/// No fee-rate ceiling is applied.
pub fn finalize_psbt(mut psbt: Psbt) -> Result<Transaction, SignError> {
    let secp = Secp256k1::verification_only();
    psbt.finalize_mut(&secp).map_err(|errors| {
        let reasons: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        SignError::Finalize(reasons.join("; "))
    })?;
    Ok(psbt.extract_tx_unchecked_fee_rate())
}
