//! Attestation message and the authority's signature over it

use crate::PayGoError;
use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::{sha256d, Hash, HashEngine};
use bitcoin::sign_message::{MessageSignature, BITCOIN_SIGNED_MSG_PREFIX};
use bitcoin::{Address, Network, VarInt};
use secp256k1::{Message, Secp256k1, SecretKey, Signing};
use std::str::FromStr;

/// NIL UUID appended to every attestation message
pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Entropy prefix length of an attestation message
pub const ENTROPY_LENGTH: usize = 65;

pub(crate) fn check_entropy(entropy: &[u8]) -> Result<(), PayGoError> {
    if entropy.len() != ENTROPY_LENGTH {
        return Err(PayGoError::InvalidEntropyLength(entropy.len()));
    }
    Ok(())
}

/// Build `entropy ‖ address ‖ NIL_UUID`.
///
/// `entropy` must be [`ENTROPY_LENGTH`] bytes and `address` a valid address
/// on `network`.
pub fn create_paygo_attestation_buffer(
    address: &str,
    entropy: &[u8],
    network: Network,
) -> Result<Vec<u8>, PayGoError> {
    check_entropy(entropy)?;
    Address::from_str(address)
        .map_err(|e| PayGoError::InvalidAddress(e.to_string()))?
        .require_network(network)
        .map_err(|e| PayGoError::InvalidAddress(e.to_string()))?;

    let mut message = Vec::with_capacity(entropy.len() + address.len() + NIL_UUID.len());
    message.extend_from_slice(entropy);
    message.extend_from_slice(address.as_bytes());
    message.extend_from_slice(NIL_UUID.as_bytes());
    Ok(message)
}

/// Bitcoin signed-message hash of arbitrary bytes:
/// `sha256d(prefix ‖ varint(len) ‖ message)`
pub fn signed_message_hash(message: &[u8]) -> sha256d::Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(BITCOIN_SIGNED_MSG_PREFIX);
    engine.input(&serialize(&VarInt(message.len() as u64)));
    engine.input(message);
    sha256d::Hash::from_engine(engine)
}

/// Sign an attestation message. Returns the 65-byte compact recoverable
/// signature (compressed key header).
pub fn sign_paygo_attestation<C: Signing>(
    secp: &Secp256k1<C>,
    secret_key: &SecretKey,
    message: &[u8],
) -> [u8; 65] {
    let digest = Message::from_digest(signed_message_hash(message).to_byte_array());
    let signature = secp.sign_ecdsa_recoverable(&digest, secret_key);
    MessageSignature::new(signature, true).serialize()
}
