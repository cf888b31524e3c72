//! PayGo Address Attestation
//!
//! An out-of-band authority approves a destination address for a payment by
//! signing an attestation message. The signature travels with the PSBT as a
//! proprietary key-value on the output that pays the address, so a
//! co-signer can check the destination without a side channel.
//!
//! # Storage
//!
//! - Identifier: `"BITGO"`
//! - Subtype: [`PAYGO_ADDRESS_ATTESTATION_PROOF`] (`0x04`)
//! - Keydata: 65 bytes of entropy
//! - Value: 65-byte signed-message signature over `[ENTROPY][ADDRESS][NIL_UUID]`
//!
//! # Example
//!
//! ```
//! use bitcoin::Network;
//! use secp256k1::{Secp256k1, SecretKey};
//! use utxo_paygo::{create_paygo_attestation_buffer, sign_paygo_attestation};
//!
//! let secp = Secp256k1::new();
//! let authority = SecretKey::from_slice(&[7u8; 32]).unwrap();
//! let entropy = [1u8; 65];
//!
//! let message = create_paygo_attestation_buffer(
//!     "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
//!     &entropy,
//!     Network::Bitcoin,
//! )
//! .unwrap();
//! let signature = sign_paygo_attestation(&secp, &authority, &message);
//! assert_eq!(signature.len(), 65);
//! ```

pub mod attestation;
pub mod psbt;
pub mod verify;

pub use attestation::{
    create_paygo_attestation_buffer, sign_paygo_attestation, signed_message_hash, ENTROPY_LENGTH,
    NIL_UUID,
};
pub use psbt::{
    add_paygo_address_proof, get_paygo_address_proof_output_index, get_paygo_address_proofs,
    output_includes_paygo_proof, PayGoProof, PAYGO_ADDRESS_ATTESTATION_PROOF,
    PAYGO_PROPRIETARY_PREFIX,
};
pub use verify::verify_paygo_address_proof;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayGoError {
    #[error("No PayGo proof found on output")]
    NoPayGoProof,

    #[error("Multiple PayGo proofs found on output")]
    MultiplePayGoProof,

    #[error("Multiple PayGo proofs found at PSBT output index {0}")]
    MultiplePayGoProofAtPsbtIndex(usize),

    #[error("PayGo address proof failed verification")]
    PayGoAddressProofFailedVerification,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid entropy length: expected 65 bytes, got {0}")]
    InvalidEntropyLength(usize),

    #[error("Output index out of bounds: {0}")]
    OutputIndexOutOfBounds(usize),
}
