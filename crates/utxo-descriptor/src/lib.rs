//! UTXO Descriptor Wallet Core
//!
//! Builds, annotates and audits multi-signature PSBTs expressed through
//! output descriptors rather than hand-built scripts.
//!
//! # Flow
//!
//! ```text
//! DescriptorMap + wallet prevouts + outputs
//!        │
//!        ▼
//!   create_psbt ──► annotated, unsigned PSBT ──► sign_psbt_with_key ──► finalize_psbt
//!                          │
//!                          ▼
//!                 parse (recover descriptor per input/output,
//!                        spend amount, miner fee, vsize)
//! ```
//!
//! All rust-miniscript calls that inspect a descriptor go through
//! [`descriptor::DescriptorExt`] and [`descriptor::derive_descriptor`].

pub mod config;
pub mod create;
pub mod descriptor;
pub mod find;
pub mod parse;
pub mod sign;
pub mod vsize;
pub mod wallet_output;

#[cfg(test)]
pub(crate) mod test_utils;

pub use create::{
    assert_satisfiable, create_psbt, keys_match_network, CreatePsbtError,
    DerivedDescriptorTransactionInput, PsbtParams, SatisfiabilityError, TapLeafSelector,
};
pub use descriptor::{
    derive_descriptor, to_descriptor_map, DescriptorError, DescriptorExt, DescriptorKind,
    DescriptorMap,
};
pub use find::{
    find_descriptor, find_descriptor_for_input, find_descriptor_for_output, DescriptorMatch,
    FindDescriptorError,
};
pub use parse::{parse, ParseError, ParsedDescriptorTransaction, ParsedInput, ParsedOutput};
pub use sign::{finalize_psbt, sign_psbt_with_key, InputSignatures, SignError, SignatureScheme};
pub use vsize::{
    get_input_vsize_for_descriptor, get_output_script_length, get_virtual_size,
    get_virtual_size_estimate_for_psbt, VsizeError, VsizeInput,
};
pub use wallet_output::{
    is_external_output, is_internal_output, DerivedDescriptorWalletOutput,
    DescriptorWalletOutput, PrevOutput, WithOptDescriptor,
};
