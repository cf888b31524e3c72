//! Wallet-owned outputs and descriptor-tagged outputs
//!
//! A [`DescriptorWalletOutput`] records which descriptor (by name) and which
//! derivation index produced a prevout. Resolving it against a
//! [`DescriptorMap`] yields a [`DerivedDescriptorWalletOutput`] carrying the
//! definite descriptor, after checking that the descriptor really produces
//! the recorded script.

use crate::descriptor::{derive_descriptor, DescriptorError, DescriptorMap};
use bitcoin::{Amount, OutPoint};
use miniscript::descriptor::DefiniteDescriptorKey;
use miniscript::Descriptor;
use utxo_core::Output;

/// A previously confirmed output being spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevOutput {
    /// Transaction id and output index
    pub outpoint: OutPoint,
    /// Script and value of the output
    pub witness_utxo: Output<Amount>,
}

/// A prevout whose owning descriptor is known by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorWalletOutput {
    pub prev_output: PrevOutput,
    pub descriptor_name: String,
    /// Ignored when the named descriptor has no wildcard
    pub descriptor_index: Option<u32>,
}

impl DescriptorWalletOutput {
    /// Resolve the descriptor name and index against `map`.
    ///
    /// # Errors
    /// - [`DescriptorError::UnknownDescriptor`] if the name is not in the map
    /// - [`DescriptorError::ScriptMismatch`] if the derived script differs
    ///   from `witness_utxo.script`
    pub fn derive(
        &self,
        map: &DescriptorMap,
    ) -> Result<DerivedDescriptorWalletOutput, DescriptorError> {
        let descriptor = map.require(&self.descriptor_name)?;
        let derived = derive_descriptor(descriptor, self.descriptor_index)?;

        let expected = derived.script_pubkey();
        if expected != self.prev_output.witness_utxo.script {
            return Err(DescriptorError::ScriptMismatch {
                name: self.descriptor_name.clone(),
                expected,
                actual: self.prev_output.witness_utxo.script.clone(),
            });
        }

        Ok(DerivedDescriptorWalletOutput {
            prev_output: self.prev_output.clone(),
            descriptor: derived,
        })
    }
}

/// A prevout with its definite descriptor already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedDescriptorWalletOutput {
    pub prev_output: PrevOutput,
    pub descriptor: Descriptor<DefiniteDescriptorKey>,
}

impl DerivedDescriptorWalletOutput {
    /// The spent output (script and value)
    pub fn to_output(&self) -> Output<Amount> {
        self.prev_output.witness_utxo.clone()
    }
}

/// A value that may carry the descriptor that produced it.
///
/// Outputs with a descriptor are internal (change), outputs without one
/// are external.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithOptDescriptor<T> {
    pub value: T,
    pub descriptor: Option<Descriptor<DefiniteDescriptorKey>>,
}

impl<T> WithOptDescriptor<T> {
    pub fn internal(value: T, descriptor: Descriptor<DefiniteDescriptorKey>) -> Self {
        Self {
            value,
            descriptor: Some(descriptor),
        }
    }

    pub fn external(value: T) -> Self {
        Self {
            value,
            descriptor: None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.descriptor.is_some()
    }

    pub fn is_external(&self) -> bool {
        self.descriptor.is_none()
    }
}

impl WithOptDescriptor<Output<Amount>> {
    /// An internal output paying `value` to the script of `descriptor`
    pub fn to_descriptor(descriptor: Descriptor<DefiniteDescriptorKey>, value: Amount) -> Self {
        let output = Output::new(descriptor.script_pubkey(), value);
        Self::internal(output, descriptor)
    }
}

pub fn is_internal_output<T>(output: &WithOptDescriptor<T>) -> bool {
    output.is_internal()
}

pub fn is_external_output<T>(output: &WithOptDescriptor<T>) -> bool {
    output.is_external()
}
