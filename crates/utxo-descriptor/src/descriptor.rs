//! Descriptor registry and engine seam
//!
//! A [`DescriptorMap`] names the script templates a wallet understands,
//! e.g. `{ "external": D1, "internal": D2 }`. It is immutable once built.
//!
//! Everything this crate needs from the Miniscript engine beyond
//! `script_pubkey`/`has_wildcard`/`max_weight_to_satisfy` lives here:
//! derivation ([`derive_descriptor`]), the top-level script shape
//! ([`DescriptorKind`]) and timelock inspection ([`DescriptorExt`]).

use bitcoin::ScriptBuf;
use miniscript::descriptor::{DefiniteDescriptorKey, DescriptorPublicKey};
use miniscript::policy::Liftable;
use miniscript::{Descriptor, MiniscriptKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Unknown descriptor: {0}")]
    UnknownDescriptor(String),

    #[error("Duplicate descriptor name: {0}")]
    DuplicateDescriptorName(String),

    #[error("Descriptor has a wildcard but no derivation index was given: {0}")]
    MissingDerivationIndex(String),

    #[error("Derivation failed: {0}")]
    Derivation(String),

    #[error("Script mismatch for descriptor {name}: descriptor gives {expected:x}, output has {actual:x}")]
    ScriptMismatch {
        name: String,
        expected: ScriptBuf,
        actual: ScriptBuf,
    },

    #[error("Unknown descriptor type: {0}")]
    UnknownDescriptorType(String),

    #[error("Cannot lift descriptor to a policy: {0}")]
    Policy(String),

    #[error("Miniscript error: {0}")]
    Miniscript(#[from] miniscript::Error),
}

/// Top-level script shape of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    /// Bare script, no wrapper
    Bare,
    /// Pay-to-pubkey-hash
    Pkh,
    /// Pay-to-witness-pubkey-hash
    Wpkh,
    /// Pay-to-script-hash, including wrapped segwit
    Sh,
    /// Pay-to-witness-script-hash
    Wsh,
    /// Pay-to-taproot
    Tr,
}

impl DescriptorKind {
    /// True for native and wrapped segwit shapes
    pub fn is_segwit(self) -> bool {
        matches!(
            self,
            DescriptorKind::Wpkh | DescriptorKind::Wsh | DescriptorKind::Tr
        )
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DescriptorKind::Bare => "bare",
            DescriptorKind::Pkh => "pkh",
            DescriptorKind::Wpkh => "wpkh",
            DescriptorKind::Sh => "sh",
            DescriptorKind::Wsh => "wsh",
            DescriptorKind::Tr => "tr",
        };
        f.write_str(s)
    }
}

impl FromStr for DescriptorKind {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bare" => Ok(DescriptorKind::Bare),
            "pkh" | "p2pkh" => Ok(DescriptorKind::Pkh),
            "wpkh" | "p2wpkh" => Ok(DescriptorKind::Wpkh),
            "sh" | "p2sh" | "p2shP2wpkh" | "p2shP2wsh" => Ok(DescriptorKind::Sh),
            "wsh" | "p2wsh" => Ok(DescriptorKind::Wsh),
            "tr" | "p2tr" => Ok(DescriptorKind::Tr),
            other => Err(DescriptorError::UnknownDescriptorType(other.to_string())),
        }
    }
}

/// Engine operations beyond what `miniscript::Descriptor` exposes directly.
pub trait DescriptorExt {
    /// The top-level script shape
    fn kind(&self) -> DescriptorKind;

    /// The absolute locktime (`after(n)`) the script requires, if any.
    ///
    /// If the script contains several, the smallest one is returned.
    fn absolute_locktime(&self) -> Result<Option<u32>, DescriptorError>;
}

impl<Pk: MiniscriptKey> DescriptorExt for Descriptor<Pk> {
    fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Bare(_) => DescriptorKind::Bare,
            Descriptor::Pkh(_) => DescriptorKind::Pkh,
            Descriptor::Wpkh(_) => DescriptorKind::Wpkh,
            Descriptor::Sh(_) => DescriptorKind::Sh,
            Descriptor::Wsh(_) => DescriptorKind::Wsh,
            Descriptor::Tr(_) => DescriptorKind::Tr,
        }
    }

    fn absolute_locktime(&self) -> Result<Option<u32>, DescriptorError> {
        let policy = self
            .lift()
            .map_err(|e| DescriptorError::Policy(e.to_string()))?;
        Ok(policy.absolute_timelocks().into_iter().min())
    }
}

/// Apply a derivation index to a descriptor.
///
/// The index is required when the descriptor has a wildcard and ignored
/// otherwise.
pub fn derive_descriptor(
    descriptor: &Descriptor<DescriptorPublicKey>,
    index: Option<u32>,
) -> Result<Descriptor<DefiniteDescriptorKey>, DescriptorError> {
    let index = if descriptor.has_wildcard() {
        index.ok_or_else(|| DescriptorError::MissingDerivationIndex(descriptor.to_string()))?
    } else {
        0
    };
    descriptor
        .at_derivation_index(index)
        .map_err(|e| DescriptorError::Derivation(e.to_string()))
}

/// Named descriptors, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorMap(BTreeMap<String, Descriptor<DescriptorPublicKey>>);

impl DescriptorMap {
    /// Build from already-parsed descriptors. Names must be unique.
    pub fn from_descriptors<I, K>(descriptors: I) -> Result<Self, DescriptorError>
    where
        I: IntoIterator<Item = (K, Descriptor<DescriptorPublicKey>)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, descriptor) in descriptors {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(DescriptorError::DuplicateDescriptorName(name));
            }
            map.insert(name, descriptor);
        }
        Ok(Self(map))
    }

    /// Look up a descriptor by name
    pub fn get(&self, name: &str) -> Option<&Descriptor<DescriptorPublicKey>> {
        self.0.get(name)
    }

    /// Look up a descriptor by name, failing with `UnknownDescriptor`
    pub fn require(&self, name: &str) -> Result<&Descriptor<DescriptorPublicKey>, DescriptorError> {
        self.get(name)
            .ok_or_else(|| DescriptorError::UnknownDescriptor(name.to_string()))
    }

    /// Iterate `(name, descriptor)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Descriptor<DescriptorPublicKey>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Descriptor names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse `(name, descriptor string)` pairs into a [`DescriptorMap`].
///
/// Checksums are optional. Duplicate names are rejected.
pub fn to_descriptor_map<I, K, V>(pairs: I) -> Result<DescriptorMap, DescriptorError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let parsed = pairs
        .into_iter()
        .map(|(name, value)| {
            let descriptor = Descriptor::<DescriptorPublicKey>::from_str(value.as_ref())?;
            Ok((name.into(), descriptor))
        })
        .collect::<Result<Vec<(String, _)>, DescriptorError>>()?;
    DescriptorMap::from_descriptors(parsed)
}
