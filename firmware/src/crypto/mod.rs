//! Label-to-password derivation.
//!
//! A label is hashed into a hardened derivation path under a fixed namespace, the secure element
//! turns that path into a 64-byte node, and the hash of the node seeds a one-shot HMAC_DRBG that
//! picks the password characters. The master secret never leaves the element.
pub mod charset;
pub mod drbg;
pub mod generator;
pub mod software;


use core::fmt;

use zeroize::Zeroizing;

use crate::config::PasswordPolicy;
use drbg::{DrbgError, HmacDrbg, OneShotEntropy};
pub use generator::Password;

/// First path component, reserved for this application.
pub const PASSWORD_PATH_PREFIX: u32 = 0x8050_5744;

/// Bit forcing hardened derivation of a path index.
pub const HARDENED: u32 = 0x8000_0000;

/// Prefix plus one word per four digest bytes.
pub const PATH_LENGTH: usize = 9;

/// Private key material followed by the chain code.
pub const NODE_SIZE: usize = 64;

pub const DIGEST_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Secp256k1,
}

/// Failure reported by the secure element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementError {
    /// The element refused or failed the derivation.
    DerivationFailed,
    /// The element could not be reached.
    Unavailable,
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementError::DerivationFailed => write!(f, "secure element derivation failed"),
            ElementError::Unavailable => write!(f, "secure element unavailable"),
        }
    }
}

impl core::error::Error for ElementError {}

/// Operations the derivation needs from the secure element.
pub trait SecureElement {
    /// Derive the node at `path` from the device master secret.
    fn derive_node(
        &mut self,
        curve: Curve,
        path: &[u32],
    ) -> Result<Zeroizing<[u8; NODE_SIZE]>, ElementError>;

    /// One-way digest.
    fn sha256(&mut self, data: &[u8]) -> [u8; DIGEST_SIZE];
}

impl<T: SecureElement + ?Sized> SecureElement for &mut T {
    fn derive_node(
        &mut self,
        curve: Curve,
        path: &[u32],
    ) -> Result<Zeroizing<[u8; NODE_SIZE]>, ElementError> {
        (**self).derive_node(curve, path)
    }

    fn sha256(&mut self, data: &[u8]) -> [u8; DIGEST_SIZE] {
        (**self).sha256(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveError {
    Element(ElementError),
    /// The enabled minimums need more characters than the password has.
    UnsatisfiableConstraints { required: usize, length: u8 },
}

impl fmt::Display for DeriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeriveError::Element(err) => write!(f, "{err}"),
            DeriveError::UnsatisfiableConstraints { required, length } => write!(
                f,
                "policy requires {required} characters but the password has {length}"
            ),
        }
    }
}

impl core::error::Error for DeriveError {}

impl From<ElementError> for DeriveError {
    fn from(value: ElementError) -> Self {
        DeriveError::Element(value)
    }
}

impl From<DrbgError> for DeriveError {
    fn from(_: DrbgError) -> Self {
        DeriveError::Element(ElementError::DerivationFailed)
    }
}

/// Derivation path for a label digest.
pub fn derivation_path(digest: &[u8; DIGEST_SIZE]) -> [u32; PATH_LENGTH] {
    let mut path = [PASSWORD_PATH_PREFIX; PATH_LENGTH];
    for (slot, word) in path[1..].iter_mut().zip(digest.chunks_exact(4)) {
        *slot = u32::from_be_bytes([word[0], word[1], word[2], word[3]]) | HARDENED;
    }
    path
}

/// Derive the password for `label`.
///
/// The result depends only on the element's master secret, the label and the policy.
pub fn derive_password<E: SecureElement>(
    element: &mut E,
    label: &[u8],
    policy: &PasswordPolicy,
) -> Result<Password, DeriveError> {
    if !policy.is_satisfiable() {
        return Err(DeriveError::UnsatisfiableConstraints {
            required: policy.required(),
            length: policy.length,
        });
    }

    let digest = Zeroizing::new(element.sha256(label));
    let path = Zeroizing::new(derivation_path(&digest));
    let node = element.derive_node(Curve::Secp256k1, &path[..])?;
    let seed = Zeroizing::new(element.sha256(&node[..]));
    drop(node);

    let mut rng = HmacDrbg::instantiate(OneShotEntropy::new(seed))?;
    generator::generate(&mut rng, policy)
}
