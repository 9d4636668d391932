//! Character selection under a class mask and per-class minimums.
use alloc::vec::Vec;
use core::fmt;

use rand_core::RngCore;
use zeroize::Zeroizing;

use super::DeriveError;
use super::charset::{CLASS_COUNT, CharClass};
use crate::config::PasswordPolicy;

/// Generated password, wiped when dropped.
pub struct Password(Zeroizing<Vec<u8>>);

impl Password {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password({} bytes)", self.0.len())
    }
}

/// Draw `policy.length` characters from `rng`.
///
/// Every slot is a single uniform draw over the concatenated alphabets of the eligible classes.
/// Classes are eligible while they are enabled, except once the outstanding minimums fill every
/// remaining slot: from then on only classes that still owe characters are eligible. The rule is
/// fixed because any change alters every derived password.
pub fn generate<R: RngCore>(rng: &mut R, policy: &PasswordPolicy) -> Result<Password, DeriveError> {
    if !policy.is_satisfiable() {
        return Err(DeriveError::UnsatisfiableConstraints {
            required: policy.required(),
            length: policy.length,
        });
    }

    let length = usize::from(policy.length);
    let mut outstanding = policy.minimums.masked(policy.mask);
    let mut output = Zeroizing::new(Vec::with_capacity(length));

    for slot in 0..length {
        let remaining = length - slot;
        let owed: usize = outstanding.iter().map(|&count| usize::from(count)).sum();
        let forced = owed == remaining;

        let mut eligible = [false; CLASS_COUNT];
        let mut alphabet_size = 0usize;
        for class in policy.mask.classes() {
            if forced && outstanding[class.index()] == 0 {
                continue;
            }
            eligible[class.index()] = true;
            alphabet_size += class.alphabet().len();
        }

        let mut pick = uniform(rng, alphabet_size as u32) as usize;
        for class in CharClass::ALL {
            if !eligible[class.index()] {
                continue;
            }
            let alphabet = class.alphabet();
            if pick < alphabet.len() {
                output.push(alphabet[pick]);
                outstanding[class.index()] = outstanding[class.index()].saturating_sub(1);
                break;
            }
            pick -= alphabet.len();
        }
    }

    Ok(Password(output))
}

/// Uniform value in `0..bound` by rejection sampling whole 32-bit draws.
fn uniform<R: RngCore>(rng: &mut R, bound: u32) -> u32 {
    let zone = (u32::MAX / bound) * bound;
    loop {
        let draw = rng.next_u32();
        if draw < zone {
            return draw % bound;
        }
    }
}
