//! HMAC_DRBG over SHA-256 (NIST SP 800-90A) fed by a single-use entropy source.
//!
//! The derivation seeds the generator from secret material exactly once. Any later request for
//! fresh entropy is answered with "nothing left" and the generator carries on from its current
//! state, which keeps the output a pure function of the seed.
use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

type HmacSha256 = Hmac<Sha256>;

/// Output block and state size of the generator.
pub const SEED_SIZE: usize = 32;

/// Generate calls allowed before the generator asks its source for more entropy.
pub const RESEED_INTERVAL: u64 = 10_000;

/// Largest single request the generator serves in one generate call.
const MAX_REQUEST_BYTES: usize = 1024;

/// Supplier of seed material.
pub trait EntropySource {
    /// Next seed, or `None` once the source is exhausted.
    fn next_seed(&mut self) -> Option<Zeroizing<[u8; SEED_SIZE]>>;
}

/// Entropy source that hands out one fixed seed and then reports exhaustion.
pub struct OneShotEntropy {
    seed: Option<Zeroizing<[u8; SEED_SIZE]>>,
}

impl OneShotEntropy {
    pub fn new(seed: Zeroizing<[u8; SEED_SIZE]>) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn is_spent(&self) -> bool {
        self.seed.is_none()
    }
}

impl EntropySource for OneShotEntropy {
    fn next_seed(&mut self) -> Option<Zeroizing<[u8; SEED_SIZE]>> {
        self.seed.take()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrbgError {
    /// The source had nothing to instantiate from.
    NoEntropy,
}

impl core::fmt::Display for DrbgError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DrbgError::NoEntropy => write!(f, "entropy source returned no seed"),
        }
    }
}

impl core::error::Error for DrbgError {}

pub struct HmacDrbg<E> {
    key: [u8; SEED_SIZE],
    value: [u8; SEED_SIZE],
    reseed_counter: u64,
    entropy: E,
}

impl<E: EntropySource> HmacDrbg<E> {
    /// Instantiate with no nonce and no personalization string.
    pub fn instantiate(entropy: E) -> Result<Self, DrbgError> {
        Self::instantiate_with(entropy, &[], &[])
    }

    /// Instantiate from `entropy || nonce || personalization`.
    pub fn instantiate_with(
        mut entropy: E,
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, DrbgError> {
        let seed = entropy.next_seed().ok_or(DrbgError::NoEntropy)?;
        let mut drbg = Self {
            key: [0x00; SEED_SIZE],
            value: [0x01; SEED_SIZE],
            reseed_counter: 1,
            entropy,
        };
        drbg.update(&[&seed[..], nonce, personalization]);
        Ok(drbg)
    }

    /// Ask the source for fresh entropy. A refusal leaves the state untouched.
    pub fn reseed(&mut self) -> bool {
        match self.entropy.next_seed() {
            Some(seed) => {
                self.update(&[&seed[..]]);
                self.reseed_counter = 1;
                true
            }
            None => {
                log::debug!("entropy source exhausted, continuing from current state");
                false
            }
        }
    }

    /// Fill `output`, reseeding first when the interval has elapsed.
    pub fn generate(&mut self, output: &mut [u8]) {
        for request in output.chunks_mut(MAX_REQUEST_BYTES) {
            if self.reseed_counter > RESEED_INTERVAL {
                self.reseed();
                self.reseed_counter = 1;
            }

            for block in request.chunks_mut(SEED_SIZE) {
                self.value = self.mac(&[&self.value[..]], &[]);
                block.copy_from_slice(&self.value[..block.len()]);
            }
            self.update(&[]);
            self.reseed_counter += 1;
        }
    }

    fn update(&mut self, provided: &[&[u8]]) {
        self.key = self.mac(&[&self.value[..], &[0x00]], provided);
        self.value = self.mac(&[&self.value[..]], &[]);
        if provided.iter().all(|part| part.is_empty()) {
            return;
        }
        self.key = self.mac(&[&self.value[..], &[0x01]], provided);
        self.value = self.mac(&[&self.value[..]], &[]);
    }

    fn mac(&self, prefix: &[&[u8]], provided: &[&[u8]]) -> [u8; SEED_SIZE] {
        // A 32-byte key zero-padded to the block size is the HMAC key itself.
        let mut block = Key::<HmacSha256>::default();
        block[..SEED_SIZE].copy_from_slice(&self.key);
        let mut mac = <HmacSha256 as KeyInit>::new(&block);
        block.as_mut_slice().zeroize();
        for part in prefix.iter().chain(provided) {
            mac.update(part);
        }
        let mut output = [0u8; SEED_SIZE];
        output.copy_from_slice(&mac.finalize().into_bytes());
        output
    }
}

impl<E> Drop for HmacDrbg<E> {
    fn drop(&mut self) {
        self.key.zeroize();
        self.value.zeroize();
        self.reseed_counter.zeroize();
    }
}

impl<E: EntropySource> RngCore for HmacDrbg<E> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.generate(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.generate(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.generate(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.generate(dest);
        Ok(())
    }
}

impl<E: EntropySource> CryptoRng for HmacDrbg<E> {}
