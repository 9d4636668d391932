//! Secure element simulated in software.
//!
//! Used by the host loopback and the tests. The chain is a hardened HMAC-SHA512 derivation in the
//! style of SLIP-10 that keeps the child key as raw bytes. It is not BIP32 compatible on
//! secp256k1, so passwords derived here differ from those of a real device with the same seed.
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, Zeroizing};

use super::{Curve, DIGEST_SIZE, ElementError, NODE_SIZE, SecureElement};

type HmacSha512 = Hmac<Sha512>;

const MASTER_KEY_SALT: &[u8] = b"Bitcoin seed";

pub struct SoftwareElement {
    seed: Zeroizing<[u8; 32]>,
}

impl SoftwareElement {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed: Zeroizing::new(seed),
        }
    }

    fn master(&self) -> Result<Zeroizing<[u8; NODE_SIZE]>, ElementError> {
        hmac_sha512(MASTER_KEY_SALT, &[&self.seed[..]])
    }
}

impl SecureElement for SoftwareElement {
    fn derive_node(
        &mut self,
        curve: Curve,
        path: &[u32],
    ) -> Result<Zeroizing<[u8; NODE_SIZE]>, ElementError> {
        match curve {
            Curve::Secp256k1 => {}
        }

        let mut node = self.master()?;
        for &index in path {
            let (key, chain) = node.split_at(32);
            let child = hmac_sha512(chain, &[&[0x00], key, &index.to_be_bytes()])?;
            node = child;
        }
        Ok(node)
    }

    fn sha256(&mut self, data: &[u8]) -> [u8; DIGEST_SIZE] {
        let mut output = [0u8; DIGEST_SIZE];
        output.copy_from_slice(&Sha256::digest(data));
        output
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<[u8; NODE_SIZE]>, ElementError> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key)
        .map_err(|_| ElementError::DerivationFailed)?;
    for part in parts {
        mac.update(part);
    }
    let mut digest = mac.finalize().into_bytes();
    let mut output = Zeroizing::new([0u8; NODE_SIZE]);
    output.copy_from_slice(&digest);
    digest.as_mut_slice().zeroize();
    Ok(output)
}
