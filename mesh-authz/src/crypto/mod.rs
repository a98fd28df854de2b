//! cryptographic operations
//!
//! Tokens are sealed with AES in CFB mode (full block feedback). The key is the
//! configured salt, whose length selects AES-128, AES-192 or AES-256. Every
//! encryption draws a fresh IV that is prepended to the ciphertext.
//!
//! The implementation is based on the RustCrypto [aes](https://docs.rs/aes) and
//! [cfb-mode](https://docs.rs/cfb-mode) crates.
use super::error;
use aes::{Aes128, Aes192, Aes256};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand_core::{CryptoRng, RngCore};
use std::convert::TryFrom;
use zeroize::Zeroize;

/// AES block size, also the IV length
pub const BLOCK_SIZE: usize = 16;

const MAX_SALT_LEN: usize = 32;

/// salt used when the configuration does not set one
pub const DEFAULT_SALT: &str = "mesh-authz@2021!";

/// symmetric key used to seal and open tokens
///
/// only 16, 24 and 32 byte salts can be built, so the cipher selection
/// never fails once a `Salt` exists
#[derive(Clone)]
pub struct Salt {
    bytes: [u8; MAX_SALT_LEN],
    len: usize,
}

impl Salt {
    /// validates the length and copies the key material
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, error::Config> {
        match bytes.len() {
            16 | 24 | 32 => {
                let mut salt = Salt {
                    bytes: [0u8; MAX_SALT_LEN],
                    len: bytes.len(),
                };
                salt.bytes[..bytes.len()].copy_from_slice(bytes);
                Ok(salt)
            }
            len => Err(error::Config::InvalidSaltLength(len)),
        }
    }

    /// key length in bytes, always 16, 24 or 32
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    fn key(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Default for Salt {
    fn default() -> Self {
        let mut bytes = [0u8; MAX_SALT_LEN];
        bytes[..DEFAULT_SALT.len()].copy_from_slice(DEFAULT_SALT.as_bytes());
        Salt {
            bytes,
            len: DEFAULT_SALT.len(),
        }
    }
}

impl TryFrom<String> for Salt {
    type Error = error::Config;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Salt::from_bytes(s.as_bytes())
    }
}

impl TryFrom<&str> for Salt {
    type Error = error::Config;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Salt::from_bytes(s.as_bytes())
    }
}

impl PartialEq for Salt {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Salt({} bytes)", self.len)
    }
}

impl Drop for Salt {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// encrypts `plaintext` and returns `IV || ciphertext`
pub fn encrypt<T: RngCore + CryptoRng>(
    salt: &Salt,
    plaintext: &[u8],
    rng: &mut T,
) -> Result<Vec<u8>, error::Auth> {
    let mut iv = [0u8; BLOCK_SIZE];
    rng.fill_bytes(&mut iv);

    let mut out = Vec::with_capacity(BLOCK_SIZE + plaintext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(plaintext);

    let key = salt.key();
    let buf = &mut out[BLOCK_SIZE..];
    let res = match key.len() {
        16 => cfb_mode::Encryptor::<Aes128>::new_from_slices(key, &iv).map(|c| c.encrypt(buf)),
        24 => cfb_mode::Encryptor::<Aes192>::new_from_slices(key, &iv).map(|c| c.encrypt(buf)),
        _ => cfb_mode::Encryptor::<Aes256>::new_from_slices(key, &iv).map(|c| c.encrypt(buf)),
    };
    res.map_err(|_| error::Config::InvalidSaltLength(key.len()))?;

    Ok(out)
}

/// reverses [encrypt]: splits off the IV and decrypts the remainder
pub fn decrypt(salt: &Salt, data: &[u8]) -> Result<Vec<u8>, error::Auth> {
    if data.len() < BLOCK_SIZE {
        return Err(error::Format::TooShort(data.len()).into());
    }

    let (iv, ciphertext) = data.split_at(BLOCK_SIZE);
    let mut buf = ciphertext.to_vec();

    let key = salt.key();
    let res = match key.len() {
        16 => cfb_mode::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map(|c| c.decrypt(&mut buf)),
        24 => cfb_mode::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map(|c| c.decrypt(&mut buf)),
        _ => cfb_mode::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map(|c| c.decrypt(&mut buf)),
    };
    res.map_err(|_| error::Config::InvalidSaltLength(key.len()))?;

    Ok(buf)
}
