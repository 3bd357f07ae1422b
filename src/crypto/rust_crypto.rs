//! Concrete primitive backend built on the RustCrypto crates.

use super::{BlockCipherKind, DigestKind};
use crate::error::Error;
use crate::fmt::error;
use aes::{Aes128, Aes256};
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

/// A MAC value sized for the largest digest this crate negotiates.
pub struct MacValue {
    buf: [u8; super::MAX_MAC_LEN],
    len: usize,
}

impl MacValue {
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Compute `HMAC(key, fragments[0] || fragments[1] || ...)` with the digest
/// named by `kind`.
pub fn hmac(kind: DigestKind, key: &[u8], fragments: &[&[u8]]) -> MacValue {
    let mut buf = [0u8; super::MAX_MAC_LEN];
    let len = kind.output_len();
    match kind {
        DigestKind::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
            for fragment in fragments {
                mac.update(fragment);
            }
            buf[..len].copy_from_slice(&mac.finalize().into_bytes());
        }
        DigestKind::Sha256 => {
            let mut mac =
                Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
            for fragment in fragments {
                mac.update(fragment);
            }
            buf[..len].copy_from_slice(&mac.finalize().into_bytes());
        }
    }
    MacValue { buf, len }
}

/// Verify `HMAC(key, fragments...)` equals `expected`, in constant time.
pub fn hmac_verify(kind: DigestKind, key: &[u8], fragments: &[&[u8]], expected: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    let computed = hmac(kind, key, fragments);
    bool::from(computed.as_slice().ct_eq(expected))
}

/// Encrypt `buf` (already padded to a multiple of the block size) in place
/// with CBC mode under `key`/`iv`.
pub fn cbc_encrypt(
    kind: BlockCipherKind,
    key: &[u8],
    iv: &[u8; BlockCipherKind::BLOCK_LEN],
    buf: &mut [u8],
) -> Result<(), Error> {
    if buf.len() % BlockCipherKind::BLOCK_LEN != 0 {
        error!("cbc_encrypt: buffer not block-aligned");
        return Err(Error::InvalidInput);
    }
    let len = buf.len();
    match kind {
        BlockCipherKind::Aes128Cbc => {
            let enc = cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
                .map_err(|_| Error::InvalidInput)?;
            enc.encrypt_padded_mut::<NoPadding>(buf, len)
                .map_err(|_| Error::InvalidInput)?;
        }
        BlockCipherKind::Aes256Cbc => {
            let enc = cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
                .map_err(|_| Error::InvalidInput)?;
            enc.encrypt_padded_mut::<NoPadding>(buf, len)
                .map_err(|_| Error::InvalidInput)?;
        }
    }
    Ok(())
}

/// Decrypt `buf` in place with CBC mode under `key`/`iv`. The caller strips
/// padding and the explicit IV afterward; `NoPadding` is used here because
/// TLS CBC padding is verified explicitly (RFC 5246 Section 6.2.3.2) rather
/// than by a generic unpadding scheme.
pub fn cbc_decrypt(
    kind: BlockCipherKind,
    key: &[u8],
    iv: &[u8; BlockCipherKind::BLOCK_LEN],
    buf: &mut [u8],
) -> Result<(), Error> {
    if buf.len() % BlockCipherKind::BLOCK_LEN != 0 {
        error!("cbc_decrypt: buffer not block-aligned");
        return Err(Error::InvalidInput);
    }
    match kind {
        BlockCipherKind::Aes128Cbc => {
            let dec = cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
                .map_err(|_| Error::InvalidInput)?;
            dec.decrypt_padded_mut::<NoPadding>(buf)
                .map_err(|_| Error::InvalidInput)?;
        }
        BlockCipherKind::Aes256Cbc => {
            let dec = cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
                .map_err(|_| Error::InvalidInput)?;
            dec.decrypt_padded_mut::<NoPadding>(buf)
                .map_err(|_| Error::InvalidInput)?;
        }
    }
    Ok(())
}

#[cfg(feature = "alloc")]
mod rsa_backend {
    use super::Error;
    use crate::fmt::error;
    use alloc::vec::Vec;
    use rsa::pkcs8::DecodePublicKey;
    use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

    /// Parse an RSA `SubjectPublicKeyInfo` DER blob, as carried in an X.509
    /// certificate, into a usable public key.
    pub fn public_key_from_spki_der(der: &[u8]) -> Result<RsaPublicKey, Error> {
        RsaPublicKey::from_public_key_der(der).map_err(|e| {
            error!("invalid RSA SubjectPublicKeyInfo: {:?}", e);
            Error::InvalidInput
        })
    }

    /// RSAES-PKCS1-v1_5 encrypt, as used for `ClientKeyExchange`.
    pub fn encrypt_pkcs1v15(
        rng: &mut (impl rand_core::CryptoRng + rand_core::RngCore),
        key: &RsaPublicKey,
        data: &[u8],
    ) -> Result<Vec<u8>, Error> {
        key.encrypt(rng, Pkcs1v15Encrypt, data).map_err(|e| {
            error!("RSA encrypt failed: {:?}", e);
            Error::InvalidInput
        })
    }
}

#[cfg(feature = "alloc")]
pub use rsa_backend::{encrypt_pkcs1v15, public_key_from_spki_der};
