//! `ClientKeyExchange` construction, RSA key-transport only.
//!
//! # References
//!
//! * [RFC 5246 Section 7.4.7.1](https://datatracker.ietf.org/doc/html/rfc5246#section-7.4.7.1)

#![cfg(feature = "alloc")]

use super::{HandshakeHeader, HandshakeType};
use crate::crypto::rust_crypto::encrypt_pkcs1v15;
use crate::error::Error;
use crate::fmt::error;
use crate::transcript::Transcript;
use rand_core::{CryptoRng, RngCore};
use rsa::RsaPublicKey;

/// `struct { opaque pre_master_secret[48]; } EncryptedPreMasterSecret`,
/// encrypted under the server's RSA key and length-prefixed per
/// `PublicValueEncoding` (RFC 5246 Section 7.4.7.1).
///
/// `buf` must have room for the handshake header plus a 2-byte length prefix
/// plus the RSA ciphertext (`server_public_key`'s modulus size). Absorbs the
/// message into `transcript` and returns the number of bytes written.
pub(crate) fn ser(
    buf: &mut [u8],
    rng: &mut (impl RngCore + CryptoRng),
    server_public_key: &RsaPublicKey,
    pre_master_secret: &[u8; 48],
    transcript: &mut Transcript,
) -> Result<usize, Error> {
    let ciphertext = encrypt_pkcs1v15(rng, server_public_key, pre_master_secret)?;
    if ciphertext.len() > u16::MAX as usize {
        error!("RSA ciphertext implausibly large: {}", ciphertext.len());
        return Err(Error::Unsupported);
    }

    let body_len = 2 + ciphertext.len();
    let header = HandshakeHeader::ser(HandshakeType::ClientKeyExchange, body_len as u32);

    let written = HandshakeHeader::LEN + body_len;
    buf[..HandshakeHeader::LEN].copy_from_slice(header.as_bytes());
    buf[HandshakeHeader::LEN..HandshakeHeader::LEN + 2]
        .copy_from_slice(&(ciphertext.len() as u16).to_be_bytes());
    buf[HandshakeHeader::LEN + 2..written].copy_from_slice(&ciphertext);

    transcript.update(&buf[..written]);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;
    use rsa::traits::PublicKeyParts;
    use rsa::RsaPrivateKey;

    #[test]
    fn ser_prefixes_ciphertext_with_its_length() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let pre_master_secret = [0x42u8; 48];

        let mut buf = [0u8; 512];
        let mut transcript = Transcript::new();
        transcript.fix(true);
        let n = ser(&mut buf, &mut OsRng, &public_key, &pre_master_secret, &mut transcript).unwrap();

        let declared_len =
            u16::from_be_bytes([buf[HandshakeHeader::LEN], buf[HandshakeHeader::LEN + 1]]) as usize;
        assert_eq!(declared_len, public_key.size());
        assert_eq!(n, HandshakeHeader::LEN + 2 + declared_len);
    }
}
