//! `CertificateVerify` construction.
//!
//! The private-key operation itself is delegated to
//! [`crate::transport::ClientIdentity::sign`]; this module only frames the
//! signature the way RFC 5246 expects: TLS 1.2 prefixes it with a
//! `{hash, signature}` algorithm pair, earlier versions sign the raw
//! MD5+SHA1 transcript digest with no such prefix.
//!
//! # References
//!
//! * [RFC 5246 Section 7.4.8](https://datatracker.ietf.org/doc/html/rfc5246#section-7.4.8)

use super::{HandshakeHeader, HandshakeType};
use crate::error::Error;
use crate::transcript::Transcript;
use crate::transport::ClientIdentity;
use crate::version::TlsVersion;

/// `{sha256, rsa}`, the only `SignatureAndHashAlgorithm` this crate offers.
const SHA256_RSA: [u8; 2] = [0x04, 0x01];

/// Largest signature this crate will accept writing inline (a 4096-bit RSA
/// key).
const MAX_SIGNATURE_LEN: usize = 512;

/// Serialize a `CertificateVerify` message, signing the transcript as it
/// stood immediately before this message (RFC 5246 Section 7.4.8:
/// `CertificateVerify.signature` covers every handshake message sent or
/// received so far, not including itself).
pub(crate) fn ser(
    buf: &mut [u8],
    version: TlsVersion,
    identity: &impl ClientIdentity,
    transcript: &mut Transcript,
) -> Result<usize, Error> {
    let transcript_hash = transcript.snapshot();

    let mut signature = [0u8; MAX_SIGNATURE_LEN];
    let signature_len = identity.sign(transcript_hash.as_slice(), &mut signature)?;

    let algorithm_prefix_len = if version >= TlsVersion::V1_2 { 2 } else { 0 };
    let body_len = algorithm_prefix_len + 2 + signature_len;
    let header = HandshakeHeader::ser(HandshakeType::CertificateVerify, body_len as u32);

    let mut offset = 0;
    buf[..HandshakeHeader::LEN].copy_from_slice(header.as_bytes());
    offset += HandshakeHeader::LEN;

    if version >= TlsVersion::V1_2 {
        buf[offset..offset + 2].copy_from_slice(&SHA256_RSA);
        offset += 2;
    }

    buf[offset..offset + 2].copy_from_slice(&(signature_len as u16).to_be_bytes());
    offset += 2;
    buf[offset..offset + signature_len].copy_from_slice(&signature[..signature_len]);
    offset += signature_len;

    transcript.update(&buf[..offset]);
    Ok(offset)
}
