//! `Certificate` parsing and construction.
//!
//! X.509 parsing and trust-anchor validation are delegated entirely to
//! [`crate::transport::CertificateVerifier`]; this module only understands
//! the wire framing of the certificate list.
//!
//! # References
//!
//! * [RFC 5246 Section 7.4.2](https://datatracker.ietf.org/doc/html/rfc5246#section-7.4.2)

use super::{HandshakeHeader, HandshakeType};
use crate::error::Error;
use crate::fmt::error;
use crate::io::Cursor;
use crate::transcript::Transcript;

/// A parsed, not-yet-validated certificate chain: a view over the
/// `Handshake.body` bytes, leaf certificate first.
pub(crate) struct CertificateChain<'a> {
    entries: &'a [u8],
}

/// Iterates the DER-encoded certificates in a [`CertificateChain`], leaf
/// first.
pub(crate) struct CertificateChainIter<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for CertificateChainIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.remaining.is_empty() {
            return None;
        }
        let mut cursor = Cursor::new(self.remaining);
        let len = cursor.next_u24().ok()? as usize;
        let cert = cursor.next_slice(len).ok()?;
        self.remaining = &self.remaining[cursor.position()..];
        Some(cert)
    }
}

impl<'a> CertificateChain<'a> {
    /// Parse a `Certificate` body: a `uint24`-length-prefixed list of
    /// `uint24`-length-prefixed DER certificates.
    pub(crate) fn deser(body: &'a [u8]) -> Result<Self, Error> {
        let mut cursor = Cursor::new(body);
        let list_len = cursor.next_u24()? as usize;
        let entries = cursor.next_slice(list_len)?;
        if !cursor.is_empty() {
            error!("Certificate body has trailing bytes after the chain");
            return Err(Error::InvalidInput);
        }
        Ok(Self { entries })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> CertificateChainIter<'a> {
        CertificateChainIter {
            remaining: self.entries,
        }
    }
}

/// Serialize an outbound `Certificate` message. `certificate_der` is `None`
/// when this client has no identity to present, which serializes to an empty
/// chain rather than failing (RFC 5246 Section 7.4.6 permits an empty
/// `Certificate` in response to a request).
pub(crate) fn ser(buf: &mut [u8], certificate_der: Option<&[u8]>, transcript: &mut Transcript) -> usize {
    let cert_len = certificate_der.map_or(0, <[u8]>::len);
    let list_len = if certificate_der.is_some() { 3 + cert_len } else { 0 };
    let body_len = 3 + list_len;

    let header = HandshakeHeader::ser(HandshakeType::Certificate, body_len as u32);
    buf[..HandshakeHeader::LEN].copy_from_slice(header.as_bytes());

    let list_len_offset = HandshakeHeader::LEN;
    let list_len_bytes = (list_len as u32).to_be_bytes();
    buf[list_len_offset..list_len_offset + 3].copy_from_slice(&list_len_bytes[1..]);

    let mut written = list_len_offset + 3;
    if let Some(der) = certificate_der {
        let cert_len_bytes = (cert_len as u32).to_be_bytes();
        buf[written..written + 3].copy_from_slice(&cert_len_bytes[1..]);
        written += 3;
        buf[written..written + cert_len].copy_from_slice(der);
        written += cert_len;
    }

    transcript.update(&buf[..written]);
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ser_with_no_identity_is_an_empty_chain() {
        let mut buf = [0u8; 64];
        let mut transcript = Transcript::new();
        transcript.fix(true);
        let n = ser(&mut buf, None, &mut transcript);
        assert_eq!(n, HandshakeHeader::LEN + 3);
        assert_eq!(&buf[HandshakeHeader::LEN..n], &[0, 0, 0]);
    }

    #[test]
    fn ser_then_deser_round_trips_one_certificate() {
        let der = [0xAAu8; 10];
        let mut buf = [0u8; 64];
        let mut transcript = Transcript::new();
        transcript.fix(true);
        let n = ser(&mut buf, Some(&der), &mut transcript);

        let body = &buf[HandshakeHeader::LEN..n];
        let chain = CertificateChain::deser(body).unwrap();
        let mut iter = chain.iter();
        assert_eq!(iter.next(), Some(&der[..]));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn deser_rejects_trailing_bytes() {
        let mut body = [0u8; 8];
        body[2] = 2; // list_len = 2
        body[3] = 0;
        body[4] = 0;
        body[5] = 1; // one cert of length 1
        body[6] = 0xFF;
        // one extra trailing byte beyond the declared list
        assert!(CertificateChain::deser(&body).is_err());
    }
}
