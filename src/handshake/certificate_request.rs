//! `CertificateRequest` parsing.
//!
//! The server's requested certificate types, signature algorithms, and
//! trusted CA list are not consulted: this client always responds with
//! whatever [`crate::transport::ClientIdentity`] provides (or an empty
//! chain), so all this module needs to do is validate the framing and skip
//! the body.
//!
//! # References
//!
//! * [RFC 5246 Section 7.4.4](https://datatracker.ietf.org/doc/html/rfc5246#section-7.4.4)

use crate::error::Error;
use crate::io::Cursor;

/// Validate a `CertificateRequest` body's framing. Returns `Ok(())` once the
/// three length-prefixed fields are confirmed to span exactly `body`.
pub(crate) fn deser(body: &[u8]) -> Result<(), Error> {
    let mut cursor = Cursor::new(body);

    let certificate_types_len = cursor.next_u8()? as usize;
    cursor.skip_n(certificate_types_len)?;

    let sig_algs_len = cursor.next_u16()? as usize;
    cursor.skip_n(sig_algs_len)?;

    let certificate_authorities_len = cursor.next_u16()? as usize;
    cursor.skip_n(certificate_authorities_len)?;

    if !cursor.is_empty() {
        return Err(Error::InvalidInput);
    }
    Ok(())
}
