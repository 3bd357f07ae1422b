//! External collaborator traits: ciphertext transport, certificate
//! verification, and client identity.
//!
//! These name the boundaries the session core needs but deliberately does
//! not implement itself: X.509 chain validation, RSA signing with a private
//! key, and the concrete network/socket stack. A caller wires in a register
//! interface or socket of its own choosing rather than this crate owning one.

use crate::error::Error;

/// The ciphertext endpoint: record-layer bytes go out through here, and the
/// session learns how much outbound buffer space remains.
pub trait Transport {
    type Error;

    /// Send a fully-formed TLS record (header included) to the peer.
    fn deliver(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Bytes of outbound buffer space currently available. The TX scheduler
    /// (C7) does not attempt to send while this is smaller than the record
    /// it wants to emit.
    fn window(&self) -> u16;

    /// Tear down the transport because the session is closing with `reason`.
    fn close(&mut self, reason: Error);
}

/// A certificate chain subject's public key, borrowed from the
/// [`CertificateVerifier`]'s own storage of the leaf certificate's DER.
pub enum SubjectPublicKey<'a> {
    /// `SubjectPublicKeyInfo` DER, as found in an RSA certificate.
    Rsa(&'a [u8]),
}

/// Certificate chain validation, delegated entirely to the caller. X.509
/// parsing and trust-anchor management are explicitly out of scope for this
/// crate; this trait is the seam where a caller plugs in `webpki`, a
/// vendored root store, or a test stub.
pub trait CertificateVerifier {
    /// Validate `chain` (leaf first, DER-encoded) against `server_name` and
    /// `now_unix`, returning the leaf's public key on success.
    fn verify<'a>(
        &mut self,
        chain: impl Iterator<Item = &'a [u8]>,
        server_name: &str,
        now_unix: u32,
    ) -> Result<SubjectPublicKey<'a>, Error>;
}

/// Client certificate authentication material, used only when the server
/// sends a `CertificateRequest`.
pub trait ClientIdentity {
    /// This client's own certificate, DER-encoded. `None` sends an empty
    /// `Certificate` message instead of aborting, matching widely deployed
    /// server behavior that tolerates an unauthenticated client when a
    /// certificate was merely requested, not required.
    fn certificate_der(&self) -> Option<&[u8]>;

    /// Sign `digest` (the handshake transcript digest) for
    /// `CertificateVerify`, writing the signature into `out` and returning
    /// its length.
    fn sign(&self, digest: &[u8], out: &mut [u8]) -> Result<usize, Error>;
}
