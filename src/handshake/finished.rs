//! `Finished` construction and verification.
//!
//! # References
//!
//! * [RFC 5246 Section 7.4.9](https://datatracker.ietf.org/doc/html/rfc5246#section-7.4.9)

use super::{HandshakeHeader, HandshakeType};
use crate::error::Error;
use crate::fmt::error;
use crate::prf::prf;
use crate::transcript::Transcript;
use crate::version::TlsVersion;
use subtle::ConstantTimeEq;

pub(crate) const VERIFY_DATA_LEN: usize = 12;

const CLIENT_LABEL: &[u8] = b"client finished";
const SERVER_LABEL: &[u8] = b"server finished";

/// `verify_data = PRF(master_secret, label, transcript_hash)[0..12]`.
fn verify_data(
    version: TlsVersion,
    master_secret: &[u8],
    label: &[u8],
    transcript_hash: &[u8],
) -> [u8; VERIFY_DATA_LEN] {
    let mut out = [0u8; VERIFY_DATA_LEN];
    prf(version, master_secret, label, &[transcript_hash], &mut out);
    out
}

/// Serialize this client's `Finished` message into `buf`, absorbing it into
/// `transcript` as it is written. Returns the number of bytes written.
pub(crate) fn ser(
    buf: &mut [u8],
    version: TlsVersion,
    master_secret: &[u8],
    transcript: &mut Transcript,
) -> usize {
    let transcript_hash = transcript.snapshot();
    let data = verify_data(version, master_secret, CLIENT_LABEL, transcript_hash.as_slice());

    let header = HandshakeHeader::ser(HandshakeType::Finished, VERIFY_DATA_LEN as u32);
    buf[..HandshakeHeader::LEN].copy_from_slice(header.as_bytes());
    buf[HandshakeHeader::LEN..HandshakeHeader::LEN + VERIFY_DATA_LEN].copy_from_slice(&data);

    let written = HandshakeHeader::LEN + VERIFY_DATA_LEN;
    transcript.update(&buf[..written]);
    written
}

/// Verify the server's `Finished` body (the handshake header already
/// stripped) against the transcript as it stood immediately before this
/// message arrived.
pub(crate) fn verify(
    body: &[u8],
    version: TlsVersion,
    master_secret: &[u8],
    transcript_hash: &[u8],
) -> Result<(), Error> {
    if body.len() != VERIFY_DATA_LEN {
        error!("Finished body length {} != {}", body.len(), VERIFY_DATA_LEN);
        return Err(Error::InvalidInput);
    }
    let expected = verify_data(version, master_secret, SERVER_LABEL, transcript_hash);
    if !bool::from(expected.ct_eq(body)) {
        error!("server Finished verify_data mismatch");
        return Err(Error::VerifyFailure);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_and_server_labels_diverge() {
        let secret = [0x55u8; 48];
        let hash = [0xAAu8; 32];
        let client = verify_data(TlsVersion::V1_2, &secret, CLIENT_LABEL, &hash);
        let server = verify_data(TlsVersion::V1_2, &secret, SERVER_LABEL, &hash);
        assert_ne!(client, server);
    }

    #[test]
    fn ser_absorbs_itself_into_transcript_and_round_trips() {
        let secret = [0x66u8; 48];
        let mut transcript = Transcript::new();
        transcript.fix(true);
        transcript.update(b"prior handshake bytes");
        let snapshot_before = transcript.snapshot();

        let mut buf = [0u8; 64];
        let n = ser(&mut buf, TlsVersion::V1_2, &secret, &mut transcript);
        assert_eq!(n, HandshakeHeader::LEN + VERIFY_DATA_LEN);

        let body = &buf[HandshakeHeader::LEN..n];
        let expected = verify_data(TlsVersion::V1_2, &secret, CLIENT_LABEL, snapshot_before.as_slice());
        assert_eq!(body, expected);
    }

    #[test]
    fn verify_rejects_wrong_length() {
        let secret = [0x77u8; 48];
        assert!(verify(&[0u8; 11], TlsVersion::V1_2, &secret, &[0u8; 32]).is_err());
    }

    #[test]
    fn verify_accepts_matching_data() {
        let secret = [0x88u8; 48];
        let hash = [0x99u8; 32];
        let data = verify_data(TlsVersion::V1_2, &secret, SERVER_LABEL, &hash);
        assert!(verify(&data, TlsVersion::V1_2, &secret, &hash).is_ok());
    }
}
