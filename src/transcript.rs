//! Handshake transcript digest.
//!
//! Every handshake message except `HelloRequest` is absorbed into a rolling
//! digest that `Finished` and `CertificateVerify` sign over. Before
//! `ServerHello` fixes the protocol version it is impossible to know which
//! digest will ultimately be needed, so both are kept live from session
//! construction and `fix` drops the one that was not selected.

use md5::Md5;
use sha2::Digest;
use sha1::Sha1;
use sha2::Sha256;

/// The MD5+SHA1 combination used by TLS 1.0 and 1.1 `Finished`/
/// `CertificateVerify`, modelled as a single digest: two contexts updated in
/// parallel, output the 16-byte MD5 digest concatenated with the 20-byte
/// SHA1 digest.
#[derive(Clone)]
struct Md5Sha1 {
    md5: Md5,
    sha1: Sha1,
}

impl Md5Sha1 {
    fn new() -> Self {
        Self {
            md5: Md5::new(),
            sha1: Sha1::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        self.md5.update(data);
        self.sha1.update(data);
    }

    /// 16 + 20 = 36 bytes.
    fn finalize_into(self, out: &mut [u8; 36]) {
        out[..16].copy_from_slice(&self.md5.finalize());
        out[16..].copy_from_slice(&self.sha1.finalize());
    }
}

/// The handshake transcript digest.
///
/// Both candidate digests are absorbed in parallel until `ServerHello` fixes
/// the negotiated protocol version, at which point [`Transcript::fix`]
/// discards whichever one turned out not to be needed. This matches
/// `ClientHello` necessarily being hashed before the version that decides
/// the digest choice is known.
#[derive(Clone)]
pub(crate) enum Transcript {
    Pending { md5_sha1: Md5Sha1, sha256: Sha256 },
    Md5Sha1(Md5Sha1),
    Sha256(Sha256),
}

/// A finalized snapshot of the transcript, sized for the larger of the two
/// variants (MD5+SHA1, 36 bytes).
pub(crate) struct TranscriptHash {
    buf: [u8; 36],
    len: usize,
}

impl TranscriptHash {
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Transcript {
    pub(crate) fn new() -> Self {
        Transcript::Pending {
            md5_sha1: Md5Sha1::new(),
            sha256: Sha256::new(),
        }
    }

    /// Fix the transcript to SHA-256 (TLS >= 1.2) or MD5+SHA1 (earlier),
    /// discarding the unused candidate. Must be called exactly once, from
    /// `ServerHello` processing, before any later handshake message is
    /// absorbed.
    pub(crate) fn fix(&mut self, use_sha256: bool) {
        if let Transcript::Pending { md5_sha1, sha256 } = self {
            *self = if use_sha256 {
                Transcript::Sha256(sha256.clone())
            } else {
                Transcript::Md5Sha1(md5_sha1.clone())
            };
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Transcript::Pending { md5_sha1, sha256 } => {
                md5_sha1.update(data);
                sha256.update(data);
            }
            Transcript::Md5Sha1(ctx) => ctx.update(data),
            Transcript::Sha256(ctx) => ctx.update(data),
        }
    }

    /// Clone-and-finalize: the live context keeps absorbing later messages.
    /// Only valid after `fix` has been called.
    pub(crate) fn snapshot(&self) -> TranscriptHash {
        match self {
            Transcript::Pending { .. } => {
                unreachable!("transcript digest read before ServerHello fixed it")
            }
            Transcript::Md5Sha1(ctx) => {
                let mut buf = [0u8; 36];
                ctx.clone().finalize_into(&mut buf);
                TranscriptHash { buf, len: 36 }
            }
            Transcript::Sha256(ctx) => {
                let digest = ctx.clone().finalize();
                let mut buf = [0u8; 36];
                buf[..32].copy_from_slice(&digest);
                TranscriptHash { buf, len: 32 }
            }
        }
    }
}
