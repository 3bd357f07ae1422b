//! Cipher suite table.

use crate::crypto::{BlockCipherKind, DigestKind};

/// A negotiable cipher suite.
///
/// # References
///
/// * [RFC 5246 Appendix A.5](https://datatracker.ietf.org/doc/html/rfc5246#appendix-A.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(non_camel_case_types)]
pub enum CipherSuite {
    TLS_RSA_WITH_AES_256_CBC_SHA256,
    TLS_RSA_WITH_AES_128_CBC_SHA256,
    TLS_RSA_WITH_AES_256_CBC_SHA,
    TLS_RSA_WITH_AES_128_CBC_SHA,
}

/// Suites offered in the `ClientHello`, in preference order.
pub const PREFERENCE: [CipherSuite; 4] = [
    CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256,
    CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256,
    CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
    CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
];

impl CipherSuite {
    pub const fn code(self) -> [u8; 2] {
        match self {
            Self::TLS_RSA_WITH_AES_256_CBC_SHA256 => [0x00, 0x3D],
            Self::TLS_RSA_WITH_AES_128_CBC_SHA256 => [0x00, 0x3C],
            Self::TLS_RSA_WITH_AES_256_CBC_SHA => [0x00, 0x35],
            Self::TLS_RSA_WITH_AES_128_CBC_SHA => [0x00, 0x2F],
        }
    }

    pub fn from_code(code: [u8; 2]) -> Option<Self> {
        PREFERENCE.into_iter().find(|suite| suite.code() == code)
    }

    /// Symmetric cipher used for record protection.
    pub const fn cipher(self) -> BlockCipherKind {
        match self {
            Self::TLS_RSA_WITH_AES_256_CBC_SHA256 | Self::TLS_RSA_WITH_AES_256_CBC_SHA => {
                BlockCipherKind::Aes256Cbc
            }
            Self::TLS_RSA_WITH_AES_128_CBC_SHA256 | Self::TLS_RSA_WITH_AES_128_CBC_SHA => {
                BlockCipherKind::Aes128Cbc
            }
        }
    }

    /// MAC digest used for record protection (not the transcript digest).
    pub const fn mac_digest(self) -> DigestKind {
        match self {
            Self::TLS_RSA_WITH_AES_256_CBC_SHA256 | Self::TLS_RSA_WITH_AES_128_CBC_SHA256 => {
                DigestKind::Sha256
            }
            Self::TLS_RSA_WITH_AES_256_CBC_SHA | Self::TLS_RSA_WITH_AES_128_CBC_SHA => {
                DigestKind::Sha1
            }
        }
    }

    pub const fn key_len(self) -> usize {
        self.cipher().key_len()
    }
}

impl From<CipherSuite> for [u8; 2] {
    #[inline]
    fn from(suite: CipherSuite) -> Self {
        suite.code()
    }
}
