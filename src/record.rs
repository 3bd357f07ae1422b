//! TLS record layer framing.

use crate::error::Error;
use crate::fmt::error;
use crate::version::TlsVersion;

/// Record content type.
///
/// # References
///
/// * [RFC 5246 Section 6.2.1](https://datatracker.ietf.org/doc/html/rfc5246#section-6.2.1)
///
/// ```text
/// enum {
///     change_cipher_spec(20), alert(21), handshake(22),
///     application_data(23), (255)
/// } ContentType;
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl From<ContentType> for u8 {
    #[inline]
    fn from(content_type: ContentType) -> Self {
        content_type as u8
    }
}

impl TryFrom<u8> for ContentType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            x if x == (Self::ChangeCipherSpec as u8) => Ok(Self::ChangeCipherSpec),
            x if x == (Self::Alert as u8) => Ok(Self::Alert),
            x if x == (Self::Handshake as u8) => Ok(Self::Handshake),
            x if x == (Self::ApplicationData as u8) => Ok(Self::ApplicationData),
            _ => Err(value),
        }
    }
}

/// A TLS record header: type, version, and the length of the fragment that
/// follows.
///
/// # References
///
/// * [RFC 5246 Section 6.2.1](https://datatracker.ietf.org/doc/html/rfc5246#section-6.2.1)
///
/// ```text
/// struct {
///     ContentType type;
///     ProtocolVersion version;
///     uint16 length;
///     opaque fragment[TLSPlaintext.length];
/// } TLSPlaintext;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader {
    buf: [u8; Self::LEN],
}

impl RecordHeader {
    pub const LEN: usize = 5;
    /// Largest fragment a conforming peer may send, per RFC 5246 Section 6.2.1.
    pub const MAX_FRAGMENT_LEN: u16 = 1 << 14;

    pub fn content_type(&self) -> Result<ContentType, Error> {
        ContentType::try_from(self.buf[0]).map_err(|raw| {
            error!("invalid ContentType: {:#04x}", raw);
            Error::InvalidInput
        })
    }

    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.buf[3], self.buf[4]])
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.buf
    }

    pub fn ser(content_type: ContentType, version: TlsVersion, data_len: u16) -> Self {
        RecordHeader {
            buf: [
                content_type.into(),
                version.msb(),
                version.lsb(),
                (data_len >> 8) as u8,
                data_len as u8,
            ],
        }
    }

    pub fn deser(buf: [u8; Self::LEN]) -> Result<Self, Error> {
        let header = Self { buf };
        header.content_type()?;
        // The record-layer version field is informational only (RFC 5246
        // Appendix E): both TLSPlaintext.version and any mid-handshake
        // version fluctuation are ignored by this implementation, matching
        // the widely deployed behaviour of tolerating a server that echoes
        // its own negotiated version before ServerHello is fully parsed.
        Ok(header)
    }
}
