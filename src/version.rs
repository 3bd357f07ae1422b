//! TLS protocol version negotiation.

use crate::error::Error;
use crate::fmt::error;

/// A negotiated TLS protocol version.
///
/// # References
///
/// * [RFC 2246 Appendix A.1](https://datatracker.ietf.org/doc/html/rfc2246#appendix-A.1)
/// * [RFC 4346 Appendix A.1](https://datatracker.ietf.org/doc/html/rfc4346#appendix-A.1)
/// * [RFC 5246 Appendix A.1](https://datatracker.ietf.org/doc/html/rfc5246#appendix-A.1)
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TlsVersion {
    /// TLS 1.0.
    V1_0 = 0x0301,
    /// TLS 1.1.
    V1_1 = 0x0302,
    /// TLS 1.2.
    V1_2 = 0x0303,
}

impl TlsVersion {
    /// Highest version this implementation will offer or accept.
    pub const MAX: TlsVersion = TlsVersion::V1_2;
    /// Lowest version this implementation will accept.
    pub const MIN: TlsVersion = TlsVersion::V1_0;

    pub(crate) const fn msb(self) -> u8 {
        ((self as u16) >> 8) as u8
    }

    pub(crate) const fn lsb(self) -> u8 {
        self as u8
    }

    /// Record-layer CBC records carry an explicit IV from 1.1 onward.
    pub(crate) fn has_explicit_iv(self) -> bool {
        self >= TlsVersion::V1_1
    }
}

impl From<TlsVersion> for u16 {
    #[inline]
    fn from(version: TlsVersion) -> Self {
        version as u16
    }
}

impl TryFrom<u16> for TlsVersion {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            x if x == (Self::V1_0 as u16) => Ok(Self::V1_0),
            x if x == (Self::V1_1 as u16) => Ok(Self::V1_1),
            x if x == (Self::V1_2 as u16) => Ok(Self::V1_2),
            x => Err(x),
        }
    }
}

/// Downgrade `session_version` to the server's offered version.
///
/// A server is never permitted to select a version higher than the one the
/// client offered, nor one below [`TlsVersion::MIN`].
pub(crate) fn negotiate(session_version: TlsVersion, server_version_raw: u16) -> Result<TlsVersion, Error> {
    let server_version = match TlsVersion::try_from(server_version_raw) {
        Ok(v) => v,
        Err(raw) => {
            if raw > (session_version as u16) {
                error!("server attempted to upgrade to unknown version {:#06x}", raw);
                return Err(Error::ProtocolViolation);
            }
            error!("illegal server version {:#06x}", raw);
            return Err(Error::InvalidInput);
        }
    };

    if server_version > session_version {
        error!(
            "server attempted upgrade: session {:?} -> server {:?}",
            session_version, server_version
        );
        return Err(Error::ProtocolViolation);
    }

    Ok(server_version)
}
