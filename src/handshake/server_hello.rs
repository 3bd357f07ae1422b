//! `ServerHello` parsing.
//!
//! # References
//!
//! * [RFC 5246 Section 7.4.1.3](https://datatracker.ietf.org/doc/html/rfc5246#section-7.4.1.3)

use crate::cipher_suites::CipherSuite;
use crate::error::Error;
use crate::fmt::{debug, error};
use crate::io::Cursor;
use crate::version::{self, TlsVersion};

pub(crate) struct ServerHello {
    pub(crate) version: TlsVersion,
    pub(crate) random: [u8; 32],
    pub(crate) cipher_suite: CipherSuite,
}

/// Parse a `ServerHello` body. The session's offered version gates what the
/// server is allowed to select; extensions, if any, are parsed for framing
/// correctness and otherwise ignored (only SNI is ever sent, and a server
/// never needs to ack it with content).
pub(crate) fn deser(body: &[u8], offered_version: TlsVersion) -> Result<ServerHello, Error> {
    let mut cursor = Cursor::new(body);

    let server_version_raw = cursor.next_u16()?;
    let version = version::negotiate(offered_version, server_version_raw)?;

    let random: [u8; 32] = cursor.next_n()?;

    let session_id_len = cursor.next_u8()? as usize;
    cursor.skip_n(session_id_len)?;

    let cipher_suite_code: [u8; 2] = cursor.next_n()?;
    let cipher_suite = CipherSuite::from_code(cipher_suite_code).ok_or_else(|| {
        error!("server selected unsupported cipher suite {:?}", cipher_suite_code);
        Error::Unsupported
    })?;

    let compression_method = cursor.next_u8()?;
    if compression_method != 0 {
        error!("server selected non-null compression {}", compression_method);
        return Err(Error::Unsupported);
    }

    if !cursor.is_empty() {
        let extensions_len = cursor.next_u16()? as usize;
        if extensions_len != cursor.remaining() {
            error!("ServerHello extensions length mismatch");
            return Err(Error::InvalidInput);
        }
        debug!("ServerHello carries {} bytes of extensions, ignored", extensions_len);
    }

    Ok(ServerHello {
        version,
        random,
        cipher_suite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(version: u16, suite: [u8; 2]) -> heapless::Vec<u8, 128> {
        let mut v: heapless::Vec<u8, 128> = heapless::Vec::new();
        v.extend_from_slice(&version.to_be_bytes()).unwrap();
        v.extend_from_slice(&[0xAA; 32]).unwrap();
        v.push(0).unwrap(); // session id len
        v.extend_from_slice(&suite).unwrap();
        v.push(0).unwrap(); // compression
        v
    }

    #[test]
    fn accepts_supported_suite_and_version() {
        let b = body(0x0303, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256.code());
        let hello = deser(&b, TlsVersion::V1_2).unwrap();
        assert_eq!(hello.version, TlsVersion::V1_2);
        assert_eq!(hello.cipher_suite, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256);
    }

    #[test]
    fn rejects_version_upgrade() {
        let b = body(0x0304, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256.code());
        assert!(deser(&b, TlsVersion::V1_2).is_err());
    }

    #[test]
    fn rejects_unknown_cipher_suite() {
        let b = body(0x0303, [0x13, 0x01]);
        assert!(deser(&b, TlsVersion::V1_2).is_err());
    }
}
