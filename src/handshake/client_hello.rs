//! `ClientHello` construction.
//!
//! # References
//!
//! * [RFC 5246 Section 7.4.1.2](https://datatracker.ietf.org/doc/html/rfc5246#section-7.4.1.2)

use super::HandshakeType;
use crate::cipher_suites::{self, CipherSuite};
use crate::extension::ExtensionType;
use crate::record::ContentType;
use crate::transcript::Transcript;
use crate::version::TlsVersion;
use core::mem::size_of;

/// # References
///
/// * [RFC 6066 Section 3](https://datatracker.ietf.org/doc/html/rfc6066#section-3)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameType {
    Hostname = 0,
}

/// Create a vector with up-to 2**8-1 bytes at compile time.
const fn vector_u8<const NUM_ELEMENTS: usize, const ELEMENT_SIZE: usize, const N: usize>(
    values: [[u8; ELEMENT_SIZE]; NUM_ELEMENTS],
) -> [u8; N] {
    let mut ret: [u8; N] = [0; N];
    let length: usize = ELEMENT_SIZE * NUM_ELEMENTS;
    ret[0] = length as u8;

    let mut value_idx: usize = 0;
    while value_idx < NUM_ELEMENTS {
        let mut value_byte_idx: usize = 0;
        while value_byte_idx < ELEMENT_SIZE {
            ret[value_idx * ELEMENT_SIZE + value_byte_idx + size_of::<u8>()] =
                values[value_idx][value_byte_idx];
            value_byte_idx += 1;
        }
        value_idx += 1;
    }

    ret
}

/// Create a vector with up-to 2**16-1 bytes at compile time.
const fn vector_u16<const NUM_ELEMENTS: usize, const ELEMENT_SIZE: usize, const N: usize>(
    values: [[u8; ELEMENT_SIZE]; NUM_ELEMENTS],
) -> [u8; N] {
    let mut ret: [u8; N] = [0; N];
    let length: u16 = (ELEMENT_SIZE * NUM_ELEMENTS) as u16;

    let len_bytes = length.to_be_bytes();
    ret[0] = len_bytes[0];
    ret[1] = len_bytes[1];

    let mut value_idx: usize = 0;
    while value_idx < NUM_ELEMENTS {
        let mut value_byte_idx: usize = 0;
        while value_byte_idx < ELEMENT_SIZE {
            ret[value_idx * ELEMENT_SIZE + value_byte_idx + size_of::<u16>()] =
                values[value_idx][value_byte_idx];
            value_byte_idx += 1;
        }
        value_idx += 1;
    }

    ret
}

/// Create a list of cipher suites.
const fn cipher_suites_list<const N_VALUES: usize, const N: usize>(
    values: [CipherSuite; N_VALUES],
) -> [u8; N] {
    let mut value_bytes: [[u8; 2]; N_VALUES] = [[0; 2]; N_VALUES];
    let mut value_idx: usize = 0;
    while value_idx < N_VALUES {
        value_bytes[value_idx] = values[value_idx].code();
        value_idx += 1;
    }
    vector_u16(value_bytes)
}

const CIPHER_SUITES_LIST: [u8; cipher_suites::PREFERENCE.len() * 2 + 2] =
    cipher_suites_list(cipher_suites::PREFERENCE);

/// legacy_session_id length (0, no session resumption) followed by the
/// cipher suite list and the null-only compression method list.
const LEGACY_THINGS_AND_CIPHER_SUITES: [u8; 1 + CIPHER_SUITES_LIST.len() + 2] = {
    let mut out = [0u8; 1 + CIPHER_SUITES_LIST.len() + 2];
    out[0] = 0; // legacy_session_id<0..32>, empty
    let mut i = 0;
    while i < CIPHER_SUITES_LIST.len() {
        out[1 + i] = CIPHER_SUITES_LIST[i];
        i += 1;
    }
    out[1 + CIPHER_SUITES_LIST.len()] = 1; // compression_methods length
    out[2 + CIPHER_SUITES_LIST.len()] = 0; // null compression
    out
};

/// Writer that serializes `ClientHello` into `buf` while simultaneously
/// absorbing the handshake-body bytes (type + length + payload, per I2) into
/// the transcript digest.
struct ClientHelloWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    transcript: &'a mut Transcript,
}

impl<'a> ClientHelloWriter<'a> {
    fn copy_from_slice(&mut self, src: &[u8]) {
        self.buf[self.len..self.len + src.len()].copy_from_slice(src);
        self.transcript.update(src);
        self.len += src.len();
    }

    fn copy_from_slice_no_hash(&mut self, src: &[u8]) {
        self.buf[self.len..self.len + src.len()].copy_from_slice(src);
        self.len += src.len();
    }

    fn push(&mut self, byte: u8) {
        self.buf[self.len] = byte;
        self.transcript.update(&[byte]);
        self.len += 1;
    }
}

/// Serialize a `ClientHello` record into `buf`, returning the number of
/// bytes written (including the record header). `server_name` is empty iff
/// SNI should be omitted.
pub(crate) fn ser(
    buf: &mut [u8],
    client_random: &[u8; 32],
    server_name: &str,
    transcript: &mut Transcript,
) -> usize {
    let sni_len: u16 = if server_name.is_empty() {
        0
    } else {
        (server_name.len() + 9) as u16 // 2 (ext type) + 2 (ext len) + 2 (list len) + 1 (name type) + 2 (name len)
    };
    let extensions_length: u16 = sni_len;
    // version(2) + random(32) + LEGACY_THINGS_AND_CIPHER_SUITES + extensions_length(2) + extensions
    let handshake_length: u16 =
        2 + 32 + LEGACY_THINGS_AND_CIPHER_SUITES.len() as u16 + 2 + extensions_length;
    let record_length: u16 = 4 + handshake_length;

    let mut writer = ClientHelloWriter {
        buf,
        len: 0,
        transcript,
    };

    writer.copy_from_slice_no_hash(&[ContentType::Handshake as u8]);
    writer.copy_from_slice_no_hash(&u16::from(TlsVersion::MAX).to_be_bytes());
    writer.copy_from_slice_no_hash(&record_length.to_be_bytes());

    writer.push(HandshakeType::ClientHello as u8);
    writer.push(0);
    writer.copy_from_slice(&handshake_length.to_be_bytes());

    writer.copy_from_slice(&u16::from(TlsVersion::MAX).to_be_bytes());
    writer.copy_from_slice(client_random);
    writer.copy_from_slice(&LEGACY_THINGS_AND_CIPHER_SUITES);
    writer.copy_from_slice(&extensions_length.to_be_bytes());

    if !server_name.is_empty() {
        let hostname_len = server_name.len() as u16;
        let server_name_list_len = hostname_len + 3;
        let extension_len = server_name_list_len + 2;

        writer.copy_from_slice(&u16::from(ExtensionType::ServerName).to_be_bytes());
        writer.copy_from_slice(&extension_len.to_be_bytes());
        writer.copy_from_slice(&server_name_list_len.to_be_bytes());
        writer.push(NameType::Hostname as u8);
        writer.copy_from_slice(&hostname_len.to_be_bytes());
        writer.copy_from_slice(server_name.as_bytes());
    }

    writer.len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ser_length_prefixes_are_consistent() {
        let mut buf = [0u8; 256];
        let mut transcript = Transcript::new();
        let client_random = [0x42u8; 32];
        let len = ser(&mut buf, &client_random, "example.com", &mut transcript);

        let record_len = u16::from_be_bytes([buf[3], buf[4]]) as usize;
        assert_eq!(record_len + 5, len);

        let hs_len =
            u32::from_be_bytes([0, buf[6], buf[7], buf[8]]) as usize;
        assert_eq!(hs_len + 4, record_len);
    }

    #[test]
    fn ser_without_server_name_omits_extension() {
        let mut buf = [0u8; 256];
        let mut transcript = Transcript::new();
        let client_random = [0u8; 32];
        let len = ser(&mut buf, &client_random, "", &mut transcript);
        assert!(len < 100);
    }
}
