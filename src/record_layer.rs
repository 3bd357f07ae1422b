//! Record protection: MAC-then-encrypt framing and verification.
//!
//! Every cipher suite this crate negotiates is a CBC suite (see
//! [`crate::cipher_suites`]), so there is only one code path here rather
//! than a per-suite-family dispatch.
//!
//! # References
//!
//! * [RFC 5246 Section 6.2.3](https://datatracker.ietf.org/doc/html/rfc5246#section-6.2.3)

use crate::cipher_spec::CipherSpecSlot;
use crate::crypto::{rust_crypto, BlockCipherKind};
use crate::error::Error;
use crate::fmt::error;
use crate::record::{ContentType, RecordHeader};
use crate::version::TlsVersion;
use rand_core::{CryptoRng, RngCore};

/// Largest plaintext fragment this crate will ever produce or accept.
pub(crate) const MAX_FRAGMENT_LEN: usize = RecordHeader::MAX_FRAGMENT_LEN as usize;
/// Largest on-wire ciphertext body: explicit IV + fragment + MAC + padding.
pub(crate) const MAX_CIPHERTEXT_LEN: usize =
    MAX_FRAGMENT_LEN + BlockCipherKind::BLOCK_LEN + crate::crypto::MAX_MAC_LEN + 256;

/// `HMAC(MAC_secret, seq_num || type || version || length || fragment)`, the
/// pseudo-header described in RFC 5246 Section 6.2.3.1.
fn mac(
    digest: crate::crypto::DigestKind,
    mac_secret: &[u8],
    sequence_number: u64,
    content_type: ContentType,
    version: TlsVersion,
    fragment: &[u8],
) -> rust_crypto::MacValue {
    let pseudo_header = [
        content_type as u8,
        version.msb(),
        version.lsb(),
        (fragment.len() >> 8) as u8,
        fragment.len() as u8,
    ];
    rust_crypto::hmac(
        digest,
        mac_secret,
        &[&sequence_number.to_be_bytes(), &pseudo_header, fragment],
    )
}

/// Verify `expected` against `HMAC(MAC_secret, seq_num || type || version ||
/// length || fragment)`, in constant time.
fn mac_verify(
    digest: crate::crypto::DigestKind,
    mac_secret: &[u8],
    sequence_number: u64,
    content_type: ContentType,
    version: TlsVersion,
    fragment: &[u8],
    expected: &[u8],
) -> bool {
    let pseudo_header = [
        content_type as u8,
        version.msb(),
        version.lsb(),
        (fragment.len() >> 8) as u8,
        fragment.len() as u8,
    ];
    rust_crypto::hmac_verify(
        digest,
        mac_secret,
        &[&sequence_number.to_be_bytes(), &pseudo_header, fragment],
        expected,
    )
}

/// Encrypt `fragment` (a single plaintext record body) under the current TX
/// cipher spec and write `{type, version, length} || ciphertext` into `out`.
/// Returns the number of bytes written. `out` must be at least
/// `RecordHeader::LEN + MAX_CIPHERTEXT_LEN` bytes.
pub(crate) fn seal(
    tx: &mut CipherSpecSlot,
    version: TlsVersion,
    content_type: ContentType,
    fragment: &[u8],
    rng: &mut (impl RngCore + CryptoRng),
    out: &mut [u8],
) -> Result<usize, Error> {
    if fragment.len() > MAX_FRAGMENT_LEN {
        error!("plaintext fragment too large: {}", fragment.len());
        return Err(Error::InvalidInput);
    }

    if tx.active().is_null() {
        let header = RecordHeader::ser(content_type, version, fragment.len() as u16);
        out[..RecordHeader::LEN].copy_from_slice(header.as_bytes());
        out[RecordHeader::LEN..RecordHeader::LEN + fragment.len()].copy_from_slice(fragment);
        return Ok(RecordHeader::LEN + fragment.len());
    }

    let cipher = tx.active().cipher().expect("checked non-null above");
    let digest = tx.active().mac_digest().expect("checked non-null above");
    let sequence_number = tx.active().sequence_number();
    let keys = tx.active().keys().expect("checked non-null above");
    let mac_secret = keys.mac_secret;
    let mac_secret_len = keys.mac_secret_len;
    let key = keys.key;
    let key_len = keys.key_len;
    let mut iv = keys.iv;

    let block_len = BlockCipherKind::BLOCK_LEN;
    let explicit_iv = version.has_explicit_iv();
    if explicit_iv {
        rng.fill_bytes(&mut iv);
    }

    let mac_value = mac(
        digest,
        &mac_secret[..mac_secret_len],
        sequence_number,
        content_type,
        version,
        fragment,
    );

    let unpadded_len = fragment.len() + mac_value.as_slice().len();
    let padding_len = block_len - 1 - (unpadded_len % block_len);
    let padded_len = unpadded_len + padding_len + 1;

    let iv_offset = RecordHeader::LEN;
    let body_offset = iv_offset + if explicit_iv { block_len } else { 0 };
    if explicit_iv {
        out[iv_offset..body_offset].copy_from_slice(&iv);
    }

    out[body_offset..body_offset + fragment.len()].copy_from_slice(fragment);
    let mac_offset = body_offset + fragment.len();
    out[mac_offset..mac_offset + mac_value.as_slice().len()].copy_from_slice(mac_value.as_slice());
    let pad_offset = mac_offset + mac_value.as_slice().len();
    for b in out[pad_offset..pad_offset + padding_len + 1].iter_mut() {
        *b = padding_len as u8;
    }

    let ciphertext = &mut out[body_offset..body_offset + padded_len];
    rust_crypto::cbc_encrypt(cipher, &key[..key_len], &iv, ciphertext)?;

    if !explicit_iv {
        iv.copy_from_slice(&ciphertext[padded_len - block_len..]);
    }

    let wire_len = (body_offset - iv_offset) + padded_len;
    let header = RecordHeader::ser(content_type, version, wire_len as u16);
    out[..RecordHeader::LEN].copy_from_slice(header.as_bytes());

    if let crate::cipher_spec::CipherSpec::Active { keys, .. } = tx.active_mut() {
        keys.iv = iv;
    }
    tx.active_mut().increment_sequence_number();

    Ok(RecordHeader::LEN + wire_len)
}

/// Decrypt `ciphertext` (the record body, header already parsed) under the
/// current RX cipher spec, returning the plaintext fragment as a subslice of
/// `ciphertext` itself (decryption and depadding happen in place).
pub(crate) fn open<'a>(
    rx: &mut CipherSpecSlot,
    version: TlsVersion,
    content_type: ContentType,
    ciphertext: &'a mut [u8],
) -> Result<&'a [u8], Error> {
    if rx.active().is_null() {
        return Ok(ciphertext);
    }

    let cipher = rx.active().cipher().expect("checked non-null above");
    let digest = rx.active().mac_digest().expect("checked non-null above");
    let sequence_number = rx.active().sequence_number();
    let keys = *rx.active().keys().expect("checked non-null above");

    let block_len = BlockCipherKind::BLOCK_LEN;
    let explicit_iv = version.has_explicit_iv();
    let mac_len = keys.mac_secret_len;

    // The body (post IV-strip) must hold at least one padding-length byte
    // and a full MAC, in addition to being a whole number of cipher blocks.
    let min_body_len = block_len.max(mac_len + 1);
    let min_len = (if explicit_iv { block_len } else { 0 }) + min_body_len;
    if ciphertext.len() < min_len || ciphertext.len() % block_len != 0 {
        error!("bad record: length {} not viable", ciphertext.len());
        return Err(Error::InvalidInput);
    }

    let body_offset = if explicit_iv { block_len } else { 0 };
    let iv = if explicit_iv {
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&ciphertext[..block_len]);
        iv
    } else {
        keys.iv
    };
    let body = &mut ciphertext[body_offset..];

    let next_implicit_iv: [u8; 16] = {
        let mut last_block = [0u8; 16];
        last_block.copy_from_slice(&body[body.len() - block_len..]);
        last_block
    };

    rust_crypto::cbc_decrypt(cipher, &keys.key[..keys.key_len], &iv, body)?;

    let body_len = body.len();
    let padding_len = body[body_len - 1] as usize;

    // Clamp to a length that still leaves room for a full MAC, so the
    // fragment/MAC split below always stays in-bounds regardless of what an
    // attacker sent. A padding length too large to be real is folded into
    // `padding_ok` below instead of rejected here, so this function always
    // computes the MAC and never reveals a bad-padding verdict any faster
    // than a bad-MAC one (RFC 5246 Section 6.2.3.2).
    let max_padding_len = body_len - mac_len - 1;
    let used_padding_len = padding_len.min(max_padding_len);
    let padding_start = body_len - used_padding_len - 1;

    let padding_ok = used_padding_len == padding_len
        && body[padding_start..body_len - 1].iter().all(|&b| b as usize == padding_len);

    let mac_start = padding_start - mac_len;
    let (fragment, received_mac) = body[..padding_start].split_at(mac_start);

    let mac_ok = mac_verify(
        digest,
        &keys.mac_secret[..keys.mac_secret_len],
        sequence_number,
        content_type,
        version,
        fragment,
        received_mac,
    );
    let fragment_len = fragment.len();

    if !(padding_ok && mac_ok) {
        error!("bad record: padding or MAC check failed");
        return Err(Error::VerifyFailure);
    }

    if !explicit_iv {
        if let crate::cipher_spec::CipherSpec::Active { keys, .. } = rx.active_mut() {
            keys.iv = next_implicit_iv;
        }
    }
    rx.active_mut().increment_sequence_number();

    Ok(&ciphertext[body_offset..body_offset + fragment_len])
}
