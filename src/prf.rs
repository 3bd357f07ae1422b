//! The TLS pseudo-random function and the key schedule built on it.
//!
//! # References
//!
//! * [RFC 5246 Section 5](https://datatracker.ietf.org/doc/html/rfc5246#section-5)
//! * [RFC 5246 Section 6.3](https://datatracker.ietf.org/doc/html/rfc5246#section-6.3)

use crate::crypto::rust_crypto::hmac;
use crate::crypto::{BlockCipherKind, DigestKind};
use crate::version::TlsVersion;

const MASTER_SECRET_LEN: usize = 48;
const MAX_KEY_BLOCK_LEN: usize = 2 * (32 + 32 + BlockCipherKind::BLOCK_LEN);

/// `P_hash(secret, seed)` as defined in RFC 5246 Section 5, written into
/// `out`.
///
/// `A(0) = seed`, `A(i) = HMAC(secret, A(i-1))`, output is
/// `HMAC(secret, A(1)) || HMAC(secret, A(2)) || ...` truncated to `out.len()`.
fn p_hash(digest: DigestKind, secret: &[u8], seed: &[u8], out: &mut [u8]) {
    let mut a = hmac(digest, secret, &[seed]);
    let mut written = 0;
    while written < out.len() {
        let chunk = hmac(digest, secret, &[a.as_slice(), seed]);
        let take = chunk.as_slice().len().min(out.len() - written);
        out[written..written + take].copy_from_slice(&chunk.as_slice()[..take]);
        written += take;
        a = hmac(digest, secret, &[a.as_slice()]);
    }
}

/// Split `secret` into the two overlapping halves TLS 1.0/1.1's PRF uses:
/// each half has length `ceil(len/2)`, overlapping by one byte when `len` is
/// odd.
fn split_secret(secret: &[u8]) -> (&[u8], &[u8]) {
    let half = secret.len().div_ceil(2);
    (&secret[..half], &secret[secret.len() - half..])
}

/// The TLS pseudo-random function: `P_SHA256` for TLS >= 1.2, or
/// `P_MD5(S1, ...) XOR P_SHA1(S2, ...)` for earlier versions.
///
/// `label` and `seed` are concatenated to form the PRF seed; `out` receives
/// exactly `out.len()` bytes of keying material.
pub(crate) fn prf(version: TlsVersion, secret: &[u8], label: &[u8], seed: &[&[u8]], out: &mut [u8]) {
    let mut full_seed_buf = [0u8; 128];
    let mut full_seed_len = label.len();
    full_seed_buf[..label.len()].copy_from_slice(label);
    for fragment in seed {
        full_seed_buf[full_seed_len..full_seed_len + fragment.len()].copy_from_slice(fragment);
        full_seed_len += fragment.len();
    }
    let full_seed = &full_seed_buf[..full_seed_len];

    if version >= TlsVersion::V1_2 {
        p_hash(DigestKind::Sha256, secret, full_seed, out);
        return;
    }

    let (s1, s2) = split_secret(secret);
    let mut md5_out = [0u8; MAX_KEY_BLOCK_LEN];
    let mut sha1_out = [0u8; MAX_KEY_BLOCK_LEN];
    p_hash_md5(s1, full_seed, &mut md5_out[..out.len()]);
    p_hash(DigestKind::Sha1, s2, full_seed, &mut sha1_out[..out.len()]);
    for i in 0..out.len() {
        out[i] = md5_out[i] ^ sha1_out[i];
    }
}

/// `P_MD5` is not exposed through the shared `DigestKind` HMAC dispatch
/// because MD5 is only ever used here, folded into TLS 1.0/1.1's PRF.
fn p_hash_md5(secret: &[u8], seed: &[u8], out: &mut [u8]) {
    use hmac::{Hmac, Mac};
    use md5::Md5;

    let mut a_buf = [0u8; 16];
    {
        let mut mac = Hmac::<Md5>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(seed);
        a_buf.copy_from_slice(&mac.finalize().into_bytes());
    }

    let mut written = 0;
    while written < out.len() {
        let mut mac = Hmac::<Md5>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&a_buf);
        mac.update(seed);
        let chunk = mac.finalize().into_bytes();
        let take = chunk.len().min(out.len() - written);
        out[written..written + take].copy_from_slice(&chunk[..take]);
        written += take;

        let mut mac = Hmac::<Md5>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&a_buf);
        a_buf.copy_from_slice(&mac.finalize().into_bytes());
    }
}

/// Derived traffic key material for one direction.
#[derive(Clone, Copy, Default)]
pub(crate) struct DirectionKeys {
    pub mac_secret: [u8; 32],
    pub mac_secret_len: usize,
    pub key: [u8; 32],
    pub key_len: usize,
    pub iv: [u8; BlockCipherKind::BLOCK_LEN],
}

/// Master secret and key block, derived exactly once per session between
/// `ServerHello` and the first `ChangeCipherSpec`.
pub(crate) struct KeySchedule {
    pub master_secret: [u8; MASTER_SECRET_LEN],
}

impl KeySchedule {
    /// `master_secret = PRF(pre_master_secret, "master secret", client_random || server_random)`.
    pub(crate) fn derive_master_secret(
        version: TlsVersion,
        pre_master_secret: &[u8],
        client_random: &[u8; 32],
        server_random: &[u8; 32],
    ) -> Self {
        let mut master_secret = [0u8; MASTER_SECRET_LEN];
        prf(
            version,
            pre_master_secret,
            b"master secret",
            &[client_random, server_random],
            &mut master_secret,
        );
        KeySchedule { master_secret }
    }

    /// `key_block = PRF(master_secret, "key expansion", server_random || client_random)`,
    /// split into (tx, rx) direction keys per RFC 5246 Section 6.3.
    pub(crate) fn key_block(
        &self,
        version: TlsVersion,
        client_random: &[u8; 32],
        server_random: &[u8; 32],
        mac_digest: DigestKind,
        cipher: BlockCipherKind,
    ) -> (DirectionKeys, DirectionKeys) {
        let mac_len = mac_digest.output_len();
        let key_len = cipher.key_len();
        let iv_len = BlockCipherKind::BLOCK_LEN;
        let total = 2 * (mac_len + key_len + iv_len);
        debug_assert!(total <= MAX_KEY_BLOCK_LEN);

        let mut block = [0u8; MAX_KEY_BLOCK_LEN];
        prf(
            version,
            &self.master_secret,
            b"key expansion",
            &[server_random, client_random],
            &mut block[..total],
        );

        let mut cursor = 0usize;
        let mut take = |len: usize| {
            let slice = &block[cursor..cursor + len];
            cursor += len;
            slice
        };

        let mut tx = DirectionKeys {
            mac_secret_len: mac_len,
            key_len,
            ..Default::default()
        };
        tx.mac_secret[..mac_len].copy_from_slice(take(mac_len));
        let mut rx = DirectionKeys {
            mac_secret_len: mac_len,
            key_len,
            ..Default::default()
        };
        rx.mac_secret[..mac_len].copy_from_slice(take(mac_len));
        tx.key[..key_len].copy_from_slice(take(key_len));
        rx.key[..key_len].copy_from_slice(take(key_len));
        tx.iv.copy_from_slice(take(iv_len));
        rx.iv.copy_from_slice(take(iv_len));

        (tx, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prf_1_2_is_deterministic_and_sized() {
        let secret = [0x11u8; 48];
        let mut out_a = [0u8; 77];
        let mut out_b = [0u8; 77];
        prf(
            TlsVersion::V1_2,
            &secret,
            b"master secret",
            &[&[0xAAu8; 32], &[0xBBu8; 32]],
            &mut out_a,
        );
        prf(
            TlsVersion::V1_2,
            &secret,
            b"master secret",
            &[&[0xAAu8; 32], &[0xBBu8; 32]],
            &mut out_b,
        );
        assert_eq!(out_a, out_b);
        assert!(out_a.iter().any(|&b| b != 0));
    }

    #[test]
    fn prf_1_0_differs_from_prf_1_2() {
        let secret = [0x22u8; 48];
        let seed: &[&[u8]] = &[&[0xCCu8; 32], &[0xDDu8; 32]];
        let mut out_12 = [0u8; 48];
        let mut out_10 = [0u8; 48];
        prf(TlsVersion::V1_2, &secret, b"master secret", seed, &mut out_12);
        prf(TlsVersion::V1_0, &secret, b"master secret", seed, &mut out_10);
        assert_ne!(out_12, out_10);
    }

    #[test]
    fn split_secret_overlaps_by_one_on_odd_length() {
        let secret = [0u8; 7];
        let (s1, s2) = split_secret(&secret);
        assert_eq!(s1.len(), 4);
        assert_eq!(s2.len(), 4);
    }

    #[test]
    fn split_secret_even_length_does_not_overlap() {
        let secret = [0u8; 8];
        let (s1, s2) = split_secret(&secret);
        assert_eq!(s1.len(), 4);
        assert_eq!(s2.len(), 4);
        assert_eq!(s1, &secret[..4]);
        assert_eq!(s2, &secret[4..]);
    }
}
