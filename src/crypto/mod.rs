//! Cryptographic primitive boundary.
//!
//! This module names the contracts the session core needs from digest,
//! symmetric-cipher, and public-key primitives without hard-wiring a single
//! implementation into the handshake and record-layer code. [`rust_crypto`]
//! is the one concrete backend shipped in-tree, selected unconditionally
//! today; the indirection exists so a hardware-accelerated backend can be
//! dropped in later the same way the digest/cipher kind enums are matched
//! on, without touching `record_layer.rs` or `handshake/*`.

pub(crate) mod rust_crypto;

/// Symmetric record cipher selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockCipherKind {
    Aes128Cbc,
    Aes256Cbc,
}

impl BlockCipherKind {
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes256Cbc => 32,
        }
    }

    /// CBC block size, and therefore explicit-IV length, for every suite this
    /// crate supports.
    pub const BLOCK_LEN: usize = 16;
}

/// Digest selection, used both for the record MAC and (via
/// [`crate::transcript`]) the handshake transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DigestKind {
    Sha1,
    Sha256,
}

impl DigestKind {
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

/// Maximum MAC length among the suites this crate supports (SHA-256).
pub const MAX_MAC_LEN: usize = 32;
