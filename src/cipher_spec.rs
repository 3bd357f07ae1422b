//! Per-direction cipher state and the pending/active swap `ChangeCipherSpec`
//! triggers.
//!
//! # References
//!
//! * [RFC 5246 Section 6.1](https://datatracker.ietf.org/doc/html/rfc5246#section-6.1)

use crate::cipher_suites::CipherSuite;
use crate::crypto::{BlockCipherKind, DigestKind};
use crate::prf::DirectionKeys;

/// Record-protection state for one direction (TX or RX).
///
/// Starts life as `CipherSpec::Null`: records are sent/received in the
/// clear, with no MAC. `install` moves a negotiated suite's keys into the
/// *pending* slot; `activate` is the `ChangeCipherSpec` swap that promotes
/// pending to active and resets the sequence number to zero.
#[derive(Clone, Copy)]
pub(crate) enum CipherSpec {
    Null,
    Active {
        suite: CipherSuite,
        keys: DirectionKeys,
        sequence_number: u64,
    },
}

impl Default for CipherSpec {
    fn default() -> Self {
        CipherSpec::Null
    }
}

impl CipherSpec {
    pub(crate) fn is_null(&self) -> bool {
        matches!(self, CipherSpec::Null)
    }

    pub(crate) fn cipher(&self) -> Option<BlockCipherKind> {
        match self {
            CipherSpec::Null => None,
            CipherSpec::Active { suite, .. } => Some(suite.cipher()),
        }
    }

    pub(crate) fn mac_digest(&self) -> Option<DigestKind> {
        match self {
            CipherSpec::Null => None,
            CipherSpec::Active { suite, .. } => Some(suite.mac_digest()),
        }
    }

    pub(crate) fn keys(&self) -> Option<&DirectionKeys> {
        match self {
            CipherSpec::Null => None,
            CipherSpec::Active { keys, .. } => Some(keys),
        }
    }

    pub(crate) fn sequence_number(&self) -> u64 {
        match self {
            CipherSpec::Null => 0,
            CipherSpec::Active {
                sequence_number, ..
            } => *sequence_number,
        }
    }

    /// Advance the sequence number after a record has been produced or
    /// consumed under this spec. A wraparound would require 2^64 records
    /// under one key and is treated as an internal invariant violation
    /// rather than a value that needs defined reset-to-zero behavior.
    pub(crate) fn increment_sequence_number(&mut self) {
        if let CipherSpec::Active {
            sequence_number, ..
        } = self
        {
            *sequence_number = sequence_number
                .checked_add(1)
                .expect("record sequence number exhausted");
        }
    }
}

/// A direction's two cipher slots: the one currently protecting records, and
/// the one a negotiated-but-not-yet-activated suite is staged into.
#[derive(Default, Clone, Copy)]
pub(crate) struct CipherSpecSlot {
    active: CipherSpec,
    pending: Option<(CipherSuite, DirectionKeys)>,
}

impl CipherSpecSlot {
    pub(crate) fn active(&self) -> &CipherSpec {
        &self.active
    }

    pub(crate) fn active_mut(&mut self) -> &mut CipherSpec {
        &mut self.active
    }

    /// Stage a negotiated suite's derived keys, to take effect on the next
    /// `ChangeCipherSpec` for this direction.
    pub(crate) fn install(&mut self, suite: CipherSuite, keys: DirectionKeys) {
        self.pending = Some((suite, keys));
    }

    /// `ChangeCipherSpec`: promote the pending spec to active, sequence
    /// number reset to zero.
    pub(crate) fn activate(&mut self) {
        if let Some((suite, keys)) = self.pending.take() {
            self.active = CipherSpec::Active {
                suite,
                keys,
                sequence_number: 0,
            };
        }
    }

    /// Reset both slots to the null cipher, for session bootstrap.
    pub(crate) fn clear(&mut self) {
        self.active = CipherSpec::Null;
        self.pending = None;
    }
}
