//! Session error type.

/// Error kinds a [`crate::Session`] can fail with.
///
/// Every variant closes the session; there is no internal recovery. The
/// caller is expected to drop the session and, if appropriate, open a new
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A fixed-size buffer or context allocation ran out of room.
    Allocation,
    /// A record or handshake message was malformed: underlength, overlength,
    /// bad ASN.1, or an illegal protocol version.
    InvalidInput,
    /// The peer violated the protocol, e.g. attempted a version upgrade or
    /// sent a message in an unexpected state.
    ProtocolViolation,
    /// No supported cipher suite or signature/hash algorithm matched.
    Unsupported,
    /// A MAC, Finished, signature, or padding check failed.
    VerifyFailure,
    /// The certificate chain did not match the configured server name, was
    /// incomplete, or the peer sent a fatal alert.
    AccessDenied,
    /// The caller attempted to send application data before the handshake
    /// completed.
    NotConnected,
    /// The ciphertext transport reported an error.
    Transport,
}

impl Error {
    /// The [`crate::alert::AlertDescription`] to send, if any, when closing
    /// the session locally for this reason.
    pub(crate) fn alert_description(self) -> Option<crate::alert::AlertDescription> {
        use crate::alert::AlertDescription as AD;
        match self {
            Error::Allocation => Some(AD::InternalError),
            Error::InvalidInput => Some(AD::DecodeError),
            Error::ProtocolViolation => Some(AD::ProtocolVersion),
            Error::Unsupported => Some(AD::HandshakeFailure),
            Error::VerifyFailure => Some(AD::BadRecordMac),
            Error::AccessDenied => Some(AD::AccessDenied),
            Error::NotConnected | Error::Transport => None,
        }
    }
}

impl From<crate::alert::AlertDescription> for Error {
    fn from(description: crate::alert::AlertDescription) -> Self {
        use crate::alert::AlertDescription as AD;
        match description {
            AD::CloseNotify | AD::UserCanceled => Error::AccessDenied,
            AD::BadRecordMac | AD::DecryptError => Error::VerifyFailure,
            AD::DecodeError
            | AD::RecordOverflow
            | AD::IllegalParameter
            | AD::UnexpectedMessage => Error::InvalidInput,
            AD::ProtocolVersion => Error::ProtocolViolation,
            AD::HandshakeFailure | AD::InsufficientSecurity | AD::UnsupportedExtension => {
                Error::Unsupported
            }
            AD::BadCertificate
            | AD::UnsupportedCertificate
            | AD::CertificateRevoked
            | AD::CertificateExpired
            | AD::CertificateUnknown
            | AD::UnknownCa
            | AD::AccessDenied => Error::AccessDenied,
            AD::NoRenegotiation => Error::ProtocolViolation,
            AD::InternalError => Error::Allocation,
        }
    }
}
