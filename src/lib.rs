//! A TLS 1.0/1.1/1.2 client for constrained environments.
//!
//! This crate speaks the classic RSA key-transport handshake
//! (`TLS_RSA_WITH_AES_{128,256}_CBC_{SHA,SHA256}`) against a server that
//! authenticates with an RSA certificate, with optional client certificate
//! authentication. It does not implement TLS 1.3, Diffie-Hellman key
//! exchange, session resumption, or renegotiation.
//!
//! # Design
//!
//! [`Session`] owns the handshake state machine and the record layer. It
//! does not own a socket: callers implement [`Transport`] to hand it
//! outbound bytes and report available buffer space, [`CertificateVerifier`]
//! to validate the server's X.509 chain, and optionally [`ClientIdentity`] to
//! answer a `CertificateRequest`.
//!
//! # Feature Flags
//!
//! * `alloc` (default): required for the `rsa` crate's RSA key-transport
//!   operations. Every cipher suite this client offers is RSA-based, so
//!   disabling this feature leaves the client unable to complete a
//!   handshake; it exists to let a build explicitly acknowledge that and
//!   fail at compile time on anything that touches `ClientKeyExchange`.
//! * `client-auth` (default): support responding to `CertificateRequest`.
//! * `std`: implies `alloc`, additionally enabling `rsa/std`.
//! * `defmt`: log via `defmt` instead of `log`.
//! * `log`: log via the `log` crate.
#![cfg_attr(docsrs, feature(doc_cfg), feature(doc_auto_cfg))]
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

#[cfg(feature = "alloc")]
extern crate alloc;

mod alert;
mod cipher_spec;
mod cipher_suites;
mod crypto;
mod error;
mod extension;
mod handshake;
mod io;
mod prf;
mod reassembler;
mod record;
mod record_layer;
mod session;
mod transcript;
mod transport;
mod version;

pub use alert::{Alert, AlertDescription, AlertLevel};
pub use error::Error;
pub use session::{Event, Session, State};
pub use transport::{CertificateVerifier, ClientIdentity, SubjectPublicKey, Transport};
pub use version::TlsVersion;

pub use rand_core;
