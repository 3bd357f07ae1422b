//! The TLS session core: handshake state machine, TX flight scheduler, and
//! the plaintext/ciphertext endpoints a caller drives.
//!
//! # References
//!
//! * [RFC 5246 Section 7.3](https://datatracker.ietf.org/doc/html/rfc5246#section-7.3)

use crate::alert::{Alert, AlertDescription, AlertLevel};
use crate::cipher_spec::CipherSpecSlot;
use crate::cipher_suites::CipherSuite;
use crate::error::Error;
use crate::fmt::{error, warn};
use crate::handshake::{
    self, certificate, certificate_request, certificate_verify, client_hello, finished,
    server_hello, HandshakeHeader, HandshakeType,
};
use crate::io::Cursor;
use crate::prf::KeySchedule;
use crate::reassembler::{AppDataRing, Reassembler};
use crate::record::{ContentType, RecordHeader};
use crate::record_layer;
use crate::transcript::Transcript;
use crate::transport::{CertificateVerifier, ClientIdentity, SubjectPublicKey, Transport};
use crate::version::TlsVersion;
use rand_core::{CryptoRng, RngCore};

/// Largest plaintext handshake body this crate will build or accept on the
/// TX side (bounds an outbound client certificate chain and its signature).
const MAX_HANDSHAKE_BODY_LEN: usize = 1536;
/// Largest sealed record this crate will build on the TX side.
const TX_RECORD_BUF_LEN: usize = MAX_HANDSHAKE_BODY_LEN + 64;

mod flight {
    pub(crate) const CLIENT_HELLO: u8 = 1 << 0;
    pub(crate) const CERTIFICATE: u8 = 1 << 1;
    pub(crate) const CLIENT_KEY_EXCHANGE: u8 = 1 << 2;
    pub(crate) const CERTIFICATE_VERIFY: u8 = 1 << 3;
    pub(crate) const CHANGE_CIPHER: u8 = 1 << 4;
    pub(crate) const FINISHED: u8 = 1 << 5;

    /// Dispatch order, lowest bit first.
    pub(crate) const ORDER: [u8; 6] = [
        CLIENT_HELLO,
        CERTIFICATE,
        CLIENT_KEY_EXCHANGE,
        CERTIFICATE_VERIFY,
        CHANGE_CIPHER,
        FINISHED,
    ];
}

/// A built-but-not-yet-delivered flight record, held across `process_tx`
/// calls when the transport window is too small to take it. Serializing a
/// handshake message absorbs it into the transcript as a side effect, so a
/// record that didn't fit must be retried byte-for-byte rather than
/// rebuilt, or its message would be hashed into the transcript twice.
struct PendingFlightRecord {
    bit: u8,
    len: usize,
    buf: [u8; TX_RECORD_BUF_LEN],
}

/// Handshake progress. There is no early-data or 0-RTT branch: the
/// full-handshake flight order is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    WaitServerHello,
    WaitCertificate,
    WaitServerHelloDone,
    WaitChangeCipherSpec,
    WaitFinished,
    Connected,
    Closed,
}

/// Something [`Session::process`] noticed that the caller might care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Nothing the caller needs to act on.
    None,
    /// New decrypted bytes are available from [`Session::read`].
    ApplicationData,
    /// The handshake completed; [`Session::write_all`] is now usable.
    HandshakeFinished,
    /// The peer sent `close_notify`, or the transport was torn down.
    Disconnect,
}

/// A TLS 1.0/1.1/1.2 client session.
///
/// `N` sizes the application-data ring ([`AppDataRing`]); it has no relation
/// to TLS record size limits, which are fixed by the protocol.
pub struct Session<'a, T, V, I, const N: usize>
where
    T: Transport,
    V: CertificateVerifier,
    I: ClientIdentity,
{
    transport: T,
    verifier: V,
    identity: Option<&'a I>,
    server_name: &'a str,
    now_unix: u32,

    state: State,
    version: TlsVersion,
    client_random: [u8; 32],
    server_random: [u8; 32],
    pre_master_secret: [u8; 48],
    master_secret: Option<[u8; 48]>,
    transcript: Transcript,
    negotiated_suite: Option<CipherSuite>,
    certificate_requested: bool,
    #[cfg(feature = "alloc")]
    server_public_key: Option<rsa::RsaPublicKey>,

    tx: CipherSpecSlot,
    rx: CipherSpecSlot,
    pending_flights: u8,
    pending_tx_record: Option<PendingFlightRecord>,

    reassembler: Reassembler,
    app_data: AppDataRing<N>,
    pending_event: Option<Event>,
}

impl<'a, T, V, I, const N: usize> Session<'a, T, V, I, N>
where
    T: Transport,
    V: CertificateVerifier,
    I: ClientIdentity,
{
    /// Bootstrap a new session (C8): null cipher specs in every slot, version
    /// pinned to [`TlsVersion::MAX`], client_random and pre_master_secret
    /// filled from `rng`, pending flights = `{ClientHello}`.
    pub fn new<R: RngCore + CryptoRng>(
        transport: T,
        verifier: V,
        identity: Option<&'a I>,
        server_name: &'a str,
        now_unix: u32,
        rng: &mut R,
    ) -> Self {
        let mut client_random = [0u8; 32];
        client_random[..4].copy_from_slice(&now_unix.to_be_bytes());
        rng.fill_bytes(&mut client_random[4..]);

        let mut pre_master_secret = [0u8; 48];
        pre_master_secret[..2].copy_from_slice(&u16::from(TlsVersion::MAX).to_be_bytes());
        rng.fill_bytes(&mut pre_master_secret[2..]);

        Self {
            transport,
            verifier,
            identity,
            server_name,
            now_unix,
            state: State::WaitServerHello,
            version: TlsVersion::MAX,
            client_random,
            server_random: [0u8; 32],
            pre_master_secret,
            master_secret: None,
            transcript: Transcript::new(),
            negotiated_suite: None,
            certificate_requested: false,
            #[cfg(feature = "alloc")]
            server_public_key: None,
            tx: CipherSpecSlot::default(),
            rx: CipherSpecSlot::default(),
            pending_flights: flight::CLIENT_HELLO,
            pending_tx_record: None,
            reassembler: Reassembler::default(),
            app_data: AppDataRing::default(),
            pending_event: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn connected(&self) -> bool {
        self.state == State::Connected
    }

    /// Drain up to `out.len()` bytes of decrypted application data.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        self.app_data.read(out)
    }

    /// Feed newly-received ciphertext bytes in, then drive the TX scheduler.
    /// `inbound` may be empty to just service the scheduler (e.g. after a
    /// window-change notification).
    pub fn process<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        inbound: &[u8],
    ) -> Result<Event, Error> {
        if self.state == State::Closed {
            return Ok(Event::None);
        }

        let mut reassembler = core::mem::take(&mut self.reassembler);
        let feed_result = reassembler.feed(inbound, |header, body| self.handle_record(header, body));
        self.reassembler = reassembler;

        if let Err(e) = feed_result {
            self.fail(rng, e);
            return Err(e);
        }

        if let Err(e) = self.process_tx(rng) {
            self.fail(rng, e);
            return Err(e);
        }

        Ok(self.pending_event.take().unwrap_or(Event::None))
    }

    /// Encrypt and send application data. Only valid once [`Session::connected`].
    pub fn write_all<R: RngCore + CryptoRng>(&mut self, rng: &mut R, data: &[u8]) -> Result<(), Error> {
        if self.state != State::Connected {
            return Err(Error::NotConnected);
        }
        for chunk in data.chunks(record_layer::MAX_FRAGMENT_LEN) {
            let mut record_buf = [0u8; TX_RECORD_BUF_LEN];
            let n = record_layer::seal(
                &mut self.tx,
                self.version,
                ContentType::ApplicationData,
                chunk,
                rng,
                &mut record_buf,
            )?;
            if (self.transport.window() as usize) < n {
                return Err(Error::Transport);
            }
            self.transport.deliver(&record_buf[..n]).map_err(|_| Error::Transport)?;
        }
        Ok(())
    }

    /// Send `close_notify` and tear down the transport.
    pub fn close<R: RngCore + CryptoRng>(&mut self, rng: &mut R) {
        if self.state == State::Closed {
            return;
        }
        let alert = Alert {
            level: AlertLevel::Warning,
            description: AlertDescription::CloseNotify,
        };
        let mut record_buf = [0u8; 64];
        if let Ok(n) = record_layer::seal(
            &mut self.tx,
            self.version,
            ContentType::Alert,
            &alert.ser(),
            rng,
            &mut record_buf,
        ) {
            let _ = self.transport.deliver(&record_buf[..n]);
        }
        self.transport.close(Error::from(AlertDescription::CloseNotify));
        self.state = State::Closed;
    }

    fn expect_state(&self, expected: State) -> Result<(), Error> {
        if self.state != expected {
            error!("handshake message not valid in this state");
            return Err(Error::ProtocolViolation);
        }
        Ok(())
    }

    /// Close the session locally, alerting the peer with the description
    /// that matches `reason` if one applies (RFC 5246 Section 7.2).
    fn fail<R: RngCore + CryptoRng>(&mut self, rng: &mut R, reason: Error) {
        if self.state == State::Closed {
            return;
        }
        if let Some(description) = reason.alert_description() {
            let alert = Alert::new_fatal(description);
            let mut record_buf = [0u8; 64];
            if let Ok(n) = record_layer::seal(
                &mut self.tx,
                self.version,
                ContentType::Alert,
                &alert.ser(),
                rng,
                &mut record_buf,
            ) {
                let _ = self.transport.deliver(&record_buf[..n]);
            }
        }
        self.transport.close(reason);
        self.state = State::Closed;
    }

    /// Record-layer dispatch (C4 step 5): decrypt, then route by content type.
    fn handle_record(&mut self, header: RecordHeader, ciphertext: &mut [u8]) -> Result<(), Error> {
        let content_type = header.content_type()?;
        let fragment = record_layer::open(&mut self.rx, self.version, content_type, ciphertext)?;

        match content_type {
            ContentType::ChangeCipherSpec => {
                self.expect_state(State::WaitChangeCipherSpec)?;
                if fragment != [0x01] {
                    error!("malformed ChangeCipherSpec body");
                    return Err(Error::InvalidInput);
                }
                self.rx.activate();
                self.state = State::WaitFinished;
                Ok(())
            }
            ContentType::Alert => {
                if fragment.len() != Alert::LEN {
                    return Err(Error::InvalidInput);
                }
                let alert = Alert::deser([fragment[0], fragment[1]])?;
                match alert.level {
                    AlertLevel::Fatal => Err(Error::from(alert.description)),
                    AlertLevel::Warning if alert.description == AlertDescription::CloseNotify => {
                        self.transport.close(Error::from(alert.description));
                        self.state = State::Closed;
                        self.pending_event = Some(Event::Disconnect);
                        Ok(())
                    }
                    AlertLevel::Warning => {
                        warn!("peer sent a warning alert, ignoring");
                        Ok(())
                    }
                }
            }
            ContentType::Handshake => self.handle_handshake(fragment),
            ContentType::ApplicationData => {
                if self.state != State::Connected {
                    error!("application data received before the handshake finished");
                    return Err(Error::ProtocolViolation);
                }
                self.app_data.push(fragment)?;
                self.pending_event = Some(Event::ApplicationData);
                Ok(())
            }
        }
    }

    /// Parse and dispatch every handshake message packed into one record
    /// fragment, absorbing each into the transcript in the order received
    /// (I2) except `HelloRequest`.
    fn handle_handshake(&mut self, fragment: &[u8]) -> Result<(), Error> {
        let mut cursor = Cursor::new(fragment);
        while !cursor.is_empty() {
            let msg_start = cursor.position();
            let header_bytes: [u8; HandshakeHeader::LEN] = cursor.next_n()?;
            let header = HandshakeHeader::from(header_bytes);
            let msg_type = header.msg_type().map_err(|raw| {
                error!("unknown HandshakeType {:#04x}", raw);
                Error::InvalidInput
            })?;
            let body = cursor.next_slice(header.length() as usize)?;
            let raw = &fragment[msg_start..cursor.position()];

            match msg_type {
                HandshakeType::HelloRequest => {
                    // Renegotiation is out of scope: ignored entirely, not hashed.
                }
                HandshakeType::ServerHello => {
                    self.expect_state(State::WaitServerHello)?;
                    let parsed = server_hello::deser(body, self.version)?;
                    self.transcript.update(raw);
                    self.transcript.fix(parsed.version >= TlsVersion::V1_2);
                    self.version = parsed.version;
                    self.server_random = parsed.random;
                    self.negotiated_suite = Some(parsed.cipher_suite);
                    self.state = State::WaitCertificate;
                }
                HandshakeType::Certificate => {
                    self.expect_state(State::WaitCertificate)?;
                    let chain = certificate::CertificateChain::deser(body)?;
                    if chain.is_empty() {
                        error!("server presented an empty certificate chain");
                        return Err(Error::AccessDenied);
                    }
                    self.adopt_server_public_key(&chain)?;
                    self.transcript.update(raw);
                    self.state = State::WaitServerHelloDone;
                }
                #[cfg(feature = "client-auth")]
                HandshakeType::CertificateRequest => {
                    self.expect_state(State::WaitServerHelloDone)?;
                    certificate_request::deser(body)?;
                    self.certificate_requested = true;
                    self.transcript.update(raw);
                }
                #[cfg(not(feature = "client-auth"))]
                HandshakeType::CertificateRequest => {
                    error!("CertificateRequest received but client-auth is disabled");
                    return Err(Error::Unsupported);
                }
                HandshakeType::ServerHelloDone => {
                    self.expect_state(State::WaitServerHelloDone)?;
                    if !body.is_empty() {
                        return Err(Error::InvalidInput);
                    }
                    self.transcript.update(raw);
                    self.begin_client_flight()?;
                    self.state = State::WaitChangeCipherSpec;
                }
                HandshakeType::Finished => {
                    self.expect_state(State::WaitFinished)?;
                    let master_secret = self.master_secret.ok_or(Error::ProtocolViolation)?;
                    let transcript_hash = self.transcript.snapshot();
                    finished::verify(body, self.version, &master_secret, transcript_hash.as_slice())?;
                    self.transcript.update(raw);
                    self.state = State::Connected;
                    self.pending_event = Some(Event::HandshakeFinished);
                }
                HandshakeType::ClientHello
                | HandshakeType::CertificateVerify
                | HandshakeType::ClientKeyExchange => {
                    error!("server sent a client-only handshake message");
                    return Err(Error::ProtocolViolation);
                }
            }
        }
        Ok(())
    }

    #[cfg(feature = "alloc")]
    fn adopt_server_public_key<'c>(
        &mut self,
        chain: &certificate::CertificateChain<'c>,
    ) -> Result<(), Error> {
        let SubjectPublicKey::Rsa(der) = self.verifier.verify(chain.iter(), self.server_name, self.now_unix)?;
        self.server_public_key = Some(crate::crypto::rust_crypto::public_key_from_spki_der(der)?);
        Ok(())
    }

    #[cfg(not(feature = "alloc"))]
    fn adopt_server_public_key<'c>(
        &mut self,
        chain: &certificate::CertificateChain<'c>,
    ) -> Result<(), Error> {
        let SubjectPublicKey::Rsa(_der) = self.verifier.verify(chain.iter(), self.server_name, self.now_unix)?;
        Err(Error::Unsupported)
    }

    /// `ServerHelloDone` (I3): derive the master secret and key block, stage
    /// both directions' cipher specs, and arm the client's response flight.
    fn begin_client_flight(&mut self) -> Result<(), Error> {
        let suite = self.negotiated_suite.ok_or(Error::ProtocolViolation)?;

        let master_secret = KeySchedule::derive_master_secret(
            self.version,
            &self.pre_master_secret,
            &self.client_random,
            &self.server_random,
        )
        .master_secret;
        self.master_secret = Some(master_secret);

        let key_schedule = KeySchedule { master_secret };
        let (tx_keys, rx_keys) = key_schedule.key_block(
            self.version,
            &self.client_random,
            &self.server_random,
            suite.mac_digest(),
            suite.cipher(),
        );
        self.tx.install(suite, tx_keys);
        self.rx.install(suite, rx_keys);

        let mut pending = flight::CLIENT_KEY_EXCHANGE | flight::CHANGE_CIPHER | flight::FINISHED;
        if self.certificate_requested {
            pending |= flight::CERTIFICATE;
            let identity_has_cert = self.identity.and_then(|i| i.certificate_der()).is_some();
            if identity_has_cert {
                pending |= flight::CERTIFICATE_VERIFY;
            }
        }
        self.pending_flights = pending;
        Ok(())
    }

    /// TX scheduler (C7): dispatch the lowest-set pending-flight bit while
    /// the transport has room, re-arming until the mask is empty.
    ///
    /// A record that doesn't fit in the current window is cached in
    /// `pending_tx_record` and retried byte-for-byte on the next call,
    /// rather than rebuilt: building a handshake message absorbs it into
    /// the transcript, and that must happen exactly once per message.
    fn process_tx<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<(), Error> {
        loop {
            let record = match self.pending_tx_record.take() {
                Some(record) => record,
                None => {
                    let Some(&bit) = flight::ORDER.iter().find(|&&b| self.pending_flights & b != 0) else {
                        return Ok(());
                    };
                    let mut buf = [0u8; TX_RECORD_BUF_LEN];
                    let len = self.build_flight_record(rng, bit, &mut buf)?;
                    PendingFlightRecord { bit, len, buf }
                }
            };

            if (self.transport.window() as usize) < record.len {
                self.pending_tx_record = Some(record);
                return Ok(());
            }
            self.transport.deliver(&record.buf[..record.len]).map_err(|_| Error::Transport)?;

            if record.bit == flight::CHANGE_CIPHER {
                self.tx.activate();
            }
            self.pending_flights &= !record.bit;
        }
    }

    fn build_flight_record<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        bit: u8,
        record_buf: &mut [u8; TX_RECORD_BUF_LEN],
    ) -> Result<usize, Error> {
        match bit {
            flight::CLIENT_HELLO => {
                Ok(client_hello::ser(record_buf, &self.client_random, self.server_name, &mut self.transcript))
            }
            flight::CERTIFICATE => {
                let der = self.identity.and_then(|i| i.certificate_der());
                let mut body = [0u8; MAX_HANDSHAKE_BODY_LEN];
                let body_len = certificate::ser(&mut body, der, &mut self.transcript);
                record_layer::seal(&mut self.tx, self.version, ContentType::Handshake, &body[..body_len], rng, record_buf)
            }
            #[cfg(feature = "alloc")]
            flight::CLIENT_KEY_EXCHANGE => {
                let pubkey = self.server_public_key.as_ref().ok_or(Error::ProtocolViolation)?;
                let mut body = [0u8; MAX_HANDSHAKE_BODY_LEN];
                let body_len = handshake::client_key_exchange::ser(
                    &mut body,
                    rng,
                    pubkey,
                    &self.pre_master_secret,
                    &mut self.transcript,
                )?;
                record_layer::seal(&mut self.tx, self.version, ContentType::Handshake, &body[..body_len], rng, record_buf)
            }
            #[cfg(not(feature = "alloc"))]
            flight::CLIENT_KEY_EXCHANGE => Err(Error::Unsupported),
            flight::CERTIFICATE_VERIFY => {
                let identity = self.identity.ok_or(Error::ProtocolViolation)?;
                let mut body = [0u8; MAX_HANDSHAKE_BODY_LEN];
                let body_len = certificate_verify::ser(&mut body, self.version, identity, &mut self.transcript)?;
                record_layer::seal(&mut self.tx, self.version, ContentType::Handshake, &body[..body_len], rng, record_buf)
            }
            flight::CHANGE_CIPHER => {
                record_layer::seal(&mut self.tx, self.version, ContentType::ChangeCipherSpec, &[0x01], rng, record_buf)
            }
            flight::FINISHED => {
                let master_secret = self.master_secret.ok_or(Error::ProtocolViolation)?;
                let mut body = [0u8; HandshakeHeader::LEN + finished::VERIFY_DATA_LEN];
                let body_len = finished::ser(&mut body, self.version, &master_secret, &mut self.transcript);
                record_layer::seal(&mut self.tx, self.version, ContentType::Handshake, &body[..body_len], rng, record_buf)
            }
            _ => unreachable!("pending_flights only ever carries bits from flight::ORDER"),
        }
    }
}
