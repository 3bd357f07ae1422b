//! Drives a [`Session`] through a complete TLS 1.2 RSA handshake and one
//! round of application data against a hand-rolled peer that speaks just
//! enough of the wire format to play the server side. The peer's crypto
//! (PRF, record MAC, CBC framing) is implemented independently of the crate
//! under test rather than by calling into it, so this exercises real
//! interoperability rather than a mirror of the same code.

use aes::Aes128;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use nanotls::{CertificateVerifier, ClientIdentity, Error, Event, Session, State, SubjectPublicKey, Transport};
use rand_core::{OsRng, RngCore};
use rsa::pkcs8::{DecodePublicKey as _, EncodePublicKey as _};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

const NOW_UNIX: u32 = 1_700_000_000;
const SERVER_NAME: &str = "example.test";
const TLS_1_2: [u8; 2] = [0x03, 0x03];
const AES_128_CBC_SHA256: [u8; 2] = [0x00, 0x3C];

/// A [`Transport`] backed by a byte queue the test retains a handle to, so
/// it can inspect whatever the session under test sends.
struct LoopbackTransport {
    outbox: Rc<RefCell<VecDeque<u8>>>,
}

impl Transport for LoopbackTransport {
    type Error = ();

    fn deliver(&mut self, data: &[u8]) -> Result<(), ()> {
        self.outbox.borrow_mut().extend(data.iter().copied());
        Ok(())
    }

    fn window(&self) -> u16 {
        u16::MAX
    }

    fn close(&mut self, _reason: Error) {}
}

/// Like [`LoopbackTransport`], but `window()` is controlled by the test so a
/// record can be deliberately held back and retried on a later `process`
/// call, exercising the same window-limited path a small real transport
/// would take.
struct ThrottledTransport {
    outbox: Rc<RefCell<VecDeque<u8>>>,
    window: Rc<Cell<u16>>,
}

impl Transport for ThrottledTransport {
    type Error = ();

    fn deliver(&mut self, data: &[u8]) -> Result<(), ()> {
        self.outbox.borrow_mut().extend(data.iter().copied());
        Ok(())
    }

    fn window(&self) -> u16 {
        self.window.get()
    }

    fn close(&mut self, _reason: Error) {}
}

/// Pretends every "certificate" in the chain already is the
/// `SubjectPublicKeyInfo` DER a real verifier would extract from an X.509
/// leaf; good enough for exercising the session core without pulling in an
/// X.509 parser here.
struct StubVerifier;

impl CertificateVerifier for StubVerifier {
    fn verify<'a>(
        &mut self,
        mut chain: impl Iterator<Item = &'a [u8]>,
        server_name: &str,
        _now_unix: u32,
    ) -> Result<SubjectPublicKey<'a>, Error> {
        assert_eq!(server_name, SERVER_NAME);
        chain.next().map(SubjectPublicKey::Rsa).ok_or(Error::AccessDenied)
    }
}

struct NoIdentity;

impl ClientIdentity for NoIdentity {
    fn certificate_der(&self) -> Option<&[u8]> {
        None
    }

    fn sign(&self, _digest: &[u8], _out: &mut [u8]) -> Result<usize, Error> {
        Err(Error::Unsupported)
    }
}

/// One parsed `TLSPlaintext` record.
struct RawRecord {
    content_type: u8,
    version: [u8; 2],
    fragment: Vec<u8>,
}

fn split_records(mut data: &[u8]) -> Vec<RawRecord> {
    let mut records = Vec::new();
    while !data.is_empty() {
        assert!(data.len() >= 5, "truncated record header");
        let content_type = data[0];
        let version = [data[1], data[2]];
        let len = u16::from_be_bytes([data[3], data[4]]) as usize;
        assert!(data.len() >= 5 + len, "truncated record body");
        let fragment = data[5..5 + len].to_vec();
        records.push(RawRecord { content_type, version, fragment });
        data = &data[5 + len..];
    }
    records
}

/// `(msg_type, body)` of a plaintext handshake message.
fn handshake_message(fragment: &[u8]) -> (u8, &[u8]) {
    let msg_type = fragment[0];
    let len = u32::from_be_bytes([0, fragment[1], fragment[2], fragment[3]]) as usize;
    (msg_type, &fragment[4..4 + len])
}

fn handshake_header(msg_type: u8, body_len: usize) -> [u8; 4] {
    let len = (body_len as u32).to_be_bytes();
    [msg_type, len[1], len[2], len[3]]
}

fn record_header(content_type: u8, version: [u8; 2], len: usize) -> [u8; 5] {
    let len = (len as u16).to_be_bytes();
    [content_type, version[0], version[1], len[0], len[1]]
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// `P_SHA256(secret, seed)`, truncated to `out_len` bytes.
fn p_sha256(secret: &[u8], seed: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(out_len);
    let mut a = hmac_sha256(secret, &[seed]);
    while out.len() < out_len {
        out.extend_from_slice(&hmac_sha256(secret, &[&a, seed]));
        a = hmac_sha256(secret, &[&a]);
    }
    out.truncate(out_len);
    out
}

fn prf(secret: &[u8], label: &[u8], seed_parts: &[&[u8]], out_len: usize) -> Vec<u8> {
    let mut seed = label.to_vec();
    for part in seed_parts {
        seed.extend_from_slice(part);
    }
    p_sha256(secret, &seed, out_len)
}

/// `HMAC(mac_key, seq || type || version || len || fragment)`.
fn record_mac(mac_key: &[u8], seq: u64, content_type: u8, version: [u8; 2], fragment: &[u8]) -> [u8; 32] {
    let pseudo_header = [content_type, version[0], version[1], (fragment.len() >> 8) as u8, fragment.len() as u8];
    hmac_sha256(mac_key, &[&seq.to_be_bytes(), &pseudo_header, fragment])
}

/// Seal one handshake/application-data fragment with AES-128-CBC / HMAC-SHA256
/// and an explicit IV, matching what a TLS 1.2 peer is required to produce.
fn seal_record(content_type: u8, fragment: &[u8], key: &[u8; 16], mac_key: &[u8; 32], seq: u64, rng: &mut impl RngCore) -> Vec<u8> {
    let mac = record_mac(mac_key, seq, content_type, TLS_1_2, fragment);
    let unpadded_len = fragment.len() + mac.len();
    let padding_len = 16 - 1 - (unpadded_len % 16);

    let mut plaintext = Vec::with_capacity(unpadded_len + padding_len + 1);
    plaintext.extend_from_slice(fragment);
    plaintext.extend_from_slice(&mac);
    plaintext.extend(std::iter::repeat(padding_len as u8).take(padding_len + 1));

    let mut iv = [0u8; 16];
    rng.fill_bytes(&mut iv);
    let enc = cbc::Encryptor::<Aes128>::new_from_slices(key, &iv).unwrap();
    let len = plaintext.len();
    enc.encrypt_padded_mut::<NoPadding>(&mut plaintext, len).unwrap();

    let mut out = Vec::with_capacity(5 + 16 + plaintext.len());
    out.extend_from_slice(&record_header(content_type, TLS_1_2, 16 + plaintext.len()));
    out.extend_from_slice(&iv);
    out.extend_from_slice(&plaintext);
    out
}

/// Open a record sealed the same way `seal_record` does, returning the
/// plaintext fragment after checking padding and the MAC.
fn open_record(record: &RawRecord, key: &[u8; 16], mac_key: &[u8; 32], seq: u64) -> Vec<u8> {
    let iv: [u8; 16] = record.fragment[..16].try_into().unwrap();
    let mut body = record.fragment[16..].to_vec();
    let dec = cbc::Decryptor::<Aes128>::new_from_slices(key, &iv).unwrap();
    let body_len = dec.decrypt_padded_mut::<NoPadding>(&mut body).unwrap().len();

    let padding_len = body[body_len - 1] as usize;
    let pad_start = body_len - padding_len - 1;
    assert!(body[pad_start..body_len].iter().all(|&b| b as usize == padding_len));

    let mac_start = pad_start - 32;
    let fragment = body[..mac_start].to_vec();
    let received_mac = &body[mac_start..pad_start];

    let expected_mac = record_mac(mac_key, seq, record.content_type, record.version, &fragment);
    assert_eq!(received_mac, expected_mac, "record MAC mismatch");
    fragment
}

fn new_session<Tp: Transport>(transport: Tp) -> Session<'static, Tp, StubVerifier, NoIdentity, 256> {
    let mut rng = OsRng;
    Session::new(transport, StubVerifier, None::<&NoIdentity>, SERVER_NAME, NOW_UNIX, &mut rng)
}

#[test]
fn full_handshake_and_application_data_round_trip() {
    let mut rng = OsRng;

    // Server-side fixture: a small RSA key, used only to decrypt the
    // ClientKeyExchange and is never treated as a real X.509 certificate.
    let server_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
    let server_pub = RsaPublicKey::from(&server_key);
    let spki_der = server_pub.to_public_key_der().unwrap().as_bytes().to_vec();
    // Exercised once here so a malformed fixture would fail loudly rather
    // than silently producing an unreachable public key later.
    RsaPublicKey::from_public_key_der(&spki_der).unwrap();

    let outbox = Rc::new(RefCell::new(VecDeque::new()));
    let window = Rc::new(Cell::new(u16::MAX));
    let mut session = new_session(ThrottledTransport { outbox: outbox.clone(), window: window.clone() });

    // 1. ClientHello.
    let event = session.process(&mut rng, &[]).unwrap();
    assert_eq!(event, Event::None);
    let sent: Vec<u8> = outbox.borrow_mut().drain(..).collect();
    let records = split_records(&sent);
    assert_eq!(records.len(), 1);
    let (msg_type, body) = handshake_message(&records[0].fragment);
    assert_eq!(msg_type, 1); // ClientHello
    let client_random: [u8; 32] = body[2..34].try_into().unwrap();

    let mut transcript = Sha256::new();
    transcript.update(&records[0].fragment);

    // 2. ServerHello + Certificate + ServerHelloDone, packed into one record.
    let mut server_random = [0u8; 32];
    rng.fill_bytes(&mut server_random);

    let mut server_hello_body = Vec::new();
    server_hello_body.extend_from_slice(&TLS_1_2);
    server_hello_body.extend_from_slice(&server_random);
    server_hello_body.push(0); // session_id_len
    server_hello_body.extend_from_slice(&AES_128_CBC_SHA256);
    server_hello_body.push(0); // null compression
    let mut server_hello_msg = handshake_header(2, server_hello_body.len()).to_vec();
    server_hello_msg.extend_from_slice(&server_hello_body);

    let mut cert_list = Vec::new();
    let cert_len = (spki_der.len() as u32).to_be_bytes();
    cert_list.extend_from_slice(&cert_len[1..]);
    cert_list.extend_from_slice(&spki_der);
    let mut certificate_body = Vec::new();
    let list_len = (cert_list.len() as u32).to_be_bytes();
    certificate_body.extend_from_slice(&list_len[1..]);
    certificate_body.extend_from_slice(&cert_list);
    let mut certificate_msg = handshake_header(11, certificate_body.len()).to_vec();
    certificate_msg.extend_from_slice(&certificate_body);

    let server_hello_done_msg = handshake_header(14, 0).to_vec();

    let mut flight = Vec::new();
    flight.extend_from_slice(&server_hello_msg);
    flight.extend_from_slice(&certificate_msg);
    flight.extend_from_slice(&server_hello_done_msg);
    transcript.update(&flight);

    let mut inbound = record_header(22, TLS_1_2, flight.len()).to_vec();
    inbound.extend_from_slice(&flight);

    // Starve the transport so the client's response flight (ClientKeyExchange,
    // ChangeCipherSpec, Finished) can't go out yet. This forces process_tx to
    // hold the built ClientKeyExchange record across calls rather than
    // discarding and rebuilding it, which would hash it into the transcript
    // twice.
    window.set(0);
    let event = session.process(&mut rng, &inbound).unwrap();
    assert_eq!(event, Event::None);
    assert_eq!(session.state(), State::WaitChangeCipherSpec);
    assert!(outbox.borrow().is_empty(), "starved transport must not have sent anything");

    window.set(u16::MAX);
    let event = session.process(&mut rng, &[]).unwrap();
    assert_eq!(event, Event::None);

    // 3. Client responds with ClientKeyExchange, ChangeCipherSpec, Finished.
    let sent: Vec<u8> = outbox.borrow_mut().drain(..).collect();
    let records = split_records(&sent);
    assert_eq!(records.len(), 3);

    let (msg_type, cke_body) = handshake_message(&records[0].fragment);
    assert_eq!(msg_type, 16); // ClientKeyExchange
    transcript.update(&records[0].fragment);
    let ct_len = u16::from_be_bytes([cke_body[0], cke_body[1]]) as usize;
    let ciphertext = &cke_body[2..2 + ct_len];
    let pre_master_secret = server_key.decrypt(Pkcs1v15Encrypt, ciphertext).unwrap();
    assert_eq!(pre_master_secret.len(), 48);

    assert_eq!(records[1].content_type, 20); // ChangeCipherSpec
    assert_eq!(records[1].fragment, [0x01]);

    let master_secret = prf(&pre_master_secret, b"master secret", &[&client_random, &server_random], 48);
    let key_block = prf(&master_secret, b"key expansion", &[&server_random, &client_random], 128);
    let client_write_mac: [u8; 32] = key_block[0..32].try_into().unwrap();
    let server_write_mac: [u8; 32] = key_block[32..64].try_into().unwrap();
    let client_write_key: [u8; 16] = key_block[64..80].try_into().unwrap();
    let server_write_key: [u8; 16] = key_block[80..96].try_into().unwrap();

    let client_finished_fragment = open_record(&records[2], &client_write_key, &client_write_mac, 0);
    let (msg_type, client_verify_data) = handshake_message(&client_finished_fragment);
    assert_eq!(msg_type, 20); // Finished
    assert_eq!(client_verify_data.len(), 12);

    let transcript_before_client_finished = transcript.clone().finalize();
    let expected_client_verify_data = prf(&master_secret, b"client finished", &[&transcript_before_client_finished], 12);
    assert_eq!(client_verify_data, &expected_client_verify_data[..]);
    transcript.update(&client_finished_fragment);

    // 4. Server responds with ChangeCipherSpec, Finished.
    let transcript_through_client_finished = transcript.clone().finalize();
    let server_verify_data = prf(&master_secret, b"server finished", &[&transcript_through_client_finished], 12);
    let mut server_finished_fragment = handshake_header(20, server_verify_data.len()).to_vec();
    server_finished_fragment.extend_from_slice(&server_verify_data);

    let mut inbound = record_header(20, TLS_1_2, 1).to_vec();
    inbound.push(0x01);
    inbound.extend_from_slice(&seal_record(22, &server_finished_fragment, &server_write_key, &server_write_mac, 0, &mut rng));

    let event = session.process(&mut rng, &inbound).unwrap();
    assert_eq!(event, Event::HandshakeFinished);
    assert!(session.connected());
    assert_eq!(session.state(), State::Connected);

    // 5. Application data, client to server.
    session.write_all(&mut rng, b"hello server").unwrap();
    let sent: Vec<u8> = outbox.borrow_mut().drain(..).collect();
    let records = split_records(&sent);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content_type, 23); // ApplicationData
    let plaintext = open_record(&records[0], &client_write_key, &client_write_mac, 1);
    assert_eq!(plaintext, b"hello server");

    // 6. Application data, server to client.
    let app_data = seal_record(23, b"hello client", &server_write_key, &server_write_mac, 1, &mut rng);
    let event = session.process(&mut rng, &app_data).unwrap();
    assert_eq!(event, Event::ApplicationData);
    let mut buf = [0u8; 32];
    let n = session.read(&mut buf);
    assert_eq!(&buf[..n], b"hello client");

    // 7. Graceful shutdown.
    session.close(&mut rng);
    assert_eq!(session.state(), State::Closed);
    assert!(!outbox.borrow().is_empty());
}

#[test]
fn malformed_content_type_closes_the_session() {
    let mut rng = OsRng;
    let outbox = Rc::new(RefCell::new(VecDeque::new()));
    let mut session = new_session(LoopbackTransport { outbox });

    let bad_record = [0xFFu8, 0x03, 0x03, 0x00, 0x01, 0x00];
    let result = session.process(&mut rng, &bad_record);
    assert!(result.is_err());
    assert_eq!(session.state(), State::Closed);
}
