#![no_main]
use libfuzzer_sys::fuzz_target;
use nanotls::{CertificateVerifier, ClientIdentity, Error, Session, SubjectPublicKey, Transport};

struct SinkTransport;

impl Transport for SinkTransport {
    type Error = ();
    fn deliver(&mut self, _data: &[u8]) -> Result<(), ()> {
        Ok(())
    }
    fn window(&self) -> u16 {
        u16::MAX
    }
    fn close(&mut self, _reason: Error) {}
}

/// Hands back whatever chain entry it was given, so the fuzzer reaches the
/// `ClientKeyExchange` code path regardless of what garbage the "leaf" is.
struct AcceptFirst;

impl CertificateVerifier for AcceptFirst {
    fn verify<'a>(
        &mut self,
        mut chain: impl Iterator<Item = &'a [u8]>,
        _server_name: &str,
        _now_unix: u32,
    ) -> Result<SubjectPublicKey<'a>, Error> {
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

fuzz_target!(|data: &[u8]| {
    let mut rng = rand_core::OsRng;
    let mut session: Session<SinkTransport, AcceptFirst, NoIdentity, 512> = Session::new(
        SinkTransport,
        AcceptFirst,
        None,
        "fuzz.invalid",
        0,
        &mut rng,
    );

    // Walk the corpus in variable-length chunks, sized off the data itself,
    // so both whole-record and byte-at-a-time reassembly paths see traffic.
    let mut offset = 0;
    while offset < data.len() {
        let chunk_len = (data[offset] as usize % 64) + 1;
        offset += 1;
        let end = (offset + chunk_len).min(data.len());
        if session.process(&mut rng, &data[offset..end]).is_err() {
            break;
        }
        offset = end;
    }
});
