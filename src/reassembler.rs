//! Inbound byte-stream reassembly into complete TLS records, and the
//! plaintext application-data ring the public reader API drains.
//!
//! # References
//!
//! * [RFC 5246 Section 6.2.1](https://datatracker.ietf.org/doc/html/rfc5246#section-6.2.1)

use crate::error::Error;
use crate::fmt::error;
use crate::record::RecordHeader;
use crate::record_layer::MAX_CIPHERTEXT_LEN;

/// Byte-stream reassembler: `AWAIT_HEADER` collects the 5-byte record
/// header, `AWAIT_BODY` collects the declared-length fragment. Unlike the
/// teacher's `Buffer<N>`, this holds at most one record at a time in a
/// one-shot scratch buffer — a TLS record is always fully consumed by the
/// record layer before the next one begins, so there is no need for the
/// teacher's four-pointer ring that lets application data and handshake
/// fragments share one buffer without copying.
pub(crate) struct Reassembler {
    header_buf: [u8; RecordHeader::LEN],
    header_filled: usize,
    header: Option<RecordHeader>,
    body: heapless::Vec<u8, MAX_CIPHERTEXT_LEN>,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self {
            header_buf: [0; RecordHeader::LEN],
            header_filled: 0,
            header: None,
            body: heapless::Vec::new(),
        }
    }
}

impl Reassembler {
    /// Feed newly-received bytes in. `on_record` is invoked once per fully
    /// reassembled record with the parsed header and a mutable view of the
    /// ciphertext body (mutable so the record layer can decrypt in place).
    pub(crate) fn feed(
        &mut self,
        mut data: &[u8],
        mut on_record: impl FnMut(RecordHeader, &mut [u8]) -> Result<(), Error>,
    ) -> Result<(), Error> {
        while !data.is_empty() {
            match self.header {
                None => {
                    let need = RecordHeader::LEN - self.header_filled;
                    let take = need.min(data.len());
                    self.header_buf[self.header_filled..self.header_filled + take]
                        .copy_from_slice(&data[..take]);
                    self.header_filled += take;
                    data = &data[take..];

                    if self.header_filled == RecordHeader::LEN {
                        let header = RecordHeader::deser(self.header_buf)?;
                        let len = header.length() as usize;
                        if len > MAX_CIPHERTEXT_LEN {
                            error!("record length {} exceeds maximum", len);
                            return Err(Error::InvalidInput);
                        }
                        self.body.clear();
                        self.header = Some(header);
                        self.header_filled = 0;
                    }
                }
                Some(header) => {
                    let need = header.length() as usize - self.body.len();
                    let take = need.min(data.len());
                    self.body
                        .extend_from_slice(&data[..take])
                        .map_err(|_| Error::Allocation)?;
                    data = &data[take..];

                    if self.body.len() == header.length() as usize {
                        on_record(header, &mut self.body)?;
                        self.header = None;
                        self.body.clear();
                    }
                }
            }
        }
        Ok(())
    }
}

/// A single-producer, single-consumer byte ring for decrypted application
/// data awaiting the caller's reader API.
pub(crate) struct AppDataRing<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> Default for AppDataRing<N> {
    fn default() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }
}

impl<const N: usize> AppDataRing<N> {
    const fn capacity(&self) -> usize {
        N - 1
    }

    fn len(&self) -> usize {
        if self.tail < self.head {
            self.tail + N - self.head
        } else {
            self.tail - self.head
        }
    }

    fn remain(&self) -> usize {
        self.capacity() - self.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub(crate) fn push(&mut self, src: &[u8]) -> Result<(), Error> {
        if src.len() > self.remain() {
            error!("app data ring full: {} > {}", src.len(), self.remain());
            return Err(Error::Allocation);
        }
        for &byte in src {
            self.buf[self.tail] = byte;
            self.tail = (self.tail + 1) % N;
        }
        Ok(())
    }

    pub(crate) fn read(&mut self, out: &mut [u8]) -> usize {
        let mut n = 0;
        while n < out.len() && self.head != self.tail {
            out[n] = self.buf[self.head];
            self.head = (self.head + 1) % N;
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContentType;
    use crate::version::TlsVersion;

    #[test]
    fn reassembles_a_record_delivered_in_one_chunk() {
        let mut reassembler = Reassembler::default();
        let header = RecordHeader::ser(ContentType::Handshake, TlsVersion::V1_2, 3);
        let mut wire = header.as_bytes().to_vec();
        wire.extend_from_slice(&[1, 2, 3]);

        let mut seen = None;
        reassembler
            .feed(&wire, |h, body| {
                seen = Some((h.length(), body.to_vec()));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, Some((3, vec![1, 2, 3])));
    }

    #[test]
    fn reassembles_a_record_delivered_byte_at_a_time() {
        let mut reassembler = Reassembler::default();
        let header = RecordHeader::ser(ContentType::Alert, TlsVersion::V1_2, 2);
        let mut wire = header.as_bytes().to_vec();
        wire.extend_from_slice(&[0xAA, 0xBB]);

        let mut seen = None;
        for byte in &wire {
            reassembler
                .feed(&[*byte], |h, body| {
                    seen = Some((h.length(), body.to_vec()));
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(seen, Some((2, vec![0xAA, 0xBB])));
    }

    #[test]
    fn app_data_ring_round_trips() {
        let mut ring: AppDataRing<8> = AppDataRing::default();
        ring.push(&[1, 2, 3]).unwrap();
        let mut out = [0u8; 3];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(out, [1, 2, 3]);
        assert!(ring.is_empty());
    }

    #[test]
    fn app_data_ring_rejects_overflow() {
        let mut ring: AppDataRing<4> = AppDataRing::default();
        assert!(ring.push(&[1, 2, 3, 4]).is_err());
    }
}
