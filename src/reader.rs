//! Streaming capture reader
//!
//! [`CaptureReader`] frames records from any [`Read`] source through a circular buffer, so
//! memory usage stays bounded by the largest record instead of the capture size.

use std::io::Read;
use std::marker::PhantomData;

use circular::Buffer;

use crate::capture::{CaptureContainer, CaptureRecord};
use crate::cursor::Cursor;
use crate::error::{ContainerError, DecodeError, ScanError};

pub const DEFAULT_BUFFER_CAPACITY: usize = 65536;

/// Records larger than this are refused instead of growing the buffer
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

const MIN_BUFFER_CAPACITY: usize = 64;

/// Outcome of [`CaptureReader::next`]
#[derive(Debug)]
pub enum ReadStep<'a> {
    Record(CaptureRecord<'a>),
    /// The capture ended on a record boundary or with an end-of-file record
    End,
    /// The source ended in the middle of a record
    Truncated,
}

/// Streaming record reader over a circular buffer
///
/// The global header is read and validated by [`new`](CaptureReader::new). Each call to
/// [`next`](CaptureReader::next) releases the previously returned record, refills the buffer
/// as needed and returns the next complete record. The buffer grows when a record, or a
/// record header the format needs in one piece, does not fit, up to [`MAX_RECORD_SIZE`].
///
/// ## Example
///
/// ```rust
/// use capture_dissector::pcap::PcapFormat;
/// use capture_dissector::{CaptureReader, ReadStep};
///
/// # let data: &[u8] = &[
/// #     0xd4, 0xc3, 0xb2, 0xa1, 2, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0,
/// #     0xff, 0xff, 0, 0, 1, 0, 0, 0,
/// # ];
/// let mut reader = CaptureReader::<_, PcapFormat>::new(65536, data).expect("CaptureReader");
/// let mut num_records = 0;
/// loop {
///     match reader.next() {
///         Ok(ReadStep::Record(record)) => {
///             num_records += 1;
///             println!("{} bytes at {}", record.data.len(), record.header.timestamp());
///         }
///         Ok(ReadStep::End) => break,
///         Ok(ReadStep::Truncated) => {
///             println!("last record is incomplete");
///             break;
///         }
///         Err(e) => panic!("error while reading: {}", e),
///     }
/// }
/// println!("num_records: {}", num_records);
/// ```
pub struct CaptureReader<R, C>
where
    R: Read,
    C: CaptureContainer,
{
    header: C::Header,
    reader: R,
    buffer: Buffer,
    consumed: usize,
    pending: usize,
    records: u64,
    reader_exhausted: bool,
    _format: PhantomData<C>,
}

/// Shift the buffer and read more data; returns true once the source is exhausted
fn refill<R: Read>(buffer: &mut Buffer, reader: &mut R) -> Result<bool, ScanError> {
    buffer.shift();
    let space = buffer.space();
    // a read() of 0 bytes only means EOF if some space was offered
    if space.is_empty() {
        return Ok(false);
    }
    let sz = reader.read(space)?;
    buffer.fill(sz);
    Ok(sz == 0)
}

impl<R, C> CaptureReader<R, C>
where
    R: Read,
    C: CaptureContainer,
{
    /// Creates a new `CaptureReader<R, C>` with the provided buffer capacity.
    pub fn new(capacity: usize, reader: R) -> Result<Self, ScanError> {
        let buffer = Buffer::with_capacity(capacity.max(MIN_BUFFER_CAPACITY));
        Self::from_buffer(buffer, reader)
    }

    /// Creates a new `CaptureReader<R, C>` using the provided `Buffer`.
    pub fn from_buffer(mut buffer: Buffer, mut reader: R) -> Result<Self, ScanError> {
        let mut reader_exhausted = false;
        loop {
            let mut cursor = Cursor::new(buffer.data());
            match C::read_global_header(&mut cursor) {
                Ok(header) => {
                    let consumed = cursor.position();
                    buffer.consume(consumed);
                    return Ok(CaptureReader {
                        header,
                        reader,
                        buffer,
                        consumed,
                        pending: 0,
                        records: 0,
                        reader_exhausted,
                        _format: PhantomData,
                    });
                }
                Err(ContainerError::UnexpectedEndOfData) if !reader_exhausted => {
                    let available = buffer.available_data();
                    if available == buffer.capacity() {
                        if available >= MAX_RECORD_SIZE {
                            return Err(ScanError::RecordTooLarge(available));
                        }
                        buffer.grow((available * 2).min(MAX_RECORD_SIZE));
                    }
                    reader_exhausted = refill(&mut buffer, &mut reader)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Validated global header
    pub fn header(&self) -> &C::Header {
        &self.header
    }

    /// Container bytes consumed so far, including the last returned record
    pub fn consumed(&self) -> usize {
        self.consumed + self.pending
    }

    fn release(&mut self, n: usize) {
        self.buffer.consume(n);
        self.consumed += n;
    }

    pub fn next(&mut self) -> Result<ReadStep<'_>, ScanError> {
        let pending = std::mem::take(&mut self.pending);
        self.release(pending);
        loop {
            if self.buffer.available_data() == 0 {
                if self.reader_exhausted {
                    return Ok(ReadStep::End);
                }
                self.reader_exhausted = refill(&mut self.buffer, &mut self.reader)?;
                continue;
            }
            let step = {
                let mut cursor = Cursor::new(self.buffer.data());
                C::read_record_header(&mut self.header, &mut cursor)
                    .map(|record| (record, cursor.position()))
            };
            match step {
                Ok((Some(header), start)) => {
                    let end = start + header.caplen as usize;
                    if end <= self.buffer.available_data() {
                        self.pending = end;
                        self.records += 1;
                        let data = &self.buffer.data()[start..end];
                        return Ok(ReadStep::Record(CaptureRecord { header, data }));
                    }
                    if end > MAX_RECORD_SIZE {
                        return Err(ScanError::RecordTooLarge(end));
                    }
                    if end > self.buffer.capacity() {
                        self.buffer.grow(end);
                    }
                }
                Ok((None, used)) => {
                    self.release(used);
                    return Ok(ReadStep::End);
                }
                Err(DecodeError::UnexpectedEndOfData) => {
                    // a full buffer holding no complete header cannot be refilled
                    let available = self.buffer.available_data();
                    if available == self.buffer.capacity() {
                        if available >= MAX_RECORD_SIZE {
                            return Err(ScanError::RecordTooLarge(available));
                        }
                        self.buffer.grow((available * 2).min(MAX_RECORD_SIZE));
                    }
                }
                Err(source) => {
                    return Err(ScanError::Packet {
                        number: self.records + 1,
                        source,
                    })
                }
            }
            if self.reader_exhausted {
                return Ok(ReadStep::Truncated);
            }
            self.reader_exhausted = refill(&mut self.buffer, &mut self.reader)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcap::PcapFormat;
    use hex_literal::hex;

    const PCAP: &[u8] = &hex!(
        "
D4 C3 B2 A1 02 00 04 00 00 00 00 00 00 00 00 00
FF FF 00 00 01 00 00 00
01 00 00 00 02 00 00 00 02 00 00 00 02 00 00 00 AA BB
03 00 00 00 04 00 00 00 50 00 00 00 50 00 00 00"
    );

    #[test]
    fn records_then_truncation() {
        let mut frame = PCAP.to_vec();
        frame.extend_from_slice(&[0x55; 0x50]);
        // tiny buffer: the 80-byte record forces a grow
        let mut reader = CaptureReader::<_, PcapFormat>::new(16, &frame[..]).expect("reader");
        assert_eq!(reader.consumed(), 24);
        match reader.next().expect("first") {
            ReadStep::Record(r) => assert_eq!(r.data, &hex!("AA BB")),
            other => panic!("unexpected step {:?}", other),
        }
        match reader.next().expect("second") {
            ReadStep::Record(r) => assert_eq!(r.data.len(), 0x50),
            other => panic!("unexpected step {:?}", other),
        }
        assert!(matches!(reader.next(), Ok(ReadStep::End)));
        assert_eq!(reader.consumed(), frame.len());

        let cut = &frame[..frame.len() - 1];
        let mut reader = CaptureReader::<_, PcapFormat>::new(4096, cut).expect("reader");
        assert!(matches!(reader.next(), Ok(ReadStep::Record(_))));
        assert!(matches!(reader.next(), Ok(ReadStep::Truncated)));
        assert_eq!(reader.consumed(), 42);
    }

    #[test]
    fn bad_magic() {
        let mut input = PCAP.to_vec();
        input[0] = 0;
        assert!(matches!(
            CaptureReader::<_, PcapFormat>::new(4096, &input[..]),
            Err(ScanError::Container(ContainerError::UnknownMagic(_)))
        ));
    }

    #[test]
    fn oversized_record() {
        let mut input = PCAP[..24].to_vec();
        input.extend_from_slice(&hex!("00 00 00 00 00 00 00 00 00 00 00 7F 00 00 00 7F"));
        let mut reader = CaptureReader::<_, PcapFormat>::new(4096, &input[..]).expect("reader");
        assert!(matches!(reader.next(), Err(ScanError::RecordTooLarge(_))));
    }
}
