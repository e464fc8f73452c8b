//! Capture scan loop: container framing, frame dissection and failure policy

use std::io::Read;

use tracing::{debug, info};

use crate::capture::{CaptureContainer, CaptureFormat, RecordHeader};
use crate::context::{DecodeContext, ErrorSink, PacketObserver, TracingSink};
use crate::cursor::Cursor;
use crate::enc::EncFormat;
use crate::error::{DecodeError, ScanError};
use crate::ethernet::decode_ethernet;
use crate::pcap::PcapFormat;
use crate::pcapng::PcapngFormat;
use crate::reader::{CaptureReader, ReadStep, DEFAULT_BUFFER_CAPACITY};

/// What to do when one packet fails validation
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketErrorPolicy {
    /// Stop the scan and return the error
    Abort,
    /// Count the packet as skipped and continue at the next record
    Resync,
}

impl Default for PacketErrorPolicy {
    fn default() -> Self {
        PacketErrorPolicy::Abort
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanOptions {
    pub packet_error_policy: PacketErrorPolicy,
    /// Number of stacked 802.1Q tags accepted in one frame
    pub max_vlan_tags: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            packet_error_policy: PacketErrorPolicy::default(),
            max_vlan_tags: 1,
        }
    }
}

/// How a successful scan ended
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Termination {
    /// The data ended on a record boundary, or with an end-of-file record
    CleanEnd,
    /// The last record, starting at `offset`, is incomplete and was discarded
    TruncatedRecord { offset: usize },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanSummary {
    /// Complete records read
    pub packets: u64,
    /// Records whose frame decoded without error
    pub decoded: u64,
    /// Records dropped under [`PacketErrorPolicy::Resync`]
    pub skipped: u64,
    /// Snapshot-truncated records whose frame ran out before its headers did
    pub snapshot_truncated: u64,
    /// Container bytes consumed, global header included
    pub bytes_consumed: usize,
    pub termination: Termination,
}

impl Default for ScanSummary {
    fn default() -> Self {
        ScanSummary {
            packets: 0,
            decoded: 0,
            skipped: 0,
            snapshot_truncated: 0,
            bytes_consumed: 0,
            termination: Termination::CleanEnd,
        }
    }
}

/// Drives a container reader and the Ethernet dissector over a whole capture
///
/// Packets are processed strictly in order. Every failure is reported to the sink before
/// it propagates or is counted.
pub struct Scanner<S, O> {
    options: ScanOptions,
    sink: S,
    observer: O,
}

impl<S: ErrorSink, O: PacketObserver> Scanner<S, O> {
    pub fn new(sink: S, observer: O) -> Self {
        Scanner::with_options(ScanOptions::default(), sink, observer)
    }

    pub fn with_options(options: ScanOptions, sink: S, observer: O) -> Self {
        Scanner {
            options,
            sink,
            observer,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn into_parts(self) -> (S, O) {
        (self.sink, self.observer)
    }

    /// Scan a capture held in memory, with the format given by `format`
    pub fn scan_format(
        &mut self,
        format: CaptureFormat,
        data: &[u8],
    ) -> Result<ScanSummary, ScanError> {
        match format {
            CaptureFormat::Pcap => self.scan::<PcapFormat>(data),
            CaptureFormat::Enc => self.scan::<EncFormat>(data),
            CaptureFormat::Pcapng => self.scan::<PcapngFormat>(data),
        }
    }

    /// Scan a capture held in memory
    pub fn scan<C: CaptureContainer>(&mut self, data: &[u8]) -> Result<ScanSummary, ScanError> {
        let mut cursor = Cursor::new(data);
        let mut header = match C::read_global_header(&mut cursor) {
            Ok(header) => header,
            Err(e) => {
                self.sink.report(&format!("{} capture: {}", C::NAME, e));
                return Err(e.into());
            }
        };
        debug!(
            format = C::NAME,
            linktype = %C::linktype(&header),
            ?header,
            "capture header accepted"
        );
        let mut summary = ScanSummary::default();
        loop {
            let offset = cursor.position();
            let number = summary.packets + 1;
            // a record is committed only once its header and frame are both present
            let mut next = cursor.clone();
            let record = match C::read_record_header(&mut header, &mut next) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    cursor = next;
                    break;
                }
                Err(DecodeError::UnexpectedEndOfData) => {
                    self.report_truncated_record(number, offset, &mut summary);
                    break;
                }
                Err(e) => {
                    self.sink.report(&format!("packet #{}: {}", number, e));
                    return Err(ScanError::Packet { number, source: e });
                }
            };
            let frame = match next.read_bytes(record.caplen as usize) {
                Ok(frame) => frame,
                Err(_) => {
                    self.report_truncated_record(number, offset, &mut summary);
                    break;
                }
            };
            cursor = next;
            summary.packets = number;
            self.process_record(number, &record, frame, &mut summary)?;
        }
        summary.bytes_consumed = cursor.position();
        info!(
            packets = summary.packets,
            skipped = summary.skipped,
            "{} scan finished",
            C::NAME
        );
        Ok(summary)
    }

    /// Scan a capture from a reader, holding at most one record in memory at a time
    pub fn scan_reader<C: CaptureContainer, R: Read>(
        &mut self,
        reader: R,
    ) -> Result<ScanSummary, ScanError> {
        let mut reader = match CaptureReader::<R, C>::new(DEFAULT_BUFFER_CAPACITY, reader) {
            Ok(reader) => reader,
            Err(e) => {
                self.sink.report(&format!("{} capture: {}", C::NAME, e));
                return Err(e);
            }
        };
        debug!(
            format = C::NAME,
            linktype = %C::linktype(reader.header()),
            header = ?reader.header(),
            "capture header accepted"
        );
        let mut summary = ScanSummary::default();
        loop {
            let offset = reader.consumed();
            let number = summary.packets + 1;
            match reader.next() {
                Ok(ReadStep::Record(record)) => {
                    summary.packets = number;
                    self.process_record(number, &record.header, record.data, &mut summary)?;
                }
                Ok(ReadStep::End) => break,
                Ok(ReadStep::Truncated) => {
                    self.report_truncated_record(number, offset, &mut summary);
                    break;
                }
                Err(e @ ScanError::Packet { .. }) => {
                    self.sink.report(&e.to_string());
                    return Err(e);
                }
                Err(e) => {
                    self.sink.report(&format!("packet #{}: {}", number, e));
                    return Err(e);
                }
            }
        }
        summary.bytes_consumed = reader.consumed();
        info!(
            packets = summary.packets,
            skipped = summary.skipped,
            "{} scan finished",
            C::NAME
        );
        Ok(summary)
    }

    fn report_truncated_record(&mut self, number: u64, offset: usize, summary: &mut ScanSummary) {
        self.sink.report(&format!(
            "packet #{}: record at offset {} is truncated, stopping",
            number, offset
        ));
        summary.termination = Termination::TruncatedRecord { offset };
    }

    /// Dissect one record's frame and apply the failure policy
    fn process_record(
        &mut self,
        number: u64,
        record: &RecordHeader,
        frame: &[u8],
        summary: &mut ScanSummary,
    ) -> Result<(), ScanError> {
        let result = {
            let mut ctx = DecodeContext::new(
                number,
                record.timestamp(),
                self.options.max_vlan_tags,
                &mut self.sink,
                &mut self.observer,
            );
            decode_ethernet(&mut Cursor::new(frame), &mut ctx)
        };
        match result {
            Ok(decoded) => {
                summary.decoded += 1;
                self.observer.on_packet(number, record, &decoded);
                Ok(())
            }
            Err(e) if e.is_truncation() && record.is_truncated() => {
                if e == DecodeError::UnexpectedEndOfData {
                    self.sink.report(&format!(
                        "packet #{}: frame cut at {} of {} bytes",
                        number, record.caplen, record.origlen
                    ));
                }
                summary.snapshot_truncated += 1;
                Ok(())
            }
            Err(e) => {
                if e == DecodeError::UnexpectedEndOfData {
                    self.sink
                        .report(&format!("packet #{}: {}", number, e));
                }
                match self.options.packet_error_policy {
                    PacketErrorPolicy::Abort => Err(ScanError::Packet { number, source: e }),
                    PacketErrorPolicy::Resync => {
                        debug!(number, error = %e, "skipping packet");
                        summary.skipped += 1;
                        Ok(())
                    }
                }
            }
        }
    }
}

/// Scan an in-memory capture with default options, reporting failures through `tracing`
pub fn scan_capture(format: CaptureFormat, data: &[u8]) -> Result<ScanSummary, ScanError> {
    Scanner::new(TracingSink, ()).scan_format(format, data)
}
