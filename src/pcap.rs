//! PCAP file format
//!
//! See <https://wiki.wireshark.org/Development/LibpcapFileFormat> for details.
//!
//! A PCAP file is a 24-byte global header followed by records, each a 16-byte header and
//! `caplen` bytes of frame data. The magic number decides the byte order of every other
//! container field; frame contents are always in network order.
//!
//! [`parse_pcap_header`] and [`parse_pcap_record_header`] are plain nom parsers.
//! [`PcapFormat`] plugs them into the [`CaptureContainer`] contract used by the scanner.

mod header;
mod record;

pub use header::*;
pub use record::*;

use crate::capture::{CaptureContainer, RecordHeader};
use crate::cursor::Cursor;
use crate::error::{ContainerError, DecodeError};
use crate::linktype::Linktype;

/// Legacy PCAP container (microsecond timestamps, either byte order)
#[derive(Clone, Copy, Debug, Default)]
pub struct PcapFormat;

impl CaptureContainer for PcapFormat {
    type Header = PcapHeader;

    const NAME: &'static str = "PCAP";

    fn read_global_header(cursor: &mut Cursor<'_>) -> Result<PcapHeader, ContainerError> {
        let header = cursor.parse(parse_pcap_header)?;
        if !header.network.is_ethernet() {
            return Err(ContainerError::UnsupportedLinktype(header.network));
        }
        if !header.is_expected_version() {
            tracing::debug!(
                major = header.version_major,
                minor = header.version_minor,
                "unexpected PCAP version, continuing"
            );
        }
        Ok(header)
    }

    fn linktype(header: &PcapHeader) -> Linktype {
        header.network
    }

    fn read_record_header(
        header: &mut PcapHeader,
        cursor: &mut Cursor<'_>,
    ) -> Result<Option<RecordHeader>, DecodeError> {
        if cursor.at_end() {
            return Ok(None);
        }
        cursor
            .parse(parse_pcap_record_header(header.endianness()))
            .map(Some)
    }
}
