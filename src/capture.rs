use std::fmt;

use crate::cursor::Cursor;
use crate::enc::ENC_SIGNATURE;
use crate::error::{ContainerError, DecodeError};
use crate::linktype::Linktype;
use crate::pcap::{PCAP_MAGIC, PCAP_MAGIC_SWAPPED};
use crate::pcapng::SHB_MAGIC;

/// Framing of one captured packet, common to all container formats
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RecordHeader {
    pub ts_sec: u32,
    pub ts_usec: u32,
    /// Number of frame bytes stored in the capture
    pub caplen: u32,
    /// Length of the frame on the wire
    pub origlen: u32,
}

impl RecordHeader {
    /// Capture time in seconds
    pub fn timestamp(&self) -> f64 {
        f64::from(self.ts_sec) + f64::from(self.ts_usec) / 1_000_000.0
    }

    /// True if the frame was cut by the capture's snapshot length
    pub fn is_truncated(&self) -> bool {
        self.caplen < self.origlen
    }
}

/// A record header together with the captured frame bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureRecord<'a> {
    pub header: RecordHeader,
    pub data: &'a [u8],
}

/// Reader for one capture container format
///
/// A container is a global header, validated once, followed by a sequence of self-describing
/// records. Implementations only frame records: the bytes following a record header (exactly
/// `caplen` of them) are left to the caller.
///
/// The header doubles as the reader state. Formats whose records carry more than the frame
/// (block padding, options) record the leftover there and skip it on the next call. A call that
/// fails leaves the state as it found it, so a streaming caller can retry with more data.
pub trait CaptureContainer {
    type Header: fmt::Debug;

    /// Short human-readable format name
    const NAME: &'static str;

    /// Read and validate the global header
    ///
    /// A capture that is not of this format, or does not carry Ethernet frames, is rejected.
    fn read_global_header(cursor: &mut Cursor<'_>) -> Result<Self::Header, ContainerError>;

    fn linktype(header: &Self::Header) -> Linktype;

    /// Read the next record header
    ///
    /// Returns `Ok(None)` when the capture ends cleanly at a record boundary.
    /// A partially present header is [`DecodeError::UnexpectedEndOfData`].
    fn read_record_header(
        header: &mut Self::Header,
        cursor: &mut Cursor<'_>,
    ) -> Result<Option<RecordHeader>, DecodeError>;
}

/// Tag selecting a container format
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaptureFormat {
    Pcap,
    Enc,
    Pcapng,
}

impl CaptureFormat {
    /// Recognize a capture format by its leading magic bytes
    pub fn detect(i: &[u8]) -> Option<CaptureFormat> {
        if i.starts_with(ENC_SIGNATURE) {
            return Some(CaptureFormat::Enc);
        }
        if i.len() >= 4 {
            let magic = u32::from_le_bytes([i[0], i[1], i[2], i[3]]);
            if magic == PCAP_MAGIC || magic == PCAP_MAGIC_SWAPPED {
                return Some(CaptureFormat::Pcap);
            }
            // palindromic, so the same in either byte order
            if magic == SHB_MAGIC {
                return Some(CaptureFormat::Pcapng);
            }
        }
        None
    }

    pub fn name(self) -> &'static str {
        match self {
            CaptureFormat::Pcap => crate::pcap::PcapFormat::NAME,
            CaptureFormat::Enc => crate::enc::EncFormat::NAME,
            CaptureFormat::Pcapng => crate::pcapng::PcapngFormat::NAME,
        }
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
