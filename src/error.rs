use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

use crate::ethernet::EtherType;
use crate::ip::IpProtocol;
use crate::linktype::Linktype;

/// Failure while reading a capture global header
///
/// Any of these aborts the whole capture before a single packet is read.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ContainerError {
    #[error("unknown PCAP magic number {0:#010x}")]
    UnknownMagic(u32),
    #[error("capture header not recognized")]
    HeaderNotRecognized,
    #[error("unsupported link-layer type {0}")]
    UnsupportedLinktype(Linktype),
    #[error("capture header field {field} is {found}, expected {expected}")]
    UnexpectedHeaderField {
        field: &'static str,
        found: i64,
        expected: i64,
    },
    #[error("invalid timestamp units {0}")]
    InvalidTimestampUnits(u8),
    #[error("capture too short for its global header")]
    UnexpectedEndOfData,
    #[error("nom error: {0:?}")]
    Nom(ErrorKind),
}

impl<I> ParseError<I> for ContainerError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Complete => ContainerError::UnexpectedEndOfData,
            _ => ContainerError::Nom(kind),
        }
    }
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Failure while decoding one packet record or one of its layers
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of data")]
    UnexpectedEndOfData,
    #[error("{protocol}: {needed} bytes required, {available} available")]
    TruncatedPacket {
        protocol: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("{protocol}: header length {length} outside {min}..={max}")]
    InvalidHeaderLength {
        protocol: &'static str,
        length: usize,
        min: usize,
        max: usize,
    },
    #[error("{protocol}: length {declared} is shorter than the {header}-byte header")]
    InvalidLength {
        protocol: &'static str,
        declared: usize,
        header: usize,
    },
    #[error("{protocol}: length field {declared} does not match enclosing length {expected}")]
    LengthMismatch {
        protocol: &'static str,
        declared: usize,
        expected: usize,
    },
    #[error("{protocol}: unexpected version {version}")]
    InvalidVersion { protocol: &'static str, version: u8 },
    #[error("unknown EtherType {0}")]
    UnknownEtherType(EtherType),
    #[error("unknown IP protocol {0}")]
    UnknownProtocol(IpProtocol),
    #[error("unsupported protocol {0}")]
    UnsupportedProtocol(&'static str),
    #[error("more than {0} stacked VLAN tags")]
    TooManyVlanTags(usize),
    #[error("unexpected capture record type {0}")]
    UnexpectedRecordType(u16),
    #[error("unsupported link-layer type {0}")]
    UnsupportedLinktype(Linktype),
    #[error("record references undeclared interface {0}")]
    UnknownInterface(u32),
    #[error("invalid timestamp resolution {0:#04x}")]
    InvalidTimestampResolution(u8),
    #[error("section header: {0}")]
    InvalidSection(ContainerError),
    #[error("nom error: {0:?}")]
    Nom(ErrorKind),
}

impl DecodeError {
    /// True if the error means the bytes ran out, as opposed to bytes that are present but invalid
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            DecodeError::UnexpectedEndOfData | DecodeError::TruncatedPacket { .. }
        )
    }
}

impl<I> ParseError<I> for DecodeError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Complete => DecodeError::UnexpectedEndOfData,
            _ => DecodeError::Nom(kind),
        }
    }
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Failure of a whole capture scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("packet #{number}: {source}")]
    Packet { number: u64, source: DecodeError },
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record of {0} bytes exceeds the maximum record size")]
    RecordTooLarge(usize),
}
