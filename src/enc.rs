//! Network Associates Sniffer (ENC) file format
//!
//! A Sniffer capture starts with a fixed signature and a version record, then a sequence of
//! typed records. Only TYPE2 records carry frames: a 14-byte descriptor (timestamp, stored
//! and true length) followed by the frame bytes. An EOF record ends the capture. Every
//! container field is little-endian.

mod header;
mod record;

pub use header::*;
pub use record::*;

use crate::capture::{CaptureContainer, RecordHeader};
use crate::cursor::Cursor;
use crate::error::{ContainerError, DecodeError};
use crate::linktype::Linktype;

/// A validated ENC global header with its resolved tick duration
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncCaptureInfo {
    pub header: EncHeader,
    pub tick_picoseconds: u64,
}

/// Sniffer ENC container
#[derive(Clone, Copy, Debug, Default)]
pub struct EncFormat;

fn expect_field(field: &'static str, found: i64, expected: i64) -> Result<(), ContainerError> {
    if found == expected {
        Ok(())
    } else {
        Err(ContainerError::UnexpectedHeaderField {
            field,
            found,
            expected,
        })
    }
}

impl CaptureContainer for EncFormat {
    type Header = EncCaptureInfo;

    const NAME: &'static str = "ENC";

    fn read_global_header(cursor: &mut Cursor<'_>) -> Result<EncCaptureInfo, ContainerError> {
        let header = cursor.parse(parse_enc_header)?;
        expect_field(
            "record type",
            header.record_type.0.into(),
            EncRecordType::VERSION.0.into(),
        )?;
        expect_field("major version", header.version_major.into(), 4)?;
        expect_field("minor version", header.version_minor.into(), 0)?;
        expect_field("file type", header.file_type.into(), 4)?;
        expect_field("format version", header.format_version.into(), 1)?;
        if !header.linktype().is_ethernet() {
            return Err(ContainerError::UnsupportedLinktype(header.linktype()));
        }
        let tick_picoseconds = header
            .tick_picoseconds()
            .ok_or(ContainerError::InvalidTimestampUnits(header.timestamp_units))?;
        Ok(EncCaptureInfo {
            header,
            tick_picoseconds,
        })
    }

    fn linktype(info: &EncCaptureInfo) -> Linktype {
        info.header.linktype()
    }

    fn read_record_header(
        info: &mut EncCaptureInfo,
        cursor: &mut Cursor<'_>,
    ) -> Result<Option<RecordHeader>, DecodeError> {
        if cursor.at_end() {
            return Ok(None);
        }
        let (record_type, _length) = cursor.parse(parse_enc_record_header)?;
        match record_type {
            EncRecordType::EOF => Ok(None),
            EncRecordType::TYPE2 => {
                let descriptor = cursor.parse(parse_enc_frame_descriptor)?;
                Ok(Some(descriptor.record_header(info.tick_picoseconds)))
            }
            other => Err(DecodeError::UnexpectedRecordType(other.0)),
        }
    }
}
