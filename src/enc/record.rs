use nom::number::streaming::{self as num, le_u16, le_u32};
use nom::IResult;

use super::header::EncRecordType;
use crate::capture::RecordHeader;
use crate::error::DecodeError;

/// Size of the frame descriptor following a TYPE2 record header
pub const ENC_FRAME_DESCRIPTOR_LEN: usize = 14;

/// Descriptor of one captured frame (TYPE2 record body, before the frame bytes)
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EncFrameDescriptor {
    pub time_low: u16,
    pub time_mid: u16,
    pub time_high: u8,
    pub time_days: u8,
    /// Number of frame bytes stored in the record
    pub size: u16,
    pub frame_error_status: u8,
    pub flags: u8,
    /// Length of the frame on the wire, or 0 when not recorded
    pub true_size: u16,
    pub reserved: u16,
}

impl EncFrameDescriptor {
    /// 40-bit tick counter since the start of the capture day
    pub fn ticks(&self) -> u64 {
        (u64::from(self.time_high) << 32)
            | (u64::from(self.time_mid) << 16)
            | u64::from(self.time_low)
    }

    /// Convert to the common record header, given the capture's tick duration in picoseconds
    pub fn record_header(&self, tick_picoseconds: u64) -> RecordHeader {
        let ps = u128::from(self.ticks()) * u128::from(tick_picoseconds);
        let ts_sec = ps / 1_000_000_000_000;
        let ts_usec = (ps % 1_000_000_000_000) / 1_000_000;
        let origlen = if self.true_size == 0 {
            self.size
        } else {
            self.true_size
        };
        RecordHeader {
            ts_sec: ts_sec as u32,
            ts_usec: ts_usec as u32,
            caplen: u32::from(self.size),
            origlen: u32::from(origlen),
        }
    }
}

/// A TYPE2 record: frame descriptor and the stored frame bytes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncFrameRecord<'a> {
    pub descriptor: EncFrameDescriptor,
    pub data: &'a [u8],
}

/// Read a record header: type and body length
pub fn parse_enc_record_header(i: &[u8]) -> IResult<&[u8], (EncRecordType, u32), DecodeError> {
    let (i, record_type) = le_u16(i)?;
    let (i, length) = le_u32(i)?;
    Ok((i, (EncRecordType(record_type), length)))
}

pub fn parse_enc_frame_descriptor(i: &[u8]) -> IResult<&[u8], EncFrameDescriptor, DecodeError> {
    let (i, time_low) = le_u16(i)?;
    let (i, time_mid) = le_u16(i)?;
    let (i, time_high) = num::u8(i)?;
    let (i, time_days) = num::u8(i)?;
    let (i, size) = le_u16(i)?;
    let (i, frame_error_status) = num::u8(i)?;
    let (i, flags) = num::u8(i)?;
    let (i, true_size) = le_u16(i)?;
    let (i, reserved) = le_u16(i)?;
    let descriptor = EncFrameDescriptor {
        time_low,
        time_mid,
        time_high,
        time_days,
        size,
        frame_error_status,
        flags,
        true_size,
        reserved,
    };
    Ok((i, descriptor))
}
