use nom::bytes::streaming::take;
use nom::number::streaming::{self as num, le_i16, le_i32, le_u16, le_u32};
use nom::IResult;
use rusticata_macros::newtype_enum;

use crate::error::ContainerError;
use crate::linktype::Linktype;

/// Leading signature of a Sniffer capture: `"TRSNIFF data    "` then `0x1a`
pub const ENC_SIGNATURE: &[u8; 17] = b"TRSNIFF data    \x1a";

pub const ENC_HEADER_LEN: usize = 41;

/// Size of a record header (type and length)
pub const ENC_RECORD_HEADER_LEN: usize = 6;

/// Type of a Sniffer record
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EncRecordType(pub u16);

newtype_enum! {
impl display EncRecordType {
    VERSION = 1,
    EOF = 3,
    TYPE2 = 4,
}
}

/// Sniffer ENC global header: the signature and the version record
///
/// All multi-byte fields are little-endian, whatever the host or the capturing machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncHeader {
    /// Type of the first record, always [`EncRecordType::VERSION`]
    pub record_type: EncRecordType,
    /// Length of the version record body
    pub record_length: u32,
    pub version_major: i16,
    pub version_minor: i16,
    /// DOS-encoded capture time
    pub time: i16,
    /// DOS-encoded capture date
    pub date: i16,
    pub file_type: i8,
    /// Network encapsulation code (1 is Ethernet)
    pub network: u8,
    pub format_version: i8,
    /// Index into the table of tick durations, see [`tick_picoseconds`]
    pub timestamp_units: u8,
    pub compression_version: i8,
    pub compression_level: i8,
    pub reserved: i32,
}

impl EncHeader {
    pub fn new() -> EncHeader {
        EncHeader {
            record_type: EncRecordType::VERSION,
            record_length: (ENC_HEADER_LEN - ENC_SIGNATURE.len() - ENC_RECORD_HEADER_LEN) as u32,
            version_major: 4,
            version_minor: 0,
            time: 0,
            date: 0,
            file_type: 4,
            network: 1,
            format_version: 1,
            timestamp_units: 3,
            compression_version: 0,
            compression_level: 0,
            reserved: 0,
        }
    }

    pub const fn size(&self) -> usize {
        ENC_HEADER_LEN
    }

    pub fn linktype(&self) -> Linktype {
        Linktype(i32::from(self.network))
    }

    pub fn tick_picoseconds(&self) -> Option<u64> {
        tick_picoseconds(self.timestamp_units)
    }
}

impl Default for EncHeader {
    fn default() -> Self {
        EncHeader::new()
    }
}

/// Duration of one timestamp tick in picoseconds, by timestamp-units code
pub fn tick_picoseconds(units: u8) -> Option<u64> {
    let ps = match units {
        0 | 2 => 15_000_000,
        1 => 838_096,
        3 => 500_000,
        4 => 2_000_000,
        5 => 80_000,
        6 => 100_000,
        _ => return None,
    };
    Some(ps)
}

/// Read the Sniffer signature and version record
///
/// Field values are returned as found; see
/// [`EncFormat`](crate::enc::EncFormat) for validation.
pub fn parse_enc_header(i: &[u8]) -> IResult<&[u8], EncHeader, ContainerError> {
    let (i, signature) = take(ENC_SIGNATURE.len())(i)?;
    if signature != &ENC_SIGNATURE[..] {
        return Err(nom::Err::Error(ContainerError::HeaderNotRecognized));
    }
    let (i, record_type) = le_u16(i)?;
    let (i, record_length) = le_u32(i)?;
    let (i, version_major) = le_i16(i)?;
    let (i, version_minor) = le_i16(i)?;
    let (i, time) = le_i16(i)?;
    let (i, date) = le_i16(i)?;
    let (i, file_type) = num::i8(i)?;
    let (i, network) = num::u8(i)?;
    let (i, format_version) = num::i8(i)?;
    let (i, timestamp_units) = num::u8(i)?;
    let (i, compression_version) = num::i8(i)?;
    let (i, compression_level) = num::i8(i)?;
    let (i, reserved) = le_i32(i)?;
    let header = EncHeader {
        record_type: EncRecordType(record_type),
        record_length,
        version_major,
        version_minor,
        time,
        date,
        file_type,
        network,
        format_version,
        timestamp_units,
        compression_version,
        compression_level,
        reserved,
    };
    Ok((i, header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    pub const ENC_HDR: &[u8] = &hex!(
        "
54 52 53 4E 49 46 46 20 64 61 74 61 20 20 20 20
1A 01 00 12 00 00 00 04 00 00 00 00 00 00 00 04
01 01 03 00 00 00 00 00 00"
    );

    #[test]
    fn parse_enc_header_fields() {
        let (rem, hdr) = parse_enc_header(ENC_HDR).expect("header parsing failed");
        assert!(rem.is_empty());
        assert_eq!(hdr, EncHeader::new());
        assert_eq!(hdr.size(), ENC_HDR.len());
        assert_eq!(hdr.linktype(), Linktype::ETHERNET);
        assert_eq!(hdr.tick_picoseconds(), Some(500_000));
    }

    #[test]
    fn reject_bad_signature() {
        let mut input = ENC_HDR.to_vec();
        input[0] = b'X';
        assert_eq!(
            parse_enc_header(&input),
            Err(nom::Err::Error(ContainerError::HeaderNotRecognized))
        );
    }

    #[test]
    fn timestamp_units_table() {
        assert_eq!(tick_picoseconds(0), tick_picoseconds(2));
        assert_eq!(tick_picoseconds(1), Some(838_096));
        assert_eq!(tick_picoseconds(6), Some(100_000));
        assert_eq!(tick_picoseconds(7), None);
    }
}
