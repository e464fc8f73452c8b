use nom::bytes::streaming::take;
use nom::number::streaming::{self as num, le_u32};
use nom::number::Endianness;
use nom::sequence::tuple;
use nom::IResult;
use rusticata_macros::newtype_enum;

use crate::error::{ContainerError, DecodeError};

/// Block type of a Section Header Block, identical in both byte orders
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Byte-order magic, as read in little-endian order from a little-endian section
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;

/// Block type, block length and trailing block length
pub const BLOCK_OVERHEAD: usize = 12;
/// Block type and block length, before the block body
pub const BLOCK_HEADER_LEN: usize = 8;
/// Smallest Section Header Block: overhead, byte-order magic, version and section length
pub const SHB_MIN_LEN: usize = 28;

pub const IDB_HEADER_LEN: usize = 8;
pub const EPB_HEADER_LEN: usize = 20;
pub const PB_HEADER_LEN: usize = 20;
pub const SPB_HEADER_LEN: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockType(pub u32);

newtype_enum! {
impl display BlockType {
    INTERFACE_DESCRIPTION = 0x0000_0001,
    PACKET = 0x0000_0002,
    SIMPLE_PACKET = 0x0000_0003,
    NAME_RESOLUTION = 0x0000_0004,
    INTERFACE_STATISTICS = 0x0000_0005,
    ENHANCED_PACKET = 0x0000_0006,
    SYSTEMD_JOURNAL_EXPORT = 0x0000_0009,
    DECRYPTION_SECRETS = 0x0000_000A,
    CUSTOM = 0x0000_0BAD,
    CUSTOM_NO_COPY = 0x4000_0BAD,
    SECTION_HEADER = 0x0A0D_0D0A,
}
}

/// Section Header Block, without its options
///
/// The byte-order magic decides the order of every field of the section, this block's
/// length included.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SectionHeader {
    pub order: Endianness,
    pub version_major: u16,
    pub version_minor: u16,
    /// Length of the section in bytes, or -1 when not recorded
    pub section_length: i64,
}

impl SectionHeader {
    pub fn is_expected_version(&self) -> bool {
        self.version_major == 1 && self.version_minor == 0
    }
}

/// A complete block other than a Section Header Block
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawBlock<'a> {
    pub block_type: BlockType,
    /// Everything between the block length and the trailing block length
    pub body: &'a [u8],
}

/// Fixed fields of a packet block, preceding the frame bytes
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PacketBlockHeader {
    pub interface_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    pub caplen: u32,
    pub origlen: u32,
}

impl PacketBlockHeader {
    /// Timestamp in units of the interface's resolution
    pub fn ticks(&self) -> u64 {
        (u64::from(self.ts_high) << 32) | u64::from(self.ts_low)
    }
}

/// Read a Section Header Block
///
/// The block is consumed whole; its options are skipped.
pub fn parse_section_header(i: &[u8]) -> IResult<&[u8], SectionHeader, ContainerError> {
    let (_, (block_type, raw_len, bom)) = tuple((le_u32, le_u32, le_u32))(i)?;
    if block_type != SHB_MAGIC {
        return Err(nom::Err::Error(ContainerError::HeaderNotRecognized));
    }
    let order = if bom == BOM_MAGIC {
        Endianness::Little
    } else if bom == BOM_MAGIC.swap_bytes() {
        Endianness::Big
    } else {
        return Err(nom::Err::Error(ContainerError::HeaderNotRecognized));
    };
    let block_len = match order {
        Endianness::Big => raw_len.swap_bytes(),
        _ => raw_len,
    };
    if (block_len as usize) < SHB_MIN_LEN {
        return Err(nom::Err::Error(ContainerError::HeaderNotRecognized));
    }
    let (i, _) = take(12usize)(i)?;
    let (i, version_major) = num::u16(order)(i)?;
    let (i, version_minor) = num::u16(order)(i)?;
    let (i, section_length) = num::i64(order)(i)?;
    let (i, _options) = take(block_len as usize - SHB_MIN_LEN)(i)?;
    let (i, trailing_len) = num::u32(order)(i)?;
    if trailing_len != block_len {
        return Err(nom::Err::Error(ContainerError::HeaderNotRecognized));
    }
    let header = SectionHeader {
        order,
        version_major,
        version_minor,
        section_length,
    };
    Ok((i, header))
}

/// Read one whole block in the byte order of its section
///
/// Both copies of the block length must agree.
pub fn parse_block<'a>(
    order: Endianness,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], RawBlock<'a>, DecodeError> {
    move |i| {
        let (i, block_type) = num::u32(order)(i)?;
        let (i, block_len) = num::u32(order)(i)?;
        if (block_len as usize) < BLOCK_OVERHEAD {
            return Err(nom::Err::Error(DecodeError::InvalidLength {
                protocol: "PCAPNG block",
                declared: block_len as usize,
                header: BLOCK_OVERHEAD,
            }));
        }
        let (i, body) = take(block_len as usize - BLOCK_OVERHEAD)(i)?;
        let (i, trailing_len) = num::u32(order)(i)?;
        if trailing_len != block_len {
            return Err(nom::Err::Error(DecodeError::LengthMismatch {
                protocol: "PCAPNG block",
                declared: trailing_len as usize,
                expected: block_len as usize,
            }));
        }
        let block = RawBlock {
            block_type: BlockType(block_type),
            body,
        };
        Ok((i, block))
    }
}

/// Read the fixed fields of an Enhanced Packet Block body
pub fn parse_enhanced_packet_header<'a>(
    order: Endianness,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], PacketBlockHeader, DecodeError> {
    move |i| {
        let (i, interface_id) = num::u32(order)(i)?;
        let (i, ts_high) = num::u32(order)(i)?;
        let (i, ts_low) = num::u32(order)(i)?;
        let (i, caplen) = num::u32(order)(i)?;
        let (i, origlen) = num::u32(order)(i)?;
        let header = PacketBlockHeader {
            interface_id,
            ts_high,
            ts_low,
            caplen,
            origlen,
        };
        Ok((i, header))
    }
}

/// Read the fixed fields of an obsolete Packet Block body
///
/// Same layout as the Enhanced Packet Block, except for a 16-bit interface id followed by a
/// 16-bit drop counter.
pub fn parse_obsolete_packet_header<'a>(
    order: Endianness,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], PacketBlockHeader, DecodeError> {
    move |i| {
        let (i, interface_id) = num::u16(order)(i)?;
        let (i, _drops_count) = num::u16(order)(i)?;
        let (i, ts_high) = num::u32(order)(i)?;
        let (i, ts_low) = num::u32(order)(i)?;
        let (i, caplen) = num::u32(order)(i)?;
        let (i, origlen) = num::u32(order)(i)?;
        let header = PacketBlockHeader {
            interface_id: u32::from(interface_id),
            ts_high,
            ts_low,
            caplen,
            origlen,
        };
        Ok((i, header))
    }
}

/// Read a Simple Packet Block body header: the original packet length
///
/// The captured length is whatever the block holds, up to that length.
pub fn parse_simple_packet_header<'a>(
    order: Endianness,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], u32, DecodeError> {
    move |i| num::u32(order)(i)
}
