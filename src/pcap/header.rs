use nom::number::streaming::{self as num, le_u32};
use nom::number::Endianness;
use nom::IResult;

use crate::error::ContainerError;
use crate::linktype::Linktype;

/// Magic number of a PCAP file, as read in little-endian order from a little-endian file
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
/// Same magic read from a big-endian file
pub const PCAP_MAGIC_SWAPPED: u32 = 0xd4c3_b2a1;

pub const PCAP_HEADER_LEN: usize = 24;

/// PCAP global header
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PcapHeader {
    /// File format and byte ordering. If equal to `0xa1b2c3d4`, the rest of the file is
    /// little-endian. If `0xd4c3b2a1` (swapped), all following fields are big-endian.
    pub magic_number: u32,
    /// Version major number (currently 2)
    pub version_major: u16,
    /// Version minor number (currently 4)
    pub version_minor: u16,
    /// The correction time in seconds between GMT (UTC) and the local timezone of the following packet header timestamps
    pub thiszone: i32,
    /// In theory, the accuracy of time stamps in the capture; in practice, all tools set it to 0
    pub sigfigs: u32,
    /// max len of captured packets, in octets
    pub snaplen: u32,
    /// Data link type
    pub network: Linktype,
}

impl PcapHeader {
    pub fn new() -> PcapHeader {
        PcapHeader {
            magic_number: PCAP_MAGIC,
            version_major: 2,
            version_minor: 4,
            thiszone: 0,
            sigfigs: 0,
            snaplen: 65535,
            network: Linktype::ETHERNET,
        }
    }

    pub const fn size(&self) -> usize {
        PCAP_HEADER_LEN
    }

    pub fn is_bigendian(&self) -> bool {
        self.magic_number == PCAP_MAGIC_SWAPPED
    }

    /// Byte order of every container field following the magic number
    pub fn endianness(&self) -> Endianness {
        if self.is_bigendian() {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    pub fn is_expected_version(&self) -> bool {
        self.version_major == 2 && self.version_minor == 4
    }
}

impl Default for PcapHeader {
    fn default() -> Self {
        PcapHeader::new()
    }
}

/// Read the PCAP global header
///
/// The magic number selects the byte order of all remaining fields. The link type is
/// returned as found; rejecting non-Ethernet captures is left to the caller.
pub fn parse_pcap_header(i: &[u8]) -> IResult<&[u8], PcapHeader, ContainerError> {
    let (i, magic_number) = le_u32(i)?;
    let order = match magic_number {
        PCAP_MAGIC => Endianness::Little,
        PCAP_MAGIC_SWAPPED => Endianness::Big,
        _ => return Err(nom::Err::Error(ContainerError::UnknownMagic(magic_number))),
    };
    let (i, version_major) = num::u16(order)(i)?;
    let (i, version_minor) = num::u16(order)(i)?;
    let (i, thiszone) = num::i32(order)(i)?;
    let (i, sigfigs) = num::u32(order)(i)?;
    let (i, snaplen) = num::u32(order)(i)?;
    let (i, network) = num::i32(order)(i)?;
    let header = PcapHeader {
        magic_number,
        version_major,
        version_minor,
        thiszone,
        sigfigs,
        snaplen,
        network: Linktype(network),
    };
    Ok((i, header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // ntp capture header, little-endian
    pub const PCAP_HDR: &[u8] = &hex!(
        "
D4 C3 B2 A1 02 00 04 00 00 00 00 00 00 00 00 00
00 00 04 00 01 00 00 00"
    );

    // same header, big-endian
    pub const PCAP_HDR_BE: &[u8] = &hex!(
        "
A1 B2 C3 D4 00 02 00 04 00 00 00 00 00 00 00 00
00 04 00 00 00 00 00 01"
    );

    #[test]
    fn parse_pcap_header_le() {
        let (rem, hdr) = parse_pcap_header(PCAP_HDR).expect("header parsing failed");
        assert!(rem.is_empty());
        assert_eq!(hdr.magic_number, PCAP_MAGIC);
        assert_eq!(hdr.version_major, 2);
        assert_eq!(hdr.version_minor, 4);
        assert_eq!(hdr.snaplen, 262_144);
        assert_eq!(hdr.network, Linktype::ETHERNET);
        assert_eq!(hdr.endianness(), Endianness::Little);
        assert!(hdr.is_expected_version());
    }

    #[test]
    fn parse_pcap_header_be() {
        let (rem, hdr) = parse_pcap_header(PCAP_HDR_BE).expect("header parsing failed");
        assert!(rem.is_empty());
        assert!(hdr.is_bigendian());
        assert_eq!(hdr.snaplen, 262_144);
        assert_eq!(hdr.network, Linktype::ETHERNET);
    }

    #[test]
    fn reject_unknown_magic() {
        let input = hex!("78 56 34 12 02 00 04 00");
        let res = parse_pcap_header(&input);
        assert_eq!(
            res,
            Err(nom::Err::Error(ContainerError::UnknownMagic(0x1234_5678)))
        );
    }

    #[test]
    fn short_header_is_incomplete() {
        assert!(matches!(
            parse_pcap_header(&PCAP_HDR[..20]),
            Err(nom::Err::Incomplete(_))
        ));
    }
}
