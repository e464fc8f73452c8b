//! Ethernet II / IEEE 802.3 frame dissector
//!
//! The frame header is followed by zero or more 802.1Q tags, then by the payload selected by
//! the EtherType. Whatever the payload dissector leaves unread (padding up to the minimum frame
//! size, a captured FCS) is returned as the frame trailer.

pub mod arp;
pub mod dec_dna;
pub mod lldp;
pub mod loopback;

use std::fmt;

use nom::bytes::streaming::take;
use nom::combinator::map;
use nom::number::streaming::be_u16;
use nom::IResult;
use rusticata_macros::newtype_enum;

use self::arp::{decode_arp, ArpPacket};
use self::dec_dna::{decode_dec_dna, DecDnaPacket};
use self::lldp::{decode_lldp, LldpPacket};
use self::loopback::{decode_loopback, LoopbackPacket};
use crate::context::DecodeContext;
use crate::cursor::{Cursor, Endianness};
use crate::error::DecodeError;
use crate::ip::ipv4::{decode_ipv4, Ipv4Packet};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const VLAN_TAG_LEN: usize = 4;

/// 48-bit hardware address
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub fn parse_mac_address<'a, E>(i: &'a [u8]) -> IResult<&'a [u8], MacAddress, E>
where
    E: nom::error::ParseError<&'a [u8]>,
{
    map(take(6usize), |b: &[u8]| {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(b);
        MacAddress(addr)
    })(i)
}

/// Ethernet type field
///
/// Values below [`EtherType::MIN_ETHERTYPE`] are not types but IEEE 802.3 payload lengths.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct EtherType(pub u16);

newtype_enum! {
impl display EtherType {
    IPV4 = 0x0800,
    ARP = 0x0806,
    DEC_DNA_REMOTE_CONSOLE = 0x6002,
    RARP = 0x8035,
    VLAN = 0x8100,
    IPV6 = 0x86dd,
    LLDP = 0x88cc,
    LOOPBACK = 0x9000,
}
}

impl EtherType {
    pub const MIN_ETHERTYPE: u16 = 0x0600;

    /// True if the field holds an 802.3 payload length rather than a type
    pub fn is_length(self) -> bool {
        self.0 < Self::MIN_ETHERTYPE
    }
}

/// IEEE 802.1Q tag control information
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VlanTag {
    pub tci: u16,
}

impl VlanTag {
    pub fn priority(&self) -> u8 {
        (self.tci >> 13) as u8
    }

    pub fn drop_eligible(&self) -> bool {
        self.tci & 0x1000 != 0
    }

    pub fn vlan_id(&self) -> u16 {
        self.tci & 0x0fff
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EthernetHeader {
    pub destination: MacAddress,
    pub source: MacAddress,
    /// Type of the payload, after any VLAN tags
    pub ethertype: EtherType,
    /// 802.1Q tags, outermost first
    pub vlan_tags: Vec<VlanTag>,
}

impl EthernetHeader {
    /// Outermost VLAN tag, if any
    pub fn vlan(&self) -> Option<&VlanTag> {
        self.vlan_tags.first()
    }

    /// Bytes taken by the header, tags included
    pub fn size(&self) -> usize {
        ETHERNET_HEADER_LEN + VLAN_TAG_LEN * self.vlan_tags.len()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EthernetPayload<'a> {
    Arp(ArpPacket),
    Rarp(ArpPacket),
    Ipv4(Ipv4Packet<'a>),
    Lldp(LldpPacket<'a>),
    Loopback(LoopbackPacket<'a>),
    DecDna(DecDnaPacket<'a>),
    /// IEEE 802.3 frame: the LLC payload, not interpreted
    Ieee8023(&'a [u8]),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EthernetFrame<'a> {
    pub header: EthernetHeader,
    pub payload: EthernetPayload<'a>,
    /// Frame bytes after the payload
    pub trailer: &'a [u8],
}

/// Read the fixed 14-byte header, without following VLAN tags
pub fn parse_ethernet_header(i: &[u8]) -> IResult<&[u8], EthernetHeader, DecodeError> {
    let (i, destination) = parse_mac_address(i)?;
    let (i, source) = parse_mac_address(i)?;
    let (i, ethertype) = be_u16(i)?;
    let header = EthernetHeader {
        destination,
        source,
        ethertype: EtherType(ethertype),
        vlan_tags: Vec::new(),
    };
    Ok((i, header))
}

/// Decode one captured frame, consuming the whole cursor
///
/// `cursor` must span exactly the captured bytes of the frame. At most
/// `ctx.max_vlan_tags()` VLAN tags are unwrapped.
pub fn decode_ethernet<'a>(
    cursor: &mut Cursor<'a>,
    ctx: &mut DecodeContext<'_>,
) -> Result<EthernetFrame<'a>, DecodeError> {
    let mut header = cursor.parse(parse_ethernet_header)?;
    while header.ethertype == EtherType::VLAN {
        if header.vlan_tags.len() >= ctx.max_vlan_tags() {
            return Err(ctx.fail(DecodeError::TooManyVlanTags(ctx.max_vlan_tags())));
        }
        let tci = cursor.read_u16(Endianness::Big)?;
        header.vlan_tags.push(VlanTag { tci });
        header.ethertype = EtherType(cursor.read_u16(Endianness::Big)?);
    }
    let available = cursor.remaining();
    let payload = match header.ethertype {
        EtherType::ARP => EthernetPayload::Arp(decode_arp("ARP", cursor, available, ctx)?),
        EtherType::RARP => EthernetPayload::Rarp(decode_arp("RARP", cursor, available, ctx)?),
        EtherType::IPV4 => EthernetPayload::Ipv4(decode_ipv4(cursor, available, ctx)?),
        EtherType::IPV6 => return Err(ctx.fail(DecodeError::UnsupportedProtocol("IPv6"))),
        EtherType::LLDP => EthernetPayload::Lldp(decode_lldp(cursor, available, ctx)?),
        EtherType::LOOPBACK => {
            EthernetPayload::Loopback(decode_loopback(cursor, available, ctx)?)
        }
        EtherType::DEC_DNA_REMOTE_CONSOLE => {
            EthernetPayload::DecDna(decode_dec_dna(cursor, available, ctx)?)
        }
        t if t.is_length() => {
            let length = usize::from(t.0);
            ctx.require("IEEE 802.3", length, available)?;
            EthernetPayload::Ieee8023(cursor.read_bytes(length)?)
        }
        t => return Err(ctx.fail(DecodeError::UnknownEtherType(t))),
    };
    let trailer_length = cursor.remaining();
    let trailer = cursor.read_bytes(trailer_length)?;
    Ok(EthernetFrame {
        header,
        payload,
        trailer,
    })
}
