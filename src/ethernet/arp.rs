use std::net::Ipv4Addr;

use nom::combinator::map;
use nom::number::streaming::{be_u16, be_u32, be_u8};
use nom::IResult;
use rusticata_macros::newtype_enum;

use super::{parse_mac_address, EtherType, MacAddress};
use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;

/// Size of an Ethernet/IPv4 ARP message
pub const ARP_PACKET_LEN: usize = 28;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ArpOperation(pub u16);

newtype_enum! {
impl display ArpOperation {
    REQUEST = 1,
    REPLY = 2,
    RARP_REQUEST = 3,
    RARP_REPLY = 4,
}
}

/// ARP or RARP message for Ethernet hardware and IPv4 protocol addresses
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArpPacket {
    pub hardware_type: u16,
    pub protocol_type: EtherType,
    pub hardware_address_length: u8,
    pub protocol_address_length: u8,
    pub operation: ArpOperation,
    pub sender_hardware_address: MacAddress,
    pub sender_protocol_address: Ipv4Addr,
    pub target_hardware_address: MacAddress,
    pub target_protocol_address: Ipv4Addr,
}

pub fn parse_arp_packet(i: &[u8]) -> IResult<&[u8], ArpPacket, DecodeError> {
    let (i, hardware_type) = be_u16(i)?;
    let (i, protocol_type) = be_u16(i)?;
    let (i, hardware_address_length) = be_u8(i)?;
    let (i, protocol_address_length) = be_u8(i)?;
    let (i, operation) = be_u16(i)?;
    let (i, sender_hardware_address) = parse_mac_address(i)?;
    let (i, sender_protocol_address) = map(be_u32, Ipv4Addr::from)(i)?;
    let (i, target_hardware_address) = parse_mac_address(i)?;
    let (i, target_protocol_address) = map(be_u32, Ipv4Addr::from)(i)?;
    let packet = ArpPacket {
        hardware_type,
        protocol_type: EtherType(protocol_type),
        hardware_address_length,
        protocol_address_length,
        operation: ArpOperation(operation),
        sender_hardware_address,
        sender_protocol_address,
        target_hardware_address,
        target_protocol_address,
    };
    Ok((i, packet))
}

/// Decode an ARP (or RARP, as named by `protocol`) message
///
/// The enclosing frame must supply at least [`ARP_PACKET_LEN`] bytes.
pub fn decode_arp(
    protocol: &'static str,
    cursor: &mut Cursor<'_>,
    available: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<ArpPacket, DecodeError> {
    ctx.require(protocol, ARP_PACKET_LEN, available)?;
    cursor.parse(parse_arp_packet)
}
