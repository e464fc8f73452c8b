use std::net::Ipv6Addr;

use nom::combinator::map;
use nom::number::streaming::{be_u128, be_u16, be_u32, be_u8};
use nom::IResult;

use crate::ip::IpProtocol;

pub const IPV6_HEADER_LEN: usize = 40;

/// IPv6 fixed header
///
/// Only parsed on request: frames carrying IPv6 are rejected by the Ethernet dissector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ipv6Header {
    /// Version (4 bits), traffic class (8 bits) and flow label (20 bits)
    pub version_class_flow: u32,
    pub payload_length: u16,
    pub next_header: IpProtocol,
    pub hop_limit: u8,
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
}

impl Ipv6Header {
    pub fn version(&self) -> u8 {
        (self.version_class_flow >> 28) as u8
    }

    pub fn traffic_class(&self) -> u8 {
        (self.version_class_flow >> 20) as u8
    }

    pub fn flow_label(&self) -> u32 {
        self.version_class_flow & 0x000f_ffff
    }
}

pub fn parse_ipv6_header(i: &[u8]) -> IResult<&[u8], Ipv6Header, crate::error::DecodeError> {
    let (i, version_class_flow) = be_u32(i)?;
    let (i, payload_length) = be_u16(i)?;
    let (i, next_header) = be_u8(i)?;
    let (i, hop_limit) = be_u8(i)?;
    let (i, source) = map(be_u128, Ipv6Addr::from)(i)?;
    let (i, destination) = map(be_u128, Ipv6Addr::from)(i)?;
    let header = Ipv6Header {
        version_class_flow,
        payload_length,
        next_header: IpProtocol(next_header),
        hop_limit,
        source,
        destination,
    };
    Ok((i, header))
}
