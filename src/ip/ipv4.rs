use std::net::Ipv4Addr;

use nom::combinator::map;
use nom::number::streaming::{be_u16, be_u32, be_u8};
use nom::IResult;

use super::eigrp::{decode_eigrp, EigrpPacket};
use super::icmp::{decode_icmpv4, IcmpPacket};
use super::igmp::{decode_igmpv2, IgmpMessage};
use super::tcp::{decode_tcp, TcpSegment};
use super::udp::{decode_udp, UdpDatagram};
use super::IpProtocol;
use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;

pub const IPV4_MIN_HEADER_LEN: usize = 20;
pub const IPV4_MAX_HEADER_LEN: usize = 60;

/// IPv4 fixed header (RFC 791)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ipv4Header {
    /// Version (high nibble) and IHL, the header length in 32-bit words (low nibble)
    pub version_ihl: u8,
    pub tos: u8,
    /// Length of header and payload
    pub total_length: u16,
    pub identification: u16,
    /// Flags (3 high bits) and fragment offset in 8-byte units
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: IpProtocol,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    pub fn version(&self) -> u8 {
        self.version_ihl >> 4
    }

    /// Header length in bytes, options included
    pub fn header_length(&self) -> usize {
        usize::from(self.version_ihl & 0x0f) * 4
    }

    pub fn dont_fragment(&self) -> bool {
        self.flags_fragment & 0x4000 != 0
    }

    pub fn more_fragments(&self) -> bool {
        self.flags_fragment & 0x2000 != 0
    }

    /// Fragment offset in 8-byte units
    pub fn fragment_offset(&self) -> u16 {
        self.flags_fragment & 0x1fff
    }
}

/// Transport content of an IPv4 packet
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ipv4Payload<'a> {
    Icmp(IcmpPacket<'a>),
    Igmp(IgmpMessage),
    Tcp(TcpSegment<'a>),
    Udp(UdpDatagram<'a>),
    Eigrp(EigrpPacket<'a>),
    /// Non-first fragment: no transport header, bytes kept as-is
    Fragment(&'a [u8]),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ipv4Packet<'a> {
    pub header: Ipv4Header,
    pub options: &'a [u8],
    pub payload: Ipv4Payload<'a>,
}

pub fn parse_ipv4_header(i: &[u8]) -> IResult<&[u8], Ipv4Header, DecodeError> {
    let (i, version_ihl) = be_u8(i)?;
    let (i, tos) = be_u8(i)?;
    let (i, total_length) = be_u16(i)?;
    let (i, identification) = be_u16(i)?;
    let (i, flags_fragment) = be_u16(i)?;
    let (i, ttl) = be_u8(i)?;
    let (i, protocol) = be_u8(i)?;
    let (i, checksum) = be_u16(i)?;
    let (i, source) = map(be_u32, Ipv4Addr::from)(i)?;
    let (i, destination) = map(be_u32, Ipv4Addr::from)(i)?;
    let header = Ipv4Header {
        version_ihl,
        tos,
        total_length,
        identification,
        flags_fragment,
        ttl,
        protocol: IpProtocol(protocol),
        checksum,
        source,
        destination,
    };
    Ok((i, header))
}

/// Decode an IPv4 packet from `available` bytes of Ethernet payload
///
/// The header's total length bounds the packet: bytes past it (Ethernet padding) are left
/// unread. Checksums are not verified and fragments are not reassembled.
pub fn decode_ipv4<'a>(
    cursor: &mut Cursor<'a>,
    available: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<Ipv4Packet<'a>, DecodeError> {
    let header = cursor.parse(parse_ipv4_header)?;
    if header.version() != 4 {
        return Err(ctx.fail(DecodeError::InvalidVersion {
            protocol: "IPv4",
            version: header.version(),
        }));
    }
    let header_length = header.header_length();
    if !(IPV4_MIN_HEADER_LEN..=IPV4_MAX_HEADER_LEN).contains(&header_length) {
        return Err(ctx.fail(DecodeError::InvalidHeaderLength {
            protocol: "IPv4",
            length: header_length,
            min: IPV4_MIN_HEADER_LEN,
            max: IPV4_MAX_HEADER_LEN,
        }));
    }
    let total_length = usize::from(header.total_length);
    ctx.require("IPv4", total_length, available)?;
    let options = cursor.read_bytes(header_length - IPV4_MIN_HEADER_LEN)?;
    let payload_length = ctx.payload_length("IPv4", total_length, header_length)?;
    if header.fragment_offset() != 0 {
        let data = cursor.read_bytes(payload_length)?;
        return Ok(Ipv4Packet {
            header,
            options,
            payload: Ipv4Payload::Fragment(data),
        });
    }
    let payload = match header.protocol {
        IpProtocol::ICMP => Ipv4Payload::Icmp(decode_icmpv4(cursor, payload_length, ctx)?),
        IpProtocol::IGMP => Ipv4Payload::Igmp(decode_igmpv2(cursor, payload_length, ctx)?),
        IpProtocol::TCP => Ipv4Payload::Tcp(decode_tcp(cursor, payload_length, ctx)?),
        IpProtocol::UDP => Ipv4Payload::Udp(decode_udp(cursor, payload_length, ctx)?),
        IpProtocol::EIGRP => Ipv4Payload::Eigrp(decode_eigrp(cursor, payload_length, ctx)?),
        other => return Err(ctx.fail(DecodeError::UnknownProtocol(other))),
    };
    Ok(Ipv4Packet {
        header,
        options,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // 10.0.0.1 -> 10.0.0.2, total length 40, TCP, followed by a bare 20-byte TCP header
    const IPV4_TCP: &[u8] = &hex!(
        "
45 00 00 28 1c 46 40 00 40 06 00 00 0a 00 00 01
0a 00 00 02
04 d2 00 50 00 00 00 00 00 00 00 00 50 02 20 00
00 00 00 00"
    );

    fn decode<'a>(input: &'a [u8], sink: &mut Vec<String>) -> Result<Ipv4Packet<'a>, DecodeError> {
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, sink, &mut observer);
        let mut c = Cursor::new(input);
        decode_ipv4(&mut c, input.len(), &mut ctx)
    }

    #[test]
    fn dispatch_to_tcp() {
        let mut sink = Vec::new();
        let p = decode(IPV4_TCP, &mut sink).expect("ipv4");
        assert_eq!(p.header.header_length(), 20);
        assert_eq!(p.header.total_length, 40);
        assert!(p.header.dont_fragment());
        assert_eq!(p.header.source, Ipv4Addr::new(10, 0, 0, 1));
        assert!(p.options.is_empty());
        match p.payload {
            Ipv4Payload::Tcp(s) => {
                assert_eq!(s.header.destination_port, 80);
                assert!(s.payload.is_empty());
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn options_skipped() {
        let mut input = IPV4_TCP[..20].to_vec();
        input[0] = 0x46;
        input[3] = 44;
        input.extend_from_slice(&hex!("94 04 00 00"));
        input.extend_from_slice(&IPV4_TCP[20..]);
        let mut sink = Vec::new();
        let p = decode(&input, &mut sink).expect("ipv4");
        assert_eq!(p.options, &hex!("94 04 00 00"));
        assert!(matches!(p.payload, Ipv4Payload::Tcp(_)));
    }

    #[test]
    fn reject_bad_headers() {
        let mut sink = Vec::new();
        let mut input = IPV4_TCP.to_vec();
        input[0] = 0x65;
        assert!(matches!(
            decode(&input, &mut sink),
            Err(DecodeError::InvalidVersion { version: 6, .. })
        ));
        input[0] = 0x44;
        assert!(matches!(
            decode(&input, &mut sink),
            Err(DecodeError::InvalidHeaderLength { length: 16, .. })
        ));
        input[0] = 0x45;
        input[3] = 0x10;
        assert!(matches!(
            decode(&input, &mut sink),
            Err(DecodeError::InvalidLength {
                declared: 16,
                header: 20,
                ..
            })
        ));
        input[3] = 0x40;
        assert!(matches!(
            decode(&input, &mut sink),
            Err(DecodeError::TruncatedPacket {
                needed: 64,
                available: 40,
                ..
            })
        ));
        input[3] = 0x28;
        input[9] = 0x99;
        assert_eq!(
            decode(&input, &mut sink),
            Err(DecodeError::UnknownProtocol(IpProtocol(0x99)))
        );
        assert_eq!(sink.len(), 5);
    }

    #[test]
    fn later_fragment_not_dispatched() {
        let mut input = IPV4_TCP.to_vec();
        input[6] = 0x00;
        input[7] = 0xb9;
        let mut sink = Vec::new();
        let p = decode(&input, &mut sink).expect("ipv4");
        assert_eq!(p.header.fragment_offset(), 185);
        assert_eq!(p.payload, Ipv4Payload::Fragment(&IPV4_TCP[20..]));
    }

    fn with_protocol(protocol: u8, payload: &[u8]) -> Vec<u8> {
        let mut input = IPV4_TCP[..20].to_vec();
        input[3] = (20 + payload.len()) as u8;
        input[9] = protocol;
        input.extend_from_slice(payload);
        input
    }

    #[test]
    fn dispatch_to_icmp() {
        // echo request, identifier 1, sequence 2
        let input = with_protocol(1, &hex!("08 00 f7 fc 00 01 00 02 61 62"));
        let mut sink = Vec::new();
        match decode(&input, &mut sink).expect("ipv4").payload {
            Ipv4Payload::Icmp(p) => {
                assert_eq!(p.header.icmp_type, 8);
                assert_eq!(p.header.checksum, 0xf7fc);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn dispatch_to_igmp() {
        let input = with_protocol(2, &hex!("16 00 fa 04 ef ff ff fa"));
        let mut sink = Vec::new();
        match decode(&input, &mut sink).expect("ipv4").payload {
            Ipv4Payload::Igmp(m) => {
                assert_eq!(m.igmp_type, 0x16);
                assert_eq!(m.group_address, Ipv4Addr::new(239, 255, 255, 250));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn dispatch_to_eigrp() {
        let mut hello = hex!("02 05 ee d1 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 64").to_vec();
        hello.extend_from_slice(&hex!("00 01 00 0c 01 00 01 00 00 00 00 0f"));
        let input = with_protocol(88, &hello);
        let mut sink = Vec::new();
        match decode(&input, &mut sink).expect("ipv4").payload {
            Ipv4Payload::Eigrp(p) => {
                assert_eq!(p.header.autonomous_system, 100);
                assert_eq!(p.tlvs.len(), 12);
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert!(sink.is_empty());
    }
}
