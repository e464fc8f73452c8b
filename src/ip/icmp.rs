use nom::number::streaming::{be_u16, be_u8};
use nom::IResult;

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;

pub const ICMP_HEADER_LEN: usize = 4;

/// ICMP header, shared by ICMPv4 and ICMPv6
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IcmpPacket<'a> {
    pub header: IcmpHeader,
    /// Message body, not interpreted
    pub data: &'a [u8],
}

pub fn parse_icmp_header(i: &[u8]) -> IResult<&[u8], IcmpHeader, DecodeError> {
    let (i, icmp_type) = be_u8(i)?;
    let (i, code) = be_u8(i)?;
    let (i, checksum) = be_u16(i)?;
    Ok((
        i,
        IcmpHeader {
            icmp_type,
            code,
            checksum,
        },
    ))
}

fn decode_icmp<'a>(
    protocol: &'static str,
    cursor: &mut Cursor<'a>,
    length: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<IcmpPacket<'a>, DecodeError> {
    let body = ctx.payload_length(protocol, length, ICMP_HEADER_LEN)?;
    let header = cursor.parse(parse_icmp_header)?;
    let data = cursor.read_bytes(body)?;
    Ok(IcmpPacket { header, data })
}

/// Decode an ICMP message of `length` bytes carried by IPv4
pub fn decode_icmpv4<'a>(
    cursor: &mut Cursor<'a>,
    length: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<IcmpPacket<'a>, DecodeError> {
    decode_icmp("ICMPv4", cursor, length, ctx)
}

/// Decode an ICMPv6 message of `length` bytes
pub fn decode_icmpv6<'a>(
    cursor: &mut Cursor<'a>,
    length: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<IcmpPacket<'a>, DecodeError> {
    decode_icmp("ICMPv6", cursor, length, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // echo request, identifier 0x0001, sequence 0x0007, 4 bytes of data
    const ECHO: &[u8] = &hex!("08 00 f7 f7 00 01 00 07 61 62 63 64");

    #[test]
    fn echo_request() {
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(ECHO);
        let p = decode_icmpv4(&mut c, ECHO.len(), &mut ctx).expect("icmp");
        assert_eq!(p.header.icmp_type, 8);
        assert_eq!(p.header.checksum, 0xf7f7);
        assert_eq!(p.data.len(), 8);
        assert!(c.at_end());
    }

    #[test]
    fn icmpv6_body_shorter_than_declared() {
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(&ECHO[..6]);
        assert_eq!(
            decode_icmpv6(&mut c, ECHO.len(), &mut ctx),
            Err(DecodeError::UnexpectedEndOfData)
        );
        let mut c = Cursor::new(ECHO);
        assert!(matches!(
            decode_icmpv6(&mut c, 2, &mut ctx),
            Err(DecodeError::InvalidLength { declared: 2, .. })
        ));
    }
}
