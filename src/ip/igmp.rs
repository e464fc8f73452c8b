use std::net::Ipv4Addr;

use nom::combinator::map;
use nom::number::streaming::{be_u16, be_u32, be_u8};
use nom::IResult;

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;

pub const IGMP_MESSAGE_LEN: usize = 8;

/// IGMPv2 message (RFC 2236)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IgmpMessage {
    pub igmp_type: u8,
    /// In tenths of a second
    pub max_response_time: u8,
    pub checksum: u16,
    pub group_address: Ipv4Addr,
}

pub fn parse_igmp_message(i: &[u8]) -> IResult<&[u8], IgmpMessage, DecodeError> {
    let (i, igmp_type) = be_u8(i)?;
    let (i, max_response_time) = be_u8(i)?;
    let (i, checksum) = be_u16(i)?;
    let (i, group_address) = map(be_u32, Ipv4Addr::from)(i)?;
    let msg = IgmpMessage {
        igmp_type,
        max_response_time,
        checksum,
        group_address,
    };
    Ok((i, msg))
}

/// Decode the fixed IGMPv2 message from an IPv4 payload of `length` bytes
pub fn decode_igmpv2(
    cursor: &mut Cursor<'_>,
    length: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<IgmpMessage, DecodeError> {
    ctx.require("IGMPv2", IGMP_MESSAGE_LEN, length)?;
    cursor.parse(parse_igmp_message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn membership_report() {
        let input = hex!("16 00 fa 04 ef ff ff fa");
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(&input);
        let m = decode_igmpv2(&mut c, 8, &mut ctx).expect("igmp");
        assert_eq!(m.igmp_type, 0x16);
        assert_eq!(m.group_address, Ipv4Addr::new(239, 255, 255, 250));
        assert!(c.at_end());
        let mut c = Cursor::new(&input);
        assert!(decode_igmpv2(&mut c, 6, &mut ctx).is_err());
        drop(ctx);
        assert_eq!(sink.len(), 1);
    }
}
