use nom::bytes::streaming::take;
use nom::number::streaming::be_u16;
use nom::IResult;

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;

pub const LOOPBACK_HEADER_LEN: usize = 6;
pub const LOOPBACK_DATA_LEN: usize = 40;

/// Configuration Testing Protocol (loopback) message
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoopbackPacket<'a> {
    pub skip_count: u16,
    pub function: u16,
    pub receipt_number: u16,
    pub data: &'a [u8],
}

pub fn parse_loopback_packet(i: &[u8]) -> IResult<&[u8], LoopbackPacket<'_>, DecodeError> {
    let (i, skip_count) = be_u16(i)?;
    let (i, function) = be_u16(i)?;
    let (i, receipt_number) = be_u16(i)?;
    let (i, data) = take(LOOPBACK_DATA_LEN)(i)?;
    let packet = LoopbackPacket {
        skip_count,
        function,
        receipt_number,
        data,
    };
    Ok((i, packet))
}

pub fn decode_loopback<'a>(
    cursor: &mut Cursor<'a>,
    available: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<LoopbackPacket<'a>, DecodeError> {
    ctx.require(
        "Loopback",
        LOOPBACK_HEADER_LEN + LOOPBACK_DATA_LEN,
        available,
    )?;
    cursor.parse(parse_loopback_packet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply() {
        let mut input = vec![0x00, 0x00, 0x00, 0x01, 0x12, 0x34];
        input.extend_from_slice(&[0xaa; LOOPBACK_DATA_LEN]);
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(&input);
        let p = decode_loopback(&mut c, input.len(), &mut ctx).expect("loopback");
        assert_eq!(p.function, 1);
        assert_eq!(p.receipt_number, 0x1234);
        assert_eq!(p.data.len(), LOOPBACK_DATA_LEN);
        assert!(c.at_end());
        let mut c = Cursor::new(&input);
        assert!(decode_loopback(&mut c, 45, &mut ctx).is_err());
    }
}
