use nom::number::streaming::{be_u16, be_u32, be_u8};
use nom::IResult;

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;

pub const EIGRP_HEADER_LEN: usize = 20;

/// Fixed EIGRP header; TLVs follow and are kept raw
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EigrpHeader {
    pub version: u8,
    pub opcode: u8,
    pub checksum: u16,
    pub flags: u32,
    pub sequence: u32,
    pub acknowledgment: u32,
    pub autonomous_system: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EigrpPacket<'a> {
    pub header: EigrpHeader,
    pub tlvs: &'a [u8],
}

pub fn parse_eigrp_header(i: &[u8]) -> IResult<&[u8], EigrpHeader, DecodeError> {
    let (i, version) = be_u8(i)?;
    let (i, opcode) = be_u8(i)?;
    let (i, checksum) = be_u16(i)?;
    let (i, flags) = be_u32(i)?;
    let (i, sequence) = be_u32(i)?;
    let (i, acknowledgment) = be_u32(i)?;
    let (i, autonomous_system) = be_u32(i)?;
    let header = EigrpHeader {
        version,
        opcode,
        checksum,
        flags,
        sequence,
        acknowledgment,
        autonomous_system,
    };
    Ok((i, header))
}

pub fn decode_eigrp<'a>(
    cursor: &mut Cursor<'a>,
    length: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<EigrpPacket<'a>, DecodeError> {
    let body = ctx.payload_length("EIGRP", length, EIGRP_HEADER_LEN)?;
    let header = cursor.parse(parse_eigrp_header)?;
    let tlvs = cursor.read_bytes(body)?;
    Ok(EigrpPacket { header, tlvs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // hello, AS 100, one parameter TLV
    const HELLO: &[u8] = &hex!(
        "
02 05 ee d1 00 00 00 00 00 00 00 00 00 00 00 00
00 00 00 64 00 01 00 0c 01 00 01 00 00 00 00 0f"
    );

    #[test]
    fn hello() {
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(HELLO);
        let p = decode_eigrp(&mut c, HELLO.len(), &mut ctx).expect("eigrp");
        assert_eq!(p.header.opcode, 5);
        assert_eq!(p.header.autonomous_system, 100);
        assert_eq!(p.tlvs.len(), 12);
        assert!(c.at_end());
    }

    #[test]
    fn length_shorter_than_header() {
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(HELLO);
        assert_eq!(
            decode_eigrp(&mut c, 12, &mut ctx),
            Err(DecodeError::InvalidLength {
                protocol: "EIGRP",
                declared: 12,
                header: EIGRP_HEADER_LEN,
            })
        );
        drop(ctx);
        assert_eq!(c.position(), 0);
        assert_eq!(sink.len(), 1);
    }
}
