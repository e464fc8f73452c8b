use nom::number::streaming::be_u16;
use nom::IResult;

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::ip::IpProtocol;

pub const UDP_HEADER_LEN: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UdpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    /// Length of header and payload
    pub length: u16,
    pub checksum: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UdpDatagram<'a> {
    pub header: UdpHeader,
    pub payload: &'a [u8],
}

pub fn parse_udp_header(i: &[u8]) -> IResult<&[u8], UdpHeader, DecodeError> {
    let (i, source_port) = be_u16(i)?;
    let (i, destination_port) = be_u16(i)?;
    let (i, length) = be_u16(i)?;
    let (i, checksum) = be_u16(i)?;
    let header = UdpHeader {
        source_port,
        destination_port,
        length,
        checksum,
    };
    Ok((i, header))
}

/// Decode a UDP datagram of `length` bytes (the IP payload length)
///
/// The datagram's own length field must match `length`.
pub fn decode_udp<'a>(
    cursor: &mut Cursor<'a>,
    length: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<UdpDatagram<'a>, DecodeError> {
    let header = cursor.parse(parse_udp_header)?;
    let declared = usize::from(header.length);
    if declared != length {
        return Err(ctx.fail(DecodeError::LengthMismatch {
            protocol: "UDP",
            declared,
            expected: length,
        }));
    }
    let payload_length = ctx.payload_length("UDP", declared, UDP_HEADER_LEN)?;
    ctx.notify_transport(
        IpProtocol::UDP,
        header.source_port,
        header.destination_port,
        payload_length,
    );
    let payload = cursor.read_bytes(payload_length)?;
    Ok(UdpDatagram { header, payload })
}
