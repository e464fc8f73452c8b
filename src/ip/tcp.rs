use nom::number::streaming::{be_u16, be_u32, be_u8};
use nom::IResult;

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::ip::IpProtocol;

pub const TCP_MIN_HEADER_LEN: usize = 20;
pub const TCP_MAX_HEADER_LEN: usize = 60;

/// TCP control bits (the flags byte)
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TcpFlags(pub u8);

impl TcpFlags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
    pub const ECE: u8 = 0x40;
    pub const CWR: u8 = 0x80;

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TcpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence: u32,
    pub acknowledgment: u32,
    /// Data offset (high nibble), reserved bits and the NS flag (low bit)
    pub data_offset: u8,
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
}

impl TcpHeader {
    /// Header length in bytes, options included
    pub fn header_length(&self) -> usize {
        usize::from(self.data_offset >> 4) * 4
    }

    /// ECN nonce sum flag
    pub fn ns(&self) -> bool {
        self.data_offset & 0x01 != 0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TcpSegment<'a> {
    pub header: TcpHeader,
    pub options: &'a [u8],
    pub payload: &'a [u8],
}

pub fn parse_tcp_header(i: &[u8]) -> IResult<&[u8], TcpHeader, DecodeError> {
    let (i, source_port) = be_u16(i)?;
    let (i, destination_port) = be_u16(i)?;
    let (i, sequence) = be_u32(i)?;
    let (i, acknowledgment) = be_u32(i)?;
    let (i, data_offset) = be_u8(i)?;
    let (i, flags) = be_u8(i)?;
    let (i, window) = be_u16(i)?;
    let (i, checksum) = be_u16(i)?;
    let (i, urgent_pointer) = be_u16(i)?;
    let header = TcpHeader {
        source_port,
        destination_port,
        sequence,
        acknowledgment,
        data_offset,
        flags: TcpFlags(flags),
        window,
        checksum,
        urgent_pointer,
    };
    Ok((i, header))
}

/// Decode a TCP segment of `length` bytes (the IP payload length)
///
/// Options and payload are returned as raw slices. Observers are notified once the header
/// length has been validated, before the payload is read.
pub fn decode_tcp<'a>(
    cursor: &mut Cursor<'a>,
    length: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<TcpSegment<'a>, DecodeError> {
    let header = cursor.parse(parse_tcp_header)?;
    let header_length = header.header_length();
    if !(TCP_MIN_HEADER_LEN..=TCP_MAX_HEADER_LEN).contains(&header_length) {
        return Err(ctx.fail(DecodeError::InvalidHeaderLength {
            protocol: "TCP",
            length: header_length,
            min: TCP_MIN_HEADER_LEN,
            max: TCP_MAX_HEADER_LEN,
        }));
    }
    let options = cursor.read_bytes(header_length - TCP_MIN_HEADER_LEN)?;
    let payload_length = ctx.payload_length("TCP", length, header_length)?;
    ctx.notify_transport(
        IpProtocol::TCP,
        header.source_port,
        header.destination_port,
        payload_length,
    );
    let payload = cursor.read_bytes(payload_length)?;
    Ok(TcpSegment {
        header,
        options,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::Facts;
    use hex_literal::hex;

    // 80 -> 49152, SYN+ACK, data offset 10 (20 option bytes), 3 payload bytes
    const SEGMENT: &[u8] = &hex!(
        "
00 50 c0 00 00 00 00 01 00 00 00 02 a0 12 ff ff
00 00 00 00
02 04 05 b4 04 02 08 0a 00 00 00 01 00 00 00 00
01 03 03 07
47 45 54"
    );

    #[test]
    fn options_skipped_before_payload() {
        let mut sink: Vec<String> = Vec::new();
        let mut observer = Facts::default();
        let mut ctx = DecodeContext::new(4, 0.5, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(SEGMENT);
        let s = decode_tcp(&mut c, SEGMENT.len(), &mut ctx).expect("tcp");
        drop(ctx);
        assert_eq!(s.header.header_length(), 40);
        assert_eq!(s.options.len(), 20);
        assert_eq!(s.options[0], 0x02);
        assert_eq!(s.payload, b"GET");
        assert!(s.header.flags.contains(TcpFlags::SYN | TcpFlags::ACK));
        assert!(!s.header.flags.contains(TcpFlags::FIN));
        assert!(c.at_end());
        assert_eq!(observer.0.len(), 1);
        assert_eq!(observer.0[0].source_port, 80);
        assert_eq!(observer.0[0].destination_port, 49152);
        assert_eq!(observer.0[0].payload_length, 3);
        assert!(sink.is_empty());
    }

    #[test]
    fn header_length_out_of_range() {
        let mut input = SEGMENT.to_vec();
        input[12] = 0x40;
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(&input);
        assert_eq!(
            decode_tcp(&mut c, input.len(), &mut ctx),
            Err(DecodeError::InvalidHeaderLength {
                protocol: "TCP",
                length: 16,
                min: 20,
                max: 60
            })
        );
        drop(ctx);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn supplied_length_shorter_than_header() {
        let mut sink: Vec<String> = Vec::new();
        let mut observer = ();
        let mut ctx = DecodeContext::new(1, 0.0, 1, &mut sink, &mut observer);
        let mut c = Cursor::new(SEGMENT);
        assert!(matches!(
            decode_tcp(&mut c, 30, &mut ctx),
            Err(DecodeError::InvalidLength {
                declared: 30,
                header: 40,
                ..
            })
        ));
    }
}
