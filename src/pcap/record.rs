use nom::number::streaming as num;
use nom::number::Endianness;
use nom::IResult;

use crate::capture::RecordHeader;
use crate::error::DecodeError;

pub const PCAP_RECORD_HEADER_LEN: usize = 16;

/// Read a PCAP record header
///
/// Each PCAP record starts with a small header, and is followed by `caplen` bytes of packet
/// data. Fields are read in the byte order of the capture's global header and are not
/// validated.
pub fn parse_pcap_record_header<'a>(
    order: Endianness,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], RecordHeader, DecodeError> {
    move |i| {
        let (i, ts_sec) = num::u32(order)(i)?;
        let (i, ts_usec) = num::u32(order)(i)?;
        let (i, caplen) = num::u32(order)(i)?;
        let (i, origlen) = num::u32(order)(i)?;
        let header = RecordHeader {
            ts_sec,
            ts_usec,
            caplen,
            origlen,
        };
        Ok((i, header))
    }
}
