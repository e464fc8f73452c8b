use nom::bytes::streaming::take;
use nom::combinator::complete;
use nom::multi::many0;
use nom::number::streaming as num;
use nom::number::Endianness;
use nom::IResult;
use rusticata_macros::{align32, newtype_enum};

use crate::error::DecodeError;
use crate::linktype::Linktype;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    END_OF_OPT = 0,
    COMMENT = 1,
    IF_NAME = 2,
    IF_TSRESOL = 9,
    IF_TSOFFSET = 14,
}
}

/// Default `if_tsresol`: microseconds
const DEFAULT_TSRESOL: u8 = 6;

/// What the records of one capture interface need: its link type and clock
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InterfaceDescription {
    pub linktype: Linktype,
    pub snaplen: u32,
    /// Raw `if_tsresol` option value
    pub if_tsresol: u8,
    /// Timestamp units per second, decoded from `if_tsresol`
    pub units_per_second: u64,
    /// Seconds added to every timestamp (`if_tsoffset`)
    pub ts_offset: i64,
}

impl InterfaceDescription {
    /// Split a packet timestamp into seconds and microseconds
    pub fn timestamp(&self, ticks: u64) -> (u32, u32) {
        let seconds = (ticks / self.units_per_second) as i64 + self.ts_offset;
        let fraction = u128::from(ticks % self.units_per_second);
        let usec = fraction * 1_000_000 / u128::from(self.units_per_second);
        (seconds as u32, usec as u32)
    }
}

/// Compute the timestamp resolution, in units per second
///
/// The high bit selects a power of two, otherwise a power of ten. Returns `None` if the
/// resolution does not fit in a `u64`.
pub fn build_ts_resolution(if_tsresol: u8) -> Option<u64> {
    let exponent = u32::from(if_tsresol & 0x7f);
    if if_tsresol & 0x80 == 0 {
        10u64.checked_pow(exponent)
    } else {
        1u64.checked_shl(exponent)
    }
}

/// Read one option: code, length and value (the value is returned without its padding)
pub fn parse_option<'a>(
    order: Endianness,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], (OptionCode, &'a [u8]), DecodeError> {
    move |i| {
        let (i, code) = num::u16(order)(i)?;
        let (i, len) = num::u16(order)(i)?;
        let (i, value) = take(align32!(u32::from(len)))(i)?;
        Ok((i, (OptionCode(code), &value[..usize::from(len)])))
    }
}

/// Read an Interface Description Block body
///
/// Only `if_tsresol` and `if_tsoffset` are kept from the options. An undecodable resolution
/// is rejected, since no timestamp of the interface could be trusted.
pub fn parse_interface_description<'a>(
    order: Endianness,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], InterfaceDescription, DecodeError> {
    move |i| {
        let (i, linktype) = num::u16(order)(i)?;
        let (i, _reserved) = num::u16(order)(i)?;
        let (i, snaplen) = num::u32(order)(i)?;
        let (i, options) = many0(complete(parse_option(order)))(i)?;
        let mut if_tsresol = DEFAULT_TSRESOL;
        let mut ts_offset = 0;
        for (code, value) in options
            .iter()
            .take_while(|(code, _)| *code != OptionCode::END_OF_OPT)
        {
            match *code {
                OptionCode::IF_TSRESOL => {
                    if let Some(&v) = value.first() {
                        if_tsresol = v;
                    }
                }
                OptionCode::IF_TSOFFSET => {
                    if let Ok((_, v)) = num::i64::<&[u8], DecodeError>(order)(*value) {
                        ts_offset = v;
                    }
                }
                _ => (),
            }
        }
        let units_per_second = build_ts_resolution(if_tsresol).ok_or(nom::Err::Error(
            DecodeError::InvalidTimestampResolution(if_tsresol),
        ))?;
        let interface = InterfaceDescription {
            linktype: Linktype(i32::from(linktype)),
            snaplen,
            if_tsresol,
            units_per_second,
            ts_offset,
        };
        Ok((i, interface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn resolutions() {
        assert_eq!(build_ts_resolution(6), Some(1_000_000));
        assert_eq!(build_ts_resolution(9), Some(1_000_000_000));
        assert_eq!(build_ts_resolution(0x8a), Some(1024));
        assert_eq!(build_ts_resolution(20), None);
        assert_eq!(build_ts_resolution(0xc0), None);
    }

    #[test]
    fn default_microseconds() {
        let body = hex!("01 00 00 00 FF FF 00 00");
        let (_, idb) = parse_interface_description(Endianness::Little)(&body).expect("IDB");
        assert_eq!(idb.linktype, Linktype::ETHERNET);
        assert_eq!(idb.snaplen, 0xffff);
        assert_eq!(idb.units_per_second, 1_000_000);
        // '97 c3 04 00 aa 47 ca 64' is 2012-06-29 07:28:25.298858 UTC
        assert_eq!(idb.timestamp(0x0004_c397_64ca_47aa), (1_340_954_905, 298_858));
    }

    #[test]
    fn resolution_and_offset_options() {
        let body = hex!(
            "
00 01 00 00 00 00 FF FF
00 02 00 04 65 74 68 30
00 09 00 01 09 00 00 00
00 0E 00 08 00 00 00 00 00 00 00 0A
00 00 00 00"
        );
        let (_, idb) = parse_interface_description(Endianness::Big)(&body).expect("IDB");
        assert_eq!(idb.if_tsresol, 9);
        assert_eq!(idb.ts_offset, 10);
        assert_eq!(idb.timestamp(2_500_000_000), (12, 500_000));
    }

    #[test]
    fn invalid_resolution() {
        let body = hex!("01 00 00 00 FF FF 00 00 09 00 01 00 7F 00 00 00");
        assert_eq!(
            parse_interface_description(Endianness::Little)(&body),
            Err(nom::Err::Error(DecodeError::InvalidTimestampResolution(0x7f)))
        );
    }
}
