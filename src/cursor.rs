//! Position-tracking reader over a captured byte stream

use nom::bytes::streaming::take;
use nom::combinator::complete;
use nom::error::{ErrorKind, ParseError};
use nom::number::streaming as num;
use nom::{Offset, Parser};

pub use nom::number::Endianness;

use crate::error::DecodeError;

/// Ordered byte source with an explicit read position
///
/// All reads are bounded by the underlying slice: a read or skip that asks for more bytes than
/// remain fails with [`DecodeError::UnexpectedEndOfData`] and leaves the position unchanged.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    /// Number of bytes consumed so far
    pub const fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Unconsumed bytes, without advancing
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Run a nom parser over the unconsumed bytes and advance past what it consumed
    ///
    /// The parser is run in `complete` mode: running out of input is reported through
    /// `ErrorKind::Complete`, which both crate error types map to their end-of-data variant.
    pub fn parse<O, E, F>(&mut self, parser: F) -> Result<O, E>
    where
        F: Parser<&'a [u8], O, E>,
        E: ParseError<&'a [u8]>,
    {
        let input = self.rest();
        let mut parser = complete(parser);
        match parser.parse(input) {
            Ok((rem, value)) => {
                self.pos += input.offset(rem);
                Ok(value)
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e),
            Err(nom::Err::Incomplete(_)) => Err(E::from_error_kind(input, ErrorKind::Complete)),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.parse(num::u8)
    }

    pub fn read_u16(&mut self, order: Endianness) -> Result<u16, DecodeError> {
        self.parse(num::u16(order))
    }

    pub fn read_u32(&mut self, order: Endianness) -> Result<u32, DecodeError> {
        self.parse(num::u32(order))
    }

    pub fn read_u64(&mut self, order: Endianness) -> Result<u64, DecodeError> {
        self.parse(num::u64(order))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.parse(take(n))
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.read_bytes(n).map(|_| ())
    }

    /// Split off the next `n` bytes as an independent cursor, advancing past them
    pub fn take(&mut self, n: usize) -> Result<Cursor<'a>, DecodeError> {
        self.read_bytes(n).map(Cursor::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use nom::number::streaming::be_u16;

    const DATA: &[u8] = &hex!("01 02 03 04 05 06 07 08 09 0a");

    #[test]
    fn read_both_orders() {
        let mut c = Cursor::new(DATA);
        assert_eq!(c.read_u8(), Ok(0x01));
        assert_eq!(c.read_u16(Endianness::Big), Ok(0x0203));
        assert_eq!(c.read_u16(Endianness::Little), Ok(0x0504));
        assert_eq!(c.position(), 5);
        assert_eq!(c.read_u32(Endianness::Big), Ok(0x0607_0809));
        assert_eq!(c.remaining(), 1);
        assert!(!c.at_end());
    }

    #[test]
    fn short_read_keeps_position() {
        let mut c = Cursor::new(DATA);
        c.skip(8).expect("skip");
        assert_eq!(c.read_u32(Endianness::Big), Err(DecodeError::UnexpectedEndOfData));
        assert_eq!(c.read_u64(Endianness::Little), Err(DecodeError::UnexpectedEndOfData));
        assert_eq!(c.position(), 8);
        assert_eq!(c.read_bytes(2), Ok(&hex!("09 0a")[..]));
        assert!(c.at_end());
        assert_eq!(c.skip(1), Err(DecodeError::UnexpectedEndOfData));
    }

    #[test]
    fn take_bounds_sub_cursor() {
        let mut c = Cursor::new(DATA);
        let mut sub = c.take(3).expect("take");
        assert_eq!(c.position(), 3);
        assert_eq!(sub.read_u16(Endianness::Big), Ok(0x0102));
        assert_eq!(sub.read_u16(Endianness::Big), Err(DecodeError::UnexpectedEndOfData));
        assert_eq!(sub.remaining(), 1);
    }

    #[test]
    fn parse_advances_by_consumed() {
        let mut c = Cursor::new(DATA);
        let v: Result<(u16, u16), DecodeError> = c.parse(nom::sequence::pair(be_u16, be_u16));
        assert_eq!(v, Ok((0x0102, 0x0304)));
        assert_eq!(c.position(), 4);
        assert_eq!(c.rest(), &DATA[4..]);
    }
}
