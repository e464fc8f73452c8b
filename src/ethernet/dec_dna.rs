use crate::context::DecodeContext;
use crate::cursor::{Cursor, Endianness};
use crate::error::DecodeError;

/// DEC DNA Remote Console message: a length prefix and that many bytes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecDnaPacket<'a> {
    pub length: u16,
    pub data: &'a [u8],
}

/// Decode a Remote Console message
///
/// DEC protocols are little-endian: unlike every other protocol field, the length prefix is
/// not in network order.
pub fn decode_dec_dna<'a>(
    cursor: &mut Cursor<'a>,
    available: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<DecDnaPacket<'a>, DecodeError> {
    let length = cursor.read_u16(Endianness::Little)?;
    ctx.require(
        "DEC DNA",
        usize::from(length),
        available.saturating_sub(2),
    )?;
    let data = cursor.read_bytes(usize::from(length))?;
    Ok(DecDnaPacket { length, data })
}
