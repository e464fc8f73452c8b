use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::error::DecodeError;

/// Size of the LLDP block taken from the frame
pub const LLDP_BLOCK_LEN: usize = 46;

/// LLDP data unit, kept opaque
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LldpPacket<'a> {
    pub data: &'a [u8],
}

pub fn decode_lldp<'a>(
    cursor: &mut Cursor<'a>,
    available: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<LldpPacket<'a>, DecodeError> {
    ctx.require("LLDP", LLDP_BLOCK_LEN, available)?;
    let data = cursor.read_bytes(LLDP_BLOCK_LEN)?;
    Ok(LldpPacket { data })
}
