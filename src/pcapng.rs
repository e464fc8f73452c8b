//! PCAPNG file format
//!
//! See <https://datatracker.ietf.org/doc/html/draft-ietf-opsawg-pcapng> for details.
//!
//! A PCAPNG file is a sequence of blocks, each framed by its type and a length repeated at
//! both ends. A Section Header Block opens every section and its byte-order magic decides the
//! order of all fields up to the next section. Interface Description Blocks declare the link
//! type and timestamp resolution of the interfaces that Enhanced, Simple and obsolete Packet
//! Blocks refer to. Any other block is skipped.
//!
//! Packet blocks carry padding and options after the frame. [`PcapngFormat`] positions the
//! cursor on the frame and skips the rest of the block on the next call, so the scanner sees
//! the same `caplen`-bytes contract as for the other formats.

mod block;
mod interface;

pub use block::*;
pub use interface::*;

use tracing::debug;

use crate::capture::{CaptureContainer, RecordHeader};
use crate::cursor::Cursor;
use crate::error::{ContainerError, DecodeError};
use crate::linktype::Linktype;

/// PCAPNG container (Ethernet interfaces only, any timestamp resolution)
#[derive(Clone, Copy, Debug, Default)]
pub struct PcapngFormat;

/// Reader state of a PCAPNG capture: current section and its interfaces
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PcapngState {
    pub section: SectionHeader,
    interfaces: Vec<InterfaceDescription>,
    /// Index of the current section's first interface
    section_start: usize,
    /// Bytes of the last packet block left after its frame
    trailer: usize,
}

#[derive(Clone, Copy)]
struct Checkpoint {
    section: SectionHeader,
    interfaces: usize,
    section_start: usize,
    trailer: usize,
}

fn check_section(section: &SectionHeader) -> Result<(), ContainerError> {
    if section.version_major != 1 {
        return Err(ContainerError::UnexpectedHeaderField {
            field: "major version",
            found: section.version_major.into(),
            expected: 1,
        });
    }
    if section.version_minor != 0 {
        return Err(ContainerError::UnexpectedHeaderField {
            field: "minor version",
            found: section.version_minor.into(),
            expected: 0,
        });
    }
    Ok(())
}

/// Parse a block body whose fixed fields are `min_len` bytes long
fn parse_body<'a, O, F>(block: &RawBlock<'a>, min_len: usize, parser: F) -> Result<O, DecodeError>
where
    F: nom::Parser<&'a [u8], O, DecodeError>,
{
    if block.body.len() < min_len {
        return Err(DecodeError::TruncatedPacket {
            protocol: "PCAPNG block",
            needed: min_len,
            available: block.body.len(),
        });
    }
    Cursor::new(block.body).parse(parser)
}

impl PcapngState {
    pub fn new(section: SectionHeader) -> Self {
        PcapngState {
            section,
            interfaces: Vec::new(),
            section_start: 0,
            trailer: 0,
        }
    }

    /// Interfaces declared so far in the current section, in id order
    pub fn interfaces(&self) -> &[InterfaceDescription] {
        &self.interfaces[self.section_start..]
    }

    pub fn interface(&self, id: u32) -> Result<&InterfaceDescription, DecodeError> {
        self.interfaces()
            .get(id as usize)
            .ok_or(DecodeError::UnknownInterface(id))
    }

    fn start_section(&mut self, section: SectionHeader) {
        self.section = section;
        self.section_start = self.interfaces.len();
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            section: self.section,
            interfaces: self.interfaces.len(),
            section_start: self.section_start,
            trailer: self.trailer,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.section = checkpoint.section;
        self.interfaces.truncate(checkpoint.interfaces);
        self.section_start = checkpoint.section_start;
        self.trailer = checkpoint.trailer;
    }

    /// Skip blocks up to the next packet block and position the cursor on its frame
    fn next_record(&mut self, cursor: &mut Cursor<'_>) -> Result<Option<RecordHeader>, DecodeError> {
        cursor.skip(self.trailer)?;
        self.trailer = 0;
        loop {
            if cursor.at_end() {
                return Ok(None);
            }
            let mut next = cursor.clone();
            if next.rest().starts_with(&SHB_MAGIC.to_le_bytes()) {
                let section = next
                    .parse(parse_section_header)
                    .and_then(|section| check_section(&section).map(|()| section))
                    .map_err(|e| match e {
                        ContainerError::UnexpectedEndOfData => DecodeError::UnexpectedEndOfData,
                        e => DecodeError::InvalidSection(e),
                    })?;
                debug!(?section, "new PCAPNG section");
                self.start_section(section);
                *cursor = next;
                continue;
            }
            let order = self.section.order;
            let block = next.parse(parse_block(order))?;
            let block_len = next.position() - cursor.position();
            match block.block_type {
                BlockType::INTERFACE_DESCRIPTION => {
                    let interface =
                        parse_body(&block, IDB_HEADER_LEN, parse_interface_description(order))?;
                    if !interface.linktype.is_ethernet() {
                        return Err(DecodeError::UnsupportedLinktype(interface.linktype));
                    }
                    debug!(id = self.interfaces().len(), ?interface, "PCAPNG interface");
                    self.interfaces.push(interface);
                }
                BlockType::ENHANCED_PACKET => {
                    let packet =
                        parse_body(&block, EPB_HEADER_LEN, parse_enhanced_packet_header(order))?;
                    return self
                        .frame_record(cursor, &packet, EPB_HEADER_LEN, block_len, true)
                        .map(Some);
                }
                BlockType::PACKET => {
                    let packet =
                        parse_body(&block, PB_HEADER_LEN, parse_obsolete_packet_header(order))?;
                    return self
                        .frame_record(cursor, &packet, PB_HEADER_LEN, block_len, true)
                        .map(Some);
                }
                BlockType::SIMPLE_PACKET => {
                    let origlen =
                        parse_body(&block, SPB_HEADER_LEN, parse_simple_packet_header(order))?;
                    // no captured length: the frame is cut by the snapshot length or the block
                    let snaplen = self.interface(0)?.snaplen;
                    let mut caplen = origlen.min((block.body.len() - SPB_HEADER_LEN) as u32);
                    if snaplen != 0 {
                        caplen = caplen.min(snaplen);
                    }
                    let packet = PacketBlockHeader {
                        caplen,
                        origlen,
                        ..PacketBlockHeader::default()
                    };
                    return self
                        .frame_record(cursor, &packet, SPB_HEADER_LEN, block_len, false)
                        .map(Some);
                }
                other => debug!(block_type = %other, "skipping PCAPNG block"),
            }
            *cursor = next;
        }
    }

    /// Move the cursor from the start of a complete packet block to its frame
    fn frame_record(
        &mut self,
        cursor: &mut Cursor<'_>,
        packet: &PacketBlockHeader,
        header_len: usize,
        block_len: usize,
        timestamped: bool,
    ) -> Result<RecordHeader, DecodeError> {
        let interface = self.interface(packet.interface_id)?;
        let frame_offset = BLOCK_HEADER_LEN + header_len;
        let stored = block_len - BLOCK_OVERHEAD - header_len;
        let caplen = packet.caplen as usize;
        if caplen > stored {
            return Err(DecodeError::LengthMismatch {
                protocol: "PCAPNG packet block",
                declared: caplen,
                expected: stored,
            });
        }
        let (ts_sec, ts_usec) = if timestamped {
            interface.timestamp(packet.ticks())
        } else {
            (0, 0)
        };
        cursor.skip(frame_offset)?;
        self.trailer = block_len - frame_offset - caplen;
        Ok(RecordHeader {
            ts_sec,
            ts_usec,
            caplen: packet.caplen,
            origlen: packet.origlen,
        })
    }
}

impl CaptureContainer for PcapngFormat {
    type Header = PcapngState;

    const NAME: &'static str = "PCAPNG";

    fn read_global_header(cursor: &mut Cursor<'_>) -> Result<PcapngState, ContainerError> {
        let section = cursor.parse(parse_section_header)?;
        check_section(&section)?;
        Ok(PcapngState::new(section))
    }

    /// Every accepted interface is Ethernet
    fn linktype(state: &PcapngState) -> Linktype {
        state
            .interfaces()
            .first()
            .map_or(Linktype::ETHERNET, |interface| interface.linktype)
    }

    fn read_record_header(
        state: &mut PcapngState,
        cursor: &mut Cursor<'_>,
    ) -> Result<Option<RecordHeader>, DecodeError> {
        let checkpoint = state.checkpoint();
        let result = state.next_record(cursor);
        if result.is_err() {
            state.restore(checkpoint);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const SHB: &[u8] = &hex!(
        "
0A 0D 0D 0A 1C 00 00 00 4D 3C 2B 1A 01 00 00 00
FF FF FF FF FF FF FF FF 1C 00 00 00"
    );
    const IDB: &[u8] = &hex!("01 00 00 00 14 00 00 00 01 00 00 00 FF FF 00 00 14 00 00 00");
    const IDB_NULL: &[u8] = &hex!("01 00 00 00 14 00 00 00 00 00 00 00 FF FF 00 00 14 00 00 00");
    // interface statistics: skipped
    const ISB: &[u8] = &hex!(
        "05 00 00 00 18 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 18 00 00 00"
    );
    // 3 frame bytes, 1 padding byte, t = 1.5 s
    const EPB: &[u8] = &hex!(
        "
06 00 00 00 24 00 00 00 00 00 00 00 00 00 00 00
60 E3 16 00 03 00 00 00 03 00 00 00 AA BB CC 00
24 00 00 00"
    );
    // 2 frame bytes, 2 padding bytes
    const SPB: &[u8] = &hex!("03 00 00 00 14 00 00 00 02 00 00 00 DD EE 00 00 14 00 00 00");

    fn capture(blocks: &[&[u8]]) -> Vec<u8> {
        blocks.concat()
    }

    #[test]
    fn packets_skip_other_blocks() {
        let data = capture(&[SHB, IDB, ISB, EPB, SPB]);
        let mut c = Cursor::new(&data);
        let mut state = PcapngFormat::read_global_header(&mut c).expect("section header");
        assert_eq!(c.position(), SHB.len());
        assert_eq!(PcapngFormat::linktype(&state), Linktype::ETHERNET);

        let r = PcapngFormat::read_record_header(&mut state, &mut c)
            .expect("record")
            .expect("EPB");
        assert_eq!((r.ts_sec, r.ts_usec, r.caplen, r.origlen), (1, 500_000, 3, 3));
        assert_eq!(c.read_bytes(3), Ok(&hex!("AA BB CC")[..]));
        assert_eq!(state.interfaces().len(), 1);

        let r = PcapngFormat::read_record_header(&mut state, &mut c)
            .expect("record")
            .expect("SPB");
        assert_eq!((r.ts_sec, r.caplen, r.origlen), (0, 2, 2));
        assert_eq!(c.read_bytes(2), Ok(&hex!("DD EE")[..]));

        assert_eq!(PcapngFormat::read_record_header(&mut state, &mut c), Ok(None));
        assert_eq!(c.position(), data.len());
    }

    #[test]
    fn big_endian_section() {
        let data = hex!(
            "
0A 0D 0D 0A 00 00 00 1C 1A 2B 3C 4D 00 01 00 00
FF FF FF FF FF FF FF FF 00 00 00 1C
00 00 00 01 00 00 00 14 00 01 00 00 00 00 FF FF 00 00 00 14
00 00 00 06 00 00 00 24 00 00 00 00 00 00 00 00
00 0F 42 40 00 00 00 02 00 00 00 02 AA BB 00 00
00 00 00 24"
        );
        let mut c = Cursor::new(&data);
        let mut state = PcapngFormat::read_global_header(&mut c).expect("section header");
        let r = PcapngFormat::read_record_header(&mut state, &mut c)
            .expect("record")
            .expect("EPB");
        assert_eq!((r.ts_sec, r.ts_usec, r.caplen), (1, 0, 2));
        c.skip(2).expect("frame");
        assert_eq!(PcapngFormat::read_record_header(&mut state, &mut c), Ok(None));
    }

    #[test]
    fn reject_section_version() {
        let mut data = SHB.to_vec();
        data[12] = 2;
        assert_eq!(
            PcapngFormat::read_global_header(&mut Cursor::new(&data)),
            Err(ContainerError::UnexpectedHeaderField {
                field: "major version",
                found: 2,
                expected: 1
            })
        );
        assert_eq!(
            PcapngFormat::read_global_header(&mut Cursor::new(&SHB[..16])),
            Err(ContainerError::UnexpectedEndOfData)
        );
    }

    #[test]
    fn reject_non_ethernet_interface() {
        let data = capture(&[SHB, IDB_NULL, EPB]);
        let mut c = Cursor::new(&data);
        let mut state = PcapngFormat::read_global_header(&mut c).expect("section header");
        assert_eq!(
            PcapngFormat::read_record_header(&mut state, &mut c),
            Err(DecodeError::UnsupportedLinktype(Linktype::NULL))
        );
    }

    #[test]
    fn packet_needs_declared_interface() {
        let data = capture(&[SHB, EPB]);
        let mut c = Cursor::new(&data);
        let mut state = PcapngFormat::read_global_header(&mut c).expect("section header");
        assert_eq!(
            PcapngFormat::read_record_header(&mut state, &mut c),
            Err(DecodeError::UnknownInterface(0))
        );
    }

    #[test]
    fn caplen_beyond_block() {
        let mut epb = EPB.to_vec();
        epb[20] = 8;
        let data = capture(&[SHB, IDB, &epb[..]]);
        let mut c = Cursor::new(&data);
        let mut state = PcapngFormat::read_global_header(&mut c).expect("section header");
        assert_eq!(
            PcapngFormat::read_record_header(&mut state, &mut c),
            Err(DecodeError::LengthMismatch {
                protocol: "PCAPNG packet block",
                declared: 8,
                expected: 4,
            })
        );
    }

    #[test]
    fn partial_block_leaves_state_unchanged() {
        let data = capture(&[SHB, IDB, ISB, EPB]);
        let cut = &data[..data.len() - 4];
        let mut c = Cursor::new(cut);
        let mut state = PcapngFormat::read_global_header(&mut c).expect("section header");
        let before = state.clone();
        assert_eq!(
            PcapngFormat::read_record_header(&mut state, &mut c.clone()),
            Err(DecodeError::UnexpectedEndOfData)
        );
        assert_eq!(state, before);

        // retrying over the whole capture declares the interface once
        let mut c = Cursor::new(&data[SHB.len()..]);
        let r = PcapngFormat::read_record_header(&mut state, &mut c)
            .expect("record")
            .expect("EPB");
        assert_eq!(r.caplen, 3);
        assert_eq!(state.interfaces().len(), 1);
    }

    #[test]
    fn new_section_resets_interfaces() {
        let data = capture(&[SHB, IDB, SHB, EPB]);
        let mut c = Cursor::new(&data);
        let mut state = PcapngFormat::read_global_header(&mut c).expect("section header");
        assert_eq!(
            PcapngFormat::read_record_header(&mut state, &mut c),
            Err(DecodeError::UnknownInterface(0))
        );
        assert!(state.interfaces().is_empty());
    }
}
