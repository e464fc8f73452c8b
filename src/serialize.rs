use crate::capture::CaptureRecord;
use crate::enc::*;
use crate::pcap::*;
use cookie_factory::bytes::{be_i32, be_u16, be_u32, le_i16, le_i32, le_i8, le_u16, le_u32, le_u8};
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError};

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation.
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self) -> Result<Vec<u8>, GenError> {
        self.fix();
        self.to_vec_raw()
    }

    /// Check and correct all fields: use magic, fix lengths fields and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation. Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError>;
}

impl ToVec for PcapHeader {
    /// Keep the byte order selected by the magic, defaulting to little-endian
    fn fix(&mut self) {
        if self.magic_number != PCAP_MAGIC_SWAPPED {
            self.magic_number = PCAP_MAGIC;
        }
        self.version_major = 2;
        self.version_minor = 4;
    }

    /// The magic number is always written as read, so a big-endian header stays big-endian
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(PCAP_HEADER_LEN);
        if self.is_bigendian() {
            gen(
                tuple((
                    le_u32(self.magic_number),
                    be_u16(self.version_major),
                    be_u16(self.version_minor),
                    be_i32(self.thiszone),
                    be_u32(self.sigfigs),
                    be_u32(self.snaplen),
                    be_i32(self.network.0),
                )),
                &mut v,
            )
            .map(|res| res.0.to_vec())
        } else {
            gen(
                tuple((
                    le_u32(self.magic_number),
                    le_u16(self.version_major),
                    le_u16(self.version_minor),
                    le_i32(self.thiszone),
                    le_u32(self.sigfigs),
                    le_u32(self.snaplen),
                    le_i32(self.network.0),
                )),
                &mut v,
            )
            .map(|res| res.0.to_vec())
        }
    }
}

impl<'a> ToVec for CaptureRecord<'a> {
    fn fix(&mut self) {
        self.header.caplen = self.data.len() as u32;
        if self.header.origlen < self.header.caplen {
            self.header.origlen = self.header.caplen;
        }
    }

    /// PCAP record in little-endian order
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.data.len() + PCAP_RECORD_HEADER_LEN);
        gen(
            tuple((
                le_u32(self.header.ts_sec),
                le_u32(self.header.ts_usec),
                le_u32(self.header.caplen),
                le_u32(self.header.origlen),
                slice(self.data),
            )),
            &mut v,
        )
        // pcap records have no alignment constraints
        .map(|res| res.0.to_vec())
    }
}

impl ToVec for EncHeader {
    /// Set the signature record fields to the only accepted version
    fn fix(&mut self) {
        self.record_type = EncRecordType::VERSION;
        self.version_major = 4;
        self.version_minor = 0;
        self.file_type = 4;
        self.format_version = 1;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(ENC_HEADER_LEN);
        gen(
            tuple((
                slice(&ENC_SIGNATURE[..]),
                le_u16(self.record_type.0),
                le_u32(self.record_length),
                le_i16(self.version_major),
                le_i16(self.version_minor),
                le_i16(self.time),
                le_i16(self.date),
                le_i8(self.file_type),
                le_u8(self.network),
                le_i8(self.format_version),
                le_u8(self.timestamp_units),
                le_i8(self.compression_version),
                le_i8(self.compression_level),
                le_i32(self.reserved),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for EncFrameRecord<'a> {
    fn fix(&mut self) {
        self.descriptor.size = self.data.len() as u16;
        if self.descriptor.true_size != 0 && self.descriptor.true_size < self.descriptor.size {
            self.descriptor.true_size = self.descriptor.size;
        }
    }

    /// TYPE2 record: record header, frame descriptor and frame bytes
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let body_len = ENC_FRAME_DESCRIPTOR_LEN + self.data.len();
        let d = &self.descriptor;
        let mut v = Vec::with_capacity(ENC_RECORD_HEADER_LEN + body_len);
        gen(
            tuple((
                le_u16(EncRecordType::TYPE2.0),
                le_u32(body_len as u32),
                le_u16(d.time_low),
                le_u16(d.time_mid),
                le_u8(d.time_high),
                le_u8(d.time_days),
                le_u16(d.size),
                le_u8(d.frame_error_status),
                le_u8(d.flags),
                le_u16(d.true_size),
                le_u16(d.reserved),
                slice(self.data),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

/// Serialized ENC end-of-file record
pub fn enc_eof_record() -> Vec<u8> {
    let mut v = EncRecordType::EOF.0.to_le_bytes().to_vec();
    v.extend_from_slice(&[0; 4]);
    v
}
