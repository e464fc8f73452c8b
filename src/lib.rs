//! # Capture dissector
//!
//! This crate reads packet capture files in the PCAP format (either byte order), the PCAPNG
//! block format or the Network Associates Sniffer ENC format, and dissects every captured Ethernet frame down to
//! the transport layer: 802.1Q VLAN tags, ARP/RARP, LLDP, loopback, DEC DNA Remote Console,
//! IPv4 with ICMP, IGMP, TCP, UDP and EIGRP.
//!
//! Parsing is zero-copy: decoded structures borrow from the capture data. Every length
//! field is checked against the bytes actually available before it is trusted, and every
//! failure is reported to an [`ErrorSink`] with its packet number before it propagates.
//!
//! # Example: scanning a capture in memory
//!
//! ```rust
//! use capture_dissector::{CaptureFormat, Scanner, TracingSink};
//!
//! # let data: &[u8] = &[
//! #     0xd4, 0xc3, 0xb2, 0xa1, 2, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0,
//! #     0xff, 0xff, 0, 0, 1, 0, 0, 0,
//! # ];
//! let format = CaptureFormat::detect(data).expect("known capture format");
//! let mut scanner = Scanner::new(TracingSink, ());
//! match scanner.scan_format(format, data) {
//!     Ok(summary) => println!("{} packets, {} decoded", summary.packets, summary.decoded),
//!     Err(e) => println!("scan failed: {}", e),
//! }
//! ```
//!
//! Large files can be scanned from any [`Read`](std::io::Read) source with
//! [`Scanner::scan_reader`], which frames records through a [`CaptureReader`].
//!
//! # Observing packets
//!
//! Implement [`PacketObserver`] to receive the facts extracted for every TCP and UDP header,
//! and every successfully decoded frame.

pub mod capture;
pub mod context;
pub mod cursor;
pub mod enc;
pub mod error;
pub mod ethernet;
pub mod ip;
mod linktype;
pub mod pcap;
pub mod pcapng;
pub mod reader;
pub mod scan;

#[cfg(feature = "serialize")]
mod serialize;

pub use capture::{CaptureContainer, CaptureFormat, CaptureRecord, RecordHeader};
pub use context::{DecodeContext, ErrorSink, PacketObserver, TracingSink, TransportFacts};
pub use cursor::Cursor;
pub use error::*;
pub use linktype::*;
pub use reader::{CaptureReader, ReadStep};
pub use scan::{scan_capture, PacketErrorPolicy, ScanOptions, ScanSummary, Scanner, Termination};
#[cfg(feature = "serialize")]
pub use serialize::*;
