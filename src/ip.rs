//! Network and transport layer dissectors
//!
//! IPv4 is fully decoded and dispatches to the transport dissectors by protocol number.
//! IPv6 headers can be parsed, but IPv6 frames are not dissected.

pub mod eigrp;
pub mod icmp;
pub mod igmp;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod udp;

use rusticata_macros::newtype_enum;

/// IP protocol number (IPv4 `protocol`, IPv6 `next header`)
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct IpProtocol(pub u8);

newtype_enum! {
impl display IpProtocol {
    ICMP = 1,
    IGMP = 2,
    TCP = 6,
    UDP = 17,
    ICMPV6 = 58,
    EIGRP = 88,
}
}
