use rusticata_macros::newtype_enum;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of each captured frame. PCAP stores it as a 32-bit field of the global header,
/// Sniffer ENC as its one-byte network encapsulation code (where `1` also means Ethernet).
///
/// Only [`Linktype::ETHERNET`] captures can be dissected.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,
    TOKEN_RING = 6,
    FDDI = 10,
    RAW = 101,
    C_HDLC = 104,
    LOOP = 108,
    LINUX_SLL = 113,
    IPV4 = 228,
    IPV6 = 229,
}
}

impl Linktype {
    pub fn is_ethernet(self) -> bool {
        self == Linktype::ETHERNET
    }
}

#[cfg(test)]
mod tests {
    use super::Linktype;

    #[test]
    fn display_known_and_unknown() {
        assert_eq!(Linktype(1).to_string(), "ETHERNET");
        assert_eq!(Linktype(104).to_string(), "C_HDLC");
        assert!(Linktype::ETHERNET.is_ethernet());
        assert!(!Linktype::NULL.is_ethernet());
        assert!(Linktype(4242).to_string().contains("4242"));
    }
}
