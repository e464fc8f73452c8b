//! Collaborators of the dissectors: the error sink and packet observers

use crate::capture::RecordHeader;
use crate::error::DecodeError;
use crate::ethernet::EthernetFrame;
use crate::ip::IpProtocol;

/// Receiver of human-readable failure reports
///
/// Reporting is fire-and-forget: a sink never fails and never influences the decode outcome.
pub trait ErrorSink {
    fn report(&mut self, message: &str);
}

/// Error sink forwarding every report to `tracing` at `WARN` level
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&mut self, message: &str) {
        tracing::warn!("{}", message);
    }
}

impl ErrorSink for Vec<String> {
    fn report(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

impl<S: ErrorSink + ?Sized> ErrorSink for &mut S {
    fn report(&mut self, message: &str) {
        (**self).report(message)
    }
}

/// Facts extracted by the TCP and UDP dissectors for downstream analysis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportFacts {
    pub packet_number: u64,
    /// Capture time in seconds
    pub timestamp: f64,
    pub protocol: IpProtocol,
    pub source_port: u16,
    pub destination_port: u16,
    pub payload_length: usize,
}

/// Observer of decoded packets
///
/// Observers are purely passive. [`on_transport`](PacketObserver::on_transport) fires as soon
/// as a TCP or UDP header has been validated, even if the payload turns out to be truncated.
/// [`on_packet`](PacketObserver::on_packet) fires once a whole frame decoded successfully; the
/// frame gives access to transport payloads, for application-level parsing keyed by port.
pub trait PacketObserver {
    fn on_transport(&mut self, _facts: &TransportFacts) {}

    fn on_packet(&mut self, _number: u64, _record: &RecordHeader, _frame: &EthernetFrame<'_>) {}
}

impl PacketObserver for () {}

impl<O: PacketObserver + ?Sized> PacketObserver for &mut O {
    fn on_transport(&mut self, facts: &TransportFacts) {
        (**self).on_transport(facts)
    }

    fn on_packet(&mut self, number: u64, record: &RecordHeader, frame: &EthernetFrame<'_>) {
        (**self).on_packet(number, record, frame)
    }
}

/// Per-packet state threaded through the dissector chain
///
/// Created for one packet record and dropped once its frame has been decoded.
pub struct DecodeContext<'c> {
    packet_number: u64,
    timestamp: f64,
    max_vlan_tags: usize,
    sink: &'c mut dyn ErrorSink,
    observer: &'c mut dyn PacketObserver,
}

impl<'c> DecodeContext<'c> {
    pub fn new(
        packet_number: u64,
        timestamp: f64,
        max_vlan_tags: usize,
        sink: &'c mut dyn ErrorSink,
        observer: &'c mut dyn PacketObserver,
    ) -> Self {
        DecodeContext {
            packet_number,
            timestamp,
            max_vlan_tags,
            sink,
            observer,
        }
    }

    pub fn packet_number(&self) -> u64 {
        self.packet_number
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn max_vlan_tags(&self) -> usize {
        self.max_vlan_tags
    }

    /// Report `err` to the sink and hand it back for propagation
    pub fn fail(&mut self, err: DecodeError) -> DecodeError {
        self.sink
            .report(&format!("packet #{}: {}", self.packet_number, err));
        err
    }

    /// Fail with [`DecodeError::TruncatedPacket`] unless `available >= needed`
    pub fn require(
        &mut self,
        protocol: &'static str,
        needed: usize,
        available: usize,
    ) -> Result<(), DecodeError> {
        if available < needed {
            return Err(self.fail(DecodeError::TruncatedPacket {
                protocol,
                needed,
                available,
            }));
        }
        Ok(())
    }

    /// Bytes left in `length` once a `header`-byte header is taken out
    ///
    /// A negative result is [`DecodeError::InvalidLength`].
    pub fn payload_length(
        &mut self,
        protocol: &'static str,
        length: usize,
        header: usize,
    ) -> Result<usize, DecodeError> {
        match length.checked_sub(header) {
            Some(n) => Ok(n),
            None => Err(self.fail(DecodeError::InvalidLength {
                protocol,
                declared: length,
                header,
            })),
        }
    }

    pub(crate) fn notify_transport(
        &mut self,
        protocol: IpProtocol,
        source_port: u16,
        destination_port: u16,
        payload_length: usize,
    ) {
        let facts = TransportFacts {
            packet_number: self.packet_number,
            timestamp: self.timestamp,
            protocol,
            source_port,
            destination_port,
            payload_length,
        };
        self.observer.on_transport(&facts);
    }
}
