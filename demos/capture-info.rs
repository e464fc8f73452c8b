use capture_dissector::enc::EncFormat;
use capture_dissector::ethernet::{EthernetFrame, EthernetPayload};
use capture_dissector::ip::ipv4::Ipv4Payload;
use capture_dissector::pcap::PcapFormat;
use capture_dissector::pcapng::PcapngFormat;
use capture_dissector::*;
use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing_subscriber::EnvFilter;

/// Count of decoded frames per protocol, and of transport headers per destination port
#[derive(Default)]
struct Stats {
    protocols: BTreeMap<&'static str, u64>,
    ports: BTreeMap<u16, u64>,
}

impl PacketObserver for Stats {
    fn on_transport(&mut self, facts: &TransportFacts) {
        *self.ports.entry(facts.destination_port).or_default() += 1;
    }

    fn on_packet(&mut self, _number: u64, _record: &RecordHeader, frame: &EthernetFrame<'_>) {
        let name = match &frame.payload {
            EthernetPayload::Arp(_) => "ARP",
            EthernetPayload::Rarp(_) => "RARP",
            EthernetPayload::Lldp(_) => "LLDP",
            EthernetPayload::Loopback(_) => "Loopback",
            EthernetPayload::DecDna(_) => "DEC DNA",
            EthernetPayload::Ieee8023(_) => "IEEE 802.3",
            EthernetPayload::Ipv4(p) => match p.payload {
                Ipv4Payload::Icmp(_) => "ICMP",
                Ipv4Payload::Igmp(_) => "IGMP",
                Ipv4Payload::Tcp(_) => "TCP",
                Ipv4Payload::Udp(_) => "UDP",
                Ipv4Payload::Eigrp(_) => "EIGRP",
                Ipv4Payload::Fragment(_) => "IPv4 fragment",
            },
        };
        *self.protocols.entry(name).or_default() += 1;
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    for arg in env::args().skip(1) {
        if let Err(e) = print_capture_info(&arg) {
            eprintln!("{}: {}", arg, e);
        }
    }
}

fn print_capture_info(arg: &str) -> Result<(), Box<dyn Error>> {
    println!("Name: {}", arg);

    let file = File::open(arg)?;
    let file_size = file.metadata()?.len();
    println!("\tfile size: {}", file_size);

    let mut reader = BufReader::new(file);
    let mut magic = [0u8; 17];
    reader.read_exact(&mut magic)?;
    let format = CaptureFormat::detect(&magic).ok_or("unknown capture format")?;
    println!("\tformat: {}", format);

    // the detected magic is fed back in front of the rest of the file
    let input = (&magic[..]).chain(reader);
    let mut scanner = Scanner::new(TracingSink, Stats::default());
    let summary = match format {
        CaptureFormat::Pcap => scanner.scan_reader::<PcapFormat, _>(input)?,
        CaptureFormat::Enc => scanner.scan_reader::<EncFormat, _>(input)?,
        CaptureFormat::Pcapng => scanner.scan_reader::<PcapngFormat, _>(input)?,
    };

    println!("\tpackets: {}", summary.packets);
    println!("\tdecoded: {}", summary.decoded);
    println!("\tskipped: {}", summary.skipped);
    println!("\tsnapshot truncated: {}", summary.snapshot_truncated);
    if let Termination::TruncatedRecord { offset } = summary.termination {
        println!("\tlast record truncated at offset {}", offset);
    }
    let (_, stats) = scanner.into_parts();
    for (protocol, count) in &stats.protocols {
        println!("\t\t{}: {}", protocol, count);
    }
    for (port, count) in &stats.ports {
        println!("\t\tport {}: {}", port, count);
    }
    Ok(())
}
