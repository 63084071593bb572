//! Synthetic legacy pcap captures of TCP conversations.

use std::{
    net::SocketAddrV4,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use etherparse::PacketBuilder;

const MAGIC_MICROS: u32 = 0xa1b2_c3d4;
const LINKTYPE_ETHERNET: u32 = 1;
const SNAPLEN: u32 = 65_535;

/// Accumulates an Ethernet legacy pcap file in memory.
#[derive(Debug)]
pub struct PcapWriter {
    buf: Vec<u8>,
}

/// TCP control flags for a written segment.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flags {
    pub syn: bool,
    pub fin: bool,
    pub rst: bool,
}

impl PcapWriter {
    /// Start a capture with a microsecond-precision global header.
    #[must_use]
    pub fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC_MICROS.to_le_bytes());
        buf.extend_from_slice(&2_u16.to_le_bytes());
        buf.extend_from_slice(&4_u16.to_le_bytes());
        buf.extend_from_slice(&0_i32.to_le_bytes());
        buf.extend_from_slice(&0_u32.to_le_bytes());
        buf.extend_from_slice(&SNAPLEN.to_le_bytes());
        buf.extend_from_slice(&LINKTYPE_ETHERNET.to_le_bytes());
        Self { buf }
    }

    /// Append one Ethernet/IPv4/TCP record captured at `seen`.
    ///
    /// # Panics
    ///
    /// Panics if the packet cannot be serialised or `seen` predates the epoch.
    pub fn tcp(
        &mut self,
        seen: SystemTime,
        from: SocketAddrV4,
        to: SocketAddrV4,
        sequence: u32,
        flags: Flags,
        payload: &[u8],
    ) {
        let mut builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
            .ipv4(from.ip().octets(), to.ip().octets(), 64)
            .tcp(from.port(), to.port(), sequence, 65_535);
        if flags.syn {
            builder = builder.syn();
        }
        if flags.fin {
            builder = builder.fin();
        }
        if flags.rst {
            builder = builder.rst();
        }
        let mut frame = Vec::with_capacity(builder.size(payload.len()));
        builder
            .write(&mut frame, payload)
            .expect("serialising a test packet");

        let since = seen.duration_since(UNIX_EPOCH).expect("timestamp after epoch");
        let secs = u32::try_from(since.as_secs()).expect("timestamp fits pcap seconds");
        let len = u32::try_from(frame.len()).expect("frame fits pcap length");
        self.buf.extend_from_slice(&secs.to_le_bytes());
        self.buf.extend_from_slice(&since.subsec_micros().to_le_bytes());
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(&frame);
    }

    /// Finished capture bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> { self.buf }
}

impl Default for PcapWriter {
    fn default() -> Self { Self::new() }
}

/// One TCP connection written into a [`PcapWriter`], tracking sequence
/// numbers for both sides.
#[derive(Debug)]
pub struct Conversation {
    client: SocketAddrV4,
    server: SocketAddrV4,
    client_seq: u32,
    server_seq: u32,
}

impl Conversation {
    #[must_use]
    pub const fn new(client: SocketAddrV4, server: SocketAddrV4) -> Self {
        Self {
            client,
            server,
            client_seq: 1_000,
            server_seq: 9_000,
        }
    }

    /// Write the SYN and SYN-ACK opening the connection.
    pub fn open(&mut self, pcap: &mut PcapWriter, seen: SystemTime) {
        let syn = Flags {
            syn: true,
            ..Flags::default()
        };
        pcap.tcp(seen, self.client, self.server, self.client_seq, syn, &[]);
        pcap.tcp(seen, self.server, self.client, self.server_seq, syn, &[]);
        self.client_seq = self.client_seq.wrapping_add(1);
        self.server_seq = self.server_seq.wrapping_add(1);
    }

    /// Client to server data.
    pub fn client_sends(&mut self, pcap: &mut PcapWriter, seen: SystemTime, payload: &[u8]) {
        pcap.tcp(seen, self.client, self.server, self.client_seq, Flags::default(), payload);
        self.client_seq = advance(self.client_seq, payload.len());
    }

    /// Server to client data.
    pub fn server_sends(&mut self, pcap: &mut PcapWriter, seen: SystemTime, payload: &[u8]) {
        pcap.tcp(seen, self.server, self.client, self.server_seq, Flags::default(), payload);
        self.server_seq = advance(self.server_seq, payload.len());
    }

    /// FIN from both sides.
    pub fn close(&mut self, pcap: &mut PcapWriter, seen: SystemTime) {
        let fin = Flags {
            fin: true,
            ..Flags::default()
        };
        pcap.tcp(seen, self.client, self.server, self.client_seq, fin, &[]);
        pcap.tcp(seen, self.server, self.client, self.server_seq, fin, &[]);
    }
}

/// Timestamp `micros` microseconds after a fixed capture start.
#[must_use]
pub fn at_micros(micros: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000) + Duration::from_micros(micros)
}

fn advance(sequence: u32, len: usize) -> u32 {
    sequence.wrapping_add(u32::try_from(len).expect("segment fits sequence space"))
}
