//! Decoded TCP segments.

use std::net::IpAddr;

use bytes::Bytes;
use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::data::{ETHERTYPE_IPV4, ETHERTYPE_IPV6, PacketData};

use crate::flow::{ConnectionKey, FlowPair};

/// Control flags relevant to stream reassembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub syn: bool,
    pub fin: bool,
    pub rst: bool,
}

/// One TCP segment with the identity of the direction it travelled in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcpSegment {
    key: ConnectionKey,
    sequence: u32,
    flags: TcpFlags,
    payload: Bytes,
}

impl TcpSegment {
    #[must_use]
    pub fn new(key: ConnectionKey, sequence: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            key,
            sequence,
            flags: TcpFlags::default(),
            payload: payload.into(),
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: TcpFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub const fn key(&self) -> ConnectionKey { self.key }

    #[must_use]
    pub const fn sequence(&self) -> u32 { self.sequence }

    #[must_use]
    pub const fn flags(&self) -> TcpFlags { self.flags }

    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    /// Decode a segment from link-layer packet data.
    ///
    /// Returns `None` for anything that is not TCP over IPv4 or IPv6.
    #[must_use]
    pub fn from_packet_data(packet: PacketData<'_>) -> Option<Self> {
        let sliced = match packet {
            PacketData::L2(data) => SlicedPacket::from_ethernet(data).ok()?,
            PacketData::L3(ethertype, data)
                if ethertype == ETHERTYPE_IPV4 || ethertype == ETHERTYPE_IPV6 =>
            {
                SlicedPacket::from_ip(data).ok()?
            }
            _ => return None,
        };
        Self::from_sliced(&sliced)
    }

    fn from_sliced(sliced: &SlicedPacket<'_>) -> Option<Self> {
        let network = match sliced.net.as_ref()? {
            NetSlice::Ipv4(ip) => FlowPair::new(
                IpAddr::V4(ip.header().source_addr()),
                IpAddr::V4(ip.header().destination_addr()),
            ),
            NetSlice::Ipv6(ip) => FlowPair::new(
                IpAddr::V6(ip.header().source_addr()),
                IpAddr::V6(ip.header().destination_addr()),
            ),
            #[allow(unreachable_patterns, reason = "variant set differs across etherparse releases")]
            _ => return None,
        };
        let Some(TransportSlice::Tcp(tcp)) = sliced.transport.as_ref() else {
            return None;
        };
        let key = ConnectionKey::new(
            network,
            FlowPair::new(tcp.source_port(), tcp.destination_port()),
        );
        let flags = TcpFlags {
            syn: tcp.syn(),
            fin: tcp.fin(),
            rst: tcp.rst(),
        };
        Some(
            Self::new(key, tcp.sequence_number(), Bytes::copy_from_slice(tcp.payload()))
                .with_flags(flags),
        )
    }
}
