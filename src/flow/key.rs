//! Connection identities and their reverses.

use std::{fmt, net::IpAddr};

/// A directed `(source, destination)` pair at one protocol layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlowPair<T> {
    pub src: T,
    pub dst: T,
}

impl<T: Copy> FlowPair<T> {
    #[must_use]
    pub const fn new(src: T, dst: T) -> Self { Self { src, dst } }

    /// The same pair observed from the opposite direction.
    #[must_use]
    pub const fn reverse(&self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
        }
    }
}

/// Identity of one direction of a TCP connection.
///
/// Two keys that are [`reverse`](Self::reverse) of one another describe the
/// two directions of the same physical connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    network: FlowPair<IpAddr>,
    transport: FlowPair<u16>,
}

impl ConnectionKey {
    /// Build a key from network and transport flows.
    #[must_use]
    pub const fn new(network: FlowPair<IpAddr>, transport: FlowPair<u16>) -> Self {
        Self { network, transport }
    }

    /// Convenience constructor from explicit endpoints.
    #[must_use]
    pub fn from_endpoints(
        src: impl Into<IpAddr>,
        src_port: u16,
        dst: impl Into<IpAddr>,
        dst_port: u16,
    ) -> Self {
        Self::new(
            FlowPair::new(src.into(), dst.into()),
            FlowPair::new(src_port, dst_port),
        )
    }

    #[must_use]
    pub const fn network(&self) -> FlowPair<IpAddr> { self.network }

    #[must_use]
    pub const fn transport(&self) -> FlowPair<u16> { self.transport }

    /// Key of the opposite direction.
    #[must_use]
    pub const fn reverse(&self) -> Self {
        Self {
            network: self.network.reverse(),
            transport: self.transport.reverse(),
        }
    }

    /// Whether this key equals its own reverse.
    ///
    /// Real TCP 5-tuples never do; such keys can only come from malformed or
    /// synthetic input.
    #[must_use]
    pub fn is_self_reverse(&self) -> bool { *self == self.reverse() }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { network, transport } = self;
        write!(
            f,
            "{} -> {}",
            std::net::SocketAddr::new(network.src, transport.src),
            std::net::SocketAddr::new(network.dst, transport.dst),
        )
    }
}
