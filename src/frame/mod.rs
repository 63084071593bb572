//! `MySQL` packet framing over reassembled byte streams.
//!
//! Packets carry a 4-byte header: a 3-byte little-endian body length followed
//! by a 1-byte sequence id. The first body byte is the command opcode. The
//! [`PacketDecoder`] recognises packet boundaries and the [`FrameExtractor`]
//! drives it over bytes that arrive in arbitrary chunks.

pub mod decoder;
pub mod extractor;

pub use decoder::{Packet, PacketDecoder};
pub use extractor::{Frame, FrameExtractor};

/// Size of the length and sequence header preceding every packet body.
pub const HEADER_LEN: usize = 4;

/// Opcode of the `COM_QUERY` command.
pub const QUERY_OPCODE: u8 = 3;
