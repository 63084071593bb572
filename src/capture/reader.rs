//! Legacy pcap ingestion.

use std::{
    io::Read,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use pcap_parser::{
    Linktype,
    PcapBlockOwned,
    PcapError,
    create_reader,
    data::get_packetdata,
    traits::PcapReaderIterator,
};
use tracing::{debug, info};

use super::{CaptureError, Driver, TcpSegment};
use crate::session::SessionFactory;

const READ_BUFFER: usize = 65_536;

/// Counters describing one pass over a capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Packet records read.
    pub packets: u64,
    /// Records that decoded to a TCP segment.
    pub segments: u64,
    /// Records skipped as non-TCP or undecodable.
    pub skipped: u64,
}

fn record_time(ts_sec: u32, ts_frac: u32, nanos: bool) -> SystemTime {
    let frac = if nanos {
        Duration::from_nanos(u64::from(ts_frac))
    } else {
        Duration::from_micros(u64::from(ts_frac))
    };
    UNIX_EPOCH + Duration::from_secs(u64::from(ts_sec)) + frac
}

/// Read a legacy pcap capture from `input` to the end and drive every TCP
/// segment through `driver`, then finish the driver.
///
/// The read buffer doubles whenever a single record does not fit in it.
///
/// # Errors
///
/// Returns [`CaptureError`] if the input is not a legacy pcap capture, is
/// cut off inside a record, or fails to read, and propagates any session
/// handler error raised while processing it.
pub fn read_pcap<R: Read, F: SessionFactory>(
    input: R,
    driver: &mut Driver<F>,
) -> crate::Result<CaptureStats> {
    let mut reader = create_reader(READ_BUFFER, input)
        .map_err(|err| CaptureError::Open(format!("{err:?}")))?;
    let mut capacity = READ_BUFFER;
    let mut stats = CaptureStats::default();
    let mut linktype = Linktype::ETHERNET;
    let mut nanos = false;

    loop {
        match reader.next() {
            Ok((offset, block)) => {
                match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        linktype = header.network;
                        nanos = header.is_nanosecond_precision();
                        debug!(?linktype, nanos, "pcap header");
                    }
                    PcapBlockOwned::Legacy(record) => {
                        stats.packets += 1;
                        let seen = record_time(record.ts_sec, record.ts_usec, nanos);
                        let segment = get_packetdata(record.data, linktype, record.caplen as usize)
                            .and_then(TcpSegment::from_packet_data);
                        match segment {
                            Some(segment) => {
                                stats.segments += 1;
                                driver.process(segment, seen)?;
                            }
                            None => stats.skipped += 1,
                        }
                    }
                    PcapBlockOwned::NG(_) => return Err(CaptureError::PcapNg.into()),
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete) => {
                if reader.reader_exhausted() {
                    return Err(CaptureError::Truncated {
                        offset: reader.consumed(),
                    }
                    .into());
                }
                if reader.data().len() >= capacity {
                    capacity *= 2;
                    debug!(capacity, "growing pcap read buffer");
                    if !reader.grow(capacity) {
                        return Err(CaptureError::Read(format!(
                            "cannot grow read buffer to {capacity} bytes"
                        ))
                        .into());
                    }
                }
                reader
                    .refill()
                    .map_err(|err| CaptureError::Read(format!("{err:?}")))?;
            }
            Err(err) => return Err(CaptureError::Parse(format!("{err:?}")).into()),
        }
    }

    driver.finish()?;
    info!(
        packets = stats.packets,
        segments = stats.segments,
        skipped = stats.skipped,
        "capture processed"
    );
    Ok(stats)
}
