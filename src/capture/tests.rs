//! Unit tests for per-direction reassembly.

use std::{
    cell::RefCell,
    net::Ipv4Addr,
    rc::Rc,
    time::{Duration, SystemTime},
};

use rstest::{fixture, rstest};

use super::{Driver, DriverConfig, TcpFlags, TcpSegment};
use crate::{
    flow::{Chunk, ConnectionKey},
    session::{SessionFactory, SessionHandler, StreamIndex},
};

#[derive(Default)]
struct Streams {
    bytes: [Vec<u8>; 2],
    stamps: Vec<SystemTime>,
    completed: usize,
}

struct Collector(Rc<RefCell<Streams>>);

impl SessionHandler for Collector {
    fn on_bytes(&mut self, index: StreamIndex, chunks: &[Chunk]) -> crate::Result<()> {
        let mut streams = self.0.borrow_mut();
        for chunk in chunks {
            streams.bytes[index.as_usize()].extend_from_slice(chunk.payload());
            streams.stamps.push(chunk.seen());
        }
        Ok(())
    }

    fn on_complete(&mut self) -> crate::Result<()> {
        self.0.borrow_mut().completed += 1;
        Ok(())
    }
}

#[derive(Default)]
struct CollectorFactory {
    sessions: Vec<Rc<RefCell<Streams>>>,
}

impl SessionFactory for CollectorFactory {
    type Handler = Collector;

    fn new_session(&mut self, _key: &ConnectionKey) -> Collector {
        let streams = Rc::new(RefCell::new(Streams::default()));
        self.sessions.push(Rc::clone(&streams));
        Collector(streams)
    }
}

fn at(millis: u64) -> SystemTime { SystemTime::UNIX_EPOCH + Duration::from_millis(millis) }

fn client() -> ConnectionKey {
    ConnectionKey::from_endpoints(
        Ipv4Addr::new(192, 168, 1, 10),
        40_000,
        Ipv4Addr::new(192, 168, 1, 20),
        3306,
    )
}

fn data(key: ConnectionKey, sequence: u32, payload: &'static [u8]) -> TcpSegment {
    TcpSegment::new(key, sequence, payload)
}

fn fin(key: ConnectionKey, sequence: u32) -> TcpSegment {
    TcpSegment::new(key, sequence, &b""[..]).with_flags(TcpFlags {
        fin: true,
        ..TcpFlags::default()
    })
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single-line rstest fixtures"
)]
#[fixture]
fn driver() -> Driver<CollectorFactory> { Driver::new(CollectorFactory::default(), DriverConfig::default()) }

fn client_bytes(driver: &Driver<CollectorFactory>) -> Vec<u8> {
    driver.correlator().factory().sessions[0].borrow().bytes[0].clone()
}

#[rstest]
fn out_of_order_segment_waits_for_gap(mut driver: Driver<CollectorFactory>) {
    driver.process(data(client(), 100, b"ab"), at(1)).expect("first");
    driver.process(data(client(), 104, b"ef"), at(2)).expect("ahead");
    assert_eq!(client_bytes(&driver), b"ab");

    driver.process(data(client(), 102, b"cd"), at(3)).expect("gap filled");
    assert_eq!(client_bytes(&driver), b"abcdef");

    let stamps = driver.correlator().factory().sessions[0].borrow().stamps.clone();
    assert_eq!(stamps, [at(1), at(3), at(2)]);
}

#[rstest]
fn retransmissions_are_trimmed(mut driver: Driver<CollectorFactory>) {
    driver.process(data(client(), 10, b"abcd"), at(1)).expect("first");
    driver.process(data(client(), 10, b"abcd"), at(2)).expect("duplicate");
    driver.process(data(client(), 12, b"cdef"), at(3)).expect("overlap");
    assert_eq!(client_bytes(&driver), b"abcdef");
}

#[rstest]
fn syn_sets_initial_sequence(mut driver: Driver<CollectorFactory>) {
    let syn = TcpSegment::new(client(), 999, &b""[..]).with_flags(TcpFlags {
        syn: true,
        ..TcpFlags::default()
    });
    driver.process(syn, at(1)).expect("syn");
    driver.process(data(client(), 1002, b"z"), at(2)).expect("ahead");
    driver.process(data(client(), 1000, b"xy"), at(3)).expect("first data");
    assert_eq!(client_bytes(&driver), b"xyz");
}

#[test]
fn sequence_space_wraps() {
    let mut driver = Driver::new(CollectorFactory::default(), DriverConfig::default());
    driver
        .process(data(client(), u32::MAX - 1, b"ab"), at(1))
        .expect("before wrap");
    driver.process(data(client(), 0, b"cd"), at(2)).expect("after wrap");
    assert_eq!(client_bytes(&driver), b"abcd");
}

#[test]
fn buffer_cap_skips_oldest_gap() {
    let config = DriverConfig {
        max_buffered_bytes: 3,
    };
    let mut driver = Driver::new(CollectorFactory::default(), config);
    driver.process(data(client(), 0, b"a"), at(1)).expect("first");
    driver.process(data(client(), 5, b"fg"), at(2)).expect("held");
    assert_eq!(client_bytes(&driver), b"a");

    driver.process(data(client(), 7, b"hi"), at(3)).expect("over cap");
    assert_eq!(client_bytes(&driver), b"afghi");
}

#[rstest]
fn fin_closes_direction_and_flushes_held_bytes(mut driver: Driver<CollectorFactory>) {
    driver.process(data(client(), 0, b"a"), at(1)).expect("first");
    driver.process(data(client(), 3, b"d"), at(2)).expect("held");
    driver.process(data(client().reverse(), 50, b"ok"), at(3)).expect("server");

    driver.process(fin(client(), 4), at(4)).expect("client fin");
    assert_eq!(client_bytes(&driver), b"ad");
    assert_eq!(driver.open_directions(), 1);

    driver.process(data(client(), 5, b"late"), at(5)).expect("ignored");
    assert_eq!(client_bytes(&driver), b"ad");

    driver.process(fin(client().reverse(), 52), at(6)).expect("server fin");
    let session = driver.correlator().factory().sessions[0].borrow();
    assert_eq!(session.completed, 1);
    assert_eq!(session.bytes[1], b"ok");
}

#[rstest]
fn finish_completes_open_and_unpaired_sessions(mut driver: Driver<CollectorFactory>) {
    driver.process(data(client(), 0, b"q"), at(1)).expect("paired client");
    driver.process(data(client().reverse(), 0, b"r"), at(2)).expect("paired server");
    let lonely = ConnectionKey::from_endpoints(
        Ipv4Addr::new(10, 9, 9, 9),
        1234,
        Ipv4Addr::new(10, 9, 9, 8),
        3306,
    );
    driver.process(data(lonely, 0, b"x"), at(3)).expect("unpaired");

    driver.finish().expect("finish");
    driver.finish().expect("finish twice");

    let sessions = &driver.correlator().factory().sessions;
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.borrow().completed == 1));
    assert_eq!(driver.open_directions(), 0);
}
