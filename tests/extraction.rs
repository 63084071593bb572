//! Query extraction from client byte streams.

mod common;

use common::{
    TestResult,
    at,
    chunk,
    client_key,
    correlator,
    deterministic_runner,
    name_at,
    sink,
};
use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    prop_assert_eq,
};
use querysplit::{Chunk, SplitConfig};
use querysplit_testing::{MemorySink, packet, query_packet};
use rstest::rstest;

#[test]
fn select_one_is_stored_under_completing_timestamp() -> TestResult {
    let wire = query_packet(0, "SELECT 1");
    assert_eq!(wire[..5], [0x09_u8, 0x00, 0x00, 0x00, 0x03]);

    let mut correlator = correlator(SplitConfig::default());
    let client = correlator.on_half_arrival(client_key())?;
    correlator.on_bytes(client, &[chunk(&wire[..6], 10), chunk(&wire[6..12], 20)])?;
    assert!(sink(&correlator).artifacts().is_empty());

    correlator.on_bytes(client, &[chunk(&wire[12..], 30)])?;
    let artifacts = sink(&correlator).artifacts();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].bytes, b"SELECT 1");
    assert_eq!(artifacts[0].name, name_at(30));
    assert_eq!(artifacts[0].timestamp, at(30));
    assert_eq!(artifacts[0].container, format!("00000001-{}", name_at(10)));
    Ok(())
}

#[test]
fn only_query_packets_are_stored() -> TestResult {
    let mut wire = packet(0, &[]);
    wire.extend(packet(0, b"\x0euser"));
    wire.extend(query_packet(0, "SELECT a"));
    wire.extend(packet(0, b"\x01"));
    wire.extend(query_packet(0, "SELECT b"));

    let mut correlator = correlator(SplitConfig::default());
    let client = correlator.on_half_arrival(client_key())?;
    correlator.on_bytes(client, &[chunk(&wire, 5)])?;
    correlator.on_global_flush()?;

    let bodies: Vec<Vec<u8>> = sink(&correlator)
        .artifacts()
        .into_iter()
        .map(|artifact| artifact.bytes)
        .collect();
    assert_eq!(bodies, [b"SELECT a".to_vec(), b"SELECT b".to_vec()]);
    Ok(())
}

#[test]
fn same_timestamp_queries_get_sortable_names() -> TestResult {
    let wire: Vec<u8> = (0..12)
        .flat_map(|n| query_packet(0, &format!("SELECT {n}")))
        .collect();

    let mut correlator = correlator(SplitConfig::default());
    let client = correlator.on_half_arrival(client_key())?;
    correlator.on_bytes(client, &[chunk(&wire, 0)])?;

    let names: Vec<String> = sink(&correlator)
        .artifacts()
        .into_iter()
        .map(|artifact| artifact.name)
        .collect();
    let base = name_at(0);
    assert_eq!(names[0], base);
    assert_eq!(names[1], format!("{base}a1"));
    assert_eq!(names[10], format!("{base}b10"));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    Ok(())
}

#[rstest]
#[case::header_only(vec![0xff, 0xff, 0x00, 0x00])]
#[case::short_body(vec![0x40, 0x00, 0x00, 0x00, 0x03, b'S', b'E'])]
#[case::partial_header(vec![0x09_u8, 0x00])]
fn truncated_trailing_frame_stores_nothing(#[case] wire: Vec<u8>) -> TestResult {
    let mut correlator = correlator(SplitConfig::default());
    let client = correlator.on_half_arrival(client_key())?;
    correlator.on_bytes(client, &[chunk(&wire, 1)])?;
    correlator.on_half_complete(client)?;
    correlator.on_global_flush()?;

    assert!(sink(&correlator).artifacts().is_empty());
    assert!(sink(&correlator).containers().is_empty());
    Ok(())
}

#[test]
fn sessions_without_queries_create_no_container() -> TestResult {
    let mut correlator = correlator(SplitConfig::default());
    let client = correlator.on_half_arrival(client_key())?;
    let server = correlator.on_half_arrival(client_key().reverse())?;
    correlator.on_bytes(server, &[chunk(b"\x05\x00\x00\x00\x0ahello", 1)])?;
    correlator.on_bytes(client, &[chunk(&packet(1, b"\x01"), 2)])?;
    correlator.on_half_complete(client)?;
    correlator.on_half_complete(server)?;

    assert_eq!(sink(&correlator).ensure_calls(), 0);
    Ok(())
}

#[test]
fn sink_failure_aborts_delivery() -> TestResult {
    let mut correlator = querysplit::FlowCorrelator::new(querysplit::SplitterFactory::new(
        MemorySink::failing_after(1),
        SplitConfig::default(),
    ));
    let client = correlator.on_half_arrival(client_key())?;
    correlator.on_bytes(client, &[chunk(&query_packet(0, "SELECT 1"), 1)])?;

    let err = correlator
        .on_bytes(client, &[chunk(&query_packet(0, "SELECT 2"), 2)])
        .expect_err("second store fails");
    assert!(matches!(err, querysplit::Error::Sink(_)));
    Ok(())
}

fn stored_queries(chunks: &[Chunk]) -> Vec<Vec<u8>> {
    let mut correlator = correlator(SplitConfig::default());
    let client = correlator
        .on_half_arrival(client_key())
        .expect("arrival");
    correlator.on_bytes(client, chunks).expect("delivery");
    correlator.on_global_flush().expect("flush");
    sink(&correlator)
        .artifacts()
        .into_iter()
        .map(|artifact| artifact.bytes)
        .collect()
}

#[test]
fn payload_round_trips_through_framing() {
    deterministic_runner(128)
        .run(&vec(any::<u8>(), 0..512), |payload| {
            let mut body = vec![querysplit::QUERY_OPCODE];
            body.extend_from_slice(&payload);
            let wire = packet(0, &body);

            let stored = stored_queries(&[Chunk::new(wire, at(1))]);
            prop_assert_eq!(stored, vec![payload]);
            Ok(())
        })
        .expect("round trip holds");
}

fn stream_and_cuts() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    vec((any::<bool>(), vec(any::<u8>(), 0..64)), 1..8)
        .prop_map(|packets| {
            packets
                .into_iter()
                .flat_map(|(query, mut body)| {
                    body.insert(0, if query { querysplit::QUERY_OPCODE } else { 0x01 });
                    packet(0, &body)
                })
                .collect::<Vec<u8>>()
        })
        .prop_flat_map(|wire| {
            let len = wire.len();
            (
                proptest::strategy::Just(wire),
                vec(0..=len, 0..16).prop_map(|mut cuts| {
                    cuts.sort_unstable();
                    cuts
                }),
            )
        })
}

#[test]
fn chunk_boundaries_do_not_change_extracted_queries() {
    deterministic_runner(128)
        .run(&stream_and_cuts(), |(wire, cuts)| {
            let whole = stored_queries(&[Chunk::new(wire.clone(), at(1))]);

            let mut chunks = Vec::new();
            let mut start = 0;
            for cut in cuts.into_iter().chain(std::iter::once(wire.len())) {
                chunks.push(Chunk::new(wire[start..cut].to_vec(), at(1)));
                start = cut;
            }
            prop_assert_eq!(stored_queries(&chunks), whole);
            Ok(())
        })
        .expect("chunking invariance holds");
}
