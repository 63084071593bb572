//! Shared utilities for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    net::Ipv4Addr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use proptest::test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner};
use querysplit::{
    Chunk,
    ConnectionKey,
    FlowCorrelator,
    SplitConfig,
    SplitterFactory,
};
use querysplit_testing::MemorySink;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub type SplitCorrelator = FlowCorrelator<SplitterFactory<MemorySink>>;

/// Capture time `micros` microseconds after a fixed start.
pub fn at(micros: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000) + Duration::from_micros(micros)
}

/// Microsecond artefact name for [`at`].
pub fn name_at(micros: u64) -> String { (1_700_000_000_000_000 + u128::from(micros)).to_string() }

/// Client to server key on the default port.
pub fn client_key() -> ConnectionKey {
    ConnectionKey::from_endpoints(
        Ipv4Addr::new(10, 1, 0, 5),
        51_234,
        Ipv4Addr::new(10, 1, 0, 9),
        3306,
    )
}

pub fn chunk(bytes: &[u8], micros: u64) -> Chunk { Chunk::new(bytes.to_vec(), at(micros)) }

pub fn correlator(config: SplitConfig) -> SplitCorrelator {
    FlowCorrelator::new(SplitterFactory::new(MemorySink::new(), config))
}

pub fn sink(correlator: &SplitCorrelator) -> &MemorySink { correlator.factory().sink() }

pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    TestRunner::new_with_rng(config, TestRng::deterministic_rng(RngAlgorithm::ChaCha))
}
