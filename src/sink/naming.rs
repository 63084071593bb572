//! Names of session containers and artefacts.
//!
//! Every name is derived from capture timestamps at microsecond resolution so
//! a plain directory listing sorts artefacts chronologically.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::session::SessionId;

/// Suffix marking response artefacts.
pub const RESPONSE_SUFFIX: &str = "o";

/// Microseconds since the Unix epoch; timestamps before the epoch map to 0.
#[must_use]
pub fn unix_micros(timestamp: SystemTime) -> u128 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros())
        .unwrap_or_default()
}

/// Container name: zero-padded session id and first-seen microseconds.
#[must_use]
pub fn container_name(session: SessionId, first_seen: SystemTime) -> String {
    format!("{session}-{}", unix_micros(first_seen))
}

/// Artefact name for a request frame completed at `completed`.
#[must_use]
pub fn request_name(completed: SystemTime) -> String { unix_micros(completed).to_string() }

/// Artefact name for a response range starting at `started`.
#[must_use]
pub fn response_name(started: SystemTime) -> String {
    format!("{}{RESPONSE_SUFFIX}", unix_micros(started))
}

/// Disambiguator for the `attempt`-th collision on a name.
///
/// The decimal attempt number is prefixed by a letter encoding its digit
/// count (`a1`..`a9`, `b10`..`b99`, `c100`, ...), so suffixed names keep
/// sorting in attempt order.
#[must_use]
pub fn sortable_suffix(attempt: u64) -> String {
    let digits = attempt.to_string();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a u64 has at most 20 decimal digits"
    )]
    let marker = char::from(b'a' + (digits.len() - 1) as u8);
    format!("{marker}{digits}")
}

/// Name to try for `base` on the given attempt, starting from zero.
#[must_use]
pub fn candidate_name(base: &str, attempt: u64) -> String {
    if attempt == 0 {
        base.to_owned()
    } else {
        format!("{base}{}", sortable_suffix(attempt))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1, "a1")]
    #[case(9, "a9")]
    #[case(10, "b10")]
    #[case(99, "b99")]
    #[case(100, "c100")]
    fn suffix_encodes_digit_count(#[case] attempt: u64, #[case] expected: &str) {
        assert_eq!(sortable_suffix(attempt), expected);
    }

    #[test]
    fn suffixed_names_sort_in_attempt_order() {
        let names: Vec<String> = (0..=120).map(|n| candidate_name("1700", n)).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn names_use_microsecond_timestamps() {
        let ts = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        assert_eq!(request_name(ts), "1700000000123456");
        assert_eq!(response_name(ts), "1700000000123456o");
        assert_eq!(
            container_name(SessionId::new(7), ts),
            "00000007-1700000000123456"
        );
    }

    #[test]
    fn pre_epoch_timestamps_clamp_to_zero() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(unix_micros(before), 0);
        assert_eq!(unix_micros(SystemTime::UNIX_EPOCH), 0);
    }
}
