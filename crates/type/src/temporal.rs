// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Portable timestamp text encoding.
//!
//! Instants are persisted as fixed-width UTC text so that lexicographic
//! order equals temporal order on every dialect, and so that as-of range
//! predicates compare correctly without driver-specific temporal types.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::{Result, diagnostic::internal};

/// `YYYY-MM-DD HH:MM:SS.ffffff`, always UTC, always microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current instant, truncated to the persisted microsecond precision so
/// that a value written and read back compares equal.
pub fn now() -> DateTime<Utc> {
	truncate(Utc::now())
}

/// Drop sub-microsecond precision.
pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
	let nanos = ts.timestamp_subsec_nanos() % 1_000;
	ts - Duration::nanoseconds(nanos as i64)
}

pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
	ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(text: &str) -> Result<DateTime<Utc>> {
	let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
		.map_err(|err| internal(format!("unreadable stored timestamp '{text}': {err}")))?;
	Ok(naive.and_utc())
}

pub fn encode_date(date: &NaiveDate) -> String {
	date.format(DATE_FORMAT).to_string()
}

pub fn decode_date(text: &str) -> Result<NaiveDate> {
	NaiveDate::parse_from_str(text, DATE_FORMAT)
		.map_err(|err| internal(format!("unreadable stored date '{text}': {err}")))
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	#[test]
	fn timestamp_round_trip() {
		let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap() + Duration::microseconds(589_793);
		assert_eq!(decode_timestamp(&encode_timestamp(&ts)).unwrap(), ts);
	}

	#[test]
	fn encoding_is_fixed_width_and_ordered() {
		let early = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
		let late = early + Duration::microseconds(1);
		let (a, b) = (encode_timestamp(&early), encode_timestamp(&late));
		assert_eq!(a.len(), b.len());
		assert!(a < b);
	}

	#[test]
	fn now_survives_round_trip() {
		let ts = now();
		assert_eq!(decode_timestamp(&encode_timestamp(&ts)).unwrap(), ts);
	}

	#[test]
	fn date_round_trip() {
		let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
		assert_eq!(decode_date(&encode_date(&date)).unwrap(), date);
	}
}
