//! Canonical string encodings shared by every node.
//!
//! Transaction ids, signatures, and block hashes are computed over string
//! renderings of amounts and timestamps. Two nodes that format either one
//! differently will disagree on every hash in the system, so the exact forms
//! live here and nowhere else.

use chrono::{DateTime, Timelike, Utc};

/// Fixed six-decimal rendering of an amount, e.g. `12.5` -> `"12.500000"`.
///
/// This is the form hashed into transaction ids and covered by signatures.
/// It must never change once a chain exists: re-rendering an amount with a
/// different precision re-keys every transaction ever signed.
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.6}")
}

/// RFC3339 timestamp with nanosecond precision and a `Z` suffix, e.g.
/// `2024-01-01T00:00:00.000000001Z`.
///
/// The fractional second is printed with all trailing zero digits removed,
/// and omitted entirely when it is zero: 120,000,000 ns renders as `.12`,
/// never `.120`. The rendering is a pure function of the instant, so a
/// timestamp that round-trips through JSON re-renders to the identical
/// string and hash recomputation still matches.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    let base = timestamp.format("%Y-%m-%dT%H:%M:%S");
    let nanos = timestamp.nanosecond();
    if nanos == 0 {
        return format!("{base}Z");
    }

    let padded = format!("{nanos:09}");
    let fraction = padded.trim_end_matches('0');
    format!("{base}.{fraction}Z")
}

/// Serde adapter rendering timestamps with [`format_timestamp`].
pub mod timestamp_rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter rendering signatures as lowercase hex.
pub mod signature_hex {
    use data_encoding::HEXLOWER;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(signature: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&HEXLOWER.encode(signature))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        HEXLOWER
            .decode(raw.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
