//! Text-column codecs shared by the persisted forms.
//!
//! Empty sequences and absent values are stored as SQL `NULL`; `NULL` reads
//! back as an empty sequence or `None`. Malformed text is a
//! [`StoreError::Serialization`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{Result, StoreError};

pub(crate) fn encode_seq<T: Serialize>(values: &[T]) -> Result<Option<String>> {
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(values)?))
}

pub(crate) fn encode_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(|v| serde_json::to_string(v).map_err(StoreError::from))
        .transpose()
}

pub(crate) fn decode_seq<T: DeserializeOwned>(column: &str, text: Option<&str>) -> Result<Vec<T>> {
    match text {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str::<Option<Vec<T>>>(text)
            .map(Option::unwrap_or_default)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", column, e))),
    }
}

pub(crate) fn decode_opt<T: DeserializeOwned>(column: &str, text: Option<&str>) -> Result<Option<T>> {
    match text {
        None => Ok(None),
        Some(text) => serde_json::from_str::<Option<T>>(text)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", column, e))),
    }
}

/// Fixed-width RFC 3339 so that text order in SQL matches time order.
pub(crate) fn encode_time(value: Option<&DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

pub(crate) fn decode_time(column: &str, text: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    text.map(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Serialization(format!("{}: {:?}: {}", column, s, e)))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_sequence_is_null() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(encode_seq(&empty).unwrap(), None);
        assert_eq!(decode_seq::<String>("links", None).unwrap(), empty);
    }

    #[test]
    fn test_json_null_reads_as_empty_or_absent() {
        assert!(decode_seq::<String>("links", Some("null")).unwrap().is_empty());
        assert_eq!(decode_opt::<String>("content", Some("null")).unwrap(), None);
    }

    #[test]
    fn test_malformed_text_is_serialization_error() {
        let err = decode_seq::<String>("links", Some("[\"unterminated")).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(ref msg) if msg.starts_with("links")));

        let err = decode_time("published_at", Some("yesterday")).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_time_round_trip_keeps_instant() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap()
            + chrono::Duration::milliseconds(250);
        let text = encode_time(Some(&dt)).unwrap();
        assert_eq!(text, "2024-03-09T14:30:05.250000000Z");
        assert_eq!(decode_time("t", Some(&text)).unwrap(), Some(dt));
    }

    #[test]
    fn test_time_text_order_matches_time_order() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        let later = whole + chrono::Duration::milliseconds(250);

        let whole = encode_time(Some(&whole)).unwrap();
        let later = encode_time(Some(&later)).unwrap();
        assert_eq!(whole.len(), later.len());
        assert!(whole < later);
    }
}
