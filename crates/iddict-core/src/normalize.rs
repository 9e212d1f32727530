//! Input normalization and argument checks shared by the stores.
//!
//! Mutators never persist "empty": empty strings, lists and maps are stored
//! as absent so that an unset attribute has a single representation.

use std::collections::BTreeMap;

use time::{OffsetDateTime, UtcOffset};

use crate::error::{StoreError, StoreResult};

/// Maps an empty string to `None`.
#[must_use]
pub fn non_empty_string(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Maps an empty list to `None`.
#[must_use]
pub fn non_empty_list(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values) }
}

/// Maps an empty map to `None`.
#[must_use]
pub fn non_empty_map<K, V>(map: BTreeMap<K, V>) -> Option<BTreeMap<K, V>> {
    if map.is_empty() { None } else { Some(map) }
}

/// Converts a timestamp to UTC.
#[must_use]
pub fn to_utc(date: Option<OffsetDateTime>) -> Option<OffsetDateTime> {
    date.map(|d| d.to_offset(UtcOffset::UTC))
}

/// Fails with [`StoreError::InvalidArgument`] when `value` is empty.
///
/// # Errors
///
/// Returns an error naming `parameter` if `value` is empty.
pub fn ensure_not_empty(value: &str, parameter: &'static str, subject: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::empty_argument(parameter, subject));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_non_empty_string() {
        assert_eq!(non_empty_string(None), None);
        assert_eq!(non_empty_string(Some(String::new())), None);
        assert_eq!(non_empty_string(Some("x".into())).as_deref(), Some("x"));
    }

    #[test]
    fn test_non_empty_collections() {
        assert_eq!(non_empty_list(Vec::new()), None);
        assert_eq!(non_empty_list(vec!["a".into()]), Some(vec!["a".to_string()]));
        assert_eq!(non_empty_map(BTreeMap::<String, String>::new()), None);
    }

    #[test]
    fn test_to_utc() {
        let local = datetime!(2024-03-01 12:00 +02:00);
        let utc = to_utc(Some(local)).unwrap();
        assert_eq!(utc.offset(), UtcOffset::UTC);
        assert_eq!(utc, local);
        assert_eq!(utc.hour(), 10);
    }

    #[test]
    fn test_ensure_not_empty() {
        assert!(ensure_not_empty("abc", "subject", "subject").is_ok());
        let err = ensure_not_empty("", "subject", "subject").unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidArgument {
                parameter: "subject",
                ..
            }
        ));
    }
}
