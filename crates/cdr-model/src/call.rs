//! Normalized call rows and the call index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::CallId;
use crate::record::CellValue;

/// Upper bound used when the caller gives no `date_to`.
pub const FAR_FUTURE_EPOCH: i64 = 9_999_999_999_999;

/// Inclusive epoch-second window applied to call dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: i64,
    pub to: i64,
}

impl DateRange {
    /// Builds a range, filling unspecified bounds with `0` and [`FAR_FUTURE_EPOCH`].
    pub fn new(from: Option<i64>, to: Option<i64>) -> Self {
        Self {
            from: from.unwrap_or(0),
            to: to.unwrap_or(FAR_FUTURE_EPOCH),
        }
    }

    pub fn contains(&self, epoch_seconds: i64) -> bool {
        self.from <= epoch_seconds && epoch_seconds <= self.to
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A normalized output row.
///
/// Field order is the serialized projection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCall {
    pub id: CallId,
    #[serde(rename = "type")]
    pub call_type: Option<CellValue>,
    /// Epoch seconds (UTC).
    pub date: i64,
    pub duration_answer: Option<CellValue>,
    pub status: Option<CellValue>,
    pub phone_number_client: String,
    pub phone_number_operator: String,
}

/// An audio file in the remote media folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub filename: String,
    pub url: String,
}

/// Where a call's recording lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallIndexEntry {
    pub filename: String,
    /// Absent when no audio asset matched the call's filename.
    pub url: Option<String>,
}

/// Mapping from call id to its recording location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallIndex {
    entries: BTreeMap<CallId, CallIndexEntry>,
}

impl CallIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry; a repeated id replaces the earlier entry.
    pub fn insert(&mut self, id: CallId, entry: CallIndexEntry) -> Option<CallIndexEntry> {
        self.entries.insert(id, entry)
    }

    pub fn get(&self, id: &CallId) -> Option<&CallIndexEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &CallId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CallId, &CallIndexEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_open() {
        let range = DateRange::default();
        assert_eq!(range.from, 0);
        assert_eq!(range.to, FAR_FUTURE_EPOCH);
        assert!(range.contains(0));
        assert!(range.contains(1_700_000_000));
        assert!(!range.contains(-1));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange::new(Some(10), Some(20));
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(9));
        assert!(!range.contains(21));
    }

    #[test]
    fn index_later_insert_wins() {
        let mut index = CallIndex::new();
        let id = CallId::from_raw("1");
        index.insert(
            id.clone(),
            CallIndexEntry {
                filename: "a.wav".to_string(),
                url: None,
            },
        );
        let previous = index.insert(
            id.clone(),
            CallIndexEntry {
                filename: "b.wav".to_string(),
                url: Some("file:///b.wav".to_string()),
            },
        );
        assert_eq!(previous.map(|entry| entry.filename), Some("a.wav".to_string()));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&id).map(|e| e.filename.as_str()), Some("b.wav"));
    }

    #[test]
    fn index_serializes_as_map() {
        let mut index = CallIndex::new();
        index.insert(
            CallId::from_raw("42"),
            CallIndexEntry {
                filename: "a.wav".to_string(),
                url: None,
            },
        );
        let json = serde_json::to_string(&index).expect("serialize index");
        assert_eq!(json, r#"{"42":{"filename":"a.wav","url":null}}"#);
    }
}
