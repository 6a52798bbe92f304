//! Merges parsed record sets into the ordered call list and the call index.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use cdr_model::{
    CallId, CallIndex, CallIndexEntry, CanonicalCall, Column, DateRange, Record, RecordSet,
    canonical_phone,
};

use crate::audio::AudioIndex;
use crate::error::{CoreError, Result};
use crate::normalize::parse_epoch_seconds;

/// The two views produced from one aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Calls within the date range, ascending by date.
    pub calls: Vec<CanonicalCall>,
    pub index: CallIndex,
}

/// A normalized row that still carries its join key.
struct Row<'a> {
    call: CanonicalCall,
    filename: &'a str,
}

/// Merges record sets, normalizes rows, filters by `range`, sorts and joins audio.
///
/// Sets are consumed in the given order; rows with equal dates keep that order.
/// Fails with [`CoreError::Schema`] when an expected column is absent from
/// every set.
pub fn aggregate(
    sets: &[Arc<RecordSet>],
    audio: &AudioIndex,
    range: DateRange,
) -> Result<Aggregation> {
    if sets.is_empty() {
        debug!("no record sets to aggregate");
        return Ok(Aggregation::default());
    }

    let columns: BTreeSet<Column> = sets
        .iter()
        .flat_map(|set| set.columns.iter().copied())
        .collect();
    if let Some(missing) = Column::ALL.into_iter().find(|c| !columns.contains(c)) {
        return Err(CoreError::Schema { column: missing });
    }

    let total: usize = sets.iter().map(|set| set.len()).sum();
    let mut rows = Vec::with_capacity(total);
    let mut undated = 0usize;
    for record in sets.iter().flat_map(|set| set.records.iter()) {
        match normalize_record(record)? {
            Some(row) => rows.push(row),
            None => undated += 1,
        }
    }
    if undated > 0 {
        debug!(rows = undated, "dropped rows without a date");
    }

    rows.retain(|row| range.contains(row.call.date));
    rows.sort_by_key(|row| row.call.date);

    let mut index = CallIndex::new();
    let mut calls = Vec::with_capacity(rows.len());
    for row in rows {
        let entry = CallIndexEntry {
            filename: row.filename.to_string(),
            url: lookup_audio(audio, row.filename),
        };
        if let Some(previous) = index.insert(row.call.id.clone(), entry) {
            warn!(
                call_id = %row.call.id,
                replaced = %previous.filename,
                "duplicate call id, later row wins in index"
            );
        }
        calls.push(row.call);
    }

    debug!(
        rows = total,
        kept = calls.len(),
        indexed = index.len(),
        from = range.from,
        to = range.to,
        "aggregated calls"
    );
    Ok(Aggregation { calls, index })
}

/// Fails with [`CoreError::InvalidDate`] on the first non-empty date no
/// supported layout accepts.
pub fn check_dates(set: &RecordSet) -> Result<()> {
    for raw in set.records.iter().filter_map(|record| record.date.as_deref()) {
        let raw = raw.trim();
        if parse_epoch_seconds(raw).is_none() {
            return Err(CoreError::InvalidDate {
                value: raw.to_string(),
            });
        }
    }
    Ok(())
}

fn normalize_record(record: &Record) -> Result<Option<Row<'_>>> {
    let Some(raw_date) = record.date.as_deref() else {
        return Ok(None);
    };
    let raw_date = raw_date.trim();
    let date = parse_epoch_seconds(raw_date).ok_or_else(|| CoreError::InvalidDate {
        value: raw_date.to_string(),
    })?;

    let filename = record.filename.as_deref().unwrap_or_default();
    let phone_number_client = canonical_phone(record.phone_number_client.as_ref());
    let phone_number_operator = canonical_phone(record.phone_number_operator.as_ref());

    let call = CanonicalCall {
        id: CallId::derive(filename, raw_date, &phone_number_client),
        call_type: record.call_type.clone(),
        date,
        duration_answer: record.duration_answer.clone(),
        status: record.status.clone(),
        phone_number_client,
        phone_number_operator,
    };
    Ok(Some(Row { call, filename }))
}

fn lookup_audio(audio: &AudioIndex, filename: &str) -> Option<String> {
    if filename.is_empty() {
        return None;
    }
    audio.get(filename).cloned()
}
