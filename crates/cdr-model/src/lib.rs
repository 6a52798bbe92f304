//! Data model for call-record ingestion.
//!
//! Types flow through the pipeline in this order:
//!
//! - [`RemoteFileMeta`]: one file in the remote store (name, fingerprint, fetch reference)
//! - [`RecordSet`] / [`Record`]: rows parsed from one source file
//! - [`CanonicalCall`]: a normalized output row with a stable [`CallId`]
//! - [`CallIndex`]: call id to source audio filename and url

pub mod call;
pub mod ids;
pub mod operator;
pub mod record;
pub mod remote;

pub use call::{
    AudioAsset, CallIndex, CallIndexEntry, CanonicalCall, DateRange, FAR_FUTURE_EPOCH,
};
pub use ids::CallId;
pub use operator::Operator;
pub use record::{CellValue, Column, Record, RecordSet, canonical_phone};
pub use remote::{MediaType, RemoteFileMeta};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_call_serializes_in_projection_order() {
        let call = CanonicalCall {
            id: CallId::derive("a.wav", "2023-01-01", "555"),
            call_type: Some(CellValue::Text("incoming".to_string())),
            date: 1_672_531_200,
            duration_answer: Some(CellValue::Int(42)),
            status: None,
            phone_number_client: "555".to_string(),
            phone_number_operator: "101".to_string(),
        };
        let json = serde_json::to_string(&call).expect("serialize call");
        let keys = [
            "\"id\"",
            "\"type\"",
            "\"date\"",
            "\"duration_answer\"",
            "\"status\"",
            "\"phone_number_client\"",
            "\"phone_number_operator\"",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| json.find(key).expect("key present"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(json.contains("\"status\":null"));
        assert!(json.contains("\"duration_answer\":42"));
    }
}
