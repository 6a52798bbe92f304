//! Metadata about files held by the remote store.

use serde::{Deserialize, Serialize};

/// Media classification reported by the remote store for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Audio,
    Spreadsheet,
    Text,
    Document,
    #[default]
    Other,
}

impl MediaType {
    /// Classifies a file by its name extension.
    pub fn from_name(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "wav" | "mp3" | "ogg" | "oga" | "opus" | "flac" | "m4a" | "aac" | "wma" => {
                MediaType::Audio
            }
            "csv" | "txt" | "tsv" => MediaType::Text,
            ext if ext.starts_with("xls") || ext == "ods" => MediaType::Spreadsheet,
            "pdf" | "doc" | "docx" | "odt" | "rtf" => MediaType::Document,
            _ => MediaType::Other,
        }
    }

    pub fn is_audio(self) -> bool {
        matches!(self, MediaType::Audio)
    }
}

/// Identity of one file on the remote store.
///
/// Immutable for the duration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileMeta {
    /// File name, unique within its folder.
    pub name: String,
    /// Opaque content digest; changes whenever the content changes.
    pub fingerprint: String,
    /// Reference usable to fetch the bytes (also the playable url for audio).
    pub reference: String,
    pub media_type: MediaType,
}

impl RemoteFileMeta {
    pub fn new(
        name: impl Into<String>,
        fingerprint: impl Into<String>,
        reference: impl Into<String>,
        media_type: MediaType,
    ) -> Self {
        Self {
            name: name.into(),
            fingerprint: fingerprint.into(),
            reference: reference.into(),
            media_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(MediaType::from_name("call.WAV"), MediaType::Audio);
        assert_eq!(MediaType::from_name("calls.csv"), MediaType::Text);
        assert_eq!(MediaType::from_name("calls.xlsx"), MediaType::Spreadsheet);
        assert_eq!(MediaType::from_name("calls.xls"), MediaType::Spreadsheet);
        assert_eq!(MediaType::from_name("README"), MediaType::Other);
    }

    #[test]
    fn media_type_serializes_snake_case() {
        let json = serde_json::to_string(&MediaType::Audio).expect("serialize");
        assert_eq!(json, "\"audio\"");
    }
}
