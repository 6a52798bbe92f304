//! Filename to playable url lookup built from the media folder listing.

use std::collections::HashMap;

use tracing::debug;

use cdr_model::RemoteFileMeta;

/// Audio filename to fetch reference.
pub type AudioIndex = HashMap<String, String>;

/// Builds the audio index from a media folder listing.
///
/// Only entries classified as audio are kept. When a name repeats, the later
/// listing entry wins.
pub fn build_audio_index(listing: &[RemoteFileMeta]) -> AudioIndex {
    let index: AudioIndex = listing
        .iter()
        .filter(|meta| meta.media_type.is_audio())
        .map(|meta| (meta.name.clone(), meta.reference.clone()))
        .collect();
    debug!(listed = listing.len(), audio = index.len(), "built audio index");
    index
}
