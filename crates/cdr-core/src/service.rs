//! Caller-facing entry points: call listing per session and recording lookup.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use cdr_model::{CallId, CallIndex, CallIndexEntry, CanonicalCall, DateRange};

use crate::cache::ContentCache;
use crate::error::{CoreError, Result};
use crate::pipeline::{Pipeline, RunOutput};
use crate::remote::RemoteStore;
use crate::settings::PipelineSettings;

/// Audio bytes for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Owns the content cache and remembers the latest call index per session.
///
/// Each session sees the index produced by its own most recent run; a lookup
/// before any run for that session is `NotFound`.
#[derive(Debug)]
pub struct CallService {
    cache: Arc<ContentCache>,
    settings: PipelineSettings,
    sessions: RwLock<HashMap<String, CallIndex>>,
}

impl CallService {
    pub fn new(cache: Arc<ContentCache>, settings: PipelineSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            cache,
            settings,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs the pipeline and stores the resulting index under `session`.
    pub fn run(
        &self,
        session: &str,
        store: &dyn RemoteStore,
        range: DateRange,
    ) -> Result<RunOutput> {
        let output = Pipeline::new(store, &self.cache, &self.settings).run(range)?;
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.to_string(), output.index.clone());
        debug!(session, calls = output.calls.len(), "stored call index for session");
        Ok(output)
    }

    /// Returns the ordered call list for `range`, remembering its index.
    pub fn get_calls(
        &self,
        session: &str,
        store: &dyn RemoteStore,
        range: DateRange,
    ) -> Result<Vec<CanonicalCall>> {
        self.run(session, store, range).map(|output| output.calls)
    }

    /// Looks up where the recording for `id` lives.
    pub fn call_index_entry(&self, session: &str, id: &CallId) -> Result<CallIndexEntry> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let index = sessions
            .get(session)
            .ok_or_else(|| CoreError::NotFound(format!("no call index for session {session}")))?;
        index
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("call_id={id}")))
    }

    /// Fetches the recording bytes for `id` from `store`.
    pub fn fetch_recording(
        &self,
        session: &str,
        id: &CallId,
        store: &dyn RemoteStore,
    ) -> Result<Recording> {
        let entry = self.call_index_entry(session, id)?;
        let url = entry.url.ok_or_else(|| CoreError::NoRecording { id: id.to_string() })?;
        let bytes = store.fetch_bytes(&url)?;
        info!(call_id = %id, file = %entry.filename, bytes = bytes.len(), "fetched recording");
        Ok(Recording {
            filename: entry.filename,
            bytes,
        })
    }

    /// Forgets the index stored for `session`.
    pub fn end_session(&self, session: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session).is_some()
    }
}
