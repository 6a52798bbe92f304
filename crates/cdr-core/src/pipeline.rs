//! Pipeline orchestration: listing, eviction, resolution, aggregation.
//!
//! ```text
//! Idle -> Listing -> Evicting -> Resolving -> Aggregating -> Done
//! ```
//!
//! Listing and fetch failures end the run. Per-file format, parse and date
//! failures end the run under [`FailurePolicy::Abort`] and are reported and
//! left out under [`FailurePolicy::Skip`]. Dates are checked while a file is
//! resolved, so a file with an unreadable date is never cached.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use cdr_ingest::{SourceFormat, parse_source};
use cdr_model::{CallIndex, CanonicalCall, DateRange, RecordSet, RemoteFileMeta};

use crate::aggregate::{aggregate, check_dates};
use crate::audio::build_audio_index;
use crate::cache::{ContentCache, Resolution};
use crate::error::{CoreError, ErrorKind, ErrorReport, Result};
use crate::remote::RemoteStore;
use crate::settings::{FailurePolicy, PipelineSettings};

/// A source file left out of a run under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub name: String,
    pub error: ErrorReport,
}

/// Counters describing what one run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Files in the data folder listing.
    pub listed: usize,
    /// Audio files in the media folder listing.
    pub audio: usize,
    /// Files whose parser ran.
    pub parsed: usize,
    /// Files served from the cache without parsing.
    pub reused: usize,
    /// Cache entries removed because their file vanished.
    pub evicted: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    /// Calls in the output after filtering.
    pub rows: usize,
}

/// Everything a run returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub calls: Vec<CanonicalCall>,
    pub index: CallIndex,
    pub report: RunReport,
}

type Resolved = Result<(Arc<RecordSet>, Resolution)>;

/// One pipeline bound to a store, a cache, and settings.
pub struct Pipeline<'a> {
    store: &'a dyn RemoteStore,
    cache: &'a ContentCache,
    settings: &'a PipelineSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn RemoteStore,
        cache: &'a ContentCache,
        settings: &'a PipelineSettings,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    /// Runs the full pipeline for `range`.
    pub fn run(&self, range: DateRange) -> Result<RunOutput> {
        let run_span = info_span!("pipeline_run", from = range.from, to = range.to);
        let _guard = run_span.enter();
        let start = Instant::now();
        let mut report = RunReport::default();

        let (data, audio) = info_span!("listing").in_scope(|| -> Result<_> {
            let data = self.store.list_folder(&self.settings.data_folder)?;
            let audio_listing = self.store.list_folder(&self.settings.audio_folder)?;
            let audio = build_audio_index(&audio_listing);
            debug!(
                data_folder = %self.settings.data_folder,
                audio_folder = %self.settings.audio_folder,
                files = data.len(),
                audio = audio.len(),
                "listing complete"
            );
            Ok((data, audio))
        })?;
        report.listed = data.len();
        report.audio = audio.len();

        report.evicted = info_span!("evicting")
            .in_scope(|| self.cache.evict(data.iter().map(|meta| meta.name.as_str())));

        let sets = info_span!("resolving").in_scope(|| -> Result<Vec<Arc<RecordSet>>> {
            let resolved = self.resolve_all(&data)?;
            let mut sets = Vec::with_capacity(resolved.len());
            for (meta, result) in data.iter().zip(resolved) {
                let Some(result) = result else {
                    continue;
                };
                match result {
                    Ok((records, resolution)) => {
                        match resolution {
                            Resolution::Parsed => report.parsed += 1,
                            Resolution::Reused => report.reused += 1,
                        }
                        sets.push(records);
                    }
                    Err(err) if self.skippable(&err) => {
                        warn!(file = %meta.name, error = %err, "skipping file");
                        report.skipped.push(SkippedFile {
                            name: meta.name.clone(),
                            error: err.report(),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(sets)
        })?;

        let aggregation =
            info_span!("aggregating").in_scope(|| aggregate(&sets, &audio, range))?;
        report.rows = aggregation.calls.len();

        info!(
            listed = report.listed,
            parsed = report.parsed,
            reused = report.reused,
            evicted = report.evicted.len(),
            skipped = report.skipped.len(),
            rows = report.rows,
            duration_ms = start.elapsed().as_millis(),
            "pipeline run complete"
        );
        Ok(RunOutput {
            calls: aggregation.calls,
            index: aggregation.index,
            report,
        })
    }

    fn skippable(&self, err: &CoreError) -> bool {
        self.settings.failure_policy == FailurePolicy::Skip
            && matches!(err.kind(), ErrorKind::UnsupportedFormat | ErrorKind::Parse)
    }

    /// Resolves every listed file on a bounded pool of scoped threads.
    ///
    /// Results come back in listing order. A slot is `None` when the file was
    /// never attempted because an earlier failure stopped the pool.
    fn resolve_all(&self, listing: &[RemoteFileMeta]) -> Result<Vec<Option<Resolved>>> {
        let mut slots: Vec<Option<Resolved>> = Vec::with_capacity(listing.len());
        slots.resize_with(listing.len(), || None);
        if listing.is_empty() {
            return Ok(slots);
        }

        let workers = self.settings.workers.clamp(1, listing.len());
        let stop_on_error = self.settings.failure_policy == FailurePolicy::Abort;
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let mut panicked = false;

        thread::scope(|scope| {
            let next = &next;
            let stop = &stop;
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                handles.push(scope.spawn(move || {
                    let mut done = Vec::new();
                    while !stop.load(Ordering::Acquire) {
                        let idx = next.fetch_add(1, Ordering::AcqRel);
                        let Some(meta) = listing.get(idx) else {
                            break;
                        };
                        let result = self.resolve_one(meta);
                        if stop_on_error && result.is_err() {
                            stop.store(true, Ordering::Release);
                        }
                        done.push((idx, result));
                    }
                    done
                }));
            }
            for handle in handles {
                match handle.join() {
                    Ok(done) => {
                        for (idx, result) in done {
                            slots[idx] = Some(result);
                        }
                    }
                    Err(_) => panicked = true,
                }
            }
        });

        if panicked {
            return Err(CoreError::Internal(
                "source resolution thread panicked".to_string(),
            ));
        }
        Ok(slots)
    }

    fn resolve_one(&self, meta: &RemoteFileMeta) -> Resolved {
        let start = Instant::now();
        let result = self.cache.resolve(meta, || -> Result<RecordSet> {
            SourceFormat::detect(&meta.name)?;
            let bytes = self.store.fetch_bytes(&meta.reference)?;
            let records = parse_source(&meta.name, &bytes)?;
            check_dates(&records)?;
            Ok(records)
        });
        if let Ok((records, resolution)) = &result {
            debug!(
                file = %meta.name,
                fingerprint = %meta.fingerprint,
                rows = records.len(),
                resolution = ?resolution,
                duration_ms = start.elapsed().as_millis(),
                "resolved source"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use cdr_model::MediaType;
    use std::collections::HashMap;

    struct MapStore {
        folders: HashMap<String, Vec<RemoteFileMeta>>,
        bytes: HashMap<String, Vec<u8>>,
    }

    impl MapStore {
        fn new() -> Self {
            Self {
                folders: HashMap::new(),
                bytes: HashMap::new(),
            }
        }

        fn put(&mut self, folder: &str, name: &str, content: &[u8]) {
            let reference = format!("{folder}{name}");
            let meta = RemoteFileMeta::new(
                name,
                crate::checksum::compute_sha256(content),
                reference.as_str(),
                MediaType::from_name(name),
            );
            self.folders.entry(folder.to_string()).or_default().push(meta);
            self.bytes.insert(reference, content.to_vec());
        }
    }

    impl RemoteStore for MapStore {
        fn list_folder(&self, path: &str) -> std::result::Result<Vec<RemoteFileMeta>, RemoteError> {
            self.folders
                .get(path)
                .cloned()
                .ok_or_else(|| RemoteError::NotFound(path.to_string()))
        }

        fn fetch_bytes(&self, reference: &str) -> std::result::Result<Vec<u8>, RemoteError> {
            self.bytes
                .get(reference)
                .cloned()
                .ok_or_else(|| RemoteError::NotFound(reference.to_string()))
        }
    }

    const HEADER: &str =
        "filename,date,phone_number_client,phone_number_operator,type,status,duration_answer\n";

    fn settings() -> PipelineSettings {
        PipelineSettings::default()
            .with_data_folder("/meta/")
            .with_audio_folder("/audio/")
            .with_workers(2)
    }

    fn store_with(files: &[(&str, String)]) -> MapStore {
        let mut store = MapStore::new();
        store.folders.insert("/audio/".to_string(), Vec::new());
        store.folders.insert("/meta/".to_string(), Vec::new());
        for (name, content) in files {
            store.put("/meta/", name, content.as_bytes());
        }
        store
    }

    #[test]
    fn test_run_reports_parse_then_reuse() {
        let store = store_with(&[(
            "a.csv",
            format!("{HEADER}a.wav,2023-01-01,555,101,in,ok,10\n"),
        )]);
        let cache = ContentCache::new();
        let settings = settings();
        let pipeline = Pipeline::new(&store, &cache, &settings);

        let first = pipeline.run(DateRange::default()).unwrap();
        let second = pipeline.run(DateRange::default()).unwrap();

        assert_eq!(first.report.parsed, 1);
        assert_eq!(second.report.parsed, 0);
        assert_eq!(second.report.reused, 1);
        assert_eq!(first.calls, second.calls);
        assert_eq!(first.index, second.index);
    }

    #[test]
    fn test_missing_data_folder_is_fatal() {
        let store = MapStore::new();
        let cache = ContentCache::new();
        let settings = settings();

        let err = Pipeline::new(&store, &cache, &settings)
            .run(DateRange::default())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    }

    #[test]
    fn test_abort_policy_fails_whole_run() {
        let store = store_with(&[
            ("a.csv", format!("{HEADER}a.wav,2023-01-01,555,101,in,ok,10\n")),
            ("notes.txt", "hello".to_string()),
        ]);
        let cache = ContentCache::new();
        let settings = settings();

        let err = Pipeline::new(&store, &cache, &settings)
            .run(DateRange::default())
            .unwrap_err();

        assert!(matches!(err, CoreError::UnsupportedFormat { ref name } if name == "notes.txt"));
    }

    #[test]
    fn test_skip_policy_reports_and_continues() {
        let store = store_with(&[
            ("a.csv", format!("{HEADER}a.wav,2023-01-01,555,101,in,ok,10\n")),
            ("notes.txt", "hello".to_string()),
        ]);
        let cache = ContentCache::new();
        let settings = settings().with_failure_policy(FailurePolicy::Skip);

        let output = Pipeline::new(&store, &cache, &settings)
            .run(DateRange::default())
            .unwrap();

        assert_eq!(output.calls.len(), 1);
        assert_eq!(output.report.skipped.len(), 1);
        assert_eq!(output.report.skipped[0].name, "notes.txt");
        assert_eq!(output.report.skipped[0].error.kind, ErrorKind::UnsupportedFormat);
        assert!(!cache.contains("notes.txt"));
    }

    #[test]
    fn test_skip_policy_drops_file_with_bad_date() {
        let store = store_with(&[
            ("a.csv", format!("{HEADER}a.wav,2023-01-01,555,101,in,ok,10\n")),
            ("b.csv", format!("{HEADER}b.wav,someday,556,102,in,ok,5\n")),
        ]);
        let cache = ContentCache::new();
        let settings = settings().with_failure_policy(FailurePolicy::Skip);

        let output = Pipeline::new(&store, &cache, &settings)
            .run(DateRange::default())
            .unwrap();

        assert_eq!(output.calls.len(), 1);
        assert_eq!(output.report.skipped.len(), 1);
        assert_eq!(output.report.skipped[0].name, "b.csv");
        assert_eq!(output.report.skipped[0].error.kind, ErrorKind::Parse);
        assert!(!cache.contains("b.csv"));
    }

    #[test]
    fn test_bad_date_aborts_by_default() {
        let store = store_with(&[(
            "b.csv",
            format!("{HEADER}b.wav,someday,556,102,in,ok,5\n"),
        )]);
        let cache = ContentCache::new();
        let settings = settings();

        let err = Pipeline::new(&store, &cache, &settings)
            .run(DateRange::default())
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidDate { ref value } if value == "someday"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_data_folder_yields_empty_output() {
        let store = store_with(&[]);
        let cache = ContentCache::new();
        let settings = settings();

        let output = Pipeline::new(&store, &cache, &settings)
            .run(DateRange::default())
            .unwrap();

        assert!(output.calls.is_empty());
        assert!(output.index.is_empty());
        assert_eq!(output.report.listed, 0);
    }
}
