use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, info_span, trace};

use cdr_core::{
    CacheStats, CallService, ContentCache, FailurePolicy, LocalFolderStore, PipelineSettings,
    RunOutput,
};
use cdr_model::{CallId, DateRange};

use crate::cli::{CacheCommand, CallsArgs, RecordingArgs, StoreArgs};
use crate::logging::redact_value;

/// Session key used for the single CLI invocation.
const CLI_SESSION: &str = "cli";

/// Result of a `recording` command.
#[derive(Debug)]
pub struct SavedRecording {
    pub id: CallId,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Result of a `cache stats` command.
#[derive(Debug)]
pub struct CacheSummary {
    pub stats: CacheStats,
    pub filenames: Vec<String>,
}

/// Merges the settings file with command-line overrides.
pub fn load_settings(args: &StoreArgs) -> Result<PipelineSettings> {
    let mut settings = match &args.config {
        Some(path) => PipelineSettings::from_json_file(path)
            .with_context(|| format!("load settings from {}", path.display()))?,
        None => PipelineSettings::default(),
    };
    if let Some(folder) = &args.data_folder {
        settings = settings.with_data_folder(folder.as_str());
    }
    if let Some(folder) = &args.audio_folder {
        settings = settings.with_audio_folder(folder.as_str());
    }
    if let Some(workers) = args.workers {
        settings = settings.with_workers(workers);
    }
    if args.skip_failed {
        settings = settings.with_failure_policy(FailurePolicy::Skip);
    }
    settings.validate().context("validate settings")?;
    Ok(settings)
}

fn open_service(args: &StoreArgs) -> Result<(CallService, LocalFolderStore)> {
    let settings = load_settings(args)?;
    let cache = match &args.cache_file {
        Some(path) => ContentCache::load_snapshot(path)
            .with_context(|| format!("load cache snapshot {}", path.display()))?,
        None => ContentCache::new(),
    };
    let service = CallService::new(Arc::new(cache), settings).context("create call service")?;
    Ok((service, LocalFolderStore::new(&args.root)))
}

fn persist_cache(service: &CallService, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        service
            .cache()
            .save_snapshot(path)
            .with_context(|| format!("save cache snapshot {}", path.display()))?;
    }
    Ok(())
}

pub fn run_calls(args: &CallsArgs) -> Result<RunOutput> {
    let span = info_span!("calls", root = %args.store.root.display());
    let _guard = span.enter();
    let (service, store) = open_service(&args.store)?;
    let range = DateRange::new(args.from, args.to);

    let output = service
        .run(CLI_SESSION, &store, range)
        .context("run call pipeline")?;
    persist_cache(&service, args.store.cache_file.as_deref())?;

    for call in &output.calls {
        trace!(
            call_id = %call.id,
            date = call.date,
            client = redact_value(&call.phone_number_client),
            operator = redact_value(&call.phone_number_operator),
            "call"
        );
    }
    if let Some(path) = &args.index_out {
        let json = serde_json::to_string_pretty(&output.index).context("serialize call index")?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), entries = output.index.len(), "wrote call index");
    }
    Ok(output)
}

pub fn run_recording(args: &RecordingArgs) -> Result<SavedRecording> {
    let span = info_span!("recording", call_id = %args.id);
    let _guard = span.enter();
    let (service, store) = open_service(&args.store)?;
    let id = CallId::from_raw(args.id.trim());

    service
        .run(CLI_SESSION, &store, DateRange::default())
        .context("run call pipeline")?;
    persist_cache(&service, args.store.cache_file.as_deref())?;

    let recording = service
        .fetch_recording(CLI_SESSION, &id, &store)
        .with_context(|| format!("fetch recording for call {id}"))?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&recording.filename));
    fs::write(&path, &recording.bytes).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), bytes = recording.bytes.len(), "saved recording");

    Ok(SavedRecording {
        id,
        path,
        bytes: recording.bytes.len(),
    })
}

pub fn run_cache(command: &CacheCommand) -> Result<CacheSummary> {
    let cache = match command {
        CacheCommand::Stats(args) => ContentCache::load_snapshot(&args.cache_file)
            .with_context(|| format!("load cache snapshot {}", args.cache_file.display()))?,
        // The previous snapshot is overwritten unread; it may be damaged.
        CacheCommand::Clear(args) => {
            let path = &args.cache_file;
            let cache = ContentCache::new();
            cache
                .save_snapshot(path)
                .with_context(|| format!("save cache snapshot {}", path.display()))?;
            info!(path = %path.display(), "cleared cache snapshot");
            cache
        }
    };
    Ok(CacheSummary {
        stats: cache.stats(),
        filenames: cache.filenames(),
    })
}
