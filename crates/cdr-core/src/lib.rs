//! Call-record pipeline.
//!
//! Lists source files on a [`RemoteStore`], resolves each one through the
//! fingerprint-keyed [`ContentCache`], and merges the parsed rows into a
//! date-filtered, date-ordered call list plus a [`CallIndex`](cdr_model::CallIndex)
//! pointing each call at its recording.
//!
//! # Example
//!
//! ```ignore
//! use cdr_core::{ContentCache, LocalFolderStore, Pipeline, PipelineSettings};
//! use cdr_model::DateRange;
//!
//! let store = LocalFolderStore::new("/srv/disk");
//! let cache = ContentCache::new();
//! let settings = PipelineSettings::default();
//! let output = Pipeline::new(&store, &cache, &settings).run(DateRange::default())?;
//! ```

pub mod aggregate;
pub mod audio;
pub mod cache;
pub mod checksum;
pub mod error;
pub mod normalize;
pub mod operators;
pub mod pipeline;
pub mod remote;
pub mod service;
pub mod settings;

pub use aggregate::{Aggregation, aggregate, check_dates};
pub use audio::{AudioIndex, build_audio_index};
pub use cache::{CacheEntry, CacheStats, ContentCache, Resolution};
pub use checksum::{compute_file_sha256, compute_sha256};
pub use error::{CoreError, ErrorKind, ErrorReport, Result};
pub use normalize::parse_epoch_seconds;
pub use operators::operators;
pub use pipeline::{Pipeline, RunOutput, RunReport, SkippedFile};
pub use remote::{LocalFolderStore, RemoteError, RemoteStore};
pub use service::{CallService, Recording};
pub use settings::{FailurePolicy, PipelineSettings};
