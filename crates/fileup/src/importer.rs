//! 🔄 The Chunked Importer — where a big pile of records becomes a sequence of
//! modest requests, each given five chances to land.
//!
//! 🎬 COLD OPEN — INT. LOADING DOCK — NIGHT
//!
//! 25,000 records arrive on a single pallet. The dock only takes 10,000 at a time.
//! The forklift driver sighs, splits the pallet three ways, and starts driving.
//! If a load bounces, they try again. Four more times. No coffee break in between.
//! If it bounces a fifth time, they turn off the forklift and go home. The rest of
//! the pallet stays on the dock. Nobody writes "partially delivered" on the form;
//! the form says zero.
//!
//! ## The rules, in order 📜
//! 1. No index name → fail fast, no request sent.
//! 2. Split into chunks of `chunk_size` (10,000), order preserved, last one may be short.
//! 3. One chunk at a time. Never two in flight.
//! 4. Up to `max_attempts` (5) writes per chunk while the verdict is a failure.
//!    No backoff. No "is this retryable?" triage. Every failure gets the same treatment.
//! 5. The chunk's per-record failures join the running list, whatever the outcome,
//!    renumbered from their place in the chunk to their place in the whole import.
//! 6. Chunk still failing → stop, keep its error, `success = false`, `doc_count = 0`.
//! 7. Chunk succeeded → `doc_count` becomes the chunk's count (see [`DocCountMode`]).
//!
//! 🦆

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::common::{ImportFailure, ImportRequest, ImportResult, Record, empty_object};
use crate::errors::UploadError;
use crate::writer::IndexWriter;

/// 📦 How many records go in one request. Sized to stay under the service's payload limit.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// 🔄 Total attempts per chunk: one try plus four retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// 🔢 What `doc_count` means at the end of a successful import.
///
/// `LastChunk` keeps the count reported by the final chunk only: each chunk's count
/// overwrites the previous one. That is what existing callers observe, so it stays
/// the default. `RunningTotal` sums every successful chunk instead. Both report 0
/// when a chunk fails for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocCountMode {
    #[default]
    LastChunk,
    RunningTotal,
}

/// 🔧 Importer knobs. Lives here, next to the thing it configures.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub doc_count_mode: DocCountMode,
    /// 🏷️ Sent along as `app` on every import request.
    #[serde(default)]
    pub app_name: Option<String>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            doc_count_mode: DocCountMode::default(),
            app_name: None,
        }
    }
}

/// 📊 Reported after every chunk that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    pub chunks_done: usize,
    pub chunks_total: usize,
    /// 🔢 Records handed to the service so far, whatever the service said about them.
    pub records_sent: usize,
}

/// ✂️ Slice `records` into runs of `chunk_size`. A size of 0 is treated as 1;
/// zero-record chunks would never finish.
pub fn chunk_records(records: &[Record], chunk_size: usize) -> std::slice::Chunks<'_, Record> {
    records.chunks(chunk_size.max(1))
}

#[derive(Debug, Clone)]
pub struct ChunkedImporter {
    writer: IndexWriter,
    config: ImportConfig,
}

impl ChunkedImporter {
    pub fn new(writer: IndexWriter, config: ImportConfig) -> Self {
        Self { writer, config }
    }

    /// 🚀 Write every record into `index`, chunk by chunk.
    pub async fn import_all(
        &self,
        id: Option<&str>,
        index: &str,
        records: &[Record],
        mappings: &Value,
        settings: &Value,
    ) -> ImportResult {
        self.import_all_with_progress(id, index, records, mappings, settings, |_| {})
            .await
    }

    /// 🚀 Same as [`import_all`](Self::import_all), calling `on_chunk` after each
    /// chunk that succeeds.
    pub async fn import_all_with_progress<F>(
        &self,
        id: Option<&str>,
        index: &str,
        records: &[Record],
        mappings: &Value,
        settings: &Value,
        mut on_chunk: F,
    ) -> ImportResult
    where
        F: FnMut(ChunkProgress),
    {
        if index.is_empty() {
            return ImportResult::from_error(&UploadError::NoIndexSupplied);
        }

        let chunk_size = self.config.chunk_size.max(1);
        let chunks_total = records.len().div_ceil(chunk_size);
        let ingest_pipeline = empty_object();
        info!(
            "📦 Importing {} records into '{}' as {} chunks of up to {}",
            records.len(),
            index,
            chunks_total,
            chunk_size
        );

        let mut failures: Vec<ImportFailure> = Vec::new();
        let mut doc_count: u64 = 0;
        let mut records_sent = 0usize;

        for (chunk_number, chunk) in chunk_records(records, chunk_size).enumerate() {
            let request = ImportRequest {
                id,
                index,
                data: chunk,
                settings,
                mappings,
                ingest_pipeline: &ingest_pipeline,
                file_type: None,
                app: None,
            };

            let (verdict, attempts) = self.write_with_retries(&request, chunk_number).await;
            records_sent += chunk.len();
            // -- the service counts from the start of the chunk, callers count from the start of the file
            let offset = chunk_number * chunk_size;
            failures.extend(verdict.failures.iter().cloned().map(|mut failure| {
                failure.item += offset;
                failure
            }));

            if !verdict.success {
                let reason = verdict
                    .error
                    .clone()
                    .unwrap_or_else(|| "the service reported failure without a reason".to_string());
                let err = UploadError::BatchWriteFailed {
                    chunk: chunk_number,
                    attempts,
                    reason,
                };
                warn!("💀 Giving up on '{}': {}", index, err);
                return ImportResult {
                    success: false,
                    failures,
                    doc_count: 0,
                    error: Some(err.to_string()),
                    id: id.map(str::to_string),
                };
            }

            doc_count = match self.config.doc_count_mode {
                DocCountMode::LastChunk => verdict.doc_count,
                DocCountMode::RunningTotal => doc_count + verdict.doc_count,
            };
            on_chunk(ChunkProgress {
                chunks_done: chunk_number + 1,
                chunks_total,
                records_sent,
            });
        }

        info!(
            "✅ Import into '{}' finished: docCount={} failures={}",
            index,
            doc_count,
            failures.len()
        );
        ImportResult {
            success: true,
            failures,
            doc_count,
            error: None,
            id: id.map(str::to_string),
        }
    }

    /// 🔄 Up to `max_attempts` writes, stopping at the first success.
    /// Returns the last verdict and how many attempts it took.
    async fn write_with_retries(
        &self,
        request: &ImportRequest<'_>,
        chunk_number: usize,
    ) -> (ImportResult, u32) {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        let mut verdict = self.writer.write(request).await;

        while !verdict.success && attempt < max_attempts {
            attempt += 1;
            debug!(
                "🔄 Chunk {} of '{}' failed ({:?}), attempt {}/{}",
                chunk_number, request.index, verdict.error, attempt, max_attempts
            );
            verdict = self.writer.write(request).await;
        }

        if verdict.success && attempt > 1 {
            info!("✅ Chunk {} landed on attempt {}", chunk_number, attempt);
        }
        (verdict, attempt)
    }
}
