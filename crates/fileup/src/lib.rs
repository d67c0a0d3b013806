//! 📦 fileup — push a parsed file into a search index, 10,000 records at a time.
//!
//! The pieces, bottom up:
//! - [`transforms`] turn a parsed file into records, mappings and settings;
//! - [`writer::IndexWriter`] sends one batch and always comes back with a verdict;
//! - [`importer::ChunkedImporter`] splits, sends in order, retries each chunk up to five times;
//! - [`index_patterns::IndexPatternManager`] registers a titled pattern for the new index;
//! - [`uploader::FileUploader`] strings the above together.
//!
//! [`run`] is what the CLI calls. 🦆

pub mod app_config;
pub mod backends;
pub mod common;
pub mod errors;
pub mod importer;
pub mod index_patterns;
pub mod progress;
pub mod readers;
pub mod transforms;
pub mod uploader;
pub mod writer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use app_config::{AppConfig, load_config};
pub use common::{
    FieldDescriptor, ImportFailure, ImportResult, IndexPatternResult, IndexingDetails,
    PatternStatus,
};
pub use errors::UploadError;
pub use importer::{ChunkedImporter, DocCountMode, ImportConfig};
pub use index_patterns::{IndexPatternManager, check_index_pattern_valid};
pub use transforms::{TransformDescriptor, TransformKey, TransformStrategy};
pub use uploader::{FileUploader, UploadContext};
pub use writer::IndexWriter;

use crate::backends::{InMemoryImportSink, InMemoryObjectStore, SinkBackend};
use crate::progress::{ImportProgress, summary_table};

/// 🎯 One upload, as asked for on the command line.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub file: PathBuf,
    pub index: String,
    /// 🏷️ Built-in transform tag (`geo`, `json`).
    pub transform: String,
    /// 🗺️ `geo_point` / `geo_shape`; inferred from the features when absent.
    pub data_type: Option<String>,
    pub create_index_pattern: bool,
    /// 🧪 Run everything against in-memory backends. Nothing leaves the process.
    pub dry_run: bool,
}

/// 🚀 Read, transform, import, and optionally register an index pattern.
///
/// Fails (as `Err`) when the file can't be read, the transform can't run, the index
/// can't be created, or the import itself reports failure. A pattern that can't be
/// registered after a good import is logged and shown in the summary, not fatal.
pub async fn run(app_config: AppConfig, job: UploadJob) -> Result<()> {
    if job.create_index_pattern {
        check_index_pattern_valid(&job.index)
            .with_context(|| format!("💀 '{}' can't be used as an index pattern title", job.index))?;
    }

    let parsed = readers::read_parsed_file(&job.file).await?;

    let context = if job.dry_run {
        warn!("🧪 Dry run: nothing will be sent anywhere");
        UploadContext::in_memory(
            InMemoryImportSink::new(),
            InMemoryObjectStore::new(),
            app_config.import.clone(),
        )
    } else {
        let context = UploadContext::connect(&app_config)
            .context("💀 Could not set up the HTTP clients for the upload service")?;
        // -- a wrong URL should fail here, not after the transform
        if let SinkBackend::Kibana(ref sink) = context.sink {
            sink.ping().await?;
        }
        context
    };
    let uploader = FileUploader::new(context);
    let transform = TransformDescriptor::named(job.transform.as_str());

    let progress = if job.dry_run {
        ImportProgress::hidden(job.index.as_str())
    } else {
        ImportProgress::new(job.index.as_str())
    };
    let import = uploader
        .index_data_with_progress(
            Some(&parsed),
            Some(&transform),
            &job.index,
            job.data_type.as_deref(),
            None,
            |chunk| progress.update(chunk),
        )
        .await
        .with_context(|| format!("💀 Upload into '{}' never got going", job.index))?;
    progress.finish();

    let pattern = if job.create_index_pattern && import.success {
        let pattern = uploader.create_index_pattern(&job.index).await;
        if !pattern.success {
            warn!("⚠️ The data is in, but the index pattern is not: {:?}", pattern.error);
        }
        Some(pattern)
    } else {
        None
    };

    println!("{}", summary_table(&import, pattern.as_ref()));

    if !import.success {
        anyhow::bail!(
            "💀 Import into '{}' failed: {}",
            job.index,
            import.error.as_deref().unwrap_or("no reason given")
        );
    }
    info!(
        "✅ {} documents in '{}' ({} rejected)",
        import.doc_count,
        job.index,
        import.failures.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ServiceConfig;
    use std::io::Write;

    fn offline_config() -> AppConfig {
        AppConfig {
            // -- unroutable on purpose: a dry run must never touch it
            service: ServiceConfig::new("http://127.0.0.1:9"),
            import: ImportConfig::default(),
            index_patterns: Default::default(),
        }
    }

    fn geojson_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        file.write_all(
            br#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]},"properties":{}}
            ]}"#,
        )
        .unwrap();
        file
    }

    #[tokio::test]
    async fn the_one_where_a_dry_run_goes_all_the_way_offline() {
        let file = geojson_file();
        let job = UploadJob {
            file: file.path().to_path_buf(),
            index: "parcels".to_string(),
            transform: "geo".to_string(),
            data_type: None,
            create_index_pattern: true,
            dry_run: true,
        };
        run(offline_config(), job).await.unwrap();
    }

    #[tokio::test]
    async fn the_one_where_a_bad_pattern_title_fails_before_reading() {
        let job = UploadJob {
            file: PathBuf::from("/not/read/anyway.json"),
            index: "Parcels".to_string(),
            transform: "geo".to_string(),
            data_type: None,
            create_index_pattern: true,
            dry_run: true,
        };
        let err = run(offline_config(), job).await.unwrap_err();
        assert!(format!("{err:#}").contains("must be lowercase"));
    }

    #[tokio::test]
    async fn the_one_where_an_unknown_transform_surfaces_by_name() {
        let file = geojson_file();
        let job = UploadJob {
            file: file.path().to_path_buf(),
            index: "parcels".to_string(),
            transform: "csv".to_string(),
            data_type: None,
            create_index_pattern: false,
            dry_run: true,
        };
        let err = run(offline_config(), job).await.unwrap_err();
        assert!(format!("{err:#}").contains("No handling defined for transform: csv"));
    }
}
