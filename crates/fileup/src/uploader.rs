//! 🚀 The Upload Orchestrator — parsed file in, populated index out.
//!
//! 🎬 COLD OPEN — INT. CONTROL ROOM — THE BUTTON HAS BEEN PRESSED
//!
//! Somebody dropped a file on a page and clicked "Import". Everything below
//! happens in the next few seconds, or the next few minutes if the file is
//! a county's worth of parcels:
//!
//! ```text
//!   parsed file ─▶ resolve transform ─▶ index absent? ─▶ create index (empty write) ─▶ chunked import
//!                                                                   │                          │
//!                                                                   └── id ────────────────────┘
//! ```
//!
//! Two things are refused before anything else runs: no file, no transform.
//! An index that is already listed is refused too, before the create.
//! Those come back as `Err`. Once work starts, the import outcome is a value,
//! even when it is a bad one.
//!
//! 🧠 Knowledge graph: [`UploadContext`] is the bag of collaborators (import sink,
//! saved-object store, settings). Nothing here is global; two uploaders on two
//! contexts never see each other.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app_config::AppConfig;
use crate::backends::{
    InMemoryImportSink, InMemoryObjectStore, KibanaImportSink, KibanaObjectStore, SinkBackend,
    StoreBackend,
};
use crate::common::{ImportRequest, ImportResult, IndexPatternResult, empty_object};
use crate::errors::{UploadError, render_chain};
use crate::importer::{ChunkProgress, ChunkedImporter, ImportConfig};
use crate::index_patterns::{IndexPatternConfig, IndexPatternManager};
use crate::transforms::{self, TransformDescriptor};
use crate::writer::IndexWriter;

/// 🧳 Everything an upload needs to talk to the outside world.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub sink: SinkBackend,
    pub store: StoreBackend,
    pub import: ImportConfig,
    pub index_patterns: IndexPatternConfig,
}

impl UploadContext {
    /// 📡 Kibana-backed context from loaded configuration.
    pub fn connect(app_config: &AppConfig) -> anyhow::Result<Self> {
        let sink = KibanaImportSink::new(app_config.service.clone())?;
        let store = KibanaObjectStore::new(app_config.service.clone())?;
        Ok(Self {
            sink: SinkBackend::Kibana(sink),
            store: StoreBackend::Kibana(store),
            import: app_config.import.clone(),
            index_patterns: app_config.index_patterns.clone(),
        })
    }

    /// 🧪 Context over in-memory backends. Used for dry runs and tests.
    pub fn in_memory(
        sink: InMemoryImportSink,
        store: InMemoryObjectStore,
        import: ImportConfig,
    ) -> Self {
        Self {
            sink: SinkBackend::InMemory(sink),
            store: StoreBackend::InMemory(store),
            import,
            index_patterns: IndexPatternConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileUploader {
    context: UploadContext,
    patterns: IndexPatternManager,
}

impl FileUploader {
    pub fn new(context: UploadContext) -> Self {
        let patterns =
            IndexPatternManager::new(context.store.clone(), context.index_patterns.clone());
        Self { context, patterns }
    }

    /// ✍️ A writer tagged with `app_name`, falling back to the configured one.
    fn writer_for(&self, app_name: Option<&str>) -> IndexWriter {
        let app_name = app_name
            .map(str::to_string)
            .or_else(|| self.context.import.app_name.clone());
        IndexWriter::new(self.context.sink.clone()).with_app_name(app_name)
    }

    /// 🚀 Transform `parsed_file`, create `index_name`, and import every record into it.
    pub async fn index_data(
        &self,
        parsed_file: Option<&Value>,
        transform: Option<&TransformDescriptor>,
        index_name: &str,
        data_type: Option<&str>,
        app_name: Option<&str>,
    ) -> Result<ImportResult, UploadError> {
        self.index_data_with_progress(parsed_file, transform, index_name, data_type, app_name, |_| {})
            .await
    }

    /// 🚀 [`index_data`](Self::index_data), reporting each finished chunk to `on_chunk`.
    pub async fn index_data_with_progress<F>(
        &self,
        parsed_file: Option<&Value>,
        transform: Option<&TransformDescriptor>,
        index_name: &str,
        data_type: Option<&str>,
        app_name: Option<&str>,
        on_chunk: F,
    ) -> Result<ImportResult, UploadError>
    where
        F: FnMut(ChunkProgress),
    {
        let parsed_file = parsed_file.ok_or(UploadError::NoFileImported)?;
        let transform = transform.ok_or(UploadError::NoProcessorDefined)?;

        let details = transforms::resolve(Some(transform), parsed_file, data_type)?
            .with_index(index_name);
        info!(
            "🔄 Transformed input into {} records for '{}'",
            details.data.len(),
            details.index
        );

        let writer = self.writer_for(app_name);
        let id = Self::create_index(
            &writer,
            &details.index,
            &details.settings,
            &details.mappings,
            &details.ingest_pipeline,
        )
        .await?;
        debug!("🏗️ Index '{}' created with id '{}'", details.index, id);

        // -- mappings and settings already went in with the create
        let empty = empty_object();
        let importer = ChunkedImporter::new(writer, self.context.import.clone());
        Ok(importer
            .import_all_with_progress(
                Some(&id),
                &details.index,
                &details.data,
                &empty,
                &empty,
                on_chunk,
            )
            .await)
    }

    /// 🏗️ An empty write without an id creates the index. The id it hands back is
    /// what every later chunk appends under. Only an index the service does not
    /// already list gets created; an existing one is [`UploadError::IndexAlreadyExists`].
    async fn create_index(
        writer: &IndexWriter,
        index: &str,
        settings: &Value,
        mappings: &Value,
        ingest_pipeline: &Value,
    ) -> Result<String, UploadError> {
        if index.is_empty() {
            return Err(UploadError::NoIndexSupplied);
        }
        let exists = writer.index_exists(index).await.map_err(|err| {
            UploadError::index_creation(format!(
                "could not check for an existing index: {}",
                render_chain(&err)
            ))
        })?;
        if exists {
            warn!("🚧 '{}' is already there, leaving it alone", index);
            return Err(UploadError::IndexAlreadyExists(index.to_string()));
        }

        let created = writer
            .write(&ImportRequest {
                id: None,
                index,
                data: &[],
                settings,
                mappings,
                ingest_pipeline,
                file_type: None,
                app: None,
            })
            .await;

        match created.id {
            Some(id) if created.success && !id.is_empty() => Ok(id),
            _ => Err(UploadError::index_creation(
                created
                    .error
                    .unwrap_or_else(|| format!("no id came back for '{index}'")),
            )),
        }
    }

    /// 📇 Register an index pattern titled `name`.
    pub async fn create_index_pattern(&self, name: &str) -> IndexPatternResult {
        self.patterns.register_pattern(name).await
    }
}
