//! ✍️ The Index Writer — one batch, one round trip, one verdict.
//!
//! Whatever the sink throws (timeouts, 500s, a body that isn't JSON) stops here and
//! becomes `ImportResult { success: false, error }`. Nothing escapes upward as an
//! error; the importer only ever sees verdicts, which is what lets it retry blindly.

use tracing::{debug, warn};

use crate::backends::{ImportSink, SinkBackend};
use crate::common::{ImportRequest, ImportResult};
use crate::errors::render_chain;

/// 📄 What the import route is told the records are. Everything is JSON by the time
/// it gets here.
pub(crate) const FILE_TYPE: &str = "json";

#[derive(Debug, Clone)]
pub struct IndexWriter {
    sink: SinkBackend,
    app_name: Option<String>,
}

impl IndexWriter {
    pub fn new(sink: SinkBackend) -> Self {
        Self {
            sink,
            app_name: None,
        }
    }

    /// 🏷️ Tag every request with the calling app's name.
    pub fn with_app_name(mut self, app_name: Option<String>) -> Self {
        self.app_name = app_name;
        self
    }

    /// 📡 Send one batch. Always returns a verdict.
    ///
    /// `request.id` present ⇒ append to that index; absent ⇒ create it.
    pub async fn write(&self, request: &ImportRequest<'_>) -> ImportResult {
        let request = request
            .with_file_type(FILE_TYPE)
            .with_app(self.app_name.as_deref());

        match self.sink.send(&request).await {
            Ok(result) => {
                if !result.success {
                    debug!(
                        "⚠️ Service rejected a batch of {} for '{}': {:?}",
                        request.data.len(),
                        request.index,
                        result.error
                    );
                }
                result
            }
            Err(err) => {
                let rendered = render_chain(&err);
                warn!("💀 Batch for '{}' never got a verdict: {}", request.index, rendered);
                ImportResult::failed(rendered)
            }
        }
    }

    /// 📋 Names of every index the service knows about.
    pub async fn existing_index_names(&self) -> anyhow::Result<Vec<String>> {
        let indices = self.sink.list_indices().await?;
        Ok(indices.into_iter().map(|index| index.name).collect())
    }

    /// 🔍 Does an index by this exact name exist?
    pub async fn index_exists(&self, index: &str) -> anyhow::Result<bool> {
        Ok(self.existing_index_names().await?.iter().any(|name| name == index))
    }
}
