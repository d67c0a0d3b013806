//! 🔌 Backends — where the real I/O happens.
//!
//! Two seams, each a trait plus an enum that dispatches to the concrete types:
//!
//! - [`ImportSink`] / [`SinkBackend`] — the import route (one request per batch) and
//!   the index listing route.
//! - [`ObjectStore`] / [`StoreBackend`] — the saved-object store holding index patterns.
//!
//! Each has a Kibana flavor that speaks HTTP and an in-memory flavor that speaks
//! `Vec`. The in-memory ones are scriptable, so tests can make the service fail on
//! the third attempt of the second chunk without bribing a real cluster.
//!
//! 🦆 The duck is here because every file must have one. Do not question the duck.

use std::fmt::Debug;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::common::{FieldDescriptor, ImportRequest, ImportResult, IndexSummary};

pub(crate) mod common_config;
pub(crate) mod in_mem;
pub(crate) mod kibana;

pub use common_config::ServiceConfig;
pub use in_mem::{InMemoryImportSink, InMemoryObjectStore, RecordedRequest};
pub use kibana::{KibanaImportSink, KibanaObjectStore};

// ===== Import sink =====

/// 🕳️ Where import requests go.
///
/// # Contract 📜
/// - `send` performs exactly one round trip and returns the service's verdict.
///   A verdict of `success: false` is still `Ok`; `Err` means we never got a verdict
///   (transport failure, non-2xx, unparseable body).
/// - `list_indices` returns whatever indices the service knows about.
/// - No retries here. Retries are the importer's problem.
#[async_trait]
pub trait ImportSink: Debug + Send + Sync {
    async fn send(&self, request: &ImportRequest<'_>) -> Result<ImportResult>;
    async fn list_indices(&self) -> Result<Vec<IndexSummary>>;
}

/// 🎭 The many faces of an import sink.
#[derive(Debug, Clone)]
pub enum SinkBackend {
    InMemory(InMemoryImportSink),
    Kibana(KibanaImportSink),
}

#[async_trait]
impl ImportSink for SinkBackend {
    async fn send(&self, request: &ImportRequest<'_>) -> Result<ImportResult> {
        match self {
            SinkBackend::InMemory(sink) => sink.send(request).await,
            SinkBackend::Kibana(sink) => sink.send(request).await,
        }
    }

    async fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        match self {
            SinkBackend::InMemory(sink) => sink.list_indices().await,
            SinkBackend::Kibana(sink) => sink.list_indices().await,
        }
    }
}

// ===== Object store =====

/// 🗄️ One stored object, as the store hands it back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedObject {
    pub id: String,
    #[serde(rename = "type", default)]
    pub object_type: String,
    #[serde(default)]
    pub attributes: Value,
}

impl SavedObject {
    pub fn title(&self) -> Option<&str> {
        self.attributes.get("title").and_then(Value::as_str)
    }

    /// 🏷️ The `fields` attribute. Stored as a JSON-encoded string by Kibana,
    /// as a plain array by anything sane. Absent means no fields yet.
    pub fn fields(&self) -> Result<Vec<FieldDescriptor>> {
        match self.attributes.get("fields") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(encoded)) => serde_json::from_str(encoded)
                .with_context(|| format!("💀 fields of saved object '{}' are not valid JSON", self.id)),
            Some(other) => serde_json::from_value(other.clone())
                .with_context(|| format!("💀 fields of saved object '{}' have an unexpected shape", self.id)),
        }
    }
}

/// 🆕 An object to create. An empty `id` lets the store pick one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavedObject {
    pub object_type: String,
    pub id: String,
    pub attributes: Value,
}

/// 🔍 `find` parameters: type, optional field projection, page size. One page only.
#[derive(Debug, Clone, Copy)]
pub struct FindOptions<'a> {
    pub object_type: &'a str,
    pub fields: &'a [&'a str],
    pub per_page: usize,
}

/// 🗄️ A generic saved-object store.
#[async_trait]
pub trait ObjectStore: Debug + Send + Sync {
    async fn find(&self, options: &FindOptions<'_>) -> Result<Vec<SavedObject>>;
    async fn create(&self, object: &NewSavedObject, overwrite: bool) -> Result<SavedObject>;
    async fn get(&self, object_type: &str, id: &str) -> Result<SavedObject>;
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    InMemory(InMemoryObjectStore),
    Kibana(KibanaObjectStore),
}

#[async_trait]
impl ObjectStore for StoreBackend {
    async fn find(&self, options: &FindOptions<'_>) -> Result<Vec<SavedObject>> {
        match self {
            StoreBackend::InMemory(store) => store.find(options).await,
            StoreBackend::Kibana(store) => store.find(options).await,
        }
    }

    async fn create(&self, object: &NewSavedObject, overwrite: bool) -> Result<SavedObject> {
        match self {
            StoreBackend::InMemory(store) => store.create(object, overwrite).await,
            StoreBackend::Kibana(store) => store.create(object, overwrite).await,
        }
    }

    async fn get(&self, object_type: &str, id: &str) -> Result<SavedObject> {
        match self {
            StoreBackend::InMemory(store) => store.get(object_type, id).await,
            StoreBackend::Kibana(store) => store.get(object_type, id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_fields_arrive_double_encoded() {
        let object = SavedObject {
            id: "p1".to_string(),
            object_type: "index-pattern".to_string(),
            attributes: json!({
                "title": "sales",
                "fields": r#"[{"name":"coordinates","type":"geo_point","searchable":true,"aggregatable":true}]"#
            }),
        };
        assert_eq!(object.title(), Some("sales"));
        let fields = object.fields().unwrap();
        assert_eq!(fields[0].name, "coordinates");
        assert_eq!(fields[0].field_type, "geo_point");
    }

    #[test]
    fn the_one_where_missing_fields_mean_none_yet() {
        let object = SavedObject {
            id: "p2".to_string(),
            object_type: "index-pattern".to_string(),
            attributes: json!({ "title": "empty" }),
        };
        assert!(object.fields().unwrap().is_empty());
    }
}
