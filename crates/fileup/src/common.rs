//! 📦 Common data structures — the nouns of fileup.
//!
//! 🎬 COLD OPEN — INT. UPLOAD DIALOG — 4:12 PM, FRIDAY
//!
//! Someone dragged a 40MB GeoJSON file onto a browser tab and pressed "Import".
//! They are already putting on their coat. They believe this will take a second.
//! These structs are what carries their optimism across the wire, 10,000 records
//! at a time, and what comes back to tell them how it went.
//!
//! - [`IndexingDetails`] — what a transform produced: records plus the index shape.
//! - [`ImportRequest`] — one borrowed slice of those records, ready to send.
//! - [`ImportResult`] — what the service (or the importer) says happened.
//! - [`IndexPatternResult`] — what happened when we tried to make the index findable.
//!
//! 🦆

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::UploadError;

/// 📄 One record. JSON in, JSON out. We don't judge the shape.
pub type Record = Value;

/// 🗺️ Everything needed to create an index and fill it.
///
/// Produced once by a transform, then left alone. `index` is empty until the
/// uploader stamps the target name on it; `id` stays `None` until the index is
/// known to exist (present ⇒ append mode, absent ⇒ create mode).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexingDetails {
    pub index: String,
    pub data: Vec<Record>,
    pub settings: Value,
    pub mappings: Value,
    pub ingest_pipeline: Value,
    pub id: Option<String>,
}

impl IndexingDetails {
    /// 🏗️ Details with the given records and empty `{}` settings, mappings and pipeline.
    pub fn from_records(data: Vec<Record>) -> Self {
        Self {
            index: String::new(),
            data,
            settings: empty_object(),
            mappings: empty_object(),
            ingest_pipeline: empty_object(),
            id: None,
        }
    }

    /// 🎯 Stamp the target index name.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// 📡 Borrow these details as a request carrying all of `data`.
    pub fn as_request(&self) -> ImportRequest<'_> {
        ImportRequest {
            id: self.id.as_deref(),
            index: &self.index,
            data: &self.data,
            settings: &self.settings,
            mappings: &self.mappings,
            ingest_pipeline: &self.ingest_pipeline,
            file_type: None,
            app: None,
        }
    }
}

/// 📡 A single create-or-append call, borrowed straight out of the caller's records.
///
/// No clones of 10,000 documents just to serialize them once. The borrow checker
/// was consulted. It signed off. It had lifetimes to say about it.
///
/// `id` does not go in the body; sinks put it in the query string.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest<'a> {
    #[serde(skip)]
    pub id: Option<&'a str>,
    pub index: &'a str,
    pub data: &'a [Record],
    pub settings: &'a Value,
    pub mappings: &'a Value,
    pub ingest_pipeline: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<&'a str>,
}

impl<'a> ImportRequest<'a> {
    pub fn with_file_type(mut self, file_type: &'a str) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn with_app(mut self, app: Option<&'a str>) -> Self {
        self.app = app;
        self
    }
}

/// 💀 One record the service refused, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ImportFailure {
    /// 🔢 Position of the record. A single write reports it relative to its own batch;
    /// [`ChunkedImporter`](crate::importer::ChunkedImporter) shifts it to the record's
    /// position in the whole import.
    #[serde(default)]
    pub item: usize,
    #[serde(default)]
    pub reason: String,
    /// 📄 The rejected record itself, when the service bothers to echo it.
    #[serde(default, alias = "record", skip_serializing_if = "Option::is_none")]
    pub doc: Option<Record>,
}

/// 📊 The verdict for one write, or for a whole chunked import.
///
/// Doubles as the wire shape of the import route's response, hence the
/// lenient `#[serde(default)]` everywhere: services omit fields when they're sad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub failures: Vec<ImportFailure>,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default, deserialize_with = "lenient_error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 🆔 Identifier the service assigned when the write created the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ImportResult {
    /// ✅ A clean success with nothing rejected.
    pub fn succeeded(doc_count: u64) -> Self {
        Self {
            success: true,
            doc_count,
            ..Self::default()
        }
    }

    /// 💀 A failure with a message and nothing written.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// 💀 A failure carrying one of our own typed errors.
    pub fn from_error(err: &UploadError) -> Self {
        Self::failed(err.to_string())
    }
}

/// 🏷️ One field of an index pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub aggregatable: bool,
}

/// 🔍 How a registration actually ended, beyond the `success` flag.
///
/// `IdNotFound` is the "created it, then couldn't find it" state: the store
/// accepted the write but the title scan came back empty. Still `success`, but
/// with no id. The caller decides whether that is a race or a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    Created,
    IdNotFound,
    Failed,
}

/// 📇 The outcome of registering an index pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPatternResult {
    pub success: bool,
    pub status: PatternStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndexPatternResult {
    pub(crate) fn created(id: String, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            success: true,
            status: PatternStatus::Created,
            id: Some(id),
            fields: Some(fields),
            error: None,
        }
    }

    pub(crate) fn id_not_found() -> Self {
        Self {
            success: true,
            status: PatternStatus::IdNotFound,
            id: None,
            fields: None,
            error: None,
        }
    }

    pub(crate) fn failed(err: &UploadError) -> Self {
        Self {
            success: false,
            status: PatternStatus::Failed,
            id: None,
            fields: None,
            error: Some(err.to_string()),
        }
    }
}

/// 📋 One row of the index listing endpoint. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexSummary {
    pub name: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

/// `{}` — the emptiest object money can buy.
pub(crate) fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// 🧽 Services return `error` as a string, an object, or occasionally a novella.
/// We flatten whatever arrives into a string so the result stays one shape.
fn lenient_error<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
