//! 🔄 Transforms — turning "a file someone uploaded" into "documents an index will accept".
//!
//! 🎬 COLD OPEN — INT. CUSTOMS DESK — THE BORDER BETWEEN A FILE AND AN INDEX
//!
//! A GeoJSON FeatureCollection approaches the desk. It has 12,000 features and a
//! `properties` object on each one. The officer squints. "Purpose of your visit?"
//! "Indexing." "Mappings?" "...I was told someone else would handle that."
//! The officer sighs and reaches for a [`TransformStrategy`].
//!
//! ## Shape of the thing 📐
//!
//! ```text
//!   TransformDescriptor
//!   ├── Named("geo")  ──▶ TransformKey::Geo  ──▶ GeoJsonTransform ─┐
//!   ├── Named("json") ──▶ TransformKey::Json ──▶ JsonPassthrough ──┼──▶ IndexingDetails
//!   └── Custom(Arc<dyn TransformStrategy>) ────────────────────────┘
//! ```
//!
//! Built-in tags are just named implementations of the same trait a caller can
//! implement. One door, many keys. No duck typing, only the mandatory duck. 🦆
//!
//! ## Knowledge Graph 🧠
//! - Depends on: `common::IndexingDetails`, `errors::UploadError`
//! - Used by: `uploader::FileUploader::index_data`
//! - Pure: no I/O, no clocks, no network. Same input, same output, every time.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::common::IndexingDetails;
use crate::errors::UploadError;

pub mod geo;
pub mod json;

pub use geo::{GeoFieldType, GeoJsonTransform, geo_index_types_for_features};
pub use json::JsonPassthrough;

/// 🔧 Anything that can turn a parsed file into indexing details.
///
/// # Contract 📜
/// - `Ok(Some(details))` — here are your records, mappings, settings, pipeline.
/// - `Ok(None)` — ran fine, produced nothing. The resolver turns this into
///   [`UploadError::TransformProducedNoDetails`].
/// - `Err(..)` — the input was wrong in a way worth naming.
/// - The returned `index` is left empty; the uploader stamps it.
pub trait TransformStrategy: Send + Sync + fmt::Debug {
    fn indexing_details(
        &self,
        parsed_file: &Value,
        data_type: Option<&str>,
    ) -> Result<Option<IndexingDetails>, UploadError>;
}

/// 🏷️ The built-in transforms, by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKey {
    /// 🗺️ GeoJSON features → geo_point / geo_shape documents.
    Geo,
    /// 📄 Records that are already documents.
    Json,
}

impl TransformKey {
    pub fn tag(&self) -> &'static str {
        match self {
            TransformKey::Geo => "geo",
            TransformKey::Json => "json",
        }
    }

    /// 🎭 The strategy behind the tag. Zero-sized, so a `'static` borrow is free.
    pub fn strategy(&self) -> &'static dyn TransformStrategy {
        match self {
            TransformKey::Geo => &GeoJsonTransform,
            TransformKey::Json => &JsonPassthrough,
        }
    }
}

impl FromStr for TransformKey {
    type Err = UploadError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "geo" => Ok(TransformKey::Geo),
            "json" => Ok(TransformKey::Json),
            other => Err(UploadError::UnsupportedTransform(other.to_string())),
        }
    }
}

/// 🎟️ What the caller hands us: a tag to look up, or a strategy of their own.
///
/// Tags stay as raw strings until resolution so an unknown tag is representable
/// and gets reported by name instead of failing somewhere upstream.
#[derive(Debug, Clone)]
pub enum TransformDescriptor {
    Named(String),
    Custom(Arc<dyn TransformStrategy>),
}

impl TransformDescriptor {
    pub fn named(tag: impl Into<String>) -> Self {
        TransformDescriptor::Named(tag.into())
    }

    pub fn custom(strategy: impl TransformStrategy + 'static) -> Self {
        TransformDescriptor::Custom(Arc::new(strategy))
    }
}

impl From<TransformKey> for TransformDescriptor {
    fn from(key: TransformKey) -> Self {
        TransformDescriptor::Named(key.tag().to_string())
    }
}

/// 🚀 Resolve a descriptor against a parsed file.
///
/// 1. No descriptor → [`UploadError::MissingTransform`]
/// 2. Tag → built-in strategy, or [`UploadError::UnsupportedTransform`] with the tag
/// 3. Custom → called directly
/// 4. `None` from the strategy → [`UploadError::TransformProducedNoDetails`]
pub fn resolve(
    descriptor: Option<&TransformDescriptor>,
    parsed_file: &Value,
    data_type: Option<&str>,
) -> Result<IndexingDetails, UploadError> {
    let descriptor = descriptor.ok_or(UploadError::MissingTransform)?;

    let details = match descriptor {
        TransformDescriptor::Named(tag) => {
            let key: TransformKey = tag.parse()?;
            debug!("🔄 Resolving built-in transform '{}'", key.tag());
            key.strategy().indexing_details(parsed_file, data_type)?
        }
        TransformDescriptor::Custom(strategy) => {
            debug!("🔄 Resolving custom transform {:?}", strategy);
            strategy.indexing_details(parsed_file, data_type)?
        }
    };

    details.ok_or(UploadError::TransformProducedNoDetails)
}
