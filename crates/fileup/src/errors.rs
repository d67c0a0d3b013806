//! 💀 Errors — the typed taxonomy of everything that can go sideways during an upload.
//!
//! Internals speak `anyhow` (context chains, 3am-friendly). The moment a failure
//! crosses a component boundary and a caller might want to `match` on it, it becomes
//! an [`UploadError`]. Import and registration outcomes carry the rendered message in
//! their `error` field, so the strings below are part of the observable surface.
//! Don't reword them casually. Someone's UI is string-matching them. Probably. 🦆

use thiserror::Error;

/// 🏷️ Everything an upload can fail with, by name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// 📂 Nothing was parsed. Hard stop before any work.
    #[error("No file imported")]
    NoFileImported,

    /// 🔧 The orchestrator was handed no transform at all. Hard stop before any work.
    #[error("No processor defined")]
    NoProcessorDefined,

    /// 🔧 The resolver was asked to resolve nothing.
    #[error("No transform defined")]
    MissingTransform,

    /// 🏷️ A plain tag that no built-in transform answers to.
    #[error("No handling defined for transform: {0}")]
    UnsupportedTransform(String),

    /// 🗺️ The geo transform only knows `geo_point` and `geo_shape`.
    #[error("Unsupported geo field type: {0}")]
    UnsupportedGeoFieldType(String),

    /// 📄 The parsed file does not look like what the transform expected.
    #[error("Malformed file: {0}")]
    MalformedFile(String),

    /// 🕳️ The strategy ran and returned nothing.
    #[error("Unknown error performing transform")]
    TransformProducedNoDetails,

    #[error("No index supplied")]
    NoIndexSupplied,

    /// 🚧 The service already lists an index by this name. Nothing is written.
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// 🏗️ The create-index write came back without an id.
    #[error("Error creating index: {0}")]
    IndexCreationFailed(String),

    /// 🔄 A chunk exhausted its attempts.
    #[error("Chunk {chunk} failed after {attempts} attempts: {reason}")]
    BatchWriteFailed {
        chunk: usize,
        attempts: u32,
        reason: String,
    },

    #[error("Index pattern creation failed: {0}")]
    PatternCreationFailed(String),

    /// 📇 A title the service would refuse as an index pattern. Caught before any work.
    #[error("Invalid index pattern name: {0}")]
    InvalidIndexPatternName(String),
}

impl UploadError {
    /// 🏗️ Shorthand for a malformed-file error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedFile(msg.into())
    }

    /// 🏗️ Shorthand for an index-creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationFailed(msg.into())
    }
}

/// 🧅 Flattens an anyhow chain into one line, outermost first.
///
/// Result values carry a single `error: String`, and "error sending request" alone
/// has never helped anyone. The causes are where the truth lives.
pub(crate) fn render_chain(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn the_one_where_unknown_transforms_get_named_and_shamed() {
        let err = UploadError::UnsupportedTransform("unknown".to_string());
        assert_eq!(err.to_string(), "No handling defined for transform: unknown");
    }

    #[test]
    fn the_one_where_the_chain_reads_outside_in() {
        let err = Err::<(), _>(anyhow::anyhow!("connection refused"))
            .context("bulk request never landed")
            .unwrap_err();
        assert_eq!(render_chain(&err), "bulk request never landed: connection refused");
    }

    #[test]
    fn the_one_where_a_bad_title_is_not_called_a_creation_failure() {
        let err = UploadError::InvalidIndexPatternName("'Parcels' must be lowercase".to_string());
        assert_eq!(err.to_string(), "Invalid index pattern name: 'Parcels' must be lowercase");
    }
}
