//! 📄 The `json` transform — records that already are documents.
//!
//! An array of objects goes in, the same array comes out, with `{}` for mappings,
//! settings and pipeline so the index lets dynamic mapping figure it out.
//! A single object is treated as a one-record file. Anything that isn't an object
//! gets turned away at the door, because an index will not take a bare `42`.

use serde_json::Value;

use super::TransformStrategy;
use crate::common::IndexingDetails;
use crate::errors::UploadError;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPassthrough;

impl TransformStrategy for JsonPassthrough {
    fn indexing_details(
        &self,
        parsed_file: &Value,
        _data_type: Option<&str>,
    ) -> Result<Option<IndexingDetails>, UploadError> {
        let records = match parsed_file {
            Value::Array(records) => records.clone(),
            Value::Object(_) => vec![parsed_file.clone()],
            _ => return Err(UploadError::malformed("expected a JSON array or object")),
        };

        if let Some(position) = records.iter().position(|record| !record.is_object()) {
            return Err(UploadError::malformed(format!(
                "record {position} is not a JSON object"
            )));
        }

        Ok(Some(IndexingDetails::from_records(records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_documents_pass_through_untouched() {
        let file = json!([{ "a": 1 }, { "b": [1, 2] }]);
        let details = JsonPassthrough.indexing_details(&file, None).unwrap().unwrap();
        assert_eq!(Value::Array(details.data), file);
        assert_eq!(details.mappings, json!({}));
    }

    #[test]
    fn the_one_where_a_bare_number_is_not_a_document() {
        let err = JsonPassthrough
            .indexing_details(&json!([{ "ok": true }, 42]), None)
            .unwrap_err();
        assert_eq!(err, UploadError::malformed("record 1 is not a JSON object"));
    }
}
