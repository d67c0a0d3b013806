//! 📂 Readers — from a path on disk to the one `Value` the transforms want.
//!
//! - `*.gz` → gunzipped first, then judged by the name underneath (`data.ndjson.gz`).
//! - `*.ndjson` / `*.jsonl` → one JSON document per line, collected into an array.
//!   Blank lines are skipped. A bad line is reported by its 1-based line number.
//! - anything else → a single JSON document (`.json`, `.geojson`, and whatever
//!   else someone swears is JSON).
//!
//! The whole file is read into memory. The import sends it in chunks, but the
//! transform needs all of it at once anyway. 🦆

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use memchr::memchr_iter;
use serde_json::Value;
use tracing::{debug, info};

/// 📄 How the bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// One JSON document.
    Json,
    /// One JSON document per line.
    Ndjson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    format: FileFormat,
    gzipped: bool,
}

fn layout_of(path: &Path) -> Layout {
    let extension = |p: &Path| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    };

    let gzipped = extension(path).as_deref() == Some("gz");
    // -- data.ndjson.gz → look at "data.ndjson"
    let inner = if gzipped {
        Path::new(path.file_stem().unwrap_or_default())
    } else {
        path
    };
    let format = match extension(inner).as_deref() {
        Some("ndjson") | Some("jsonl") => FileFormat::Ndjson,
        _ => FileFormat::Json,
    };
    Layout { format, gzipped }
}

/// 🚀 Read and parse `path` into the `Value` handed to a transform.
pub async fn read_parsed_file(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read(path).await.with_context(|| {
        format!(
            "💀 Could not read '{}'. Check that it exists and that we are allowed to look at it.",
            path.display()
        )
    })?;
    let layout = layout_of(path);
    info!(
        "📂 Read {} bytes from '{}' ({:?}{})",
        raw.len(),
        path.display(),
        layout.format,
        if layout.gzipped { ", gzip" } else { "" }
    );

    let bytes = if layout.gzipped {
        gunzip(&raw).with_context(|| format!("💀 '{}' is not valid gzip", path.display()))?
    } else {
        raw
    };

    match layout.format {
        FileFormat::Json => parse_json(&bytes),
        FileFormat::Ndjson => parse_ndjson(&bytes),
    }
    .with_context(|| format!("💀 Could not parse '{}'", path.display()))
}

fn gunzip(raw: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(raw);
    let mut out = Vec::with_capacity(raw.len() * 4);
    decoder.read_to_end(&mut out)?;
    debug!("🗜️ Inflated {} bytes into {}", raw.len(), out.len());
    Ok(out)
}

/// 📄 One document, whole.
pub fn parse_json(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).context("💀 The file is not a JSON document")
}

/// 📜 One document per line, collected into a `Value::Array`.
pub fn parse_ndjson(bytes: &[u8]) -> Result<Value> {
    let mut records = Vec::new();
    let mut start = 0;
    let ends = memchr_iter(b'\n', bytes).chain(std::iter::once(bytes.len()));

    for (line_number, end) in ends.enumerate() {
        // -- \r\n endings and whitespace-only lines both trim down to blank
        let line = bytes[start..end].trim_ascii();
        start = end + 1;
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_slice(line)
            .with_context(|| format!("💀 Line {} is not a JSON document", line_number + 1))?;
        records.push(record);
    }

    debug!("📜 Parsed {} ndjson records", records.len());
    Ok(Value::Array(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use serde_json::json;
    use std::io::Write;

    fn file_with(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("💀 Failed to create a temp file.");
        file.write_all(contents).expect("💀 Failed to write the temp file.");
        file
    }

    fn gzip(contents: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn the_one_where_geojson_is_just_json() {
        let file = file_with(
            ".geojson",
            br#"{"type":"FeatureCollection","features":[]}"#,
        );
        let parsed = read_parsed_file(file.path()).await.unwrap();
        assert_eq!(parsed, json!({ "type": "FeatureCollection", "features": [] }));
    }

    #[tokio::test]
    async fn the_one_where_ndjson_skips_the_blank_lines() {
        let file = file_with(".ndjson", b"{\"a\":1}\r\n\n   \n{\"a\":2}\n{\"a\":3}");
        let parsed = read_parsed_file(file.path()).await.unwrap();
        assert_eq!(parsed, json!([{ "a": 1 }, { "a": 2 }, { "a": 3 }]));
    }

    #[tokio::test]
    async fn the_one_where_gzip_hides_an_ndjson() {
        let file = file_with(".jsonl.gz", &gzip(b"{\"a\":1}\n{\"a\":2}\n"));
        let parsed = read_parsed_file(file.path()).await.unwrap();
        assert_eq!(parsed, json!([{ "a": 1 }, { "a": 2 }]));
    }

    #[tokio::test]
    async fn the_one_where_a_bad_line_is_named() {
        let file = file_with(".ndjson", b"{\"a\":1}\n{oops\n");
        let err = read_parsed_file(file.path()).await.unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("Line 2"), "{chain}");
    }

    #[tokio::test]
    async fn the_one_where_the_file_is_not_there() {
        let err = read_parsed_file(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn the_one_where_the_extension_under_gz_decides() {
        assert_eq!(
            layout_of(Path::new("a.ndjson.GZ")),
            Layout { format: FileFormat::Ndjson, gzipped: true }
        );
        assert_eq!(
            layout_of(Path::new("a.json.gz")),
            Layout { format: FileFormat::Json, gzipped: true }
        );
        assert_eq!(
            layout_of(Path::new("points")),
            Layout { format: FileFormat::Json, gzipped: false }
        );
    }
}
