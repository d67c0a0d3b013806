//! 📇 Index Pattern Manager — makes an index show up in the UI under a title.
//!
//! The registration dance, in four steps:
//! 1. create a pattern titled `<name>` with a blank id (`overwrite = true`, the store mints one);
//! 2. scan one page of stored patterns for that exact title;
//! 3. found → fetch it and hand back its id and fields;
//! 4. not found → still a success, just without an id ([`PatternStatus::IdNotFound`]).
//!
//! The create response carries the id too. We ignore it and scan by title anyway,
//! so a pattern that was already registered under that title is the one reported.
//! Only one page is scanned. Pattern number 1,001 is invisible. 🦆
//!
//! [`PatternStatus::IdNotFound`]: crate::common::PatternStatus::IdNotFound

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::backends::{FindOptions, NewSavedObject, ObjectStore, StoreBackend};
use crate::common::IndexPatternResult;
use crate::errors::{UploadError, render_chain};

/// 🏷️ The saved-object type every pattern is stored under.
pub const INDEX_PATTERN_TYPE: &str = "index-pattern";

/// 🔍 Page size for the title scan that follows a create.
pub const DEFAULT_LOOKUP_PAGE_SIZE: usize = 1_000;

/// 📋 Page size when listing every known pattern name.
pub const EXISTING_NAMES_PAGE_SIZE: usize = 10_000;

const TITLE_FIELDS: &[&str] = &["title"];

/// 🔧 Pattern manager knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexPatternConfig {
    #[serde(default = "default_lookup_page_size")]
    pub lookup_page_size: usize,
}

fn default_lookup_page_size() -> usize {
    DEFAULT_LOOKUP_PAGE_SIZE
}

impl Default for IndexPatternConfig {
    fn default() -> Self {
        Self {
            lookup_page_size: DEFAULT_LOOKUP_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPatternManager {
    store: StoreBackend,
    config: IndexPatternConfig,
}

impl IndexPatternManager {
    pub fn new(store: StoreBackend, config: IndexPatternConfig) -> Self {
        Self { store, config }
    }

    /// 📇 Register a pattern titled `name`. Never returns an error; store failures
    /// come back as `{ success: false, status: Failed, error }`.
    pub async fn register_pattern(&self, name: &str) -> IndexPatternResult {
        match self.try_register(name).await {
            Ok(result) => result,
            Err(err) => {
                let err = UploadError::PatternCreationFailed(render_chain(&err));
                warn!("💀 {}", err);
                IndexPatternResult::failed(&err)
            }
        }
    }

    async fn try_register(&self, name: &str) -> anyhow::Result<IndexPatternResult> {
        let pattern = NewSavedObject {
            object_type: INDEX_PATTERN_TYPE.to_string(),
            id: String::new(),
            attributes: json!({ "title": name }),
        };
        self.store
            .create(&pattern, true)
            .await
            .with_context(|| format!("💀 Could not save index pattern '{name}'"))?;
        debug!("📇 Saved index pattern '{}', looking up its id", name);

        let Some(id) = self.index_pattern_id(name).await? else {
            warn!("⚠️ Index pattern '{}' was saved but no id turned up in the first page", name);
            return Ok(IndexPatternResult::id_not_found());
        };

        let stored = self
            .store
            .get(INDEX_PATTERN_TYPE, &id)
            .await
            .with_context(|| format!("💀 Could not load index pattern '{id}'"))?;
        let fields = stored.fields()?;
        info!("✅ Index pattern '{}' registered as '{}' with {} fields", name, id, fields.len());
        Ok(IndexPatternResult::created(id, fields))
    }

    /// 🔍 Id of the first stored pattern whose title is exactly `name`, if any
    /// within the first `lookup_page_size` patterns.
    pub async fn index_pattern_id(&self, name: &str) -> anyhow::Result<Option<String>> {
        let page = self
            .store
            .find(&FindOptions {
                object_type: INDEX_PATTERN_TYPE,
                fields: TITLE_FIELDS,
                per_page: self.config.lookup_page_size,
            })
            .await
            .context("💀 Could not list index patterns")?;
        Ok(page
            .into_iter()
            .find(|object| object.title() == Some(name))
            .map(|object| object.id))
    }

    /// 📋 Titles of up to 10,000 stored patterns.
    pub async fn existing_index_pattern_names(&self) -> anyhow::Result<Vec<String>> {
        let page = self
            .store
            .find(&FindOptions {
                object_type: INDEX_PATTERN_TYPE,
                fields: TITLE_FIELDS,
                per_page: EXISTING_NAMES_PAGE_SIZE,
            })
            .await
            .context("💀 Could not list index pattern names")?;
        Ok(page
            .iter()
            .filter_map(|object| object.title().map(str::to_string))
            .collect())
    }
}

const MAX_PATTERN_BYTES: usize = 255;
const ILLEGAL_CHARACTERS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#'];

/// ✅ Would the service accept `name` as a pattern title? Same rules as index names:
/// lowercase, no illegal characters, no whitespace, no leading `-`/`_`/`+`, not `.` or `..`,
/// at most 255 bytes.
pub fn check_index_pattern_valid(name: &str) -> Result<(), UploadError> {
    let reject = |reason: String| Err(UploadError::InvalidIndexPatternName(reason));

    if name.is_empty() {
        return reject("name is empty".to_string());
    }
    if name.len() > MAX_PATTERN_BYTES {
        return reject(format!("'{name}' is longer than {MAX_PATTERN_BYTES} bytes"));
    }
    if name != name.to_lowercase() {
        return reject(format!("'{name}' must be lowercase"));
    }
    if name == "." || name == ".." {
        return reject(format!("'{name}' is reserved"));
    }
    if name.starts_with(['-', '_', '+']) {
        return reject(format!("'{name}' must not start with '-', '_' or '+'"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| c.is_whitespace() || ILLEGAL_CHARACTERS.contains(c))
    {
        return reject(format!("'{name}' contains an illegal character {bad:?}"));
    }
    Ok(())
}
