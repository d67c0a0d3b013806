use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::{FindOptions, NewSavedObject, ObjectStore, SavedObject};

#[derive(Debug, Default)]
struct StoreState {
    objects: Vec<SavedObject>,
    next_id: u64,
    fail_with: Option<String>,
    hide_from_find: bool,
}

/// 🗄️ A saved-object store that lives and dies with the process.
///
/// Ids are minted as `obj-<n>`. `find` returns objects in insertion order and
/// honors `per_page` as a hard ceiling, like the real thing.
/// Two knobs for tests: `fail_with` makes every call error, `hide_from_find` makes
/// `find` come back empty (a store that hasn't caught up with its own writes).
#[derive(Debug, Default, Clone)]
pub struct InMemoryObjectStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 💀 Every call from now on fails with `message`.
    pub async fn fail_with(&self, message: impl Into<String>) {
        self.state.lock().await.fail_with = Some(message.into());
    }

    /// 🙈 `find` stops seeing anything. Writes still land.
    pub async fn hide_from_find(&self) {
        self.state.lock().await.hide_from_find = true;
    }

    pub async fn objects(&self) -> Vec<SavedObject> {
        self.state.lock().await.objects.clone()
    }
}

fn check(state: &StoreState) -> Result<()> {
    match state.fail_with {
        Some(ref message) => Err(anyhow::anyhow!(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn find(&self, options: &FindOptions<'_>) -> Result<Vec<SavedObject>> {
        let state = self.state.lock().await;
        check(&state)?;
        if state.hide_from_find {
            return Ok(Vec::new());
        }
        Ok(state
            .objects
            .iter()
            .filter(|o| o.object_type == options.object_type)
            .take(options.per_page)
            .cloned()
            .collect())
    }

    async fn create(&self, object: &NewSavedObject, overwrite: bool) -> Result<SavedObject> {
        let mut state = self.state.lock().await;
        check(&state)?;

        let id = if object.id.is_empty() {
            state.next_id += 1;
            format!("obj-{}", state.next_id)
        } else {
            object.id.clone()
        };

        let saved = SavedObject {
            id: id.clone(),
            object_type: object.object_type.clone(),
            attributes: object.attributes.clone(),
        };

        let existing = state
            .objects
            .iter()
            .position(|o| o.id == id && o.object_type == object.object_type);
        match existing {
            Some(position) if overwrite => state.objects[position] = saved.clone(),
            Some(_) => anyhow::bail!("💀 Saved object '{id}' already exists and overwrite is off"),
            None => state.objects.push(saved.clone()),
        }
        Ok(saved)
    }

    async fn get(&self, object_type: &str, id: &str) -> Result<SavedObject> {
        let state = self.state.lock().await;
        check(&state)?;
        state
            .objects
            .iter()
            .find(|o| o.id == id && o.object_type == object_type)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("💀 Saved object [{object_type}/{id}] not found"))
    }
}
