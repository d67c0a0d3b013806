use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::backends::ImportSink;
use crate::common::{ImportRequest, ImportResult, IndexSummary};

/// 📼 One request as the sink saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub id: Option<String>,
    pub index: String,
    pub data: Vec<Value>,
    pub settings: Value,
    pub mappings: Value,
    pub app: Option<String>,
}

/// 🎬 A queued answer: a verdict, or a transport-style error.
#[derive(Debug, Clone)]
enum Scripted {
    Verdict(ImportResult),
    Error(String),
}

#[derive(Debug, Default)]
struct SinkState {
    script: VecDeque<Scripted>,
    requests: Vec<RecordedRequest>,
    indices: Vec<IndexSummary>,
}

/// 📦 A sink that never forgets, and can be told what to say.
///
/// Scripted answers are consumed one per `send`, in order. Once the script runs
/// dry the sink behaves like a healthy service: creates (no id) register the index
/// and hand back `in-mem-<index>` as the id, every write reports
/// `docCount = records in the request`.
#[derive(Debug, Default, Clone)]
pub struct InMemoryImportSink {
    state: Arc<Mutex<SinkState>>,
}

impl InMemoryImportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 🏗️ Pretend these indices already exist.
    pub async fn with_indices(self, names: &[&str]) -> Self {
        {
            let mut state = self.state.lock().await;
            state.indices.extend(names.iter().map(|name| IndexSummary {
                name: name.to_string(),
                uuid: None,
            }));
        }
        self
    }

    /// 🎬 Queue a verdict for an upcoming `send`.
    pub async fn push_verdict(&self, verdict: ImportResult) {
        self.state.lock().await.script.push_back(Scripted::Verdict(verdict));
    }

    /// 💀 Queue a transport failure for an upcoming `send`.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.state.lock().await.script.push_back(Scripted::Error(message.into()));
    }

    /// 📼 Everything that was sent, in order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }
}

#[async_trait]
impl ImportSink for InMemoryImportSink {
    async fn send(&self, request: &ImportRequest<'_>) -> Result<ImportResult> {
        // 🔒 The Mutex is load-bearing. Do not remove. I know it looks optional. It isn't.
        let mut state = self.state.lock().await;
        state.requests.push(RecordedRequest {
            id: request.id.map(str::to_string),
            index: request.index.to_string(),
            data: request.data.to_vec(),
            settings: request.settings.clone(),
            mappings: request.mappings.clone(),
            app: request.app.map(str::to_string),
        });

        match state.script.pop_front() {
            Some(Scripted::Verdict(verdict)) => Ok(verdict),
            Some(Scripted::Error(message)) => Err(anyhow::anyhow!(message)),
            None => {
                let id = match request.id {
                    Some(id) => id.to_string(),
                    None => {
                        if !state.indices.iter().any(|i| i.name == request.index) {
                            state.indices.push(IndexSummary {
                                name: request.index.to_string(),
                                uuid: None,
                            });
                        }
                        format!("in-mem-{}", request.index)
                    }
                };
                Ok(ImportResult {
                    id: Some(id),
                    ..ImportResult::succeeded(request.data.len() as u64)
                })
            }
        }
    }

    async fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        Ok(self.state.lock().await.indices.clone())
    }
}
