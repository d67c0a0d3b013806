use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use super::XSRF_HEADER;
use crate::backends::{ImportSink, ServiceConfig};
use crate::common::{ImportRequest, ImportResult, IndexSummary};

/// 📡 POSTs import batches to `/api/fileupload/import` and lists indices from
/// `/api/index_management/indices`.
///
/// 🧠 Knowledge graph:
/// - `id` present ⇒ `?id=<id>` ⇒ append to an existing index.
/// - `id` absent ⇒ the service creates the index and reports the new `id`.
/// - A 2xx with `success: false` in the body is a verdict, not an error. We pass it up.
/// - A non-2xx is an error. The importer turns it into a failed result and retries.
///
/// 🔄 This sink does not retry. Retries are the caller's problem. Good luck.
#[derive(Debug, Clone)]
pub struct KibanaImportSink {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl KibanaImportSink {
    /// 🚀 Stand up a sink. No network yet; the first request is the first handshake.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// 📡 "Hello? Is this thing on?" — a GET on `/api/status`, so a wrong URL fails
    /// here and not 10,000 records deep.
    pub async fn ping(&self) -> Result<()> {
        let url = self.config.api_url("status")?;
        let response = self
            .config
            .authorize(self.client.get(url.clone()))
            .send()
            .await
            .with_context(|| format!("💀 Could not reach '{url}'. Is the service up? Is the URL right?"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("💀 '{url}' answered with {status}. Check the URL and the credentials.");
        }
        debug!("✅ Service at '{}' is home and answering", self.config.url);
        Ok(())
    }
}

#[async_trait]
impl ImportSink for KibanaImportSink {
    async fn send(&self, request: &ImportRequest<'_>) -> Result<ImportResult> {
        let mut url = self.config.api_url("fileupload/import")?;
        if let Some(id) = request.id {
            url.query_pairs_mut().append_pair("id", id);
        }

        let body = serde_json::to_vec(request)
            .context("💀 Could not serialize the import request. The records refused to become bytes.")?;
        debug!(
            "📡 Sending {} records ({} bytes) to index '{}'",
            request.data.len(),
            body.len(),
            request.index
        );

        let response = self
            .config
            .authorize(self.client.post(url))
            .header(CONTENT_TYPE, "application/json")
            .header(XSRF_HEADER, "true")
            .body(body)
            .send()
            .await
            .context("💀 The import request never made it to the service. Check connectivity and timeouts.")?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .context("💀 The service answered, then hung up before finishing the sentence.")?;

        if !status.is_success() {
            anyhow::bail!(
                "💀 The import request arrived, but the service said '{}'. The body read: '{}'",
                status,
                String::from_utf8_lossy(&bytes)
            );
        }

        let result: ImportResult = serde_json::from_slice(&bytes)
            .context("💀 The import route answered in something that is not an import result.")?;
        trace!(
            "🚀 Import verdict for '{}': success={} docCount={}",
            request.index, result.success, result.doc_count
        );
        Ok(result)
    }

    async fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        let url = self.config.api_url("index_management/indices")?;
        let response = self
            .config
            .authorize(self.client.get(url))
            .send()
            .await
            .context("💀 Could not fetch the index listing.")?;

        let status = response.status();
        let bytes = response.bytes().await.context("💀 The index listing got cut off mid-list.")?;
        if !status.is_success() {
            anyhow::bail!(
                "💀 The index listing came back '{}': '{}'",
                status,
                String::from_utf8_lossy(&bytes)
            );
        }
        serde_json::from_slice(&bytes).context("💀 The index listing is not a list of indices.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink_for(server: &MockServer) -> KibanaImportSink {
        KibanaImportSink::new(ServiceConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn the_one_where_an_existing_id_rides_in_the_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/fileupload/import"))
            .and(query_param("id", "idx-123"))
            .and(header("kbn-xsrf", "true"))
            .and(body_partial_json(json!({ "index": "sales", "data": [{ "a": 1 }], "ingestPipeline": {} })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "failures": [], "docCount": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let data = vec![json!({ "a": 1 })];
        let empty = json!({});
        let request = ImportRequest {
            id: Some("idx-123"),
            index: "sales",
            data: &data,
            settings: &empty,
            mappings: &empty,
            ingest_pipeline: &empty,
            file_type: None,
            app: None,
        };

        let result = sink_for(&server).send(&request).await.unwrap();
        assert!(result.success);
        assert_eq!(result.doc_count, 1);
    }

    #[tokio::test]
    async fn the_one_where_a_500_is_an_error_not_a_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/fileupload/import"))
            .respond_with(ResponseTemplate::new(500).set_body_string("circuit_breaking_exception"))
            .mount(&server)
            .await;

        let empty = json!({});
        let request = ImportRequest {
            id: None,
            index: "sales",
            data: &[],
            settings: &empty,
            mappings: &empty,
            ingest_pipeline: &empty,
            file_type: Some("json"),
            app: Some("maps"),
        };

        let err = sink_for(&server).send(&request).await.unwrap_err();
        let rendered = format!("{err:#}");
        assert!(rendered.contains("500"), "status should be in the message: {rendered}");
        assert!(rendered.contains("circuit_breaking_exception"));
    }

    #[tokio::test]
    async fn the_one_where_the_api_key_cuts_the_line() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/index_management/indices"))
            .and(header("Authorization", "ApiKey c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "sales", "uuid": "u1", "health": "green" },
                { "name": "geo" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = ServiceConfig {
            api_key: Some("c2VjcmV0".to_string()),
            username: Some("elastic".to_string()),
            ..ServiceConfig::new(server.uri())
        };
        let indices = KibanaImportSink::new(config).unwrap().list_indices().await.unwrap();

        assert_eq!(indices.len(), 2);
        assert_eq!(indices[0].name, "sales");
        assert_eq!(indices[0].uuid.as_deref(), Some("u1"));
        assert_eq!(indices[1].uuid, None);
    }

    #[tokio::test]
    async fn the_one_where_ping_notices_nobody_is_home() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = sink_for(&server).ping().await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
