use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Response;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::XSRF_HEADER;
use crate::backends::{FindOptions, NewSavedObject, ObjectStore, SavedObject, ServiceConfig};

/// 🗄️ The saved-objects HTTP API, wearing the `ObjectStore` trait.
///
/// - `find`   → `GET  /api/saved_objects/_find?type=&per_page=&fields=`
/// - `create` → `POST /api/saved_objects/<type>[/<id>]?overwrite=true`
/// - `get`    → `GET  /api/saved_objects/<type>/<id>`
#[derive(Debug, Clone)]
pub struct KibanaObjectStore {
    client: reqwest::Client,
    config: ServiceConfig,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    saved_objects: Vec<SavedObject>,
}

impl KibanaObjectStore {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }
}

/// 📦 Status check + body parse, shared by every route in here.
async fn parse_response<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("💀 The {what} response got cut off."))?;
    if !status.is_success() {
        anyhow::bail!(
            "💀 The saved-object store refused the {what}: '{}' '{}'",
            status,
            String::from_utf8_lossy(&bytes)
        );
    }
    serde_json::from_slice(&bytes)
        .with_context(|| format!("💀 The {what} response is not the shape we expected."))
}

#[async_trait]
impl ObjectStore for KibanaObjectStore {
    async fn find(&self, options: &FindOptions<'_>) -> Result<Vec<SavedObject>> {
        let mut url = self.config.api_url("saved_objects/_find")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("type", options.object_type);
            query.append_pair("per_page", &options.per_page.to_string());
            for field in options.fields {
                query.append_pair("fields", field);
            }
        }
        debug!("🔍 Finding up to {} '{}' objects", options.per_page, options.object_type);

        let response = self
            .config
            .authorize(self.client.get(url))
            .send()
            .await
            .context("💀 The saved-object find request never landed.")?;
        let found: FindResponse = parse_response(response, "find").await?;
        Ok(found.saved_objects)
    }

    async fn create(&self, object: &NewSavedObject, overwrite: bool) -> Result<SavedObject> {
        // -- 🆔 empty id ⇒ no id segment ⇒ the store mints one
        let route = if object.id.is_empty() {
            format!("saved_objects/{}", object.object_type)
        } else {
            format!("saved_objects/{}/{}", object.object_type, object.id)
        };
        let mut url = self.config.api_url(&route)?;
        if overwrite {
            url.query_pairs_mut().append_pair("overwrite", "true");
        }

        let body = serde_json::to_vec(&json!({ "attributes": object.attributes }))
            .context("💀 Could not serialize the saved object attributes.")?;
        let response = self
            .config
            .authorize(self.client.post(url))
            .header(CONTENT_TYPE, "application/json")
            .header(XSRF_HEADER, "true")
            .body(body)
            .send()
            .await
            .context("💀 The saved-object create request never landed.")?;
        parse_response(response, "create").await
    }

    async fn get(&self, object_type: &str, id: &str) -> Result<SavedObject> {
        let url = self.config.api_url(&format!("saved_objects/{object_type}/{id}"))?;
        let response = self
            .config
            .authorize(self.client.get(url))
            .send()
            .await
            .context("💀 The saved-object get request never landed.")?;
        parse_response(response, "get").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> KibanaObjectStore {
        KibanaObjectStore::new(ServiceConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn the_one_where_find_asks_for_exactly_one_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/saved_objects/_find"))
            .and(query_param("type", "index-pattern"))
            .and(query_param("per_page", "1000"))
            .and(query_param("fields", "title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "per_page": 1000,
                "total": 1,
                "saved_objects": [
                    { "id": "p1", "type": "index-pattern", "attributes": { "title": "sales" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let found = store_for(&server)
            .find(&FindOptions { object_type: "index-pattern", fields: &["title"], per_page: 1000 })
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title(), Some("sales"));
    }

    #[tokio::test]
    async fn the_one_where_an_empty_id_lets_the_store_pick() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/saved_objects/index-pattern"))
            .and(query_param("overwrite", "true"))
            .and(header("kbn-xsrf", "true"))
            .and(body_json(json!({ "attributes": { "title": "sales" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "minted-1", "type": "index-pattern", "attributes": { "title": "sales" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = store_for(&server)
            .create(
                &NewSavedObject {
                    object_type: "index-pattern".to_string(),
                    id: String::new(),
                    attributes: json!({ "title": "sales" }),
                },
                true,
            )
            .await
            .unwrap();
        assert_eq!(created.id, "minted-1");
    }

    #[tokio::test]
    async fn the_one_where_get_on_a_ghost_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/saved_objects/index-pattern/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = store_for(&server).get("index-pattern", "nope").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
