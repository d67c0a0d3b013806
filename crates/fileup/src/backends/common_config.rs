//! 🎬 *[two backends walk into a struct. one posts imports. one stores saved objects.]*
//! *["We talk to the same server," they said. "Share a config?" The module system nodded.]*
//!
//! 📦 **ServiceConfig** — where the service lives, who we are when we knock, and how
//! long we wait at the door. Both Kibana backends embed it, so it lives here and not
//! in `app_config` (which would be a circular import waiting to happen).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;

/// 📡 Connection settings for the upload service and its saved-object store.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// 📡 Base URL, scheme and port included. The `/api/...` routes hang off this.
    pub url: String,
    /// 🔒 Basic auth username. Ignored when `api_key` is set.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// 🔒 API key — the velvet rope. Wins over basic auth. This is not a democracy.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// ⏱️ A 10,000-record chunk can take a while. Not forever though.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ServiceConfig {
    /// 🏗️ A config pointing at `url` with no auth and default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            api_key: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// 🔧 Build the shared HTTP client with our timeouts baked in.
    pub(crate) fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. Probably TLS. It's always TLS.")
    }

    /// 📡 `{url}/api/{path}`, minus the double-slash tragedy.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/api/{}", self.url.trim_end_matches('/'), path);
        Url::parse(&raw).with_context(|| {
            format!("💀 '{raw}' is not a URL. Check `service.url`; it needs a scheme and a host.")
        })
    }

    /// 🔒 Stamp credentials on a request. API key first, basic auth second, anonymous third.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.api_key {
            request.header("Authorization", format!("ApiKey {}", api_key))
        } else if let Some(ref username) = self.username {
            request.basic_auth(username, self.password.as_ref())
        } else {
            request
        }
    }
}
