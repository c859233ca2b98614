//! HTTP client for the MediaWiki Action API and the SPARQL query service

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;

use super::errors::{check_response, from_status, from_transport};
use crate::api::adapter::{AdapterError, Binding};
use crate::config::TransportPolicy;

pub const USER_AGENT: &str = concat!("ontosync/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Request parameters, sent as query string or form body
pub type Params = Vec<(&'static str, String)>;

/// One logged-in session against a wiki.
///
/// Cookies live in this client's own store and the transport policy applies
/// only to it.
#[derive(Debug)]
pub struct MediaWikiClient {
    http: Client,
    api_url: String,
    sparql_url: String,
    csrf_token: RwLock<Option<String>>,
}

impl MediaWikiClient {
    pub fn new(
        api_url: impl Into<String>,
        sparql_url: impl Into<String>,
        transport: TransportPolicy,
        timeout: Duration,
    ) -> Result<Self, AdapterError> {
        if !transport.verify_certificates {
            log::warn!("TLS certificate verification is disabled for this knowledge base connection");
        }

        let http = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!transport.verify_certificates)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AdapterError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            sparql_url: sparql_url.into(),
            csrf_token: RwLock::new(None),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn sparql_url(&self) -> &str {
        &self.sparql_url
    }

    pub async fn set_csrf_token(&self, token: String) {
        *self.csrf_token.write().await = Some(token);
    }

    /// Read-only API call
    pub async fn get(&self, params: Params) -> Result<Value, AdapterError> {
        let params = with_format(params);
        log::debug!("GET {} action={}", self.api_url, action_of(&params));
        self.send(self.http.get(&self.api_url).query(&params)).await
    }

    /// Unauthenticated POST (used by the login flow)
    pub async fn post(&self, params: Params) -> Result<Value, AdapterError> {
        let params = with_format(params);
        log::debug!("POST {} action={}", self.api_url, action_of(&params));
        self.send(self.http.post(&self.api_url).form(&params)).await
    }

    /// Write call carrying the session's CSRF token
    pub async fn post_with_token(&self, mut params: Params) -> Result<Value, AdapterError> {
        let token = self
            .csrf_token
            .read()
            .await
            .clone()
            .ok_or_else(|| AdapterError::Auth("no CSRF token, log in first".to_string()))?;

        params.push(("token", token));
        params.push(("assert", "user".to_string()));
        self.post(params).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, AdapterError> {
        let response = request.send().await.map_err(|e| from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(from_status(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AdapterError::rejected(format!("invalid JSON from API: {}", e)))?;

        check_response(&body)?;
        Ok(body)
    }

    /// Run a SELECT query and flatten the bindings to strings
    pub async fn sparql(&self, query: &str) -> Result<Vec<Binding>, AdapterError> {
        log::debug!("SPARQL query against {}", self.sparql_url);

        let response = self
            .http
            .get(&self.sparql_url)
            .query(&[("query", query), ("format", "json")])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await
            .map_err(|e| from_transport(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::malformed(format!("query rejected: {}", body.trim())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(from_status(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AdapterError::rejected(format!("invalid SPARQL results: {}", e)))?;

        Ok(parse_bindings(&body))
    }
}

fn with_format(mut params: Params) -> Params {
    params.push(("format", "json".to_string()));
    params.push(("formatversion", "2".to_string()));
    params
}

fn action_of(params: &Params) -> &str {
    params
        .iter()
        .find(|(key, _)| *key == "action")
        .map(|(_, value)| value.as_str())
        .unwrap_or("?")
}

/// Convert SPARQL JSON results into variable to value maps
pub fn parse_bindings(body: &Value) -> Vec<Binding> {
    body.pointer("/results/bindings")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|solution| {
            solution
                .iter()
                .filter_map(|(var, term)| {
                    term.get("value")
                        .and_then(Value::as_str)
                        .map(|value| (var.clone(), value.to_string()))
                })
                .collect()
        })
        .collect()
}
