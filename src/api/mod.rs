//! HTTP access to the ADR dashboard API
//!
//! Architecture: Infrastructure Layer - the API is an external collaborator
//! - `DashboardApi` is the seam the loaders and the live poller depend on
//! - `HttpApi` is the reqwest implementation against the JSON endpoints
//! - Payload shape checks happen here so domain code only sees typed records

use crate::config::DashboardConfig;
use crate::domain::violations::{DashboardError, DashboardResult, ManifestEntry, Violation};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Read (and upload) operations offered by the dashboard backend
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// `GET /manifest/{repo_key}` → enforced rules
    async fn fetch_manifest(&self, repo_key: &str) -> DashboardResult<Vec<ManifestEntry>>;

    /// `GET /adr/{adr_id}` → raw `---` segmented document
    async fn fetch_adr_content(&self, adr_id: &str) -> DashboardResult<String>;

    /// `GET /api/violations/{repo_key}` → current violations
    async fn fetch_violations(&self, repo_key: &str) -> DashboardResult<Vec<Violation>>;

    /// `POST /api/upload` with `{violations}`
    async fn upload_violations(&self, violations: &[Violation]) -> DashboardResult<()>;
}

#[derive(Debug, Deserialize)]
struct AdrContentResponse {
    content: String,
}

#[derive(Debug, Serialize)]
struct UploadPayload<'a> {
    violations: &'a [Violation],
}

/// reqwest-backed API client
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: std::time::Duration) -> DashboardResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DashboardError::config(format!("Invalid base_url '{base_url}': {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Create a client from validated configuration
    pub fn from_config(config: &DashboardConfig) -> DashboardResult<Self> {
        Self::new(&config.api.base_url, config.timeout())
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL; every segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> DashboardResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DashboardError::config(format!("base_url '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> DashboardResult<(StatusCode, Option<JsonValue>)> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DashboardError::transport(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok((status, None));
        }

        let body = response
            .json::<JsonValue>()
            .await
            .map_err(|e| DashboardError::transport(url.as_str(), format!("invalid JSON body: {e}")))?;
        Ok((status, Some(body)))
    }
}

/// Pull `field` out of a JSON object and require it to be an array of `T`
fn array_field<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    mut body: JsonValue,
    field: &str,
) -> DashboardResult<Vec<T>> {
    let items = body.get_mut(field).map(JsonValue::take).unwrap_or(JsonValue::Null);
    if !items.is_array() {
        return Err(DashboardError::empty_result(
            endpoint,
            format!("'{field}' is not an array"),
        ));
    }
    serde_json::from_value(items)
        .map_err(|e| DashboardError::empty_result(endpoint, format!("bad '{field}' entry: {e}")))
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_manifest(&self, repo_key: &str) -> DashboardResult<Vec<ManifestEntry>> {
        let url = self.endpoint(&["manifest", repo_key])?;
        let endpoint = url.to_string();
        match self.get_json(url).await? {
            (_, Some(body)) => array_field(&endpoint, body, "rules"),
            (status, None) => Err(DashboardError::transport(endpoint, format!("status {status}"))),
        }
    }

    async fn fetch_adr_content(&self, adr_id: &str) -> DashboardResult<String> {
        let url = self.endpoint(&["adr", adr_id])?;
        let endpoint = url.to_string();
        match self.get_json(url).await? {
            (_, Some(body)) => serde_json::from_value::<AdrContentResponse>(body)
                .map(|r| r.content)
                .map_err(|e| DashboardError::empty_result(endpoint, e.to_string())),
            (status, None) => Err(DashboardError::not_found(adr_id, status.as_u16())),
        }
    }

    async fn fetch_violations(&self, repo_key: &str) -> DashboardResult<Vec<Violation>> {
        let url = self.endpoint(&["api", "violations", repo_key])?;
        let endpoint = url.to_string();
        match self.get_json(url).await? {
            (_, Some(body)) => array_field(&endpoint, body, "violations"),
            (status, None) => Err(DashboardError::transport(endpoint, format!("status {status}"))),
        }
    }

    async fn upload_violations(&self, violations: &[Violation]) -> DashboardResult<()> {
        let url = self.endpoint(&["api", "upload"])?;
        tracing::debug!("POST {} ({} violations)", url, violations.len());
        let response = self
            .client
            .post(url.clone())
            .json(&UploadPayload { violations })
            .send()
            .await
            .map_err(|e| DashboardError::transport(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::transport(url.as_str(), format!("status {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = HttpApi::new("http://localhost:8000", Duration::from_secs(1)).unwrap();

        let url = api.endpoint(&["adr", "ADR 1/../x"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/adr/ADR%201%2F..%2Fx");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = HttpApi::new("http://host/dashboard/", Duration::from_secs(1)).unwrap();

        let url = api.endpoint(&["api", "violations", "mySpace"]).unwrap();
        assert_eq!(url.as_str(), "http://host/dashboard/api/violations/mySpace");
    }

    #[test]
    fn test_array_field_rejects_wrong_shape() {
        let body = serde_json::json!({ "rules": "not-an-array" });
        let err = array_field::<ManifestEntry>("manifest", body, "rules").unwrap_err();
        assert!(matches!(err, DashboardError::EmptyResult { .. }));

        let missing = serde_json::json!({});
        assert!(array_field::<ManifestEntry>("manifest", missing, "rules").is_err());
    }

    #[test]
    fn test_array_field_parses_entries() {
        let body = serde_json::json!({
            "repo": "mySpace",
            "rules": [{ "id": "ADR-1", "tool": "eslint", "rule_id": "no-any", "severity": "high" }]
        });
        let rules: Vec<ManifestEntry> = array_field("manifest", body, "rules").unwrap();
        assert_eq!(rules, vec![ManifestEntry::new("ADR-1", "eslint", "no-any", "high")]);
    }
}
