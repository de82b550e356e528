//! Content loaders on top of the dashboard API
//!
//! Architecture: Application Services - each loader owns one failure policy
//! - Manifest loading fails soft: errors are logged and become an empty list
//! - ADR loading fetches and parses, surfacing a typed error
//! - Violation polling surfaces errors so the caller can keep the stale set

use crate::api::DashboardApi;
use crate::domain::adr::{parse_adr, AdrDocument};
use crate::domain::violations::{DashboardResult, ManifestEntry, Violation};

/// Fetch the enforced rules for `repo_key`.
///
/// Never fails: transport and shape errors are logged and yield an empty list.
pub async fn load_manifest(api: &dyn DashboardApi, repo_key: &str) -> Vec<ManifestEntry> {
    match api.fetch_manifest(repo_key).await {
        Ok(rules) => {
            tracing::debug!("Loaded {} manifest rules for '{}'", rules.len(), repo_key);
            rules
        }
        Err(e) => {
            tracing::warn!("Error loading manifest for '{}': {}", repo_key, e);
            Vec::new()
        }
    }
}

/// Fetch and parse a single ADR document
pub async fn load_adr(api: &dyn DashboardApi, adr_id: &str) -> DashboardResult<AdrDocument> {
    let raw = api.fetch_adr_content(adr_id).await?;
    let document = parse_adr(&raw)?;
    if document.id() != adr_id {
        tracing::debug!("ADR '{}' declares id '{}' in its front-matter", adr_id, document.id());
    }
    Ok(document)
}

/// Fetch the current violation list for `repo_key`
pub async fn poll_violations(api: &dyn DashboardApi, repo_key: &str) -> DashboardResult<Vec<Violation>> {
    let violations = api.fetch_violations(repo_key).await.map_err(|e| {
        tracing::warn!("Error polling violations for '{}': {}", repo_key, e);
        e
    })?;
    tracing::debug!("Polled {} violations for '{}'", violations.len(), repo_key);
    Ok(violations)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory `DashboardApi` used by loader, state and poller tests

    use super::*;
    use crate::domain::violations::DashboardError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    pub struct FakeApi {
        pub manifest: Mutex<Option<Vec<ManifestEntry>>>,
        pub violations: Mutex<Option<Vec<Violation>>>,
        pub documents: Mutex<HashMap<String, (Duration, String)>>,
        pub uploaded: Mutex<Vec<Violation>>,
        pub manifest_calls: AtomicUsize,
        pub violation_calls: AtomicUsize,
        pub adr_calls: AtomicUsize,
    }

    impl FakeApi {
        pub fn set_manifest(&self, rules: Option<Vec<ManifestEntry>>) {
            *self.manifest.lock().unwrap() = rules;
        }

        pub fn set_violations(&self, violations: Option<Vec<Violation>>) {
            *self.violations.lock().unwrap() = violations;
        }

        pub fn add_document(&self, adr_id: &str, delay: Duration, raw: &str) {
            self.documents
                .lock()
                .unwrap()
                .insert(adr_id.to_string(), (delay, raw.to_string()));
        }
    }

    #[async_trait]
    impl DashboardApi for FakeApi {
        async fn fetch_manifest(&self, _repo_key: &str) -> DashboardResult<Vec<ManifestEntry>> {
            self.manifest_calls.fetch_add(1, Ordering::SeqCst);
            self.manifest
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| DashboardError::empty_result("manifest", "'rules' is not an array"))
        }

        async fn fetch_adr_content(&self, adr_id: &str) -> DashboardResult<String> {
            self.adr_calls.fetch_add(1, Ordering::SeqCst);
            let entry = self.documents.lock().unwrap().get(adr_id).cloned();
            match entry {
                Some((delay, raw)) => {
                    tokio::time::sleep(delay).await;
                    Ok(raw)
                }
                None => Err(DashboardError::not_found(adr_id, 404)),
            }
        }

        async fn fetch_violations(&self, _repo_key: &str) -> DashboardResult<Vec<Violation>> {
            self.violation_calls.fetch_add(1, Ordering::SeqCst);
            self.violations
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| DashboardError::transport("violations", "status 500"))
        }

        async fn upload_violations(&self, violations: &[Violation]) -> DashboardResult<()> {
            self.uploaded.lock().unwrap().extend_from_slice(violations);
            Ok(())
        }
    }
}
