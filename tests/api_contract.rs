//! HTTP contract tests against a mock dashboard API

use adr_dashboard::{
    load_adr, load_manifest, poll_violations, upload_sarif, DashboardApi, DashboardError, HttpApi,
    ManifestEntry, Violation,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADR_ONE: &str = "---\nid: ADR-1\ntitle: Use X\nenforcement:\n  tool: eslint\n  rule_id: no-any\n  severity: high\n---\nBody text";

fn client(server: &MockServer) -> HttpApi {
    HttpApi::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn manifest_rules_are_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest/mySpace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "repo": "mySpace",
            "rules": [
                { "id": "ADR-1", "tool": "eslint", "rule_id": "no-any", "severity": "high" },
                { "id": "ADR-2", "tool": "archunit", "rule_id": "layers", "severity": null }
            ]
        })))
        .mount(&server)
        .await;

    let rules = load_manifest(&client(&server), "mySpace").await;
    assert_eq!(
        rules,
        vec![
            ManifestEntry::new("ADR-1", "eslint", "no-any", "high"),
            ManifestEntry::new("ADR-2", "archunit", "layers", ""),
        ]
    );
}

#[tokio::test]
async fn manifest_with_wrong_shape_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest/mySpace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rules": "not-an-array" })))
        .mount(&server)
        .await;

    let api = client(&server);
    assert!(matches!(
        api.fetch_manifest("mySpace").await,
        Err(DashboardError::EmptyResult { .. })
    ));
    assert!(load_manifest(&api, "mySpace").await.is_empty());
}

#[tokio::test]
async fn manifest_transport_failure_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest/mySpace"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(load_manifest(&client(&server), "mySpace").await.is_empty());
}

#[tokio::test]
async fn adr_document_is_fetched_and_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adr/ADR-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": ADR_ONE })))
        .mount(&server)
        .await;

    let doc = load_adr(&client(&server), "ADR-1").await.unwrap();
    assert_eq!(doc.frontmatter.id, "ADR-1");
    assert_eq!(doc.frontmatter.title, "Use X");
    assert_eq!(doc.frontmatter.enforcement.tool, "eslint");
    assert_eq!(doc.frontmatter.enforcement.rule_id, "no-any");
    assert_eq!(doc.frontmatter.enforcement.severity, "high");
    assert_eq!(doc.body, "Body text");
}

#[tokio::test]
async fn adr_non_success_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adr/ADR-404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = load_adr(&client(&server), "ADR-404").await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound { status: 404, .. }));
}

#[tokio::test]
async fn adr_without_delimiters_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adr/ADR-3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "content": "no delimiters here" })),
        )
        .mount(&server)
        .await;

    let err = load_adr(&client(&server), "ADR-3").await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn violations_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/violations/mySpace"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = poll_violations(&client(&server), "mySpace").await.unwrap_err();
    assert!(matches!(err, DashboardError::Transport { .. }));
}

#[tokio::test]
async fn violations_are_returned_in_source_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/violations/mySpace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "violations": [
                { "adr_id": "ADR-2", "file": "b.ts", "line": 2, "message": "second" },
                { "adr_id": "ADR-1", "file": "a.ts", "line": 1, "message": "first" }
            ]
        })))
        .mount(&server)
        .await;

    let violations = poll_violations(&client(&server), "mySpace").await.unwrap();
    assert_eq!(
        violations,
        vec![
            Violation::new("ADR-2", "b.ts", 2, "second"),
            Violation::new("ADR-1", "a.ts", 1, "first"),
        ]
    );
}

#[tokio::test]
async fn sarif_upload_posts_mapped_violations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest/mySpace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rules": [{ "id": "ADR-1", "tool": "eslint", "rule_id": "no-any", "severity": "high" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_json(json!({
            "violations": [{ "adr_id": "ADR-1", "file": "src/app.ts", "line": 7, "message": "Unexpected any" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let report = temp_dir.path().join("eslint.sarif");
    std::fs::write(
        &report,
        json!({
            "runs": [{
                "tool": { "driver": { "name": "ESLint" } },
                "results": [
                    {
                        "ruleId": "no-any",
                        "message": { "text": "Unexpected any" },
                        "locations": [{ "physicalLocation": {
                            "artifactLocation": { "uri": "src/app.ts" },
                            "region": { "startLine": 7 }
                        }}]
                    },
                    { "ruleId": "eqeqeq", "message": { "text": "Expected ===" } }
                ]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let outcome = upload_sarif(&client(&server), "mySpace", &report, false).await.unwrap();
    assert!(outcome.uploaded);
    assert_eq!(outcome.findings, 2);
    assert_eq!(outcome.violations.len(), 1);
}
