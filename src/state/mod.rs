//! Explicit view state for the live dashboard
//!
//! Architecture: Aggregate Root - one container owns selection, manifest, violations and document
//! - Every mutation goes through a method that states its replacement policy
//! - Selection changes bump a request token so late ADR responses are discarded
//! - Derived views (filtered violations, detail view) are recomputed, never stored

use crate::domain::adr::AdrDocument;
use crate::domain::violations::{filter_violations, DashboardResult, ManifestEntry, Violation};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default reserved selection id that shows the aggregate insights page
pub const DASHBOARD_SENTINEL: &str = "__dashboard__";

/// What the user has picked in the list view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "adr_id", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    Unselected,
    Selected(String),
    DashboardSelected,
}

impl Selection {
    /// Interpret a raw id from the list view or the command line.
    ///
    /// Empty input is `Unselected` and `sentinel` is `DashboardSelected`.
    pub fn from_id(id: Option<&str>, sentinel: &str) -> Self {
        match id.map(str::trim) {
            None | Some("") => Self::Unselected,
            Some(id) if id == sentinel => Self::DashboardSelected,
            Some(adr_id) => Self::Selected(adr_id.to_string()),
        }
    }

    /// The selected ADR id, if an ADR is selected
    pub fn adr_id(&self) -> Option<&str> {
        match self {
            Self::Selected(id) => Some(id),
            _ => None,
        }
    }
}

/// Ticket for an ADR fetch started by a selection change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdrRequest {
    pub token: u64,
    pub adr_id: String,
}

/// What the detail pane should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailView<'a> {
    /// Nothing selected
    Placeholder,
    /// Aggregate insights page
    Insights,
    /// ADR fetch in flight
    Loading,
    /// Parsed ADR
    Document(&'a AdrDocument),
    /// Fetch or parse failed; no detail is given to the user
    Failed,
}

/// Complete state of one dashboard view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    selection: Selection,
    manifest: Vec<ManifestEntry>,
    violations: Vec<Violation>,
    violations_error: bool,
    document: Option<AdrDocument>,
    loading: bool,
    load_failed: bool,
    #[serde(skip)]
    request_token: u64,
    manifest_changed_at: Option<DateTime<Utc>>,
    violations_changed_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether the most recent violation poll failed
    pub fn violations_error(&self) -> bool {
        self.violations_error
    }

    pub fn document(&self) -> Option<&AdrDocument> {
        self.document.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// When the manifest rows last changed
    pub fn manifest_changed_at(&self) -> Option<DateTime<Utc>> {
        self.manifest_changed_at
    }

    /// When the violation set or its error flag last changed
    pub fn violations_changed_at(&self) -> Option<DateTime<Utc>> {
        self.violations_changed_at
    }

    /// Token of the most recent selection change
    pub fn request_token(&self) -> u64 {
        self.request_token
    }

    /// Change the selection.
    ///
    /// Leaving for `Unselected` or `DashboardSelected` clears the document
    /// synchronously. Selecting an ADR returns the request the caller must
    /// fetch and later hand back to [`DashboardState::apply_adr_result`].
    /// Re-selecting the current selection is a no-op and returns `None`.
    pub fn select(&mut self, selection: Selection) -> Option<AdrRequest> {
        if selection == self.selection {
            return None;
        }

        self.request_token += 1;
        self.document = None;
        self.load_failed = false;
        self.selection = selection;

        match &self.selection {
            Selection::Selected(adr_id) => {
                self.loading = true;
                Some(AdrRequest {
                    token: self.request_token,
                    adr_id: adr_id.clone(),
                })
            }
            Selection::Unselected | Selection::DashboardSelected => {
                self.loading = false;
                None
            }
        }
    }

    /// Apply a finished ADR fetch.
    ///
    /// Returns `false` and leaves the state untouched when `token` belongs
    /// to a superseded selection.
    pub fn apply_adr_result(&mut self, token: u64, result: DashboardResult<AdrDocument>) -> bool {
        if token != self.request_token {
            tracing::debug!(
                "Discarding stale ADR response (token {}, current {})",
                token,
                self.request_token
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(document) => {
                self.document = Some(document);
                self.load_failed = false;
            }
            Err(e) => {
                tracing::warn!("Failed to load ADR content: {}", e);
                self.document = None;
                self.load_failed = true;
            }
        }
        true
    }

    /// Replace the manifest snapshot. Returns whether the rows changed.
    pub fn replace_manifest(&mut self, rules: Vec<ManifestEntry>) -> bool {
        if self.manifest == rules {
            return false;
        }
        self.manifest = rules;
        self.manifest_changed_at = Some(Utc::now());
        true
    }

    /// Apply a violation poll.
    ///
    /// Success replaces the set and clears the error flag; failure keeps the
    /// previous set and raises the flag. Returns whether anything visible changed.
    pub fn apply_violation_poll(&mut self, result: DashboardResult<Vec<Violation>>) -> bool {
        match result {
            Ok(violations) => {
                if self.violations == violations && !self.violations_error {
                    return false;
                }
                self.violations = violations;
                self.violations_error = false;
            }
            Err(_) => {
                if self.violations_error {
                    return false;
                }
                self.violations_error = true;
            }
        }
        self.violations_changed_at = Some(Utc::now());
        true
    }

    /// Violations for the selected ADR, in source order
    pub fn filtered_violations(&self) -> Vec<&Violation> {
        filter_violations(&self.violations, self.selection.adr_id())
    }

    /// Resolve what the detail pane shows
    pub fn detail_view(&self) -> DetailView<'_> {
        match &self.selection {
            Selection::Unselected => DetailView::Placeholder,
            Selection::DashboardSelected => DetailView::Insights,
            Selection::Selected(_) if self.loading => DetailView::Loading,
            Selection::Selected(_) => match &self.document {
                Some(document) => DetailView::Document(document),
                None if self.load_failed => DetailView::Failed,
                None => DetailView::Loading,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adr::parse_adr;
    use crate::domain::violations::DashboardError;

    fn doc(id: &str) -> AdrDocument {
        parse_adr(&format!("---\nid: {id}\ntitle: Title {id}\n---\nBody of {id}")).unwrap()
    }

    #[test]
    fn test_selection_from_id() {
        assert_eq!(Selection::from_id(None, DASHBOARD_SENTINEL), Selection::Unselected);
        assert_eq!(Selection::from_id(Some("  "), DASHBOARD_SENTINEL), Selection::Unselected);
        assert_eq!(
            Selection::from_id(Some(DASHBOARD_SENTINEL), DASHBOARD_SENTINEL),
            Selection::DashboardSelected
        );
        assert_eq!(
            Selection::from_id(Some("ADR-1"), DASHBOARD_SENTINEL),
            Selection::Selected("ADR-1".to_string())
        );
    }

    #[test]
    fn test_selection_from_id_with_custom_sentinel() {
        assert_eq!(Selection::from_id(Some(" overview "), "overview"), Selection::DashboardSelected);
        assert_eq!(
            Selection::from_id(Some(DASHBOARD_SENTINEL), "overview"),
            Selection::Selected(DASHBOARD_SENTINEL.to_string())
        );
    }

    #[test]
    fn test_select_adr_starts_loading() {
        let mut state = DashboardState::new();
        let request = state.select(Selection::Selected("ADR-1".into())).unwrap();

        assert_eq!(request.adr_id, "ADR-1");
        assert!(state.is_loading());
        assert_eq!(state.detail_view(), DetailView::Loading);

        assert!(state.apply_adr_result(request.token, Ok(doc("ADR-1"))));
        assert!(!state.is_loading());
        assert_eq!(state.detail_view(), DetailView::Document(&doc("ADR-1")));
    }

    #[test]
    fn test_reselecting_same_adr_keeps_document() {
        let mut state = DashboardState::new();
        let request = state.select(Selection::Selected("ADR-1".into())).unwrap();
        state.apply_adr_result(request.token, Ok(doc("ADR-1")));
        let before = state.clone();

        assert!(state.select(Selection::Selected("ADR-1".into())).is_none());
        assert_eq!(state, before);
        assert_eq!(state.request_token(), request.token);
        assert_eq!(state.detail_view(), DetailView::Document(&doc("ADR-1")));

        // Reselecting mid-flight keeps the pending request valid
        let pending = state.select(Selection::Selected("ADR-2".into())).unwrap();
        assert!(state.select(Selection::Selected("ADR-2".into())).is_none());
        assert!(state.is_loading());
        assert!(state.apply_adr_result(pending.token, Ok(doc("ADR-2"))));
    }

    #[test]
    fn test_unselect_and_dashboard_clear_synchronously() {
        let mut state = DashboardState::new();
        let request = state.select(Selection::Selected("ADR-1".into())).unwrap();
        state.apply_adr_result(request.token, Ok(doc("ADR-1")));

        assert!(state.select(Selection::DashboardSelected).is_none());
        assert!(state.document().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.detail_view(), DetailView::Insights);

        assert!(state.select(Selection::Unselected).is_none());
        assert_eq!(state.detail_view(), DetailView::Placeholder);
    }

    #[test]
    fn test_failed_load_clears_document() {
        let mut state = DashboardState::new();
        let first = state.select(Selection::Selected("ADR-1".into())).unwrap();
        state.apply_adr_result(first.token, Ok(doc("ADR-1")));

        let second = state.select(Selection::Selected("ADR-2".into())).unwrap();
        state.apply_adr_result(second.token, Err(DashboardError::malformed("no delimiters")));

        assert!(state.document().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.detail_view(), DetailView::Failed);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut state = DashboardState::new();
        let slow = state.select(Selection::Selected("ADR-1".into())).unwrap();
        let fast = state.select(Selection::Selected("ADR-2".into())).unwrap();

        assert!(state.apply_adr_result(fast.token, Ok(doc("ADR-2"))));
        assert!(!state.apply_adr_result(slow.token, Ok(doc("ADR-1"))));

        assert_eq!(state.document().map(|d| d.id()), Some("ADR-2"));
    }

    #[test]
    fn test_stale_response_after_unselect_is_discarded() {
        let mut state = DashboardState::new();
        let request = state.select(Selection::Selected("ADR-1".into())).unwrap();
        state.select(Selection::Unselected);

        assert!(!state.apply_adr_result(request.token, Ok(doc("ADR-1"))));
        assert!(state.document().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_violation_failure_keeps_previous_set() {
        let mut state = DashboardState::new();
        let previous = vec![Violation::new("ADR-1", "a.ts", 1, "m")];
        state.apply_violation_poll(Ok(previous.clone()));

        assert!(state.apply_violation_poll(Err(DashboardError::transport("violations", "status 500"))));
        assert_eq!(state.violations(), previous.as_slice());
        assert!(state.violations_error());

        state.apply_violation_poll(Ok(Vec::new()));
        assert!(state.violations().is_empty());
        assert!(!state.violations_error());
    }

    #[test]
    fn test_polling_unchanged_data_is_idempotent() {
        let mut state = DashboardState::new();
        let rules = vec![ManifestEntry::new("ADR-1", "eslint", "no-any", "high")];
        let violations = vec![Violation::new("ADR-1", "a.ts", 1, "m")];

        assert!(state.replace_manifest(rules.clone()));
        assert!(state.apply_violation_poll(Ok(violations.clone())));
        let manifest_before = state.manifest().to_vec();
        let violations_before = state.violations().to_vec();

        let stamps = (state.manifest_changed_at(), state.violations_changed_at());
        assert!(stamps.0.is_some() && stamps.1.is_some());

        assert!(!state.replace_manifest(rules));
        assert!(!state.apply_violation_poll(Ok(violations)));
        assert_eq!((state.manifest_changed_at(), state.violations_changed_at()), stamps);
        assert_eq!(state.manifest(), manifest_before.as_slice());
        assert_eq!(state.violations(), violations_before.as_slice());
    }

    #[test]
    fn test_filtered_violations_follow_selection() {
        let mut state = DashboardState::new();
        state.apply_violation_poll(Ok(vec![
            Violation::new("ADR-1", "a.ts", 1, "first"),
            Violation::new("ADR-2", "b.ts", 2, "other"),
            Violation::new("ADR-1", "c.ts", 3, "second"),
        ]));

        assert!(state.filtered_violations().is_empty());

        state.select(Selection::Selected("ADR-1".into()));
        let messages: Vec<_> = state.filtered_violations().iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);

        state.select(Selection::DashboardSelected);
        assert!(state.filtered_violations().is_empty());
    }
}
