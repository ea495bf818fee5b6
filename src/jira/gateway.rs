//! Tracker gateway contract.
//!
//! The core only ever talks to the tracker through this trait; the gouqi
//! adapter in [`super::client`] is the production implementation and tests
//! substitute an in-memory mock.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::jira::types::{IssueRecord, Transition};

/// Remote issue tracker operations consumed by the sync and push engines.
///
/// Implementations render a `since` watermark into the query language as an
/// additional `updated > '<local Y-m-d H:M>'` clause ANDed onto the base
/// query. Calls may block on network I/O; no retrying happens here.
#[async_trait]
pub trait TrackerGateway: Send + Sync {
  /// Issues matching `jql`, optionally restricted to those updated after
  /// the epoch-seconds watermark.
  async fn search(&self, jql: &str, since: Option<i64>) -> Result<Vec<IssueRecord>>;

  /// A single issue by key.
  async fn fetch(&self, key: &str) -> Result<IssueRecord>;

  async fn add_comment(&self, key: &str, body: &str) -> Result<()>;

  async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>>;

  async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()>;

  /// Replace the value of one issue field.
  async fn update_field(&self, key: &str, field_id: &str, values: Vec<String>) -> Result<()>;

  /// Browse URL for an issue key.
  fn browse_url(&self, key: &str) -> String;

  /// Extract the issue key from a browse URL, if the URL belongs to this
  /// tracker. Fragments are stripped before matching.
  fn issue_from_url(&self, resource: &str) -> Option<String>;

  /// Does this URL point at the tracker at all?
  fn url_matches(&self, url: &str) -> bool;
}

/// Browse-URL handling shared by gateway implementations.
#[derive(Debug, Clone)]
pub struct BrowseUrls {
  base: String,
}

impl BrowseUrls {
  /// `base` is the tracker root, trailing slashes ignored.
  pub fn new(base: &str) -> Self {
    Self {
      base: base.trim_end_matches('/').to_string(),
    }
  }

  pub fn browse_url(&self, key: &str) -> String {
    format!("{}/browse/{}", self.base, key)
  }

  pub fn issue_from_url(&self, resource: &str) -> Option<String> {
    let mut url = Url::parse(resource).ok()?;
    url.set_fragment(None);

    let prefix = format!("{}/browse/", self.base);
    let key = url.as_str().strip_prefix(prefix.as_str())?;

    (!key.is_empty()).then(|| key.to_string())
  }

  pub fn url_matches(&self, url: &str) -> bool {
    url.starts_with(&self.base)
  }
}

/// Reopen an issue if its current workflow state offers a reopen path.
///
/// Picks the first available transition whose name contains "reopen",
/// case-insensitively. No matching transition is not an error; the issue
/// simply has no reopen path from its current status. Returns whether a
/// transition was applied.
pub async fn reopen(gateway: &dyn TrackerGateway, key: &str) -> Result<bool> {
  let transitions = gateway.list_transitions(key).await?;

  let Some(transition) = transitions
    .iter()
    .find(|t| t.name.to_lowercase().contains("reopen"))
  else {
    debug!(key, "no reopen transition available, skipping");
    return Ok(false);
  };

  gateway.apply_transition(key, &transition.id).await?;
  debug!(key, transition = %transition.name, "reopened issue");

  Ok(true)
}

#[cfg(test)]
pub(crate) mod testing {
  //! In-memory gateway recording every mutating call.

  use std::collections::BTreeMap;
  use std::sync::Mutex;

  use super::*;
  use crate::error::Error;

  #[derive(Debug, Clone, PartialEq, Eq)]
  pub enum Call {
    Search { jql: String, since: Option<i64> },
    Fetch { key: String },
    Comment { key: String, body: String },
    Transition { key: String, id: String },
    UpdateField { key: String, field: String, values: Vec<String> },
  }

  pub struct MockGateway {
    urls: BrowseUrls,
    pub issues: BTreeMap<String, IssueRecord>,
    pub search_results: Vec<IssueRecord>,
    pub transitions: BTreeMap<String, Vec<Transition>>,
    calls: Mutex<Vec<Call>>,
  }

  impl MockGateway {
    pub fn new() -> Self {
      Self {
        urls: BrowseUrls::new("https://jira.example.com"),
        issues: BTreeMap::new(),
        search_results: Vec::new(),
        transitions: BTreeMap::new(),
        calls: Mutex::new(Vec::new()),
      }
    }

    pub fn with_issue(mut self, issue: IssueRecord) -> Self {
      self.issues.insert(issue.key.clone(), issue);
      self
    }

    pub fn with_search_results(mut self, issues: Vec<IssueRecord>) -> Self {
      self.search_results = issues;
      self
    }

    pub fn with_transitions(mut self, key: &str, transitions: Vec<Transition>) -> Self {
      self.transitions.insert(key.to_string(), transitions);
      self
    }

    pub fn calls(&self) -> Vec<Call> {
      self.calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<Call> {
      self
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::UpdateField { .. }))
        .collect()
    }

    fn record(&self, call: Call) {
      self.calls.lock().unwrap().push(call);
    }
  }

  #[async_trait]
  impl TrackerGateway for MockGateway {
    async fn search(&self, jql: &str, since: Option<i64>) -> Result<Vec<IssueRecord>> {
      self.record(Call::Search {
        jql: jql.to_string(),
        since,
      });
      Ok(self.search_results.clone())
    }

    async fn fetch(&self, key: &str) -> Result<IssueRecord> {
      self.record(Call::Fetch {
        key: key.to_string(),
      });
      self
        .issues
        .get(key)
        .cloned()
        .ok_or_else(|| Error::Tracker(format!("no such issue: {key}")))
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<()> {
      self.record(Call::Comment {
        key: key.to_string(),
        body: body.to_string(),
      });
      Ok(())
    }

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>> {
      Ok(self.transitions.get(key).cloned().unwrap_or_default())
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()> {
      self.record(Call::Transition {
        key: key.to_string(),
        id: transition_id.to_string(),
      });
      Ok(())
    }

    async fn update_field(&self, key: &str, field_id: &str, values: Vec<String>) -> Result<()> {
      self.record(Call::UpdateField {
        key: key.to_string(),
        field: field_id.to_string(),
        values,
      });
      Ok(())
    }

    fn browse_url(&self, key: &str) -> String {
      self.urls.browse_url(key)
    }

    fn issue_from_url(&self, resource: &str) -> Option<String> {
      self.urls.issue_from_url(resource)
    }

    fn url_matches(&self, url: &str) -> bool {
      self.urls.url_matches(url)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::testing::{Call, MockGateway};
  use super::*;

  #[test]
  fn browse_urls_round_trip() {
    let urls = BrowseUrls::new("https://jira.example.com/");

    assert_eq!(
      urls.browse_url("DEMO-1"),
      "https://jira.example.com/browse/DEMO-1"
    );
    assert_eq!(
      urls.issue_from_url("https://jira.example.com/browse/DEMO-1"),
      Some("DEMO-1".to_string())
    );
  }

  #[test]
  fn issue_from_url_strips_fragments() {
    let urls = BrowseUrls::new("https://jira.example.com");

    assert_eq!(
      urls.issue_from_url("https://jira.example.com/browse/DEMO-7#scenario_2"),
      Some("DEMO-7".to_string())
    );
  }

  #[test]
  fn foreign_urls_do_not_resolve() {
    let urls = BrowseUrls::new("https://jira.example.com");

    assert_eq!(urls.issue_from_url("https://other.example.com/browse/DEMO-1"), None);
    assert_eq!(urls.issue_from_url("features/checkout.feature"), None);
    assert!(!urls.url_matches("https://other.example.com/browse/DEMO-1"));
    assert!(urls.url_matches("https://jira.example.com/browse/DEMO-1"));
  }

  #[tokio::test]
  async fn reopen_picks_first_matching_transition() {
    let gateway = MockGateway::new().with_transitions(
      "DEMO-1",
      vec![
        Transition {
          id: "2".to_string(),
          name: "Delete Issue".to_string(),
        },
        Transition {
          id: "3".to_string(),
          name: "Reopen Issue".to_string(),
        },
      ],
    );

    assert!(reopen(&gateway, "DEMO-1").await.unwrap());
    assert_eq!(
      gateway.calls(),
      vec![Call::Transition {
        key: "DEMO-1".to_string(),
        id: "3".to_string(),
      }]
    );
  }

  #[tokio::test]
  async fn reopen_without_matching_transition_is_a_no_op() {
    let gateway = MockGateway::new().with_transitions(
      "DEMO-1",
      vec![Transition {
        id: "5".to_string(),
        name: "Close Issue".to_string(),
      }],
    );

    assert!(!reopen(&gateway, "DEMO-1").await.unwrap());
    assert!(gateway.calls().is_empty());
  }
}
