//! Push-back of locally-authored scenario text into tracker issues.
//!
//! Scenario text accumulates in memory during a run, keyed by issue.
//! At flush time each issue is updated at most once, only if its content
//! actually changed, and never when its workflow status forbids writes.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::error::Result;
use crate::jira::TrackerGateway;
use crate::translate::extract_field_text;

pub struct ScenarioPusher {
  /// Accumulated text blocks per issue key, insertion order preserved
  store: BTreeMap<String, Vec<String>>,
  /// Issues updated by the last flush, with the content that was written
  pushed: BTreeMap<String, String>,
  /// Issues skipped by the last flush because of their status
  ignored: BTreeSet<String>,
  ignored_statuses: Vec<String>,
  feature_field: String,
}

impl ScenarioPusher {
  pub fn new(feature_field: impl Into<String>, ignored_statuses: Vec<String>) -> Self {
    Self {
      store: BTreeMap::new(),
      pushed: BTreeMap::new(),
      ignored: BTreeSet::new(),
      ignored_statuses,
      feature_field: feature_field.into(),
    }
  }

  /// Accumulate a scenario text block for every given issue key.
  /// Memory only; nothing reaches the tracker until [`flush`](Self::flush).
  pub fn record(&mut self, keys: &[String], text: &str) {
    for key in keys {
      self
        .store
        .entry(key.clone())
        .or_default()
        .push(text.to_string());
    }
  }

  /// Push accumulated text to the tracker.
  ///
  /// Per issue: skip entirely when its current status is in the ignore
  /// list (closed-out workflow states must not be written to); otherwise
  /// compare the joined text against the live field value with line breaks
  /// stripped, and update only on a real difference. The written value
  /// gets a trailing blank line.
  pub async fn flush(&mut self, gateway: &dyn TrackerGateway) -> Result<()> {
    for (key, blocks) in &self.store {
      let issue = gateway.fetch(key).await?;

      if self.ignored_statuses.iter().any(|s| *s == issue.status) {
        debug!(key, status = %issue.status, "status is ignored, not pushing");
        self.ignored.insert(key.clone());
        continue;
      }

      let joined = blocks.concat();
      let remote = extract_field_text(&issue, &self.feature_field);
      if remote.replace(['\n', '\r'], "") == joined {
        debug!(key, "content unchanged, not pushing");
        continue;
      }

      gateway
        .update_field(key, &self.feature_field, vec![format!("{joined}\n\n")])
        .await?;
      self.pushed.insert(key.clone(), joined);
    }

    info!(
      pushed = self.pushed.len(),
      ignored = self.ignored.len(),
      "pushed scenarios to tracker"
    );
    self.store.clear();

    Ok(())
  }

  /// Issue keys updated by the last flush, with the pushed content.
  pub fn pushed(&self) -> &BTreeMap<String, String> {
    &self.pushed
  }

  /// Issue keys whose status kept the last flush from writing to them.
  pub fn ignored(&self) -> &BTreeSet<String> {
    &self.ignored
  }

  /// Anything recorded and not yet flushed?
  pub fn has_pending(&self) -> bool {
    !self.store.is_empty()
  }
}
