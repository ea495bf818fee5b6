//! Feature loading and synchronization.
//!
//! The host hands a resource string to [`FeatureLoader::load`]: an explicit
//! `jira:KEY`, a browse URL, or the empty string meaning "everything the
//! configured JQL matches". The all-issues path is incremental: only issues
//! updated after the cache watermark are fetched, then cached entries fill
//! in whatever the fresh result set did not return.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::FileCacheStore;
use crate::error::{Error, Result};
use crate::feature::{FeatureDocument, FeatureParser};
use crate::jira::TrackerGateway;
use crate::time::to_epoch_seconds;
use crate::translate::translate;

pub struct FeatureLoader {
  gateway: Arc<dyn TrackerGateway>,
  parser: Arc<dyn FeatureParser>,
  cache: FileCacheStore,
  jql: String,
  feature_field: String,
}

impl FeatureLoader {
  pub fn new(
    gateway: Arc<dyn TrackerGateway>,
    parser: Arc<dyn FeatureParser>,
    cache: FileCacheStore,
    jql: impl Into<String>,
    feature_field: impl Into<String>,
  ) -> Self {
    Self {
      gateway,
      parser,
      cache,
      jql: jql.into(),
      feature_field: feature_field.into(),
    }
  }

  /// Resolve a resource to an issue key: `jira:KEY`, or a browse URL on
  /// the configured tracker.
  fn resolve_issue(&self, resource: &str) -> Option<String> {
    if let Some(key) = resource.strip_prefix("jira:") {
      return (!key.is_empty()).then(|| key.to_string());
    }

    self.gateway.issue_from_url(resource)
  }

  /// Can this loader serve the resource?
  pub fn supports(&self, resource: &str) -> bool {
    resource.is_empty()
      || self.resolve_issue(resource).is_some()
      || self.gateway.url_matches(resource)
  }

  /// Load feature documents for a resource.
  ///
  /// A resolved issue key yields at most one document; anything else
  /// yields the full merged set, ordered by issue key, each key exactly
  /// once.
  pub async fn load(&mut self, resource: &str) -> Result<Vec<FeatureDocument>> {
    if let Some(key) = self.resolve_issue(resource) {
      return self.load_one(&key).await;
    }

    self.load_all().await
  }

  /// Single-issue path: ad-hoc fetch, no cache traffic.
  async fn load_one(&self, key: &str) -> Result<Vec<FeatureDocument>> {
    let issue = self.gateway.fetch(key).await?;
    let document = translate(
      self.gateway.as_ref(),
      self.parser.as_ref(),
      &issue,
      &self.feature_field,
    )?;

    Ok(document.into_iter().collect())
  }

  /// All-issues path: incremental fetch above the cache watermark, then
  /// backfill from the cache so no previously-seen issue is lost. Fresh
  /// documents win for overlapping keys.
  async fn load_all(&mut self) -> Result<Vec<FeatureDocument>> {
    let watermark = self.cache.latest_timestamp()?;
    let since = (watermark > 0).then_some(watermark);
    debug!(?since, "searching tracker for updated issues");

    let issues = self.gateway.search(&self.jql, since).await?;

    let mut documents: BTreeMap<String, FeatureDocument> = BTreeMap::new();
    for issue in &issues {
      let Some(document) = translate(
        self.gateway.as_ref(),
        self.parser.as_ref(),
        issue,
        &self.feature_field,
      )?
      else {
        debug!(key = %issue.key, "issue has no feature text, skipping");
        continue;
      };

      let timestamp = to_epoch_seconds(&issue.updated)?;
      self.cache.write(&issue.key, &document, timestamp)?;
      documents.insert(issue.key.clone(), document);
    }

    let fetched = documents.len();

    for key in self.cache.keys()? {
      if documents.contains_key(&key) {
        continue;
      }

      match self.cache.read(&key) {
        Ok(document) => {
          documents.insert(key, document);
        }
        // Indexed but payload gone: a miss, the key is simply omitted
        Err(Error::CacheMiss(_)) => {}
        Err(e) => return Err(e),
      }
    }

    self.cache.flush()?;
    info!(
      fetched,
      total = documents.len(),
      "synchronized feature documents"
    );

    Ok(documents.into_values().collect())
  }
}
