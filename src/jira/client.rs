//! gouqi-backed [`TrackerGateway`] implementation.
//!
//! Deliberately thin: everything interesting happens behind the trait.
//! The session is established once, when the gouqi client is built; the
//! transport layer owns retries, timeouts and auth renewal.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::jira::api_types::{reserialize, ApiIssue, ApiIssueFields, ApiTransitionsResponse};
use crate::jira::gateway::{BrowseUrls, TrackerGateway};
use crate::jira::types::{IssueRecord, Transition};
use crate::time::format_watermark;

/// Jira gateway over the gouqi async client.
#[derive(Clone)]
pub struct JiraGateway {
  client: gouqi::r#async::Jira,
  urls: BrowseUrls,
}

impl JiraGateway {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::api_token()?;
    let credentials = gouqi::Credentials::Basic(config.user.clone(), token);

    let client = gouqi::r#async::Jira::new(&config.url, credentials)
      .map_err(|e| Error::Tracker(format!("failed to create Jira client: {e}")))?;

    Ok(Self {
      client,
      urls: BrowseUrls::new(&config.url),
    })
  }

  /// Compose the effective JQL: the base query, restricted to issues
  /// updated after the watermark when one is present.
  fn effective_jql(jql: &str, since: Option<i64>) -> String {
    match since {
      Some(epoch) => format!("{} AND updated > '{}'", jql, format_watermark(epoch)),
      None => jql.to_string(),
    }
  }
}

#[async_trait]
impl TrackerGateway for JiraGateway {
  async fn search(&self, jql: &str, since: Option<i64>) -> Result<Vec<IssueRecord>> {
    use futures::{StreamExt, TryStreamExt};

    let jql = Self::effective_jql(jql, since);
    let search = self.client.search();
    let options = gouqi::SearchOptions::default();

    let stream = search
      .stream(&jql, &options)
      .await
      .map_err(|e| Error::Tracker(format!("search failed: {e}")))?;

    let issues: Vec<IssueRecord> = stream
      .map(|issue| {
        let fields: ApiIssueFields = reserialize(&issue.fields)?;
        Ok(
          ApiIssue {
            key: issue.key,
            fields,
          }
          .into_record(),
        )
      })
      .try_collect()
      .await
      .map_err(|e: serde_json::Error| Error::Tracker(format!("failed to parse issue: {e}")))?;

    Ok(issues)
  }

  async fn fetch(&self, key: &str) -> Result<IssueRecord> {
    let issues = self.client.issues();

    let issue = issues
      .get(key)
      .await
      .map_err(|e| Error::Tracker(format!("failed to get issue {key}: {e}")))?;

    let fields: ApiIssueFields = reserialize(&issue.fields)
      .map_err(|e| Error::Tracker(format!("failed to parse issue {key}: {e}")))?;

    Ok(
      ApiIssue {
        key: issue.key,
        fields,
      }
      .into_record(),
    )
  }

  async fn add_comment(&self, key: &str, body: &str) -> Result<()> {
    let endpoint = format!("/issue/{key}/comment");
    let payload = serde_json::json!({ "body": body });

    self
      .client
      .post::<Value, _>("api", &endpoint, payload)
      .await
      .map_err(|e| Error::Tracker(format!("failed to comment on {key}: {e}")))?;

    Ok(())
  }

  async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>> {
    let endpoint = format!("/issue/{key}/transitions");

    let response: ApiTransitionsResponse = self
      .client
      .get("api", &endpoint)
      .await
      .map_err(|e| Error::Tracker(format!("failed to get transitions for {key}: {e}")))?;

    Ok(
      response
        .transitions
        .into_iter()
        .map(Transition::from)
        .collect(),
    )
  }

  async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()> {
    let endpoint = format!("/issue/{key}/transitions");
    let body = serde_json::json!({
      "transition": { "id": transition_id }
    });

    self
      .client
      .post::<Value, _>("api", &endpoint, body)
      .await
      .map_err(|e| Error::Tracker(format!("failed to transition {key}: {e}")))?;

    Ok(())
  }

  async fn update_field(&self, key: &str, field_id: &str, values: Vec<String>) -> Result<()> {
    let endpoint = format!("/issue/{key}");
    let value = match values.as_slice() {
      [single] => Value::String(single.clone()),
      many => Value::Array(many.iter().cloned().map(Value::String).collect()),
    };
    let body = serde_json::json!({
      "fields": { field_id: value }
    });

    self
      .client
      .put::<Value, _>("api", &endpoint, body)
      .await
      .map_err(|e| Error::Tracker(format!("failed to update {field_id} on {key}: {e}")))?;

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
