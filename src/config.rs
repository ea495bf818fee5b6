use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Configuration for the Jira feature loader and push-back engine.
///
/// Loaded from a YAML file supplied by the host; credentials come from the
/// environment so they never land in a checked-in config.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Jira server base URL, e.g. "https://jira.example.com"
  pub url: String,
  /// Jira user ID (email on cloud instances)
  pub user: String,
  /// JQL filter selecting the issues that carry feature text
  pub jql: String,
  /// Issue field holding the feature text: a direct field name
  /// (e.g. "description") or a custom field id (e.g. "customfield_10089")
  pub feature_field: String,
  /// Cache directory. Absent means caching is disabled.
  pub cache_dir: Option<PathBuf>,
  /// Comma-separated status names that must never receive push-back writes
  #[serde(default)]
  pub ignored_statuses: String,
  /// Regex deriving a Jira issue key from a scenario tag, first capture
  /// group is the key
  #[serde(default = "default_tag_pattern")]
  pub tag_pattern: String,
  /// Post a comment on the issue when its scenario passes
  #[serde(default)]
  pub comment_on_pass: bool,
  /// Post a comment on the issue when its scenario fails
  #[serde(default)]
  pub comment_on_fail: bool,
  /// Reopen the issue when its scenario fails
  #[serde(default)]
  pub reopen_on_fail: bool,
  /// Push locally-authored scenario text back to Jira at end of run
  #[serde(default)]
  pub push_features: bool,
}

fn default_tag_pattern() -> String {
  "jira:(.*)".to_string()
}

impl Config {
  /// Load configuration from a YAML file.
  pub fn load(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

    Self::from_yaml(&contents).map_err(|e| Error::Config {
      path: path.to_path_buf(),
      message: e,
    })
  }

  /// Parse configuration from a YAML string.
  pub fn from_yaml(contents: &str) -> std::result::Result<Self, String> {
    let mut config: Config = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
    config.url = config.url.trim_end_matches('/').to_string();
    Ok(config)
  }

  /// Get the Jira API token from the environment.
  ///
  /// Checks JIRA_FEATURES_TOKEN first, then JIRA_API_TOKEN as fallback.
  pub fn api_token() -> Result<String> {
    std::env::var("JIRA_FEATURES_TOKEN")
      .or_else(|_| std::env::var("JIRA_API_TOKEN"))
      .map_err(|_| {
        Error::Tracker(
          "Jira API token not found. Set JIRA_FEATURES_TOKEN or JIRA_API_TOKEN.".to_string(),
        )
      })
  }

  /// Ignored statuses as a list, trimmed, empty entries dropped.
  pub fn ignored_status_list(&self) -> Vec<String> {
    self
      .ignored_statuses
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(String::from)
      .collect()
  }
}
