use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One custom field on an issue: its id and the raw values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldValue {
  pub id: String,
  pub values: Vec<String>,
}

/// Tracker-supplied issue record, immutable once fetched.
///
/// Field text lives either in a direct field ("description") or in one of
/// the custom field entries; resolution between the two is explicit, see
/// [`crate::translate::extract_field_text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
  pub key: String,
  /// RFC-3339 last-update timestamp as reported by the tracker
  pub updated: String,
  /// Assignee display name
  pub assignee: Option<String>,
  /// Fix version names, tracker order preserved
  pub fix_versions: Vec<String>,
  /// Status name (the adapter resolves ids to names)
  pub status: String,
  /// Direct scalar fields by name
  pub fields: BTreeMap<String, String>,
  /// Custom field entries
  pub custom_fields: Vec<CustomFieldValue>,
}

impl IssueRecord {
  /// A bare record with only a key, useful as a test fixture base.
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      updated: String::new(),
      assignee: None,
      fix_versions: Vec::new(),
      status: String::new(),
      fields: BTreeMap::new(),
      custom_fields: Vec::new(),
    }
  }
}

/// A workflow transition available on an issue in its current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub id: String,
  pub name: String,
}
