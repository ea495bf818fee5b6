//! Serde-deserializable types matching Jira API responses.
//!
//! These are separate from the domain [`IssueRecord`] so deserialization
//! stays tolerant of whatever a given Jira deployment returns while the
//! domain type keeps a fixed, explicit shape.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::types::{CustomFieldValue, IssueRecord, Transition};

/// Re-serialize a value through JSON to convert between compatible types.
/// Useful for converting gouqi's BTreeMap fields to our typed structs.
pub fn reserialize<T: DeserializeOwned>(value: impl Serialize) -> serde_json::Result<T> {
  serde_json::from_value(serde_json::to_value(value)?)
}

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(rename = "displayName")]
  pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiVersion {
  pub name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  pub status: Option<ApiStatus>,
  pub assignee: Option<ApiUser>,
  #[serde(rename = "fixVersions", default)]
  pub fix_versions: Vec<ApiVersion>,
  #[serde(default)]
  pub updated: String,
  // Description can be a plain string (API v2) or an ADF document (v3)
  pub description: Option<serde_json::Value>,
  // Catch-all for custom fields carrying feature text
  #[serde(flatten)]
  pub extra: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

impl ApiIssue {
  pub fn into_record(self) -> IssueRecord {
    let f = self.fields;
    let mut record = IssueRecord::new(self.key);

    record.updated = f.updated;
    record.status = f.status.map(|s| s.name).unwrap_or_default();
    record.assignee = f.assignee.map(|u| u.display_name);
    record.fix_versions = f.fix_versions.into_iter().map(|v| v.name).collect();

    if let Some(description) = f.description.as_ref().and_then(extract_text) {
      record.fields.insert("description".to_string(), description);
    }

    // Custom fields keep tracker order as returned
    let mut customs: Vec<(String, serde_json::Value)> = f
      .extra
      .into_iter()
      .filter(|(k, _)| k.starts_with("customfield_"))
      .collect();
    customs.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (id, value) in customs {
      let values = extract_values(&value);
      if !values.is_empty() {
        record.custom_fields.push(CustomFieldValue { id, values });
      }
    }

    record
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiTransition {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransitionsResponse {
  #[serde(default)]
  pub transitions: Vec<ApiTransition>,
}

impl From<ApiTransition> for Transition {
  fn from(t: ApiTransition) -> Self {
    Transition {
      id: t.id,
      name: t.name,
    }
  }
}

/// Extract plain text from a string field or an ADF document.
fn extract_text(value: &serde_json::Value) -> Option<String> {
  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  if let Some(content) = value.get("content").and_then(|v| v.as_array()) {
    let mut text = String::new();
    extract_adf_text(content, &mut text);
    if !text.is_empty() {
      return Some(text);
    }
  }

  None
}

/// Field values as a string list: scalars become a one-element list, arrays
/// keep their order. Anything unrepresentable is dropped.
fn extract_values(value: &serde_json::Value) -> Vec<String> {
  match value {
    serde_json::Value::String(s) => vec![s.clone()],
    serde_json::Value::Array(items) => items
      .iter()
      .filter_map(|item| extract_text(item).or_else(|| value_name(item)))
      .collect(),
    serde_json::Value::Object(_) => extract_text(value)
      .or_else(|| value_name(value))
      .into_iter()
      .collect(),
    _ => Vec::new(),
  }
}

/// Option-style custom fields wrap their value in `{"value": ...}` or
/// `{"name": ...}`.
fn value_name(value: &serde_json::Value) -> Option<String> {
  value
    .get("value")
    .or_else(|| value.get("name"))
    .and_then(|v| v.as_str())
    .map(String::from)
}

/// Recursively extract text from ADF content.
fn extract_adf_text(content: &[serde_json::Value], output: &mut String) {
  for node in content {
    if let Some(node_type) = node.get("type").and_then(|v| v.as_str()) {
      match node_type {
        "text" => {
          if let Some(text) = node.get("text").and_then(|v| v.as_str()) {
            output.push_str(text);
          }
        }
        "hardBreak" => output.push('\n'),
        _ => {
          if let Some(children) = node.get("content").and_then(|v| v.as_array()) {
            extract_adf_text(children, output);
          }
          if node_type == "paragraph" || node_type == "heading" {
            output.push('\n');
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn converts_api_issue_into_record() {
    let issue: ApiIssue = serde_json::from_value(serde_json::json!({
      "key": "DEMO-3",
      "fields": {
        "status": { "name": "Open" },
        "assignee": { "displayName": "Jane Doe" },
        "fixVersions": [{ "name": "1.2" }, { "name": "2.0 beta" }],
        "updated": "2011-05-11T18:51:30+00:00",
        "description": "Feature: X\n",
        "customfield_10089": "{code}Feature: Y{code}"
      }
    }))
    .unwrap();

    let record = issue.into_record();
    assert_eq!(record.key, "DEMO-3");
    assert_eq!(record.status, "Open");
    assert_eq!(record.assignee.as_deref(), Some("Jane Doe"));
    assert_eq!(record.fix_versions, vec!["1.2", "2.0 beta"]);
    assert_eq!(record.fields["description"], "Feature: X\n");
    assert_eq!(record.custom_fields.len(), 1);
    assert_eq!(record.custom_fields[0].id, "customfield_10089");
    assert_eq!(record.custom_fields[0].values, vec!["{code}Feature: Y{code}"]);
  }

  #[test]
  fn adf_descriptions_flatten_to_text() {
    let value = serde_json::json!({
      "type": "doc",
      "content": [
        { "type": "paragraph", "content": [{ "type": "text", "text": "Feature: Z" }] }
      ]
    });

    assert_eq!(extract_text(&value).as_deref(), Some("Feature: Z\n"));
  }

  #[test]
  fn option_fields_unwrap_value_names() {
    assert_eq!(
      extract_values(&serde_json::json!([{ "value": "red" }, { "value": "blue" }])),
      vec!["red", "blue"]
    );
  }
}
