//! Issue record to feature document translation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::feature::{FeatureDocument, FeatureParser};
use crate::jira::{IssueRecord, TrackerGateway};

/// Feature text is stored wrapped in Jira `{code}` fences, optionally with
/// attributes on the opening fence.
fn code_fence_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)\{code.*?\}(.+?)\{code\}").expect("static regex"))
}

/// Resolve the scenario-bearing field on an issue.
///
/// A direct field wins; otherwise the first value of the custom field whose
/// id matches the selector. A missing field is not an error, it just means
/// the issue carries no scenario text.
pub fn extract_field_text(issue: &IssueRecord, field_selector: &str) -> String {
  if let Some(value) = issue.fields.get(field_selector) {
    return value.clone();
  }

  issue
    .custom_fields
    .iter()
    .find(|cf| cf.id == field_selector)
    .and_then(|cf| cf.values.first())
    .cloned()
    .unwrap_or_default()
}

/// Unwrap `{code}` fenced regions.
///
/// When fences are present only their content survives (multiple regions
/// joined by a newline); plain text without fences passes through
/// unchanged, since not every deployment wraps its feature text.
pub fn strip_code_fences(text: &str) -> String {
  let captures: Vec<&str> = code_fence_regex()
    .captures_iter(text)
    .filter_map(|c| c.get(1))
    .map(|m| m.as_str())
    .collect();

  if captures.is_empty() {
    text.to_string()
  } else {
    captures.join("\n")
  }
}

/// Turn an issue into a tagged feature document.
///
/// Returns `None` when the issue carries no scenario text. The document's
/// source id is the issue's browse URL (with a trailing `#` so hosts can
/// append scenario anchors), and assignee/fix-version metadata becomes
/// tags.
pub fn translate(
  gateway: &dyn TrackerGateway,
  parser: &dyn FeatureParser,
  issue: &IssueRecord,
  field_selector: &str,
) -> Result<Option<FeatureDocument>> {
  let text = strip_code_fences(&extract_field_text(issue, field_selector));
  if text.trim().is_empty() {
    return Ok(None);
  }

  let source_id = format!("{}#", gateway.browse_url(&issue.key));
  let mut document = parser.parse(&text, &source_id)?;

  if let Some(assignee) = &issue.assignee {
    document.add_tag(format!("assignee:{}", tag_safe(assignee)));
  }

  for version in &issue.fix_versions {
    document.add_tag(format!("fixVersion:{}", tag_safe(version)));
  }

  Ok(Some(document))
}

/// Tags cannot contain spaces or "@".
fn tag_safe(value: &str) -> String {
  value.replace([' ', '@'], "_")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::feature::GherkinTextParser;
  use crate::jira::gateway::testing::MockGateway;
  use crate::jira::CustomFieldValue;

  fn issue_with_custom_field(text: &str) -> IssueRecord {
    let mut issue = IssueRecord::new("DEMO-1");
    issue.custom_fields.push(CustomFieldValue {
      id: "customfield_10089".to_string(),
      values: vec![text.to_string()],
    });
    issue
  }

  #[test]
  fn direct_field_wins_over_custom_fields() {
    let mut issue = issue_with_custom_field("custom text");
    issue
      .fields
      .insert("description".to_string(), "direct text".to_string());

    assert_eq!(extract_field_text(&issue, "description"), "direct text");
    assert_eq!(
      extract_field_text(&issue, "customfield_10089"),
      "custom text"
    );
  }

  #[test]
  fn missing_field_is_empty_not_an_error() {
    let issue = IssueRecord::new("DEMO-1");
    assert_eq!(extract_field_text(&issue, "customfield_404"), "");
  }

  #[test]
  fn fenced_text_is_unwrapped() {
    assert_eq!(
      strip_code_fences("preamble {code:language=gherkin}Feature: X\nrest{code} trailer"),
      "Feature: X\nrest"
    );
  }

  #[test]
  fn unfenced_text_passes_through() {
    assert_eq!(strip_code_fences("Feature: X\n"), "Feature: X\n");
  }

  #[test]
  fn translate_builds_tagged_document() {
    let gateway = MockGateway::new();
    let mut issue = issue_with_custom_field("{code}Feature: Checkout{code}");
    issue.assignee = Some("Jane @ Doe".to_string());
    issue.fix_versions = vec!["1.2".to_string(), "2.0 beta".to_string()];

    let doc = translate(&gateway, &GherkinTextParser, &issue, "customfield_10089")
      .unwrap()
      .unwrap();

    assert_eq!(doc.source, "https://jira.example.com/browse/DEMO-1#");
    assert_eq!(doc.name, "Checkout");
    assert_eq!(
      doc.tags,
      vec!["assignee:Jane___Doe", "fixVersion:1.2", "fixVersion:2.0_beta"]
    );
  }

  #[test]
  fn translate_without_text_yields_none() {
    let gateway = MockGateway::new();
    let issue = IssueRecord::new("DEMO-1");

    let doc = translate(&gateway, &GherkinTextParser, &issue, "customfield_10089").unwrap();
    assert!(doc.is_none());
  }
}
