//! Feature documents and the parser seam.
//!
//! The actual Gherkin grammar lives in the host; this crate only needs a
//! parse entry point and a taggable document it can serialize into the
//! cache. `GherkinTextParser` is a minimal built-in that keeps the raw
//! text and picks the feature name off the header line, enough for
//! stand-alone use and tests.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A parsed, taggable feature scenario derived from issue text.
///
/// Mutable only through [`add_tag`](Self::add_tag); everything else is
/// fixed at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDocument {
  /// Source identifier, the issue's browse URL
  pub source: String,
  /// Feature name from the `Feature:` header, empty if absent
  pub name: String,
  /// Full feature text as extracted from the issue
  pub body: String,
  /// Derived tags such as `assignee:...` and `fixVersion:...`
  pub tags: Vec<String>,
}

impl FeatureDocument {
  pub fn add_tag(&mut self, tag: impl Into<String>) {
    self.tags.push(tag.into());
  }
}

/// Parser turning raw scenario text into a [`FeatureDocument`].
pub trait FeatureParser: Send + Sync {
  fn parse(&self, text: &str, source_id: &str) -> Result<FeatureDocument>;
}

/// Built-in lightweight parser.
#[derive(Debug, Default)]
pub struct GherkinTextParser;

impl FeatureParser for GherkinTextParser {
  fn parse(&self, text: &str, source_id: &str) -> Result<FeatureDocument> {
    let name = text
      .lines()
      .map(str::trim)
      .find_map(|line| line.strip_prefix("Feature:"))
      .map(|rest| rest.trim().to_string())
      .unwrap_or_default();

    Ok(FeatureDocument {
      source: source_id.to_string(),
      name,
      body: text.to_string(),
      tags: Vec::new(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_feature_name_from_header() {
    let text = "Feature: Checkout flow\n\n  Scenario: Pay by card\n    Given a cart\n";
    let doc = GherkinTextParser
      .parse(text, "https://jira.example.com/browse/DEMO-1#")
      .unwrap();

    assert_eq!(doc.name, "Checkout flow");
    assert_eq!(doc.body, text);
    assert!(doc.tags.is_empty());
  }

  #[test]
  fn missing_header_yields_empty_name() {
    let doc = GherkinTextParser.parse("just notes", "src").unwrap();
    assert_eq!(doc.name, "");
  }

  #[test]
  fn documents_round_trip_through_json() {
    let mut doc = GherkinTextParser.parse("Feature: X\n", "src").unwrap();
    doc.add_tag("assignee:Jane_Doe");

    let bytes = serde_json::to_vec(&doc).unwrap();
    let back: FeatureDocument = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, doc);
  }
}
