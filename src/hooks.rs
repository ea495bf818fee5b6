//! Run lifecycle entry points for the host test runner.
//!
//! The host calls [`RunHook::after_scenario`] with each finished scenario
//! and [`RunHook::after_run`] once at the end. Result actions (comments,
//! reopen) and push-back accumulation are independent mechanisms: either
//! can be configured without the other.

use std::sync::Arc;

use regex::Regex;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::jira::{reopen, TrackerGateway};
use crate::push::ScenarioPusher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioOutcome {
  Passed,
  Failed,
}

/// What the host knows about a finished scenario.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
  pub title: String,
  /// Source identifier of the feature the scenario came from, a browse
  /// URL when the feature was loaded from the tracker
  pub source: String,
  pub tags: Vec<String>,
  /// Free-text step lines, e.g. "Given a cart"
  pub steps: Vec<String>,
}

pub struct RunHook {
  gateway: Arc<dyn TrackerGateway>,
  pusher: ScenarioPusher,
  tag_pattern: Regex,
  comment_on_pass: bool,
  comment_on_fail: bool,
  reopen_on_fail: bool,
  push_features: bool,
}

impl RunHook {
  pub fn new(gateway: Arc<dyn TrackerGateway>, config: &Config) -> Result<Self> {
    let tag_pattern = Regex::new(&config.tag_pattern).map_err(|e| Error::Pattern {
      pattern: config.tag_pattern.clone(),
      message: e.to_string(),
    })?;

    Ok(Self {
      gateway,
      pusher: ScenarioPusher::new(&config.feature_field, config.ignored_status_list()),
      tag_pattern,
      comment_on_pass: config.comment_on_pass,
      comment_on_fail: config.comment_on_fail,
      reopen_on_fail: config.reopen_on_fail,
      push_features: config.push_features,
    })
  }

  /// Issue keys named by scenario tags, first capture group of the
  /// configured pattern.
  fn tracker_keys(&self, tags: &[String]) -> Vec<String> {
    tags
      .iter()
      .filter_map(|tag| self.tag_pattern.captures(tag))
      .filter_map(|captures| captures.get(1))
      .map(|m| m.as_str().to_string())
      .collect()
  }

  /// Record and react to one finished scenario.
  ///
  /// With push-back enabled, the scenario's step text is accumulated for
  /// every issue its tags name; otherwise the issue is derived from the
  /// feature's source URL. Comments and reopen happen either way,
  /// according to the configured flags.
  pub async fn after_scenario(
    &mut self,
    report: &ScenarioReport,
    outcome: ScenarioOutcome,
  ) -> Result<()> {
    let keys = if self.push_features {
      let keys = self.tracker_keys(&report.tags);
      if !keys.is_empty() {
        let block = format_scenario_block(&report.title, &report.source, &report.steps);
        self.pusher.record(&keys, &block);
      }
      keys
    } else {
      self.gateway.issue_from_url(&report.source).into_iter().collect()
    };

    for key in &keys {
      match outcome {
        ScenarioOutcome::Passed if self.comment_on_pass => {
          let body = format!("Scenario \"{}\" passed", report.title);
          self.gateway.add_comment(key, &body).await?;
        }
        ScenarioOutcome::Failed if self.comment_on_fail => {
          let body = format!("Scenario \"{}\" failed", report.title);
          self.gateway.add_comment(key, &body).await?;
        }
        _ => {}
      }

      if outcome == ScenarioOutcome::Failed && self.reopen_on_fail {
        reopen(self.gateway.as_ref(), key).await?;
      }
    }

    Ok(())
  }

  /// End of run: flush accumulated scenario text back to the tracker.
  pub async fn after_run(&mut self) -> Result<()> {
    if !self.push_features || !self.pusher.has_pending() {
      return Ok(());
    }

    info!("pushing scenarios to tracker");
    self.pusher.flush(self.gateway.as_ref()).await
  }

  /// Push/ignore results for reporting after the run.
  pub fn pusher(&self) -> &ScenarioPusher {
    &self.pusher
  }
}

/// The `{code}`-fenced step block written into the tracker field.
fn format_scenario_block(title: &str, source: &str, steps: &[String]) -> String {
  let mut lines = vec!["{code}".to_string()];

  let file = source
    .trim_end_matches('#')
    .rsplit('/')
    .next()
    .unwrap_or_default();
  lines.push(format!("#Title: {file}"));
  lines.push(format!("Scenario: {title}"));

  for step in steps {
    lines.push(format!("  {step}"));
  }

  lines.push("{code}".to_string());
  lines.join("\n")
}
