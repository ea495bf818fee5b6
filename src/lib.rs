//! Keep Gherkin feature documents in sync with Jira issues.
//!
//! Issues matching a configured JQL filter carry feature text in a direct
//! or custom field; this crate loads them into taggable feature documents
//! through an incremental, file-backed cache, and can push locally
//! authored scenario text back into the tracker at the end of a test run.
//!
//! The host test runner drives three surfaces:
//! - [`FeatureLoader`]: `supports`/`load` over a resource string
//! - [`RunHook`]: per-scenario and end-of-run lifecycle entry points
//! - [`Config`]: YAML configuration, credentials from the environment

pub mod cache;
pub mod config;
pub mod error;
pub mod feature;
pub mod hooks;
pub mod jira;
pub mod loader;
pub mod push;
pub mod time;
pub mod translate;

pub use cache::FileCacheStore;
pub use config::Config;
pub use error::{Error, Result};
pub use feature::{FeatureDocument, FeatureParser, GherkinTextParser};
pub use hooks::{RunHook, ScenarioOutcome, ScenarioReport};
pub use jira::{IssueRecord, JiraGateway, TrackerGateway};
pub use loader::FeatureLoader;
pub use push::ScenarioPusher;
