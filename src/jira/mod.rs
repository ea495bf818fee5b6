//! Tracker-facing code: domain types, the gateway contract and the gouqi
//! adapter.

pub mod api_types;
pub mod client;
pub mod gateway;
pub mod types;

pub use client::JiraGateway;
pub use gateway::{reopen, BrowseUrls, TrackerGateway};
pub use types::{CustomFieldValue, IssueRecord, Transition};
