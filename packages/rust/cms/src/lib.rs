//! Kantan CMS API client and the fetch stage.
//!
//! [`CmsClient`] wraps the authenticated HTTP API (key validation, paginated
//! collection/record listing). [`fetch_all`] drives the first pipeline stage:
//! pull every required collection and snapshot its records to disk.

mod client;
mod fetch;

pub use client::CmsClient;
pub use fetch::{CollectionFetch, FetchSummary, fetch_all};
