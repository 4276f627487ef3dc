//! Pipeline orchestration for KantanPress.
//!
//! This crate ties together the fetch, convert, build, and deploy stages
//! into the end-to-end `publish` workflow.

pub mod builder;
pub mod pipeline;
