//! Shared types, error model, and configuration for KantanPress.
//!
//! This crate is the foundation depended on by all other KantanPress crates.
//! It provides:
//! - [`KantanError`] — the unified error type
//! - Domain types ([`Collection`], [`Record`], [`create_slug`])
//! - Configuration ([`AppConfig`], converter/export configs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, CmsConfig, CmsCredentials, ConverterConfig, DeployConfig,
    ExportConfig, ExportField, FetchConfig, FieldFormat, FrontmatterField, OutputFormat,
    SortDirection, config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_credentials,
};
pub use error::{KantanError, Result};
pub use types::{Collection, Record, create_slug};
