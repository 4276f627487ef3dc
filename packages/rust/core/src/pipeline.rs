//! End-to-end `publish` pipeline: fetch → convert → build → deploy.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use kantanpress_cms::{CmsClient, fetch_all};
use kantanpress_convert::{export_latest, run_converter};
use kantanpress_deploy::{DeployOptions, HostingClient, deploy};
use kantanpress_shared::{AppConfig, CmsCredentials, Result};

use crate::builder::build_site;

/// Configuration for the `publish` pipeline.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Resolved application config.
    pub config: AppConfig,
    /// CMS credentials (resolved from the environment).
    pub credentials: CmsCredentials,
    /// Deploy as a preview instead of production hosting.
    pub preview: bool,
}

/// Result of the `publish` pipeline.
#[derive(Debug)]
pub struct PublishResult {
    /// Number of collections fetched.
    pub collections: usize,
    /// Number of content files written by the converters.
    pub files_converted: usize,
    /// Size of the uploaded archive in bytes.
    pub zip_size_bytes: u64,
    /// Whether this was a preview deployment.
    pub preview: bool,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called per processed unit within a phase.
    fn item(&self, current: usize, total: usize, detail: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &PublishResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item(&self, _current: usize, _total: usize, _detail: &str) {}
    fn done(&self, _result: &PublishResult) {}
}

/// Run the full publish pipeline.
///
/// 1. Fetch collections from the CMS
/// 2. Convert snapshots to content files (plus latest-items exports)
/// 3. Run the static site generator
/// 4. Package and upload the output
///
/// Each stage is gated on the previous one; the first error stops the run.
#[instrument(skip_all, fields(preview = options.preview))]
pub async fn publish(
    options: &PublishOptions,
    progress: &dyn ProgressReporter,
) -> Result<PublishResult> {
    let start = Instant::now();
    let config = &options.config;

    info!(base_url = %config.cms.base_url, "starting publish pipeline");

    // --- Stage 1: Fetch ---
    progress.phase("Fetching CMS content");
    let cms = CmsClient::new(&config.cms.base_url, &options.credentials, config.cms.page_size)?;
    let fetch_summary = fetch_all(&cms, &config.fetch).await?;

    // --- Stage 2: Convert ---
    progress.phase("Converting content");
    let mut files_converted = 0;
    let total = config.converters.len();
    for (i, converter) in config.converters.iter().enumerate() {
        let summary = run_converter(converter, &config.fetch.storage_path)?;
        progress.item(i + 1, total, &summary.collection);
        files_converted += summary.files;
    }

    for export in &config.exports {
        export_latest(export)?;
    }

    // --- Stage 3: Build ---
    progress.phase("Building static site");
    build_site(&config.build)?;

    // --- Stage 4: Deploy ---
    progress.phase("Packaging and uploading");
    let hosting = HostingClient::new(&config.cms.base_url, &options.credentials)?;
    let deploy_options = DeployOptions {
        static_output_dir: PathBuf::from(&config.deploy.static_output_dir),
        zip_filename: PathBuf::from(&config.deploy.zip_filename),
        preview: options.preview,
    };
    let deploy_result = deploy(&hosting, &deploy_options).await?;

    let result = PublishResult {
        collections: fetch_summary.collections.len(),
        files_converted,
        zip_size_bytes: deploy_result.zip_size_bytes,
        preview: options.preview,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        collections = result.collections,
        files_converted = result.files_converted,
        zip_size_bytes = result.zip_size_bytes,
        elapsed_ms = result.elapsed.as_millis(),
        "publish pipeline complete"
    );

    Ok(result)
}
