//! Deploy stage: package the static output and ship it to CMS hosting.
//!
//! ZIP the generator's output directory, request a presigned upload URL,
//! PUT the archive, then report hosting status. The archive is removed
//! once the deployment succeeds.

mod archive;
mod upload;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use kantanpress_shared::{KantanError, Result};

pub use archive::{ArchiveInfo, create_zip_archive};
pub use upload::{HostingClient, HostingStatus};

/// Runtime options for the deploy stage.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Directory containing the generator's static output.
    pub static_output_dir: PathBuf,
    /// File name for the temporary ZIP archive.
    pub zip_filename: PathBuf,
    /// Deploy as a preview instead of production hosting.
    pub preview: bool,
}

/// Outcome of a completed deployment.
#[derive(Debug)]
pub struct DeployResult {
    /// Size of the uploaded archive in bytes.
    pub zip_size_bytes: u64,
    /// Number of files packed.
    pub file_count: usize,
    /// SHA-256 of the uploaded archive.
    pub sha256: String,
    /// Whether this was a preview deployment.
    pub preview: bool,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Run the deploy stage end to end.
#[instrument(skip_all, fields(output = %options.static_output_dir.display(), preview = options.preview))]
pub async fn deploy(client: &HostingClient, options: &DeployOptions) -> Result<DeployResult> {
    let start = Instant::now();

    let archive = create_zip_archive(&options.static_output_dir, &options.zip_filename)?;

    info!("requesting presigned upload URL");
    let presigned_url = client.presigned_upload_url().await?;

    client.upload_zip(&archive.path, &presigned_url).await?;

    let (status, message) = if options.preview {
        (HostingStatus::PreviewComplete, "Preview deployment complete")
    } else {
        (HostingStatus::HostComplete, "Production deployment complete")
    };
    client.update_hosting_status(status, message).await?;

    // The archive is only a transport artifact; clean it up on success.
    std::fs::remove_file(&archive.path).map_err(|e| KantanError::io(&archive.path, e))?;

    let result = DeployResult {
        zip_size_bytes: archive.size_bytes,
        file_count: archive.file_count,
        sha256: archive.sha256,
        preview: options.preview,
        elapsed: start.elapsed(),
    };

    info!(
        size_bytes = result.zip_size_bytes,
        files = result.file_count,
        elapsed_ms = result.elapsed.as_millis(),
        "deployment complete"
    );

    Ok(result)
}
