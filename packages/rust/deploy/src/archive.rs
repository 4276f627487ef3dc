//! ZIP packaging of the static site output.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use kantanpress_shared::{KantanError, Result};

/// Metadata about a created archive.
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Path to the archive on disk.
    pub path: PathBuf,
    /// Archive size in bytes.
    pub size_bytes: u64,
    /// Number of files packed.
    pub file_count: usize,
    /// SHA-256 hex digest of the archive, for correlating uploads.
    pub sha256: String,
}

/// Create a ZIP archive of `source_dir` at `output_path`.
///
/// Files are stored with forward-slash relative paths and Deflate level 9,
/// sorted for a deterministic entry order. Symlinks are skipped.
#[instrument(skip_all, fields(source = %source_dir.display(), output = %output_path.display()))]
pub fn create_zip_archive(source_dir: &Path, output_path: &Path) -> Result<ArchiveInfo> {
    if !source_dir.is_dir() {
        return Err(KantanError::validation(format!(
            "static output directory {} does not exist — run the build stage first",
            source_dir.display()
        )));
    }

    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry =
            entry.map_err(|e| KantanError::Archive(format!("failed to walk output dir: {e}")))?;
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|_| KantanError::Archive("failed to compute relative path".into()))?;
            entries.push(rel.to_path_buf());
        }
    }
    entries.sort();

    let file = File::create(output_path).map_err(|e| KantanError::io(output_path, e))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for rel in &entries {
        let name = zip_entry_name(rel);
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| KantanError::Archive(format!("{name}: {e}")))?;

        let src = source_dir.join(rel);
        let mut reader = BufReader::new(File::open(&src).map_err(|e| KantanError::io(&src, e))?);
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| KantanError::io(&src, e))?;
        writer
            .write_all(&buf)
            .map_err(|e| KantanError::Archive(format!("{name}: {e}")))?;
    }

    writer
        .finish()
        .map_err(|e| KantanError::Archive(format!("failed to finalize archive: {e}")))?;

    let size_bytes = std::fs::metadata(output_path)
        .map_err(|e| KantanError::io(output_path, e))?
        .len();
    let sha256 = sha256_file(output_path)?;

    info!(
        files = entries.len(),
        size_bytes,
        sha256 = %sha256,
        "archive created"
    );

    Ok(ArchiveInfo {
        path: output_path.to_path_buf(),
        size_bytes,
        file_count: entries.len(),
        sha256,
    })
}

/// Archive entry name: forward slashes regardless of platform.
fn zip_entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// SHA-256 hex digest of a file's contents.
fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| KantanError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| KantanError::io(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}
