//! Convert stage: collection snapshots → content files.
//!
//! Reads the JSON snapshot a fetch produced, generates frontmatter from the
//! configured field mappings, and writes one markdown (or JSON) file per
//! record with a slug-based filename. Also hosts the latest-items exporter.

mod frontmatter;
mod latest;

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, instrument};

use kantanpress_shared::{ConverterConfig, KantanError, OutputFormat, Record, Result, create_slug};

pub use frontmatter::{format_value, generate_frontmatter};
pub use latest::export_latest;

/// Summary of a completed converter run.
#[derive(Debug, Clone)]
pub struct ConvertSummary {
    /// Collection name.
    pub collection: String,
    /// Number of files written.
    pub files: usize,
    /// Directory the files were written to.
    pub target_dir: PathBuf,
}

/// Convert one collection snapshot into content files.
#[instrument(skip_all, fields(collection = %config.collection))]
pub fn run_converter(config: &ConverterConfig, storage_path: &str) -> Result<ConvertSummary> {
    let source = config.source_path(storage_path);
    if !source.exists() {
        return Err(KantanError::validation(format!(
            "snapshot {} not found — run the fetch stage first",
            source.display()
        )));
    }

    let content = std::fs::read_to_string(&source).map_err(|e| KantanError::io(&source, e))?;
    let records: Vec<Record> = serde_json::from_str(&content)
        .map_err(|e| KantanError::parse(format!("{}: {e}", source.display())))?;

    info!(records = records.len(), "converting records");

    let target_dir = PathBuf::from(&config.target_dir);
    std::fs::create_dir_all(&target_dir).map_err(|e| KantanError::io(&target_dir, e))?;

    let mut processed_slugs: HashSet<String> = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let path = convert_record(record, index, config, &target_dir, &mut processed_slugs)?;
        debug!(path = %path.display(), "converted");
    }

    info!(
        files = processed_slugs.len(),
        target = %target_dir.display(),
        "conversion complete"
    );

    Ok(ConvertSummary {
        collection: config.collection.clone(),
        files: processed_slugs.len(),
        target_dir,
    })
}

/// Convert a single record and write it to the target directory.
fn convert_record(
    record: &Record,
    index: usize,
    config: &ConverterConfig,
    target_dir: &std::path::Path,
    processed_slugs: &mut HashSet<String>,
) -> Result<PathBuf> {
    let slug = record_slug(record, index, &config.slug_field, processed_slugs);
    processed_slugs.insert(slug.clone());

    let file_content = match config.output {
        OutputFormat::Markdown => {
            let fm = generate_frontmatter(record, &config.frontmatter)?;
            let body = field_as_text(record, &config.content_field);
            format!("{fm}\n{body}")
        }
        OutputFormat::Json => {
            let mut object = serde_json::Map::new();
            for field in &config.frontmatter {
                if let Some(value) = record.get(&field.source) {
                    object.insert(field.target.clone(), format_value(&value, field.format)?);
                }
            }
            object.insert(
                "content".into(),
                Value::String(field_as_text(record, &config.content_field)),
            );

            serde_json::to_string_pretty(&Value::Object(object))
                .map_err(|e| KantanError::parse(e.to_string()))?
        }
    };

    let path = target_dir.join(format!("{slug}.{}", config.output.extension()));
    std::fs::write(&path, file_content).map_err(|e| KantanError::io(&path, e))?;
    Ok(path)
}

/// Slug for a record, made unique against already-processed slugs.
///
/// Duplicates get the first 8 chars of the record id appended (or the record
/// index when the id is absent). A record with no usable slug source becomes
/// `untitled`.
fn record_slug(
    record: &Record,
    index: usize,
    slug_field: &str,
    processed_slugs: &HashSet<String>,
) -> String {
    let mut slug = create_slug(&field_as_text(record, slug_field));
    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    if processed_slugs.contains(&slug) {
        let suffix = match &record.id {
            Some(id) => id.chars().take(8).collect::<String>(),
            None => index.to_string(),
        };
        slug = format!("{slug}-{suffix}");
    }

    slug
}

/// A record field rendered as plain text. Missing fields become `""`.
fn field_as_text(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
