//! Latest-items exporter: the newest N records as a JSON data file.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, instrument};

use kantanpress_shared::{ExportConfig, KantanError, Record, Result, SortDirection};

use crate::frontmatter::format_value;

/// Export the latest items of a snapshot according to `config`.
///
/// Records are sorted by the string value of `sort_field`, the first
/// `count` are kept, and each becomes the configured `defaults` overlaid
/// with the mapped fields. The result is written as a pretty JSON array.
#[instrument(skip_all, fields(source = %config.source_file, target = %config.target_file))]
pub fn export_latest(config: &ExportConfig) -> Result<PathBuf> {
    let source = PathBuf::from(&config.source_file);
    let content = std::fs::read_to_string(&source).map_err(|e| KantanError::io(&source, e))?;
    let mut records: Vec<Record> = serde_json::from_str(&content)
        .map_err(|e| KantanError::parse(format!("{}: {e}", source.display())))?;

    info!(records = records.len(), "selecting latest items");

    // Stable sort in both directions so records with equal keys keep
    // their snapshot order.
    match config.sort_direction {
        SortDirection::Asc => records
            .sort_by(|a, b| sort_key(a, &config.sort_field).cmp(&sort_key(b, &config.sort_field))),
        SortDirection::Desc => records
            .sort_by(|a, b| sort_key(b, &config.sort_field).cmp(&sort_key(a, &config.sort_field))),
    }

    let mut items: Vec<Value> = Vec::with_capacity(config.count);
    for record in records.iter().take(config.count) {
        let mut item = config.defaults.clone();
        for field in &config.fields {
            if let Some(value) = record.get(&field.source) {
                item.insert(field.target.clone(), format_value(&value, field.format)?);
            }
        }
        items.push(Value::Object(item));
    }

    let target = PathBuf::from(&config.target_file);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| KantanError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(&items)
        .map_err(|e| KantanError::parse(e.to_string()))?;
    std::fs::write(&target, json).map_err(|e| KantanError::io(&target, e))?;

    info!(items = items.len(), "latest items exported");
    Ok(target)
}

/// Sort key: the field's string value; missing fields sort first.
fn sort_key(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kantanpress_shared::{ExportField, FieldFormat};
    use serde_json::json;

    fn export_config(source: &std::path::Path, target: &std::path::Path) -> ExportConfig {
        let mut defaults = serde_json::Map::new();
        defaults.insert("kind".into(), json!("blog"));

        ExportConfig {
            source_file: source.to_string_lossy().into_owned(),
            target_file: target.to_string_lossy().into_owned(),
            count: 2,
            sort_field: "date".into(),
            sort_direction: SortDirection::Desc,
            fields: vec![
                ExportField {
                    source: "name".into(),
                    target: "title".into(),
                    format: None,
                },
                ExportField {
                    source: "date".into(),
                    target: "date".into(),
                    format: Some(FieldFormat::IsoDate),
                },
            ],
            defaults,
        }
    }

    #[test]
    fn exports_newest_items_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("Blog.json");
        std::fs::write(
            &source,
            serde_json::to_string(&json!([
                { "id": "rec_1", "name": "Oldest", "date": "2024-01-01T00:00:00Z" },
                { "id": "rec_2", "name": "Newest", "date": "2024-03-01T00:00:00Z" },
                { "id": "rec_3", "name": "Middle", "date": "2024-02-01T00:00:00Z" },
            ]))
            .unwrap(),
        )
        .unwrap();
        let target = tmp.path().join("data").join("latest.json");

        let written = export_latest(&export_config(&source, &target)).unwrap();
        assert_eq!(written, target);

        let raw = std::fs::read_to_string(&target).unwrap();
        let items: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], json!("Newest"));
        assert_eq!(items[0]["date"], json!("2024-03-01"));
        assert_eq!(items[0]["kind"], json!("blog"));
        assert_eq!(items[1]["title"], json!("Middle"));
    }

    #[test]
    fn ascending_sort_takes_oldest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("Blog.json");
        std::fs::write(
            &source,
            serde_json::to_string(&json!([
                { "id": "rec_1", "name": "B", "date": "2024-02-01" },
                { "id": "rec_2", "name": "A", "date": "2024-01-01" },
            ]))
            .unwrap(),
        )
        .unwrap();
        let target = tmp.path().join("latest.json");

        let mut config = export_config(&source, &target);
        config.sort_direction = SortDirection::Asc;
        config.count = 1;

        export_latest(&config).unwrap();

        let items: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], json!("A"));
    }

    #[test]
    fn descending_sort_keeps_equal_keys_in_snapshot_order() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("Blog.json");
        std::fs::write(
            &source,
            serde_json::to_string(&json!([
                { "id": "rec_1", "name": "First of the day", "date": "2024-03-01" },
                { "id": "rec_2", "name": "Second of the day", "date": "2024-03-01" },
                { "id": "rec_3", "name": "Older", "date": "2024-01-01" },
            ]))
            .unwrap(),
        )
        .unwrap();
        let target = tmp.path().join("latest.json");

        let mut config = export_config(&source, &target);
        config.count = 3;

        export_latest(&config).unwrap();

        let items: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(items[0]["title"], json!("First of the day"));
        assert_eq!(items[1]["title"], json!("Second of the day"));
        assert_eq!(items[2]["title"], json!("Older"));
    }

    #[test]
    fn missing_source_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = export_config(&tmp.path().join("nope.json"), &tmp.path().join("out.json"));
        assert!(matches!(
            export_latest(&config),
            Err(KantanError::Io { .. })
        ));
    }
}
