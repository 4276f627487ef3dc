//! Fetch stage: snapshot CMS collections to local JSON files.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use kantanpress_shared::{FetchConfig, KantanError, Record, Result};

use crate::client::CmsClient;

/// Per-collection outcome of a fetch.
#[derive(Debug, Clone)]
pub struct CollectionFetch {
    /// Collection name.
    pub name: String,
    /// Number of records written.
    pub records: usize,
    /// Snapshot file path.
    pub file: PathBuf,
}

/// Summary of a completed fetch stage.
#[derive(Debug)]
pub struct FetchSummary {
    /// Per-collection results.
    pub collections: Vec<CollectionFetch>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Run the fetch stage: validate credentials, then snapshot every required
/// collection's records to `<storage_path>/<Name>.json`.
///
/// Unlike the classic scripts this propagates every failure — a fetch error
/// stops the pipeline instead of producing an empty snapshot.
#[instrument(skip_all, fields(storage = %config.storage_path))]
pub async fn fetch_all(client: &CmsClient, config: &FetchConfig) -> Result<FetchSummary> {
    let start = Instant::now();

    client.validate_api_key().await?;

    let collections = client.list_collections(&config.collections).await?;
    if collections.is_empty() {
        return Err(KantanError::validation(
            "no collections found or matching requirements",
        ));
    }

    info!(count = collections.len(), "collections to fetch");

    let storage = Path::new(&config.storage_path);
    std::fs::create_dir_all(storage).map_err(|e| KantanError::io(storage, e))?;

    let mut results = Vec::with_capacity(collections.len());
    for collection in &collections {
        info!(name = %collection.name, id = %collection.id, "fetching collection");

        let records = client.list_records(collection).await?;
        let file = save_records(storage, &collection.name, &records)?;

        info!(
            name = %collection.name,
            records = records.len(),
            file = %file.display(),
            "collection saved"
        );

        results.push(CollectionFetch {
            name: collection.name.clone(),
            records: records.len(),
            file,
        });
    }

    let summary = FetchSummary {
        collections: results,
        elapsed: start.elapsed(),
    };

    info!(
        collections = summary.collections.len(),
        elapsed_ms = summary.elapsed.as_millis(),
        "fetch stage complete"
    );

    Ok(summary)
}

/// Write a collection's records as pretty-printed JSON.
fn save_records(storage: &Path, name: &str, records: &[Record]) -> Result<PathBuf> {
    let file = storage.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| KantanError::parse(format!("serializing {name} records: {e}")))?;

    std::fs::write(&file, json).map_err(|e| KantanError::io(&file, e))?;
    Ok(file)
}
