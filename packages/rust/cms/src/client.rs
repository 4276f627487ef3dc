//! Authenticated HTTP client for the Kantan CMS API.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

use kantanpress_shared::{CmsCredentials, Collection, KantanError, Record, Result};

/// User-Agent string for CMS requests.
const USER_AGENT: &str = concat!("KantanPress/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiValidationResponse {
    status: u16,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    collections: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<Record>,
}

// ---------------------------------------------------------------------------
// CmsClient
// ---------------------------------------------------------------------------

/// Authenticated client for the Kantan CMS content API.
///
/// All requests carry the `X-Project-Id` and `X-API-Key` headers; listing
/// endpoints are paginated with 1-based `page_num`.
pub struct CmsClient {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    masked_key: String,
    page_size: u32,
}

impl CmsClient {
    /// Create a new client against `base_url` with the given credentials.
    pub fn new(base_url: &str, credentials: &CmsCredentials, page_size: u32) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| KantanError::config(format!("invalid CMS base URL '{base_url}': {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert("X-Project-Id", header_value(&credentials.project_id)?);
        headers.insert("X-API-Key", header_value(&credentials.api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KantanError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            project_id: credentials.project_id.clone(),
            masked_key: mask_key(&credentials.api_key),
            page_size,
        })
    }

    /// Validate the API key and project id against the CMS.
    #[instrument(skip_all)]
    pub async fn validate_api_key(&self) -> Result<()> {
        info!(
            project_id = %self.project_id,
            api_key = %self.masked_key,
            base_url = %self.base_url,
            "validating API credentials"
        );

        let response: ApiValidationResponse = self.get_json("api_key/validate").await?;

        if response.status != 200 {
            return Err(KantanError::api(format!(
                "API key validation rejected (status {})",
                response.status
            )));
        }

        info!("API credentials validated");
        Ok(())
    }

    /// Count the total number of collections in the project.
    pub async fn count_collections(&self) -> Result<u64> {
        let response: CountResponse = self.get_json("collections_count/").await?;
        Ok(response.count)
    }

    /// Retrieve all collections, paginating as needed.
    ///
    /// When `required` is non-empty, only collections whose name appears in
    /// the list are returned.
    #[instrument(skip_all, fields(required = required.len()))]
    pub async fn list_collections(&self, required: &[String]) -> Result<Vec<Collection>> {
        let count = self.count_collections().await?;
        let pages = pages_for(count, self.page_size);

        let mut all_collections: Vec<Collection> = Vec::new();
        for page in 1..=pages {
            let path = format!(
                "collections/?page_size={}&page_num={page}",
                self.page_size
            );
            let response: CollectionsResponse = self.get_json(&path).await?;
            all_collections.extend(response.collections);
        }

        debug!(total = all_collections.len(), "collections listed");

        if required.is_empty() {
            return Ok(all_collections);
        }

        Ok(all_collections
            .into_iter()
            .filter(|c| required.contains(&c.name))
            .collect())
    }

    /// Count the records in a collection.
    pub async fn count_records(&self, collection_id: &str) -> Result<u64> {
        let path = format!("collections/{collection_id}/records_count/");
        let response: CountResponse = self.get_json(&path).await?;
        Ok(response.count)
    }

    /// Retrieve all records from a collection, paginating as needed.
    #[instrument(skip_all, fields(collection = %collection.name))]
    pub async fn list_records(&self, collection: &Collection) -> Result<Vec<Record>> {
        let count = self.count_records(&collection.id).await?;
        let pages = pages_for(count, self.page_size);

        let mut all_records: Vec<Record> = Vec::new();
        for page in 1..=pages {
            let path = format!(
                "collections/{}/records/?page_size={}&page_num={page}",
                collection.id, self.page_size
            );
            let response: RecordsResponse = self.get_json(&path).await?;
            all_records.extend(response.records);
        }

        debug!(records = all_records.len(), "records listed");
        Ok(all_records)
    }

    /// GET `<base_url>/v1/api/<path>` and deserialize the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.api_url(path);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| KantanError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KantanError::api(format!("{url}: HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| KantanError::parse(format!("{url}: {e}")))
    }

    fn api_url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/v1/api/{path}")
    }
}

/// Number of pages needed to cover `count` items at `page_size` per page.
fn pages_for(count: u64, page_size: u32) -> u64 {
    count.div_ceil(u64::from(page_size.max(1)))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| KantanError::config("credential contains invalid header characters"))
}

/// Mask an API key for logging: first 4 chars, the rest starred.
fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    let hidden = key.chars().count().saturating_sub(4);
    format!("{visible}{}", "*".repeat(hidden))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_credentials() -> CmsCredentials {
        CmsCredentials {
            project_id: "proj_123".into(),
            api_key: "key_abcdef123456".into(),
        }
    }

    #[test]
    fn mask_key_hides_all_but_prefix() {
        assert_eq!(mask_key("key_abcdef"), "key_******");
        assert_eq!(mask_key("ab"), "ab");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn pages_for_rounds_up() {
        assert_eq!(pages_for(0, 100), 0);
        assert_eq!(pages_for(1, 100), 1);
        assert_eq!(pages_for(100, 100), 1);
        assert_eq!(pages_for(101, 100), 2);
        assert_eq!(pages_for(250, 100), 3);
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let result = CmsClient::new("not a url", &test_credentials(), 100);
        assert!(matches!(result, Err(KantanError::Config { .. })));
    }

    #[tokio::test]
    async fn validate_sends_auth_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/api/api_key/validate"))
            .and(header("X-Project-Id", "proj_123"))
            .and(header("X-API-Key", "key_abcdef123456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 200 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CmsClient::new(&server.uri(), &test_credentials(), 100).unwrap();
        client.validate_api_key().await.unwrap();
    }

    #[tokio::test]
    async fn validate_rejects_non_200_status_field() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/api/api_key/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 401 })))
            .mount(&server)
            .await;

        let client = CmsClient::new(&server.uri(), &test_credentials(), 100).unwrap();
        let result = client.validate_api_key().await;
        assert!(matches!(result, Err(KantanError::Api { .. })));
    }

    #[tokio::test]
    async fn validate_http_error_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/api/api_key/validate"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = CmsClient::new(&server.uri(), &test_credentials(), 100).unwrap();
        let result = client.validate_api_key().await;
        assert!(matches!(result, Err(KantanError::Api { .. })));
    }

    #[tokio::test]
    async fn list_collections_paginates_and_filters() {
        let server = MockServer::start().await;

        let collection = |id: &str, name: &str| {
            json!({
                "id": id,
                "name": name,
                "description": null,
                "type": "list",
                "order": null,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z",
            })
        };

        Mock::given(method("GET"))
            .and(path("/v1/api/collections_count/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 3 })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/api/collections/"))
            .and(query_param("page_num", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "collections": [collection("col_1", "Blog"), collection("col_2", "News")],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/api/collections/"))
            .and(query_param("page_num", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "collections": [collection("col_3", "Projects")],
            })))
            .mount(&server)
            .await;

        // page_size 2 forces two pages for three collections
        let client = CmsClient::new(&server.uri(), &test_credentials(), 2).unwrap();

        let all = client.list_collections(&[]).await.unwrap();
        assert_eq!(all.len(), 3);

        let filtered = client
            .list_collections(&["Blog".to_string()])
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Blog");
    }

    #[tokio::test]
    async fn list_records_paginates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/api/collections/col_1/records_count/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 3 })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/api/collections/col_1/records/"))
            .and(query_param("page_num", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    { "id": "rec_1", "name": "One" },
                    { "id": "rec_2", "name": "Two" },
                ],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/api/collections/col_1/records/"))
            .and(query_param("page_num", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [{ "id": "rec_3", "name": "Three" }],
            })))
            .mount(&server)
            .await;

        let client = CmsClient::new(&server.uri(), &test_credentials(), 2).unwrap();
        let collection = Collection {
            id: "col_1".into(),
            name: "Blog".into(),
            description: None,
            kind: "list".into(),
            order: None,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        };

        let records = client.list_records(&collection).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].id.as_deref(), Some("rec_3"));
    }
}
