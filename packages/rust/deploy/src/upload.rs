//! Hosting API client: presigned upload URL, archive upload, status reporting.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

use kantanpress_shared::{CmsCredentials, KantanError, Result};

/// User-Agent string for hosting requests.
const USER_AGENT: &str = concat!("KantanPress/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PresignedZipUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PresignedZipResponse {
    presigned_zip: PresignedZipUrl,
}

/// Hosting status values understood by the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostingStatus {
    HostError,
    PreviewError,
    HostComplete,
    PreviewComplete,
    Waiting,
    Running,
}

#[derive(Debug, Serialize)]
struct HostingStatusBody<'a> {
    status: HostingStatus,
    status_message: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateHostingStatusReq<'a> {
    hosting: HostingStatusBody<'a>,
}

// ---------------------------------------------------------------------------
// HostingClient
// ---------------------------------------------------------------------------

/// Authenticated client for the CMS hosting endpoints.
pub struct HostingClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HostingClient {
    /// Create a new client against `base_url` with the given credentials.
    pub fn new(base_url: &str, credentials: &CmsCredentials) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| KantanError::config(format!("invalid CMS base URL '{base_url}': {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert("X-Project-Id", header_value(&credentials.project_id)?);
        headers.insert("X-API-Key", header_value(&credentials.api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| KantanError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Request a presigned URL for uploading the site archive.
    #[instrument(skip_all)]
    pub async fn presigned_upload_url(&self) -> Result<Url> {
        let url = self.api_url("hosting/build/upload_presigned_url/");

        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| KantanError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KantanError::api(format!("{url}: HTTP {status}")));
        }

        let body: PresignedZipResponse = response
            .json()
            .await
            .map_err(|e| KantanError::parse(format!("{url}: {e}")))?;

        Url::parse(&body.presigned_zip.url).map_err(|e| {
            KantanError::parse(format!("presigned URL '{}': {e}", body.presigned_zip.url))
        })
    }

    /// PUT the archive to the presigned URL.
    ///
    /// The presigned URL carries its own authorization, so the request goes
    /// out without the CMS auth headers.
    #[instrument(skip_all, fields(zip = %zip_path.display()))]
    pub async fn upload_zip(&self, zip_path: &Path, presigned_url: &Url) -> Result<()> {
        let bytes = tokio::fs::read(zip_path)
            .await
            .map_err(|e| KantanError::io(zip_path, e))?;
        let size = bytes.len();

        info!(size_bytes = size, "uploading archive");

        let response = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| KantanError::Network(format!("failed to build upload client: {e}")))?
            .put(presigned_url.as_str())
            .header(CONTENT_TYPE, "application/zip")
            .header(CONTENT_LENGTH, size)
            .body(bytes)
            .send()
            .await
            .map_err(|e| KantanError::Network(format!("upload: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KantanError::api(format!("upload: HTTP {status}")));
        }

        info!("upload complete");
        Ok(())
    }

    /// Report the hosting status after an upload.
    #[instrument(skip_all, fields(status = ?status))]
    pub async fn update_hosting_status(
        &self,
        status: HostingStatus,
        message: &str,
    ) -> Result<()> {
        let url = self.api_url("hosting/status/");
        let body = UpdateHostingStatusReq {
            hosting: HostingStatusBody {
                status,
                status_message: message,
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| KantanError::Network(format!("{url}: {e}")))?;

        let http_status = response.status();
        if !http_status.is_success() {
            return Err(KantanError::api(format!("{url}: HTTP {http_status}")));
        }

        Ok(())
    }

    fn api_url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/v1/api/{path}")
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| KantanError::config("credential contains invalid header characters"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_credentials() -> CmsCredentials {
        CmsCredentials {
            project_id: "proj_123".into(),
            api_key: "key_test".into(),
        }
    }

    #[test]
    fn hosting_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(HostingStatus::HostComplete).unwrap(),
            json!("host_complete")
        );
        assert_eq!(
            serde_json::to_value(HostingStatus::PreviewComplete).unwrap(),
            json!("preview_complete")
        );
    }

    #[tokio::test]
    async fn presigned_url_request_parses_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/hosting/build/upload_presigned_url/"))
            .and(header("X-Project-Id", "proj_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "presigned_zip": { "url": format!("{}/upload/abc", server.uri()) },
            })))
            .mount(&server)
            .await;

        let client = HostingClient::new(&server.uri(), &test_credentials()).unwrap();
        let url = client.presigned_upload_url().await.unwrap();
        assert!(url.as_str().ends_with("/upload/abc"));
    }

    #[tokio::test]
    async fn upload_puts_zip_bytes() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/upload/abc"))
            .and(header("content-type", "application/zip"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("site.zip");
        std::fs::write(&zip_path, b"PK\x03\x04fake").unwrap();

        let client = HostingClient::new(&server.uri(), &test_credentials()).unwrap();
        let presigned = Url::parse(&format!("{}/upload/abc", server.uri())).unwrap();
        client.upload_zip(&zip_path, &presigned).await.unwrap();
    }

    #[tokio::test]
    async fn upload_failure_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/upload/abc"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("site.zip");
        std::fs::write(&zip_path, b"data").unwrap();

        let client = HostingClient::new(&server.uri(), &test_credentials()).unwrap();
        let presigned = Url::parse(&format!("{}/upload/abc", server.uri())).unwrap();
        let result = client.upload_zip(&zip_path, &presigned).await;
        assert!(matches!(result, Err(KantanError::Api { .. })));
    }

    #[tokio::test]
    async fn status_update_sends_expected_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/api/hosting/status/"))
            .and(body_json(json!({
                "hosting": {
                    "status": "preview_complete",
                    "status_message": "Preview deployment complete",
                },
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HostingClient::new(&server.uri(), &test_credentials()).unwrap();
        client
            .update_hosting_status(
                HostingStatus::PreviewComplete,
                "Preview deployment complete",
            )
            .await
            .unwrap();
    }
}
