use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::filename::content_disposition_filename;
use crate::{
    ApiError, CreateJobPayload, CreateJobResponse, DownloadedExport, FailureKind,
    JobListResponse, JobStatusResponse, UploadResponse,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Cookie header saved by an earlier run (`name=value; name2=value2`).
    pub session_cookie: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("datatrans/", env!("CARGO_PKG_VERSION")).to_string(),
            session_cookie: None,
        }
    }
}

/// Backend calls used by the engine. Each call is a single attempt.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn upload_file(&self, path: &Path) -> Result<UploadResponse, ApiError>;

    async fn create_job(&self, payload: &CreateJobPayload) -> Result<CreateJobResponse, ApiError>;

    async fn get_job(&self, job_id: &str) -> Result<JobStatusResponse, ApiError>;

    async fn list_jobs(&self, limit: u32, offset: u32) -> Result<JobListResponse, ApiError>;

    /// Fetch an export. `download_url` may be relative to the base URL.
    async fn download(&self, download_url: &str) -> Result<DownloadedExport, ApiError>;

    /// Cookie header the backend session is bound to, if one was issued.
    fn session_cookie(&self) -> Option<String>;
}

pub struct ReqwestApiClient {
    base_url: Url,
    client: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestApiClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = settings.session_cookie.as_deref() {
            for pair in cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &base_url);
            }
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base_url,
            client,
            jar,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ApiClient for ReqwestApiClient {
    async fn upload_file(&self, path: &Path) -> Result<UploadResponse, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ApiError::new(
                FailureKind::LocalFile,
                format!("{}: {err}", path.display()),
            )
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let url = self.endpoint(&["api", "v1", "files", "upload"])?;
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn create_job(&self, payload: &CreateJobPayload) -> Result<CreateJobResponse, ApiError> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let url = self.endpoint(&["api", "v1", "jobs"])?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn get_job(&self, job_id: &str) -> Result<JobStatusResponse, ApiError> {
        let url = self.endpoint(&["api", "v1", "jobs", job_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn list_jobs(&self, limit: u32, offset: u32) -> Result<JobListResponse, ApiError> {
        let mut url = self.endpoint(&["api", "v1", "jobs"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn download(&self, download_url: &str) -> Result<DownloadedExport, ApiError> {
        let url = self
            .base_url
            .join(download_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename);
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(DownloadedExport {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .unwrap_or_default();
    Err(ApiError::new(
        FailureKind::HttpStatus(status.as_u16()),
        error_message(status.as_u16(), content_type.as_deref(), &body),
    ))
}

/// User-facing message for a failed response: the JSON `detail` when present,
/// then the raw body, then a generic status line.
pub fn error_message(status: u16, content_type: Option<&str>, body: &[u8]) -> String {
    let mut message = String::new();
    if content_type.is_some_and(|ct| ct.contains("application/json")) {
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            message = match value.get("detail") {
                Some(Value::String(detail)) => detail.clone(),
                Some(Value::Null) | None => value.to_string(),
                Some(detail) => detail.to_string(),
            };
        }
    }
    if message.is_empty() {
        message = String::from_utf8_lossy(body).into_owned();
    }
    let message = message.trim();
    if message.is_empty() {
        format!("request failed: {status}")
    } else {
        message.to_string()
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
