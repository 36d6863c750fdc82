use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Url};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{
    InputArtifact, JobStatusResponse, RemixRequest, ResultLocator, StylesResponse,
    SubmitResponse, UploadResponse,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// The four job operations the lifecycle core depends on.
///
/// Each call is a single request/response with no retry or caching. Futures
/// are `Send` so a polling loop can run them on a spawned task.
pub trait RemixApi: Send + Sync {
    fn upload_artifact(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
    ) -> impl Future<Output = Result<InputArtifact, ApiError>> + Send;

    fn submit_job(
        &self,
        request: &RemixRequest,
    ) -> impl Future<Output = Result<SubmitResponse, ApiError>> + Send;

    fn fetch_job_status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatusResponse, ApiError>> + Send;

    /// Only meaningful once the job's last known state is completed.
    fn fetch_result_reference(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<ResultLocator, ApiError>> + Send;
}

/// Run `call` under `deadline`; an elapsed deadline becomes [`ApiError::Timeout`].
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout),
    }
}

/// HTTP client for the remix service.
pub struct HttpRemixClient {
    client: Client,
    base_url: String,
}

impl HttpRemixClient {
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`] (useful for testing).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `{base_url}{route}/{job_id}` with the id escaped as a single path segment.
    fn job_url(&self, route: &str, job_id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(route))
            .map_err(|err| ApiError::Transport(format!("invalid service url: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport("service url cannot take a path".into()))?
            .push(job_id);
        Ok(url)
    }

    /// `GET /styles`: the externally supplied style catalog.
    pub async fn fetch_styles(&self) -> Result<Vec<String>, ApiError> {
        let response = self.client.get(self.url("/styles")).send().await?;
        let body: StylesResponse = Self::parse_json(response).await?;
        Ok(body.styles)
    }

    /// `GET /system`: descriptive metadata, passed through untouched.
    pub async fn fetch_system_info(&self) -> Result<serde_json::Value, ApiError> {
        let response = self.client.get(self.url("/system")).send().await?;
        Self::parse_json(response).await
    }

    /// `GET /download/{job_id}`: the finished artifact bytes.
    pub async fn download_result(&self, job_id: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(self.job_url("/download", job_id)?)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        tracing::debug!(job_id, size = bytes.len(), "Downloaded remix artifact");
        Ok(bytes.to_vec())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, &body))
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }
}

impl RemixApi for HttpRemixClient {
    async fn upload_artifact(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
    ) -> Result<InputArtifact, ApiError> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(display_name.to_string())
            .mime_str(audio_mime_type(display_name))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = Self::parse_json(response).await?;
        tracing::debug!(
            file_id = %body.file_id,
            size,
            message = body.message.as_deref(),
            "Uploaded input artifact",
        );
        Ok(InputArtifact::from(body))
    }

    async fn submit_job(&self, request: &RemixRequest) -> Result<SubmitResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/remix"))
            .json(request)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn fetch_job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError> {
        let response = self
            .client
            .get(self.job_url("/status", job_id)?)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn fetch_result_reference(&self, job_id: &str) -> Result<ResultLocator, ApiError> {
        Ok(ResultLocator {
            job_id: job_id.to_string(),
            url: self.job_url("/download", job_id)?.to_string(),
        })
    }
}

/// MIME type sent with an upload, derived from the file extension.
pub fn audio_mime_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpRemixClient {
        HttpRemixClient::with_client(Client::new(), format!("{}/api/", server.uri()))
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(audio_mime_type("song.MP3"), "audio/mpeg");
        assert_eq!(audio_mime_type("take.wav"), "audio/wav");
        assert_eq!(audio_mime_type("live.flac"), "audio/flac");
        assert_eq!(audio_mime_type("voice.m4a"), "audio/mp4");
        assert_eq!(audio_mime_type("notes.txt"), "application/octet-stream");
        assert_eq!(audio_mime_type("no_extension"), "application/octet-stream");
    }

    #[tokio::test]
    async fn base_url_trailing_slash_is_trimmed() {
        let client = HttpRemixClient::with_client(Client::new(), "http://host:8000/api/");
        let locator = client.fetch_result_reference("j7").await.unwrap();
        assert_eq!(locator.url, "http://host:8000/api/download/j7");
    }

    #[tokio::test]
    async fn upload_returns_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "file_id": "f1",
                "filename": "song.mp3",
                "duration": 12.0,
                "message": "Upload successful"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let artifact = client_for(&server)
            .upload_artifact(b"ID3".to_vec(), "song.mp3")
            .await
            .unwrap();
        assert_eq!(artifact.artifact_id, "f1");
        assert_eq!(artifact.display_name, "song.mp3");
        assert_eq!(artifact.duration_secs, Some(12.0));
    }

    #[tokio::test]
    async fn upload_rejected_format_is_validation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "Format not supported. Allowed: ['.mp3', '.wav', '.flac', '.m4a']"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload_artifact(b"plain".to_vec(), "notes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { status: 400, .. }));
    }

    #[tokio::test]
    async fn submit_posts_service_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/remix"))
            .and(body_json(serde_json::json!({
                "file_id": "f1",
                "style": "lofi_chill",
                "energy": 1.0,
                "brightness": 1.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "j1",
                "status": "processing",
                "progress": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = RemixRequest {
            artifact_id: "f1".into(),
            style_id: "lofi_chill".into(),
            energy: 1.0,
            brightness: 1.0,
        };
        let accepted = client_for(&server).submit_job(&request).await.unwrap();
        assert_eq!(accepted.job_id, "j1");
        assert_eq!(accepted.status, "processing");
    }

    #[tokio::test]
    async fn unknown_job_status_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"detail": "Job not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_job_status("missing")
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound("Job not found".into()));
    }

    #[tokio::test]
    async fn server_error_on_status_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/j1"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_job_status("j1").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn undecodable_status_body_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/j1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_job_status("j1").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn result_reference_points_at_download_endpoint() {
        let client = HttpRemixClient::with_client(Client::new(), "http://host:8000/api");
        let locator = client.fetch_result_reference("j1").await.unwrap();
        assert_eq!(locator.job_id, "j1");
        assert_eq!(locator.url, "http://host:8000/api/download/j1");

        let locator = client.fetch_result_reference("../styles").await.unwrap();
        assert_eq!(locator.url, "http://host:8000/api/download/..%2Fstyles");
    }

    #[tokio::test]
    async fn job_id_is_escaped_as_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/a%2Fb%3Fc%23d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "job_id": "a/b?c#d",
                "status": "processing",
                "progress": 5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = client_for(&server).fetch_job_status("a/b?c#d").await.unwrap();
        assert_eq!(status.job_id.as_deref(), Some("a/b?c#d"));
        assert_eq!(status.progress, 5);
    }

    #[tokio::test]
    async fn styles_and_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/styles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "styles": ["lofi_chill", "synthwave"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/download/j1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFdata".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/download/j2"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({"detail": "Remix not ready"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(
            client.fetch_styles().await.unwrap(),
            vec!["lofi_chill".to_string(), "synthwave".to_string()]
        );
        assert_eq!(client.download_result("j1").await.unwrap(), b"RIFFdata".to_vec());
        let err = client.download_result("j2").await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation {
                status: 400,
                message: "Remix not ready".into()
            }
        );
    }
}
