//! OneDrive API client: upload sessions, chunked uploads and listings.

use std::path::Path;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use url::Url;

use skylift_common::{Error, RemotePath, Result};

use crate::auth;
use crate::config::Credentials;
use crate::upload::{chunk_spans, progress_body, ProgressHandler, UploadSessionResponse};

/// Microsoft Graph API base URL.
const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Normalized descriptor for a drive entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveItem {
    /// Provider-assigned identifier.
    pub id: String,
    /// Entry name.
    pub name: String,
    /// Direct download link; `None` for entries the provider exposes
    /// none for (folders, for instance). Such entries are kept, never
    /// dropped from the listing.
    #[serde(rename = "@microsoft.graph.downloadUrl", default)]
    pub download_url: Option<String>,
}

/// Response from listing root children.
#[derive(Debug, Deserialize)]
struct ChildrenResponse {
    #[serde(default)]
    value: Vec<DriveItem>,
}

/// Result of a completed upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    /// Always `true` for a returned outcome; failures surface as errors.
    pub success: bool,
    /// Human-readable completion message.
    pub message: String,
}

/// OneDrive API client.
///
/// Holds immutable credentials and a shared HTTP client. A fresh access
/// token is fetched for every exported operation and nothing is cached
/// between calls, so independent operations may run concurrently; the
/// chunks within one upload are submitted strictly in order.
pub struct OneDriveClient {
    http: Client,
    credentials: Credentials,
}

impl OneDriveClient {
    /// Create a new client from credentials.
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent("Skylift/0.1")
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, credentials })
    }

    /// Exchange the configured refresh token for a bearer token.
    ///
    /// Failures propagate unmodified; see [`auth::fetch_access_token`].
    pub async fn access_token(&self) -> Result<String> {
        auth::fetch_access_token(&self.http, &self.credentials).await
    }

    /// List the immediate children of the drive root, in provider order.
    pub async fn list_children(&self) -> Result<Vec<DriveItem>> {
        let token = self.access_token().await?;
        let url = format!("{GRAPH_BASE}/me/drive/root/children");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to list children: {e}")))?;

        let listing: ChildrenResponse = handle_response(response).await?;
        Ok(listing.value)
    }

    /// Upload a local file in sequential 20 MiB byte-range chunks.
    ///
    /// `dest` selects the destination folder (drive root when `None`),
    /// `filename` overrides the source file name, and `on_progress`
    /// receives whole percentages while chunk bodies stream out. Values
    /// are non-decreasing across the upload and reach 100 with the last
    /// byte of the last chunk.
    ///
    /// Re-invoking after a failure creates a new session and re-uploads
    /// from scratch; partial sessions are not resumed.
    ///
    /// # Errors
    /// Any failure (session creation, chunk submission, I/O) is logged
    /// with the provider-supplied detail and re-signaled as the opaque
    /// [`Error::Upload`]; the original cause stays reachable through
    /// `source()`.
    pub async fn upload_file(
        &self,
        source: &Path,
        dest: Option<&RemotePath>,
        filename: Option<&str>,
        on_progress: Option<ProgressHandler>,
    ) -> Result<UploadOutcome> {
        match self
            .upload_file_inner(source, dest, filename, on_progress.as_ref())
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(cause) => {
                tracing::error!(error = %cause, source = %source.display(), "upload failed");
                Err(Error::Upload(Box::new(cause)))
            }
        }
    }

    async fn upload_file_inner(
        &self,
        source: &Path,
        dest: Option<&RemotePath>,
        filename: Option<&str>,
        on_progress: Option<&ProgressHandler>,
    ) -> Result<UploadOutcome> {
        let name = resolve_filename(source, filename)?;
        let token = self.access_token().await?;

        let mut file = File::open(source).await?;
        let total_size = file.metadata().await?.len();

        let session_url = upload_session_url(dest, &name);
        let upload_url = self.create_upload_session(&token, &session_url).await?;

        tracing::info!(name = %name, total_size, "starting chunked upload");

        // The session protocol requires ordered, non-overlapping ranges:
        // each PUT completes before the next one starts.
        for span in chunk_spans(total_size) {
            let mut buf = vec![0u8; span.len() as usize];
            file.read_exact(&mut buf).await?;

            let body = progress_body(buf.into(), span.start, total_size, on_progress);

            let response = self
                .http
                .put(&upload_url)
                .bearer_auth(&token)
                .header(header::CONTENT_LENGTH, span.len())
                .header(header::CONTENT_RANGE, span.content_range(total_size))
                .body(body)
                .send()
                .await
                .map_err(|e| Error::Network(format!("Failed to upload chunk: {e}")))?;

            if !response.status().is_success() {
                return Err(api_error(response).await);
            }
        }

        tracing::info!(name = %name, "file uploaded successfully");

        Ok(UploadOutcome {
            success: true,
            message: "File uploaded successfully".to_string(),
        })
    }

    /// Create an upload session, validating the returned URL.
    ///
    /// Fails before any chunk is sent when the provider rejects the
    /// request or omits `uploadUrl`.
    async fn create_upload_session(&self, token: &str, session_url: &str) -> Result<String> {
        let response = self
            .http
            .post(session_url)
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to create upload session: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(&response.text().await.unwrap_or_default());
            return Err(Error::Session(format!("provider returned {status}: {detail}")));
        }

        let session: UploadSessionResponse = response
            .json()
            .await
            .map_err(|e| Error::Session(format!("malformed session response: {e}")))?;

        let upload_url = session.into_upload_url()?;

        Url::parse(&upload_url)
            .map_err(|e| Error::Session(format!("invalid uploadUrl `{upload_url}`: {e}")))?;

        Ok(upload_url)
    }
}

/// Destination `createUploadSession` URL for an upload.
///
/// With a destination folder the file is addressed as
/// `root:/{path}/{filename}:`, otherwise directly under the root. Every
/// segment is percent-encoded.
fn upload_session_url(dest: Option<&RemotePath>, filename: &str) -> String {
    let name = encode_segment(filename);
    match dest {
        Some(path) if !path.is_root() => {
            let encoded = path
                .components()
                .iter()
                .map(|component| encode_segment(component))
                .collect::<Vec<_>>()
                .join("/");
            format!("{GRAPH_BASE}/me/drive/root:/{encoded}/{name}:/createUploadSession")
        }
        _ => format!("{GRAPH_BASE}/me/drive/root:/{name}:/createUploadSession"),
    }
}

/// Pick the remote filename: explicit override, else source file name.
fn resolve_filename(source: &Path, filename: Option<&str>) -> Result<String> {
    match filename {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => source
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Source path has no usable file name: {}",
                    source.display()
                ))
            }),
    }
}

/// Percent-encode a single path segment for a Graph `root:/...:` address.
fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

/// Parse a success response body, mapping non-success statuses to errors.
async fn handle_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {e}")))
    } else {
        Err(api_error(response).await)
    }
}

/// Map a non-success response to an error, extracting the provider's
/// error detail when the body carries one.
async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body);

    if status == StatusCode::UNAUTHORIZED {
        Error::Authentication(format!("Invalid or expired token: {message}"))
    } else {
        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Best-effort extraction of the human-readable message from a Graph
/// error body; falls back to the raw body.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct GraphError {
        error: GraphErrorInner,
    }

    #[derive(Deserialize)]
    struct GraphErrorInner {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    match serde_json::from_str::<GraphError>(body) {
        Ok(GraphError { error }) => {
            let code = error.code.unwrap_or_default();
            let message = error.message.unwrap_or_default();
            match (code.is_empty(), message.is_empty()) {
                (true, true) => body.to_string(),
                (true, false) => message,
                (false, true) => code,
                (false, false) => format!("{code}: {message}"),
            }
        }
        Err(_) => body.to_string(),
    }
}
