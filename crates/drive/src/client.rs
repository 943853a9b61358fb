use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    bytes::Bytes,
    reqwest::{
        StatusCode,
        header::{CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE},
    },
    secrecy::ExposeSecret,
    tgdrive_queue::{TransferClient, TransferError, TransferReceipt, TransferRequest},
    tracing::{debug, info},
};

use crate::{
    token::TokenSource,
    types::{ApiErrorBody, FileMetadata, FileResource},
};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

const UPLOAD_PATH: &str = "/upload/drive/v3/files";
const FILE_FIELDS: &str = "id,name,webViewLink,size";
/// Drive requires every chunk except the last to be a multiple of this.
const CHUNK_GRANULARITY: usize = 256 * 1024;
/// Error bodies longer than this are cut before being shown to users.
const MAX_REASON_LEN: usize = 300;

#[derive(Debug, Clone)]
pub struct DriveClientConfig {
    pub api_base: String,
    /// Bytes per upload request; rounded down to a multiple of 256 KiB.
    pub chunk_size: usize,
    pub timeout: Duration,
}

impl Default for DriveClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            chunk_size: 1024 * 1024,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Uploads payloads to Google Drive with resumable sessions.
pub struct DriveClient {
    http: reqwest::Client,
    token: Arc<dyn TokenSource>,
    api_base: String,
    chunk_size: usize,
}

impl DriveClient {
    pub fn new(config: DriveClientConfig, token: Arc<dyn TokenSource>) -> reqwest::Result<Self> {
        // The resumable protocol answers 308 without a Location header; it
        // must reach us untouched.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.timeout)
            .build()?;
        let chunk_size = (config.chunk_size / CHUNK_GRANULARITY).max(1) * CHUNK_GRANULARITY;
        Ok(Self {
            http,
            token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            chunk_size,
        })
    }

    /// Open a resumable session and return its URI.
    async fn start_session(
        &self,
        bearer: &str,
        request: &TransferRequest,
    ) -> Result<String, TransferError> {
        let url = format!("{}{UPLOAD_PATH}", self.api_base);
        let metadata = FileMetadata {
            name: &request.name,
            mime_type: &request.content_type,
            parents: request.destination.as_deref().map(|d| [d]),
        };

        let resp = self
            .http
            .post(&url)
            .query(&[
                ("uploadType", "resumable"),
                ("supportsAllDrives", "true"),
                ("fields", FILE_FIELDS),
            ])
            .bearer_auth(bearer)
            .header("X-Upload-Content-Type", &request.content_type)
            .header("X-Upload-Content-Length", request.data.len())
            .json(&metadata)
            .send()
            .await
            .map_err(|e| TransferError::external("open upload session", e))?;

        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }

        resp.headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| TransferError::rejected("upload session response had no Location"))
    }

    /// Send the payload in chunks until Drive returns the file resource.
    async fn send_chunks(
        &self,
        bearer: &str,
        session: &str,
        data: &Bytes,
        content_type: &str,
    ) -> Result<FileResource, TransferError> {
        let total = data.len();
        let mut offset = 0usize;

        loop {
            let end = (offset + self.chunk_size).min(total);
            let (range, body) = if total == 0 {
                ("bytes */0".to_string(), Bytes::new())
            } else {
                (
                    format!("bytes {offset}-{}/{total}", end - 1),
                    data.slice(offset..end),
                )
            };
            debug!(session = %session, range = %range, "uploading chunk");

            let resp = self
                .http
                .put(session)
                .bearer_auth(bearer)
                .header(CONTENT_TYPE, content_type)
                .header(CONTENT_RANGE, range)
                .body(body)
                .send()
                .await
                .map_err(|e| TransferError::external("upload chunk", e))?;

            match resp.status() {
                StatusCode::OK | StatusCode::CREATED => {
                    return resp
                        .json::<FileResource>()
                        .await
                        .map_err(|e| TransferError::external("decode file resource", e));
                },
                StatusCode::PERMANENT_REDIRECT => {
                    // No Range header means nothing has been persisted yet.
                    let next = persisted_up_to(resp.headers().get(RANGE)).unwrap_or(0);
                    if next <= offset {
                        return Err(TransferError::rejected(
                            "upload made no progress on the resumable session",
                        ));
                    }
                    if next >= total {
                        return Err(TransferError::rejected(
                            "upload session stayed incomplete after the final chunk",
                        ));
                    }
                    offset = next;
                },
                _ => return Err(rejection(resp).await),
            }
        }
    }
}

#[async_trait]
impl TransferClient for DriveClient {
    async fn upload(&self, request: TransferRequest) -> Result<TransferReceipt, TransferError> {
        let bearer = self.token.access_token().await?;
        let bearer = bearer.expose_secret();

        let session = self.start_session(bearer, &request).await?;
        let file = self
            .send_chunks(bearer, &session, &request.data, &request.content_type)
            .await?;

        let size_bytes = file
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(request.data.len() as u64);
        let link = file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", file.id));

        info!(
            file_id = %file.id,
            name = %file.name,
            size_bytes,
            "drive upload complete"
        );
        Ok(TransferReceipt {
            remote_id: file.id,
            resolved_name: file.name,
            link,
            size_bytes,
        })
    }
}

/// Parse the `Range: bytes=0-N` header of a 308 into the next offset.
fn persisted_up_to(range: Option<&reqwest::header::HeaderValue>) -> Option<usize> {
    let value = range?.to_str().ok()?;
    let last = value.strip_prefix("bytes=")?.split_once('-')?.1;
    last.trim().parse::<usize>().ok().map(|n| n + 1)
}

/// Turn a non-success response into a user-facing rejection.
async fn rejection(resp: reqwest::Response) -> TransferError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let reason = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => {
            let mut text: String = body.trim().chars().take(MAX_REASON_LEN).collect();
            if body.trim().chars().count() > MAX_REASON_LEN {
                text.push('…');
            }
            format!("HTTP {status}: {text}")
        },
    };
    TransferError::with_status(status.as_u16(), reason)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::token::StaticToken,
        mockito::Matcher,
        secrecy::Secret,
        serde_json::json,
    };

    fn client(base: &str, chunk_size: usize) -> DriveClient {
        DriveClient::new(
            DriveClientConfig {
                api_base: base.to_string(),
                chunk_size,
                timeout: Duration::from_secs(10),
            },
            Arc::new(StaticToken::new(Secret::new("tok".into()))),
        )
        .unwrap()
    }

    fn request(data: Vec<u8>, destination: Option<&str>) -> TransferRequest {
        TransferRequest {
            data: Bytes::from(data),
            name: "report.pdf".into(),
            content_type: "application/pdf".into(),
            destination: destination.map(str::to_string),
        }
    }

    fn session_path() -> Matcher {
        Matcher::Regex("^/upload/session/1".into())
    }

    #[tokio::test]
    async fn uploads_single_chunk() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let init = server
            .mock("POST", Matcher::Regex(format!("^{UPLOAD_PATH}")))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("uploadType".into(), "resumable".into()),
                Matcher::UrlEncoded("fields".into(), FILE_FIELDS.into()),
            ]))
            .match_header("authorization", "Bearer tok")
            .match_header("x-upload-content-length", "5")
            .match_body(Matcher::Json(json!({
                "name": "report.pdf",
                "mimeType": "application/pdf",
                "parents": ["folder-1"],
            })))
            .with_status(200)
            .with_header("location", &format!("{base}/upload/session/1"))
            .create_async()
            .await;
        let put = server
            .mock("PUT", session_path())
            .match_header("content-range", "bytes 0-4/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "abc123",
                    "name": "report.pdf",
                    "webViewLink": "https://drive.google.com/file/d/abc123/view",
                    "size": "5",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let receipt = client(&base, CHUNK_GRANULARITY)
            .upload(request(b"hello".to_vec(), Some("folder-1")))
            .await
            .unwrap();

        assert_eq!(receipt, TransferReceipt {
            remote_id: "abc123".into(),
            resolved_name: "report.pdf".into(),
            link: "https://drive.google.com/file/d/abc123/view".into(),
            size_bytes: 5,
        });
        init.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn uploads_in_multiple_chunks() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let total = CHUNK_GRANULARITY + 1000;

        let _init = server
            .mock("POST", Matcher::Regex(format!("^{UPLOAD_PATH}")))
            .with_status(200)
            .with_header("location", &format!("{base}/upload/session/1"))
            .create_async()
            .await;
        let first = server
            .mock("PUT", session_path())
            .match_header(
                "content-range",
                format!("bytes 0-{}/{total}", CHUNK_GRANULARITY - 1).as_str(),
            )
            .with_status(308)
            .with_header("range", &format!("bytes=0-{}", CHUNK_GRANULARITY - 1))
            .create_async()
            .await;
        let last = server
            .mock("PUT", session_path())
            .match_header(
                "content-range",
                format!("bytes {CHUNK_GRANULARITY}-{}/{total}", total - 1).as_str(),
            )
            .with_status(201)
            .with_body(json!({ "id": "big", "name": "report.pdf" }).to_string())
            .create_async()
            .await;

        let receipt = client(&base, CHUNK_GRANULARITY)
            .upload(request(vec![7u8; total], None))
            .await
            .unwrap();

        // No size or link in the resource: fall back to local values.
        assert_eq!(receipt.size_bytes, total as u64);
        assert_eq!(receipt.link, "https://drive.google.com/file/d/big/view");
        first.assert_async().await;
        last.assert_async().await;
    }

    #[tokio::test]
    async fn omits_parents_without_destination() {
        let mut server = mockito::Server::new_async().await;
        let init = server
            .mock("POST", Matcher::Regex(format!("^{UPLOAD_PATH}")))
            .match_body(Matcher::Json(json!({
                "name": "report.pdf",
                "mimeType": "application/pdf",
            })))
            .with_status(403)
            .create_async()
            .await;

        let err = client(&server.url(), CHUNK_GRANULARITY)
            .upload(request(b"x".to_vec(), None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 403 Forbidden");
        init.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_message_becomes_reason() {
        let mut server = mockito::Server::new_async().await;
        let _init = server
            .mock("POST", Matcher::Regex(format!("^{UPLOAD_PATH}")))
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": {
                        "code": 403,
                        "message": "The user's Drive storage quota has been exceeded.",
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server.url(), CHUNK_GRANULARITY)
            .upload(request(b"x".to_vec(), Some("f")))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Rejected {
            status: Some(403),
            ..
        }));
        assert_eq!(
            err.to_string(),
            "The user's Drive storage quota has been exceeded."
        );
    }

    #[tokio::test]
    async fn chunk_failure_includes_body_text() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _init = server
            .mock("POST", Matcher::Regex(format!("^{UPLOAD_PATH}")))
            .with_status(200)
            .with_header("location", &format!("{base}/upload/session/1"))
            .create_async()
            .await;
        let _put = server
            .mock("PUT", session_path())
            .with_status(500)
            .with_body("backend unavailable")
            .create_async()
            .await;

        let err = client(&base, CHUNK_GRANULARITY)
            .upload(request(b"abc".to_vec(), None))
            .await
            .unwrap_err();
        let reason = err.to_string();
        assert!(reason.starts_with("HTTP 500"), "{reason}");
        assert!(reason.contains("backend unavailable"));
    }

    #[tokio::test]
    async fn missing_location_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _init = server
            .mock("POST", Matcher::Regex(format!("^{UPLOAD_PATH}")))
            .with_status(200)
            .create_async()
            .await;

        let err = client(&server.url(), CHUNK_GRANULARITY)
            .upload(request(b"abc".to_vec(), None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Location"));
    }

    #[tokio::test]
    async fn empty_token_fails_before_any_request() {
        let client = DriveClient::new(
            DriveClientConfig::default(),
            Arc::new(StaticToken::new(Secret::new(String::new()))),
        )
        .unwrap();
        let err = client
            .upload(request(b"abc".to_vec(), None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("access token"));
    }

    #[test]
    fn chunk_size_is_rounded_to_granularity() {
        let c = client("http://localhost", CHUNK_GRANULARITY + 10);
        assert_eq!(c.chunk_size, CHUNK_GRANULARITY);
        let c = client("http://localhost", 1);
        assert_eq!(c.chunk_size, CHUNK_GRANULARITY);
    }

    #[test]
    fn parses_persisted_range() {
        let v = reqwest::header::HeaderValue::from_static("bytes=0-262143");
        assert_eq!(persisted_up_to(Some(&v)), Some(262_144));
        assert_eq!(persisted_up_to(None), None);
        let bad = reqwest::header::HeaderValue::from_static("items=3");
        assert_eq!(persisted_up_to(Some(&bad)), None);
    }
}
