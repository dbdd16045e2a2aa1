use crate::core::error::DoloresError;
use eventsource_stream::Eventsource;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, Response};
use serde::Serialize;

const USER_AGENT: &str = concat!("dolores/", env!("CARGO_PKG_VERSION"));
const DONE_MARKER: &str = "[DONE]";

/// Thin JSON-over-HTTP client shared by chat backends
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth_header: Option<(String, String)>,
}

impl HttpClient {
    pub fn new(base_url: String, auth_header: Option<(String, String)>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
        }
    }

    /// POSTs `payload` as JSON. Non-success statuses are turned into
    /// `DoloresError::Api` with the provider's message when it sent one.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, DoloresError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(url = %url, "sending request");

        let mut request = self
            .client
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .json(payload);

        if let Some((key, value)) = &self.auth_header {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, body = %body, "request rejected");
        Err(DoloresError::Api(format!(
            "{} {}",
            status,
            error_message(&body).unwrap_or(body)
        )))
    }

    /// Yields the `data` payload of each server-sent event until `[DONE]`.
    /// A body that ends before `[DONE]` is reported as a truncated reply.
    pub fn sse_data(response: Response) -> BoxStream<'static, Result<String, DoloresError>> {
        let events = response.bytes_stream().eventsource().boxed();

        stream::try_unfold(events, |mut events| async move {
            while let Some(event) = events.next().await {
                let data = event
                    .map_err(|e| DoloresError::Api(format!("Stream interrupted: {}", e)))?
                    .data;
                let trimmed = data.trim();
                if trimmed == DONE_MARKER {
                    return Ok(None);
                }
                if !trimmed.is_empty() {
                    return Ok(Some((data, events)));
                }
            }
            Err(DoloresError::Api(
                "Stream ended before the reply was complete".to_string(),
            ))
        })
        .boxed()
    }
}

/// Extracts `error.message` (or a top-level `message`) from an error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
