use crate::config::Config;
use crate::core::error::DoloresError;
use crate::providers::base_client::HttpClient;
use crate::providers::{ChatClient, FragmentStream, Message};
use async_trait::async_trait;
use futures::future;
use futures::stream::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

const COMPLETIONS_PATH: &str = "chat/completions";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Extracts the text delta from one streamed chunk, if it carries any.
pub fn parse_stream_chunk(data: &str) -> Result<Option<String>, DoloresError> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| DoloresError::Api(format!("Malformed stream chunk: {}", e)))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

/// Client for any endpoint speaking the OpenAI chat-completions protocol
#[derive(Clone)]
pub struct OpenAICompatibleClient {
    client: HttpClient,
    model: String,
}

impl OpenAICompatibleClient {
    pub fn new(base_url: String, api_key: &str, model: String) -> Self {
        let auth_header = Some(("Authorization".to_string(), format!("Bearer {}", api_key)));

        Self {
            client: HttpClient::new(base_url, auth_header),
            model,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.base_url.clone(),
            &config.api_key,
            config.model_id.clone(),
        )
    }
}

#[async_trait]
impl ChatClient for OpenAICompatibleClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, DoloresError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self.client.post(COMPLETIONS_PATH, &payload).await?;
        let response_body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body)?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DoloresError::Api("No choices in API response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn stream(&self, messages: &[Message]) -> Result<FragmentStream, DoloresError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "streaming completion");
        let response = self.client.post(COMPLETIONS_PATH, &payload).await?;

        Ok(HttpClient::sse_data(response)
            .try_filter_map(|data| future::ready(parse_stream_chunk(&data)))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body(fragments: &[&str]) -> String {
        let mut body = String::new();
        for fragment in fragments {
            let chunk = serde_json::json!({
                "choices": [{"index": 0, "delta": {"content": fragment}}]
            });
            body.push_str(&format!("data: {}\n\n", chunk));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    fn client_for(server: &MockServer) -> OpenAICompatibleClient {
        OpenAICompatibleClient::new(server.uri(), "sk-test", "deepseek-chat".to_string())
    }

    #[test]
    fn parse_stream_chunk_reads_delta_content() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_stream_chunk(data).unwrap().as_deref(), Some("Hel"));
    }

    #[test]
    fn parse_stream_chunk_skips_role_only_and_empty_deltas() {
        assert_eq!(
            parse_stream_chunk(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            None
        );
        assert_eq!(
            parse_stream_chunk(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap(),
            None
        );
        assert_eq!(parse_stream_chunk(r#"{"choices":[]}"#).unwrap(), None);
    }

    #[test]
    fn parse_stream_chunk_rejects_garbage() {
        let err = parse_stream_chunk("not json").unwrap_err();
        assert!(matches!(err, DoloresError::Api(_)));
    }

    #[tokio::test]
    async fn complete_sends_history_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "stream": false,
                "messages": [
                    {"role": "system", "content": "Be terse."},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello!")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete(&[Message::system("Be terse."), Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn stream_yields_fragments_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(sse_body(&["Hel", "lo", " there"]), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let fragments: Vec<String> = client_for(&server)
            .stream(&[Message::user("hi")])
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(fragments, vec!["Hel", "lo", " there"]);
    }

    #[tokio::test]
    async fn streamed_fragments_concatenate_to_the_completion() {
        let server = MockServer::start().await;
        let text = "  Line one.\nLine two.  ";
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    sse_body(&["  Line", " one.\n", "Line two.  "]),
                    "text/event-stream",
                ),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(text)))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let history = [Message::user("two lines please")];
        let streamed: String = client
            .stream(&history)
            .await
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap()
            .concat();
        let completed = client.complete(&history).await.unwrap();
        assert_eq!(streamed, completed);
    }

    #[tokio::test]
    async fn error_status_surfaces_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Authentication Fails", "type": "authentication_error"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.complete(&[Message::user("hi")]).await.unwrap_err();
        match err {
            DoloresError::Api(message) => {
                assert!(message.contains("401"), "{message}");
                assert!(message.contains("Authentication Fails"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = client.stream(&[Message::user("hi")]).await.err().unwrap();
        assert!(matches!(err, DoloresError::Api(_)));
    }

    #[tokio::test]
    async fn stream_without_done_marker_is_an_api_error() {
        let server = MockServer::start().await;
        let body = sse_body(&["Hel", "lo"]).replace("data: [DONE]\n\n", "");
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let results: Vec<_> = client_for(&server)
            .stream(&[Message::user("hi")])
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), "Hel");
        assert_eq!(results[1].as_ref().unwrap(), "lo");
        assert!(matches!(results[2], Err(DoloresError::Api(_))));
    }

    #[tokio::test]
    async fn empty_choices_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, DoloresError::Api(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_an_api_error() {
        let client = OpenAICompatibleClient::new(
            "http://127.0.0.1:9".to_string(),
            "sk-test",
            "deepseek-chat".to_string(),
        );
        let err = client.complete(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, DoloresError::Api(_)));
    }
}
