use crate::state::AppState;
use axum::{
    extract::State,
    http::{self, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use safee::models::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

/// Server-sent events carrying one `data: <json>` line per item.
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Connection", "keep-alive")
            .body(body)
            .unwrap()
    }
}

fn sse_event(payload: &str) -> String {
    format!("data: {payload}\n\n")
}

/// Single-shot chat: run the agent to completion and return the final
/// answer as JSON. Only a provider transport failure surfaces as an error.
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    match state.agent.reply(request.messages).await {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(err) => {
            tracing::error!("chat request failed: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Streaming chat: one event per completed sentence, each carrying the
/// text and its synthesized audio; a failure emits one `{"error": …}`
/// event and ends the stream without tearing the connection down.
async fn chat_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> SseResponse {
    let (tx, rx) = mpsc::channel(100);

    let agent = state.agent.clone();
    tokio::spawn(async move {
        let mut stream = agent.reply_stream(request.messages);
        while let Some(event) = stream.next().await {
            match event {
                Ok(sentence) => {
                    let payload =
                        serde_json::to_string(&sentence).unwrap_or_else(|_| String::new());
                    if tx.send(sse_event(&payload)).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!("streaming chat failed: {err}");
                    let payload = json!({"error": err.to_string()}).to_string();
                    let _ = tx.send(sse_event(&payload)).await;
                    break;
                }
            }
        }
    });

    SseResponse::new(ReceiverStream::new(rx))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_event_wire_format() {
        assert_eq!(
            sse_event(r#"{"text":"Hello.","audio":"UklGRg=="}"#),
            "data: {\"text\":\"Hello.\",\"audio\":\"UklGRg==\"}\n\n"
        );
    }

    #[test]
    fn test_chat_request_accepts_bare_messages() {
        let request: ChatRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "score me"}]
        }))
        .unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "score me");
    }
}
