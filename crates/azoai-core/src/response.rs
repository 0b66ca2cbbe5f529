use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tokio::sync::mpsc;

/// What the engine hands back to the HTTP layer. Streaming responses carry
/// a channel of ready-to-send SSE frames; the router adapts it into the
/// response body without inspecting the bytes again.
#[derive(Debug)]
pub enum ProxyResponse {
    Json {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    Stream {
        status: StatusCode,
        headers: HeaderMap,
        frames: mpsc::Receiver<Bytes>,
    },
}

impl ProxyResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Json { status, .. } | Self::Stream { status, .. } => *status,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream { .. })
    }
}
