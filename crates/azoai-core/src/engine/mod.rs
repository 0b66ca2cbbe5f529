mod wire;

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tracing::{info, warn};

use azoai_common::ProxyConfig;
use azoai_protocol::sse::SseLineParser;
use azoai_protocol::{ChatCompletionsRequestBody, CustomChatResponse};
use azoai_transform::stream::{AzureStreamBridge, StreamFrame, decode_frame};
use azoai_transform::{
    chat_to_text_completion, completion_to_chat_body, normalize_embeddings_response,
    normalize_image_response, to_azure_chat_completion, to_upstream_chat_body,
    to_upstream_embeddings_body, to_upstream_image_body,
};

use crate::classify::{ClassifiedRequest, ProxyOperation};
use crate::error::ProxyError;
use crate::headers::synthesize_response_headers;
use crate::response::ProxyResponse;
use crate::upstream_client::{
    UpstreamBody, UpstreamClient, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
    UpstreamTransportErrorKind,
};

pub use wire::{sse_done_frame, sse_json_frame};

/// Per-request dispatcher: shapes the upstream call, runs it in buffered or
/// streaming mode, and rewraps the result. Holds only shared immutable
/// state; all per-request state lives on the stack of `handle`.
pub struct ProxyEngine {
    config: Arc<ProxyConfig>,
    client: Arc<dyn UpstreamClient>,
}

impl ProxyEngine {
    pub fn new(config: Arc<ProxyConfig>, client: Arc<dyn UpstreamClient>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub async fn handle(
        &self,
        classified: ClassifiedRequest,
        trace_id: &str,
        client_request_id: Option<&str>,
    ) -> Result<ProxyResponse, ProxyError> {
        let endpoint = classified.operation.endpoint();
        let url = format!("{}{}", self.config.upstream_base_url, endpoint.upstream_path());
        let deployment = classified.deployment.clone();

        match classified.operation {
            ProxyOperation::TextChat(body) | ProxyOperation::VisionChat(body) => {
                let upstream_body = to_upstream_chat_body(body, &deployment);
                if classified.is_stream {
                    self.stream_chat(url, upstream_body, &deployment, trace_id, client_request_id)
                        .await
                } else {
                    self.buffered_chat(
                        url,
                        upstream_body,
                        &deployment,
                        trace_id,
                        client_request_id,
                        false,
                    )
                    .await
                }
            }
            ProxyOperation::LegacyCompletion(body) => {
                let upstream_body = completion_to_chat_body(body, &deployment);
                if classified.is_stream {
                    self.stream_chat(url, upstream_body, &deployment, trace_id, client_request_id)
                        .await
                } else {
                    self.buffered_chat(
                        url,
                        upstream_body,
                        &deployment,
                        trace_id,
                        client_request_id,
                        true,
                    )
                    .await
                }
            }
            ProxyOperation::ImageGeneration(body) => {
                let upstream_body = to_upstream_image_body(body, &deployment);
                self.buffered_passthrough(
                    url,
                    encode_body(&upstream_body)?,
                    &deployment,
                    trace_id,
                    client_request_id,
                    normalize_image_response,
                )
                .await
            }
            ProxyOperation::Embeddings(body) => {
                let upstream_body = to_upstream_embeddings_body(body, &deployment);
                self.buffered_passthrough(
                    url,
                    encode_body(&upstream_body)?,
                    &deployment,
                    trace_id,
                    client_request_id,
                    normalize_embeddings_response,
                )
                .await
            }
        }
    }

    async fn buffered_chat(
        &self,
        url: String,
        upstream_body: ChatCompletionsRequestBody,
        deployment: &str,
        trace_id: &str,
        client_request_id: Option<&str>,
        legacy: bool,
    ) -> Result<ProxyResponse, ProxyError> {
        let resp = self
            .send_upstream(url, encode_body(&upstream_body)?, false)
            .await?;
        let (upstream_headers, body) = expect_buffered(resp)?;

        let upstream: CustomChatResponse = serde_json::from_slice(&body).map_err(|err| {
            ProxyError::internal(format!("upstream returned malformed JSON: {err}"))
        })?;
        let chat = to_azure_chat_completion(upstream, deployment, &self.config.system_fingerprint);
        let body = if legacy {
            encode_body(&chat_to_text_completion(chat))?
        } else {
            encode_body(&chat)?
        };

        Ok(ProxyResponse::Json {
            status: StatusCode::OK,
            headers: synthesize_response_headers(
                deployment,
                &self.config.region_tag,
                trace_id,
                client_request_id,
                false,
                &upstream_headers,
            ),
            body,
        })
    }

    async fn buffered_passthrough(
        &self,
        url: String,
        upstream_body: Bytes,
        deployment: &str,
        trace_id: &str,
        client_request_id: Option<&str>,
        normalize: fn(JsonValue) -> JsonValue,
    ) -> Result<ProxyResponse, ProxyError> {
        let resp = self.send_upstream(url, upstream_body, false).await?;
        let (upstream_headers, body) = expect_buffered(resp)?;

        let value: JsonValue = serde_json::from_slice(&body).map_err(|err| {
            ProxyError::internal(format!("upstream returned malformed JSON: {err}"))
        })?;
        let body = encode_body(&normalize(value))?;

        Ok(ProxyResponse::Json {
            status: StatusCode::OK,
            headers: synthesize_response_headers(
                deployment,
                &self.config.region_tag,
                trace_id,
                client_request_id,
                false,
                &upstream_headers,
            ),
            body,
        })
    }

    /// The streaming bridge. Upstream events are buffered only until the
    /// first content delta; an upstream error arriving before that point
    /// still becomes a buffered HTTP error with everything staged so far
    /// discarded. From the first content delta on, frames go to the client
    /// as they are produced and errors turn into a terminal frame.
    async fn stream_chat(
        &self,
        url: String,
        upstream_body: ChatCompletionsRequestBody,
        deployment: &str,
        trace_id: &str,
        client_request_id: Option<&str>,
    ) -> Result<ProxyResponse, ProxyError> {
        let resp = self
            .send_upstream(url, encode_body(&upstream_body)?, true)
            .await?;
        let upstream_headers = resp.headers;
        let mut rx = match resp.body {
            UpstreamBody::Stream(rx) => rx,
            UpstreamBody::Bytes(bytes) => {
                // A 2xx that arrived buffered is still treated as SSE input.
                let (tx, rx) = mpsc::channel(1);
                let _ = tx.try_send(bytes);
                rx
            }
        };

        let mut parser = SseLineParser::new();
        let mut bridge =
            AzureStreamBridge::new(deployment, self.config.system_fingerprint.clone());
        let mut staged: Vec<Bytes> = Vec::new();
        let mut finished = false;

        // Prime until first content (or end of stream).
        'prime: while !bridge.content_emitted() && !finished {
            let Some(chunk) = rx.recv().await else {
                for payload in parser.finish() {
                    // Nothing was written to the client yet; an upstream
                    // error here drops the staged frames in favor of a real
                    // error response.
                    stage_payload(&payload, &mut bridge, &mut staged)
                        .map_err(|err| ProxyError::from_stream_error(&err))?;
                }
                if !bridge.is_closed() {
                    warn!(event = "upstream_stream_truncated", trace_id = %trace_id);
                    finish_stream(&mut bridge, &mut staged);
                }
                finished = true;
                break 'prime;
            };
            for payload in parser.push_bytes(&chunk) {
                stage_payload(&payload, &mut bridge, &mut staged)
                    .map_err(|err| ProxyError::from_stream_error(&err))?;
                if bridge.is_closed() {
                    finished = true;
                    break 'prime;
                }
            }
        }

        let (tx, frames) = mpsc::channel::<Bytes>(32);
        let trace_id_owned = trace_id.to_string();
        tokio::spawn(async move {
            for frame in staged {
                if tx.send(frame).await.is_err() {
                    return;
                }
            }
            if finished {
                return;
            }

            'forward: while let Some(chunk) = rx.recv().await {
                for payload in parser.push_bytes(&chunk) {
                    match forward_payload(&payload, &mut bridge, &tx).await {
                        ForwardOutcome::Continue => {}
                        ForwardOutcome::Closed => break 'forward,
                    }
                }
            }

            if !bridge.is_closed() {
                for payload in parser.finish() {
                    if let ForwardOutcome::Closed =
                        forward_payload(&payload, &mut bridge, &tx).await
                    {
                        break;
                    }
                }
            }
            if !bridge.is_closed() {
                warn!(event = "upstream_stream_truncated", trace_id = %trace_id_owned);
                for chunk in bridge.finish() {
                    if let Some(frame) = sse_json_frame(&chunk)
                        && tx.send(frame).await.is_err()
                    {
                        return;
                    }
                }
                let _ = tx.send(sse_done_frame()).await;
            }
        });

        Ok(ProxyResponse::Stream {
            status: StatusCode::OK,
            headers: synthesize_response_headers(
                deployment,
                &self.config.region_tag,
                trace_id,
                client_request_id,
                true,
                &upstream_headers,
            ),
            frames,
        })
    }

    async fn send_upstream(
        &self,
        url: String,
        body: Bytes,
        is_stream: bool,
    ) -> Result<UpstreamHttpResponse, ProxyError> {
        let resp = self
            .client
            .send(UpstreamHttpRequest {
                url,
                body,
                is_stream,
            })
            .await
            .map_err(map_transport_failure)?;

        if !(200..300).contains(&resp.status) {
            let body = match resp.body {
                UpstreamBody::Bytes(bytes) => bytes,
                UpstreamBody::Stream(_) => Bytes::new(),
            };
            info!(event = "upstream_error_status", status = resp.status);
            return Err(ProxyError::from_upstream_status(
                resp.status,
                &resp.headers,
                &body,
            ));
        }
        Ok(resp)
    }
}

enum ForwardOutcome {
    Continue,
    Closed,
}

/// Streaming-phase payload handling: decode, rewrap, write, flush. Errors
/// after content emission become a terminal error frame plus `[DONE]`.
async fn forward_payload(
    payload: &str,
    bridge: &mut AzureStreamBridge,
    tx: &mpsc::Sender<Bytes>,
) -> ForwardOutcome {
    match decode_frame(payload) {
        Some(StreamFrame::Done) => {
            for chunk in bridge.finish() {
                if let Some(frame) = sse_json_frame(&chunk)
                    && tx.send(frame).await.is_err()
                {
                    return ForwardOutcome::Closed;
                }
            }
            let _ = tx.send(sse_done_frame()).await;
            ForwardOutcome::Closed
        }
        Some(StreamFrame::Chunk(chunk)) => match bridge.push(*chunk) {
            Ok(chunks) => {
                for chunk in chunks {
                    if let Some(frame) = sse_json_frame(&chunk)
                        && tx.send(frame).await.is_err()
                    {
                        return ForwardOutcome::Closed;
                    }
                }
                ForwardOutcome::Continue
            }
            Err(err) => {
                bridge.close();
                let envelope = ProxyError::from_stream_error(&err.detail).envelope;
                if let Some(frame) = sse_json_frame(&envelope)
                    && tx.send(frame).await.is_err()
                {
                    return ForwardOutcome::Closed;
                }
                let _ = tx.send(sse_done_frame()).await;
                ForwardOutcome::Closed
            }
        },
        None => {
            warn!(event = "upstream_frame_dropped", payload_len = payload.len());
            ForwardOutcome::Continue
        }
    }
}

/// Priming-phase payload handling: frames are staged, not written, and an
/// upstream error aborts the whole staging buffer.
fn stage_payload(
    payload: &str,
    bridge: &mut AzureStreamBridge,
    staged: &mut Vec<Bytes>,
) -> Result<(), JsonValue> {
    match decode_frame(payload) {
        Some(StreamFrame::Done) => {
            finish_stream(bridge, staged);
            Ok(())
        }
        Some(StreamFrame::Chunk(chunk)) => match bridge.push(*chunk) {
            Ok(chunks) => {
                for chunk in chunks {
                    if let Some(frame) = sse_json_frame(&chunk) {
                        staged.push(frame);
                    }
                }
                Ok(())
            }
            Err(err) => Err(err.detail),
        },
        None => {
            warn!(event = "upstream_frame_dropped", payload_len = payload.len());
            Ok(())
        }
    }
}

fn finish_stream(bridge: &mut AzureStreamBridge, staged: &mut Vec<Bytes>) {
    if bridge.is_closed() {
        return;
    }
    for chunk in bridge.finish() {
        if let Some(frame) = sse_json_frame(&chunk) {
            staged.push(frame);
        }
    }
    staged.push(sse_done_frame());
}

fn expect_buffered(
    resp: UpstreamHttpResponse,
) -> Result<(Vec<(String, String)>, Bytes), ProxyError> {
    match resp.body {
        UpstreamBody::Bytes(bytes) => Ok((resp.headers, bytes)),
        UpstreamBody::Stream(_) => Err(ProxyError::internal(
            "unexpected streaming body on a buffered call",
        )),
    }
}

fn encode_body<T: serde::Serialize>(value: &T) -> Result<Bytes, ProxyError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|err| ProxyError::internal(format!("request encoding failed: {err}")))
}

fn map_transport_failure(failure: UpstreamFailure) -> ProxyError {
    match failure.kind {
        UpstreamTransportErrorKind::Connect | UpstreamTransportErrorKind::Dns => {
            ProxyError::bad_gateway(format!("upstream unreachable: {}", failure.message))
        }
        UpstreamTransportErrorKind::Timeout | UpstreamTransportErrorKind::ReadTimeout => {
            ProxyError::gateway_timeout(format!("upstream timed out: {}", failure.message))
        }
        UpstreamTransportErrorKind::Tls | UpstreamTransportErrorKind::Other => {
            ProxyError::internal(format!("upstream request failed: {}", failure.message))
        }
    }
}
