use serde_json::Value as JsonValue;

use azoai_protocol::azure::chat_completions::response::PromptFilterResult;
use azoai_protocol::azure::chat_completions::stream::{
    ChatCompletionChunk, ChunkChoice, ChunkDelta, ChunkObjectType,
};
use azoai_protocol::{ContentFilterResults, CustomChunk, CustomChunkChoice, FinishReason};

use crate::helpers::{new_completion_id, now_epoch_seconds};

/// One logical upstream SSE event after frame extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    Chunk(Box<CustomChunk>),
    Done,
}

/// Decode a `data:` payload. `None` means the payload was not parseable;
/// the caller logs and drops it without aborting the stream.
pub fn decode_frame(payload: &str) -> Option<StreamFrame> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == "[DONE]" {
        return Some(StreamFrame::Done);
    }
    serde_json::from_str::<CustomChunk>(payload)
        .ok()
        .map(|chunk| StreamFrame::Chunk(Box::new(chunk)))
}

/// The upstream reported a failure inside the stream. Whether this becomes
/// a buffered error response or a terminal in-stream frame depends on how
/// much the bridge already emitted; the caller decides.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamStreamError {
    pub detail: JsonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BridgePhase {
    Init,
    RoleSent,
    Content,
    Final,
    Closed,
}

/// Per-stream rewrapper: consumes upstream chunks, produces Azure chunks.
///
/// `id`, `created` and `model` are pinned when the first chunk arrives and
/// never change afterwards, so every emitted chunk of one stream agrees.
/// Even an upstream that already speaks the Azure shape is re-validated and
/// rewrapped through this machine; forwarding verbatim could violate the
/// single-finish and stable-identity guarantees.
#[derive(Debug)]
pub struct AzureStreamBridge {
    deployment: String,
    fingerprint: String,
    phase: BridgePhase,
    id: Option<String>,
    created: Option<i64>,
    model: Option<String>,
    upstream_fingerprint: Option<String>,
    emitted_chunks: usize,
    content_emitted: bool,
}

impl AzureStreamBridge {
    pub fn new(deployment: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
            fingerprint: fingerprint.into(),
            phase: BridgePhase::Init,
            id: None,
            created: None,
            model: None,
            upstream_fingerprint: None,
            emitted_chunks: 0,
            content_emitted: false,
        }
    }

    /// True once any Azure chunk has been produced; after that point errors
    /// can no longer become a buffered HTTP response.
    pub fn emitted_any(&self) -> bool {
        self.emitted_chunks > 0
    }

    pub fn content_emitted(&self) -> bool {
        self.content_emitted
    }

    pub fn is_closed(&self) -> bool {
        self.phase == BridgePhase::Closed
    }

    /// Feed one upstream chunk through the state machine.
    pub fn push(
        &mut self,
        chunk: CustomChunk,
    ) -> Result<Vec<ChatCompletionChunk>, UpstreamStreamError> {
        if self.phase == BridgePhase::Closed {
            return Ok(Vec::new());
        }
        if let Some(detail) = chunk.error {
            return Err(UpstreamStreamError { detail });
        }

        self.pin_identity(&chunk);

        // Leading filter-check event: prompt results, no choices. Rewrapped
        // under the stream identity; never synthesized when absent upstream.
        if chunk.choices.is_empty() {
            if let Some(filters) = chunk.prompt_filter_results {
                return Ok(vec![self.prompt_filter_chunk(filters)]);
            }
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for choice in chunk.choices {
            self.rewrap_choice(choice, &mut out);
        }
        self.emitted_chunks += out.len();
        Ok(out)
    }

    /// Terminate without synthesizing anything further; used after an
    /// in-stream error has already been reported to the client.
    pub fn close(&mut self) {
        self.phase = BridgePhase::Closed;
    }

    /// End of upstream input, via `[DONE]` or EOF. A stream that never saw a
    /// finish chunk gets one synthesized so the client always observes a
    /// terminal `finish_reason`.
    pub fn finish(&mut self) -> Vec<ChatCompletionChunk> {
        if self.phase == BridgePhase::Closed {
            return Vec::new();
        }
        let mut out = Vec::new();
        if self.phase != BridgePhase::Final {
            out.push(self.final_chunk(0, FinishReason::Stop));
            self.emitted_chunks += 1;
        }
        self.phase = BridgePhase::Closed;
        out
    }

    fn rewrap_choice(&mut self, choice: CustomChunkChoice, out: &mut Vec<ChatCompletionChunk>) {
        let index = choice.index.unwrap_or(0);
        let delta = choice.delta;

        if delta.role.is_some() && self.phase == BridgePhase::Init {
            out.push(self.role_chunk(index));
            self.phase = BridgePhase::RoleSent;
        }

        if let Some(content) = delta.content {
            // Some upstreams skip the role announcement; synthesize it so
            // the client still sees role before content.
            if self.phase == BridgePhase::Init {
                out.push(self.role_chunk(index));
                self.phase = BridgePhase::RoleSent;
            }
            out.push(self.content_chunk(index, content));
            self.phase = BridgePhase::Content;
            self.content_emitted = true;
        }

        if delta.tool_calls.is_some() || !delta.extra.is_empty() {
            let wrapped = ChunkDelta {
                tool_calls: delta.tool_calls,
                extra: delta.extra,
                ..ChunkDelta::default()
            };
            out.push(self.delta_chunk(index, wrapped, None, ContentFilterResults::empty()));
            if self.phase == BridgePhase::Init {
                self.phase = BridgePhase::RoleSent;
            }
        }

        if let Some(reason) = choice.finish_reason
            && self.phase != BridgePhase::Final
        {
            out.push(self.final_chunk(index, reason));
            self.phase = BridgePhase::Final;
        }
    }

    fn pin_identity(&mut self, chunk: &CustomChunk) {
        if self.id.is_none()
            && let Some(id) = &chunk.id
        {
            self.id = Some(id.clone());
        }
        if self.created.is_none()
            && let Some(created) = chunk.created
        {
            self.created = Some(created);
        }
        if self.model.is_none()
            && let Some(model) = &chunk.model
        {
            self.model = Some(model.clone());
        }
        if self.upstream_fingerprint.is_none()
            && let Some(fingerprint) = &chunk.system_fingerprint
        {
            self.upstream_fingerprint = Some(fingerprint.clone());
        }
    }

    fn role_chunk(&mut self, index: i64) -> ChatCompletionChunk {
        let delta = ChunkDelta {
            role: Some("assistant".to_string()),
            content: Some(String::new()),
            ..ChunkDelta::default()
        };
        self.delta_chunk(index, delta, None, ContentFilterResults::empty())
    }

    fn content_chunk(&mut self, index: i64, content: String) -> ChatCompletionChunk {
        let delta = ChunkDelta {
            content: Some(content),
            ..ChunkDelta::default()
        };
        self.delta_chunk(index, delta, None, ContentFilterResults::safe())
    }

    fn final_chunk(&mut self, index: i64, reason: FinishReason) -> ChatCompletionChunk {
        self.delta_chunk(
            index,
            ChunkDelta::default(),
            Some(reason),
            ContentFilterResults::empty(),
        )
    }

    fn delta_chunk(
        &mut self,
        index: i64,
        delta: ChunkDelta,
        finish_reason: Option<FinishReason>,
        content_filter_results: ContentFilterResults,
    ) -> ChatCompletionChunk {
        let mut chunk = self.envelope();
        chunk.choices.push(ChunkChoice {
            index,
            delta,
            finish_reason,
            logprobs: None,
            content_filter_results,
        });
        chunk
    }

    fn prompt_filter_chunk(&mut self, filters: Vec<PromptFilterResult>) -> ChatCompletionChunk {
        let mut chunk = self.envelope();
        chunk.prompt_filter_results = Some(filters);
        self.emitted_chunks += 1;
        chunk
    }

    fn envelope(&mut self) -> ChatCompletionChunk {
        let id = self
            .id
            .get_or_insert_with(new_completion_id)
            .clone();
        let created = *self.created.get_or_insert_with(now_epoch_seconds);
        ChatCompletionChunk {
            id,
            object: ChunkObjectType::ChatCompletionChunk,
            created,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| self.deployment.clone()),
            system_fingerprint: self
                .upstream_fingerprint
                .clone()
                .unwrap_or_else(|| self.fingerprint.clone()),
            choices: Vec::new(),
            prompt_filter_results: None,
        }
    }
}
