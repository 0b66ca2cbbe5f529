pub mod azure;
pub mod custom;
pub mod sse;

pub use crate::azure::chat_completions::request::{
    ChatCompletionsRequestBody, ChatMessage, ContentPart, ImageUrl, MessageContent,
    StopConfiguration,
};
pub use crate::azure::chat_completions::response::{
    AssistantMessage, ChatChoice, ChatCompletion, ChatCompletionObjectType, CompletionTokensDetails,
    PromptFilterResult, PromptTokensDetails, Usage,
};
pub use crate::azure::chat_completions::stream::{
    ChatCompletionChunk, ChunkChoice, ChunkDelta, ChunkObjectType,
};
pub use crate::azure::completions::{
    CompletionsRequestBody, TextChoice, TextCompletion, TextCompletionObjectType,
};
pub use crate::azure::content_filter::{
    CategoryResult, ContentFilterResults, DetectResult, PromptContentFilterResults, Severity,
};
pub use crate::azure::embeddings::{EmbeddingsInput, EmbeddingsRequestBody};
pub use crate::azure::error::{ErrorDetail, ErrorEnvelope};
pub use crate::azure::images::ImageGenerationRequestBody;
pub use crate::azure::types::{FinishReason, ImageDetail};
pub use crate::custom::chat::{CustomChatResponse, CustomChoice, CustomMessage, CustomUsage};
pub use crate::custom::stream::{CustomChunk, CustomChunkChoice, CustomDelta};
pub use crate::sse::SseLineParser;
