use azoai_protocol::azure::chat_completions::response::{
    AssistantMessage, ChatChoice, ChatCompletion, ChatCompletionObjectType, PromptFilterResult,
    Usage,
};
use azoai_protocol::{ContentFilterResults, CustomChatResponse, PromptContentFilterResults};

use crate::helpers::{new_completion_id, now_epoch_seconds};

/// Rewrap a buffered upstream chat result into the Azure envelope.
///
/// The upstream-reported model string wins over the URL deployment so the
/// deployment/model distinction survives; missing ids and timestamps are
/// filled in, and every choice gets the safe filter scaffold.
pub fn to_azure_chat_completion(
    upstream: CustomChatResponse,
    deployment: &str,
    fingerprint: &str,
) -> ChatCompletion {
    let usage = upstream.usage.unwrap_or_default();

    let choices = upstream
        .choices
        .into_iter()
        .enumerate()
        .map(|(position, choice)| ChatChoice {
            index: choice.index.unwrap_or(position as i64),
            message: AssistantMessage {
                role: choice
                    .message
                    .role
                    .unwrap_or_else(|| "assistant".to_string()),
                content: choice.message.content,
                tool_calls: choice.message.tool_calls,
                refusal: None,
                annotations: Vec::new(),
            },
            finish_reason: choice.finish_reason,
            logprobs: None,
            content_filter_results: ContentFilterResults::safe(),
        })
        .collect();

    ChatCompletion {
        id: upstream.id.unwrap_or_else(new_completion_id),
        object: ChatCompletionObjectType::ChatCompletion,
        created: upstream.created.unwrap_or_else(now_epoch_seconds),
        model: upstream
            .model
            .unwrap_or_else(|| deployment.to_string()),
        choices,
        usage: Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            completion_tokens_details: usage.completion_tokens_details.unwrap_or_default(),
            prompt_tokens_details: usage.prompt_tokens_details.unwrap_or_default(),
        },
        system_fingerprint: upstream
            .system_fingerprint
            .unwrap_or_else(|| fingerprint.to_string()),
        prompt_filter_results: vec![PromptFilterResult {
            prompt_index: 0,
            content_filter_results: PromptContentFilterResults::safe(),
        }],
    }
}
