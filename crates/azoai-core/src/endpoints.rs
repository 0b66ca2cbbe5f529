/// The declarative binding between the Azure-shaped deployment operations
/// and the upstream custom API paths. Body shaping per endpoint lives in
/// `azoai-transform`; this table only answers "where does it go".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatCompletions,
    /// Legacy completions surface, rewritten to chat internally.
    Completions,
    ImageGenerations,
    Embeddings,
}

impl Endpoint {
    /// Match the path suffix after `/deployments/{deployment}/`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.trim_matches('/') {
            "chat/completions" => Some(Self::ChatCompletions),
            "completions" => Some(Self::Completions),
            "images/generations" => Some(Self::ImageGenerations),
            "embeddings" => Some(Self::Embeddings),
            _ => None,
        }
    }

    pub fn upstream_path(self) -> &'static str {
        match self {
            Self::ChatCompletions | Self::Completions => "/chatgpt/v1/completions",
            Self::ImageGenerations => "/ai/v1/images/generations",
            Self::Embeddings => "/ai/v1/embeddings",
        }
    }
}

/// Advertised in the 404 envelope for unknown paths.
pub const SUPPORTED_ENDPOINTS: [&str; 5] = [
    "POST /proxyapi/azurecom/openai/deployments/{deployment}/chat/completions",
    "POST /proxyapi/azurecom/openai/deployments/{deployment}/completions",
    "POST /proxyapi/azurecom/openai/deployments/{deployment}/images/generations",
    "POST /proxyapi/azurecom/openai/deployments/{deployment}/embeddings",
    "GET /health",
];
