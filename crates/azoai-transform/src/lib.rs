pub mod chat;
pub mod embeddings;
pub mod helpers;
pub mod images;
pub mod legacy;
pub mod stream;

pub use chat::request::to_upstream_chat_body;
pub use chat::response::to_azure_chat_completion;
pub use embeddings::{normalize_embeddings_response, to_upstream_embeddings_body};
pub use images::{normalize_image_response, to_upstream_image_body};
pub use legacy::{chat_to_text_completion, completion_to_chat_body};
pub use stream::{AzureStreamBridge, StreamFrame, UpstreamStreamError, decode_frame};
