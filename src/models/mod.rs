pub mod chat;

pub use chat::{
    resolve_model, sanitize_history, ChatRequest, ChatResponse, ErrorResponse, ModelDescriptor,
    ProviderKind, Turn, HISTORY_LIMIT, THINKING_MODEL,
};
