mod chat;

pub use chat::{ChatRequest, ChatResponse, QueryType};
