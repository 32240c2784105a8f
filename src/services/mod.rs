pub mod chat_service;
pub mod classifier;
pub mod llm_service;
