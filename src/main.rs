use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use trendlink_chatbot::app;
use trendlink_chatbot::external::trendlink::{TrendlinkClient, TrendlinkConfig};
use trendlink_chatbot::logging::{self, LoggingConfig};
use trendlink_chatbot::services::chat_service::ChatService;
use trendlink_chatbot::services::classifier::{ClassifierRules, QueryClassifier};
use trendlink_chatbot::services::llm_service::{LlmConfig, OpenAiProvider};
use trendlink_chatbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    logging::init_logging(LoggingConfig::from_env())?;

    let llm_config = LlmConfig::from_env();
    let trendlink_config = TrendlinkConfig::from_env();

    if llm_config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; chat requests will fail");
    }
    if trendlink_config.api_token.is_none() {
        tracing::warn!("TRENDLINK_API_TOKEN is not set; trend data will be unavailable");
    }

    let chat_service = ChatService::new(
        QueryClassifier::new(ClassifierRules::default()),
        Arc::new(TrendlinkClient::new(trendlink_config)),
        Arc::new(OpenAiProvider::new(llm_config)),
    );

    let state = AppState {
        chat_service: Arc::new(chat_service),
    };
    let app = app::create_app(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("🚀 Trendlink chatbot running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
