use serde::{Deserialize, Serialize};

/// Inbound chat body. `message` stays optional so a missing key surfaces as
/// a validation error instead of a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// How the inbound message was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    CuratedTrends,
    TrendInstruments,
    GeneralFinance,
    OffTopic,
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryType::CuratedTrends => write!(f, "curated_trends"),
            QueryType::TrendInstruments => write!(f, "trend_instruments"),
            QueryType::GeneralFinance => write!(f, "general_finance"),
            QueryType::OffTopic => write!(f, "off_topic"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The model's text answer (or the fixed decline text).
    pub response: String,
    /// True iff trend-provider data was successfully folded into the prompt.
    pub has_trend_data: bool,
    pub query_type: QueryType,
}
