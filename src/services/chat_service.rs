use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::trendlink::TrendProvider;
use crate::models::{ChatResponse, QueryType};
use crate::services::classifier::{Classification, QueryClassifier};
use crate::services::llm_service::LlmProvider;

/// Fixed persona instruction sent as the first message of every completion
/// request. Strict by intent: trend answers come from the supplied Trendlink
/// data only.
pub const PERSONA_PROMPT: &str = "Du bist ein Finanz-Assistent mit Zugriff auf aktuelle \
Markttrend-Daten von Trendlink. Beantworte ausschließlich Fragen zu Finanzthemen, Märkten \
und Trends. Bei Fragen zu Trends stützt du dich ausschließlich auf die bereitgestellten \
Trendlink-Daten und greifst nicht auf allgemeines Weltwissen zurück. Gib keine \
Anlageberatung und keine Kauf- oder Verkaufsempfehlungen.";

/// Canned reply for messages outside the finance/trend domain. Sent without
/// touching the trend provider or the LLM.
pub const OFF_TOPIC_REPLY: &str = "Entschuldigung, dazu kann ich nichts sagen. Ich beantworte \
ausschließlich Fragen zu Finanzthemen, Märkten und aktuellen Trends.";

/// Orchestrates one chat turn: classify, optionally fetch trend data, build
/// the system prompt, relay to the LLM.
pub struct ChatService {
    classifier: QueryClassifier,
    trendlink: Arc<dyn TrendProvider>,
    llm: Arc<dyn LlmProvider>,
}

impl ChatService {
    pub fn new(
        classifier: QueryClassifier,
        trendlink: Arc<dyn TrendProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            classifier,
            trendlink,
            llm,
        }
    }

    pub async fn handle_message(&self, message: &str) -> Result<ChatResponse, AppError> {
        let classification = self.classifier.classify(message);

        if !classification.is_finance_related {
            info!("Off-topic message, declining without provider or LLM call");
            return Ok(ChatResponse {
                response: OFF_TOPIC_REPLY.to_string(),
                has_trend_data: false,
                query_type: QueryType::OffTopic,
            });
        }

        let context = self.assemble_context(&classification).await;
        let response = self.llm.complete(message, &context.system_prompt).await?;

        Ok(ChatResponse {
            response,
            has_trend_data: context.has_trend_data,
            query_type: context.query_type,
        })
    }

    /// Decide which provider call (if any) to make and build the system
    /// prompt. Provider failures are absorbed into caveat text here — they
    /// never abort the chat turn.
    async fn assemble_context(&self, classification: &Classification) -> AssembledContext {
        let mut system_prompt = String::from(PERSONA_PROMPT);

        if classification.is_trend_stock_query {
            if let Some(name) = classification.trend_name.as_deref().filter(|n| !n.is_empty()) {
                match self.trendlink.fetch_trend_instruments(name).await {
                    Ok(data) => {
                        info!("Instrument data fetched for trend '{}'", name);
                        system_prompt.push_str(&format!(
                            "\n\nTop-Instrumente im Trend '{}':\n\n{}\n\nStütze deine Antwort \
                             ausschließlich auf diese Instrumentendaten.",
                            name, data
                        ));
                        return AssembledContext {
                            system_prompt,
                            has_trend_data: !data.is_empty(),
                            query_type: QueryType::TrendInstruments,
                        };
                    }
                    Err(e) => {
                        warn!("Failed to fetch instruments for trend '{}': {}", name, e);
                        system_prompt.push_str(&format!(
                            "\n\nZum Trend '{}' konnten keine Instrumentendaten abgerufen \
                             werden. Teile dem Nutzer höflich mit, dass aktuell keine Daten zu \
                             diesem Trend vorliegen.",
                            name
                        ));
                        return AssembledContext {
                            system_prompt,
                            has_trend_data: false,
                            query_type: QueryType::TrendInstruments,
                        };
                    }
                }
            }
        }

        if classification.is_trend_query {
            match self.trendlink.fetch_curated_trends(5).await {
                Ok(data) => {
                    info!("Curated trends fetched for prompt context");
                    system_prompt.push_str(&format!(
                        "\n\nHier sind die neuesten kuratierten Trends von Trendlink:\n\n{}",
                        data
                    ));
                    return AssembledContext {
                        system_prompt,
                        has_trend_data: !data.is_empty(),
                        query_type: QueryType::CuratedTrends,
                    };
                }
                Err(e) => {
                    warn!("Failed to fetch curated trends: {}", e);
                    system_prompt.push_str(
                        "\n\nDie aktuellen Trend-Daten konnten nicht abgerufen werden. Teile \
                         dem Nutzer höflich mit, dass derzeit keine Trend-Daten vorliegen.",
                    );
                    return AssembledContext {
                        system_prompt,
                        has_trend_data: false,
                        query_type: QueryType::CuratedTrends,
                    };
                }
            }
        }

        AssembledContext {
            system_prompt,
            has_trend_data: false,
            query_type: QueryType::GeneralFinance,
        }
    }
}

struct AssembledContext {
    system_prompt: String,
    has_trend_data: bool,
    query_type: QueryType,
}
