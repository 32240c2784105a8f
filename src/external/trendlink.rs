use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://api.trendlink.com/v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hard caps on the formatted output, regardless of what the API returns.
const MAX_TRENDS: usize = 5;
const MAX_SOURCES: usize = 3;

/// Sentinel text for an empty or missing trend list. Deliberately not an
/// error — the caller relays it to the model as-is.
pub const NO_TREND_DATA: &str = "Keine Trend-Daten verfügbar";

#[derive(Debug, Error)]
pub enum TrendlinkError {
    #[error("TRENDLINK_API_TOKEN is not configured")]
    MissingToken,

    #[error("request to Trendlink failed: {0}")]
    Request(String),

    #[error("Trendlink returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to parse Trendlink response: {0}")]
    Parse(String),
}

/// How the API token travels. The provider accepted both transports at
/// different times, so this stays configurable instead of hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `?token=…` query parameter (the provider's current preference).
    QueryParam,
    /// `Authorization: Bearer …` header.
    BearerHeader,
}

#[derive(Debug, Clone)]
pub struct TrendlinkConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub auth_style: AuthStyle,
}

impl TrendlinkConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("TRENDLINK_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_token: std::env::var("TRENDLINK_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            auth_style: match std::env::var("TRENDLINK_AUTH_STYLE").as_deref() {
                Ok("header") => AuthStyle::BearerHeader,
                _ => AuthStyle::QueryParam,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CuratedTrendsResponse {
    trends: Option<Vec<CuratedTrend>>,
}

#[derive(Debug, Deserialize)]
struct CuratedTrend {
    name: Option<String>,
    score: Option<f64>,
    category: Option<String>,
    date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    sources: Vec<TrendSource>,
}

#[derive(Debug, Deserialize)]
struct TrendSource {
    name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendCatalogResponse {
    trends: Option<Vec<CatalogTrend>>,
}

#[derive(Debug, Deserialize)]
struct CatalogTrend {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    instruments: Vec<TrendInstrument>,
}

#[derive(Debug, Deserialize)]
struct TrendInstrument {
    isin: Option<String>,
    weighting: Option<String>,
    #[serde(default)]
    preferred: bool,
}

/// Trait for trend-data providers.
///
/// Both operations return pre-formatted German text blocks ready for prompt
/// injection, not raw structures. Network and parse failures surface as
/// [`TrendlinkError`]; an empty result set does not.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    /// Fetch the provider-curated trend list, newest first.
    async fn fetch_curated_trends(&self, limit: usize) -> Result<String, TrendlinkError>;

    /// Resolve `trend_name` against the trend catalog and format the matched
    /// trend's top instruments.
    async fn fetch_trend_instruments(&self, trend_name: &str) -> Result<String, TrendlinkError>;
}

/// Client for the Trendlink REST API.
pub struct TrendlinkClient {
    client: reqwest::Client,
    config: TrendlinkConfig,
}

impl TrendlinkClient {
    pub fn new(config: TrendlinkConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build Trendlink HTTP client");

        Self { client, config }
    }

    fn token(&self) -> Result<&str, TrendlinkError> {
        self.config
            .api_token
            .as_deref()
            .ok_or(TrendlinkError::MissingToken)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TrendlinkError> {
        // Token check happens before any I/O.
        let token = self.token()?;

        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.client.get(&url).query(params);
        request = match self.config.auth_style {
            AuthStyle::QueryParam => request.query(&[("token", token)]),
            AuthStyle::BearerHeader => request.bearer_auth(token),
        };

        let response = request
            .send()
            .await
            .map_err(|e| TrendlinkError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrendlinkError::Status(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TrendlinkError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TrendProvider for TrendlinkClient {
    async fn fetch_curated_trends(&self, limit: usize) -> Result<String, TrendlinkError> {
        info!("Fetching curated trends from Trendlink (limit: {})", limit);

        let limit_param = limit.to_string();
        let body: CuratedTrendsResponse = self
            .get_json(
                "trends/curated",
                &[("limit", limit_param.as_str()), ("sort", "date_desc")],
            )
            .await?;

        Ok(format_curated_trends(&body))
    }

    // The catalog endpoint does not filter server-side; matching happens
    // here, in provider-supplied order.
    async fn fetch_trend_instruments(&self, trend_name: &str) -> Result<String, TrendlinkError> {
        info!("Fetching trend catalog from Trendlink for '{}'", trend_name);

        let body: TrendCatalogResponse = self
            .get_json("trends", &[("nice5", "true"), ("lang", "de")])
            .await?;

        let trends = body.trends.unwrap_or_default();
        match find_trend(&trends, trend_name) {
            Some(trend) => Ok(format_trend_instruments(trend)),
            None => Ok(format!("Kein Trend zu '{}' gefunden", trend_name)),
        }
    }
}

/// Pick the first catalog trend matching the query: case-insensitive
/// substring on the name, else word-boundary match on the description, else
/// on any synonym. Search stops at the first hit.
fn find_trend<'a>(trends: &'a [CatalogTrend], query: &str) -> Option<&'a CatalogTrend> {
    let needle = query.to_lowercase();
    // The open character class tolerates German suffixes and plurals
    // ("wasserstoff" also hits "wasserstoffaktien").
    let pattern = Regex::new(&format!(r"\b{}[a-zäöüß]*", regex::escape(&needle))).ok()?;

    trends.iter().find(|trend| {
        if trend
            .name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&needle))
        {
            return true;
        }
        if trend
            .description
            .as_deref()
            .is_some_and(|description| pattern.is_match(&description.to_lowercase()))
        {
            return true;
        }
        trend
            .synonyms
            .iter()
            .any(|synonym| pattern.is_match(&synonym.to_lowercase()))
    })
}

fn format_curated_trends(body: &CuratedTrendsResponse) -> String {
    let trends = match &body.trends {
        Some(trends) if !trends.is_empty() => trends,
        _ => return NO_TREND_DATA.to_string(),
    };

    let shown = &trends[..trends.len().min(MAX_TRENDS)];
    let mut out = String::from("=== AKTUELLE KURATIERTE TRENDS ===\n\n");

    for (i, trend) in shown.iter().enumerate() {
        let name = trend.name.as_deref().unwrap_or("Unbekannter Trend");
        let category = trend.category.as_deref().unwrap_or("Allgemein");
        let score = trend
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let date = match trend.date.as_deref().filter(|d| !d.is_empty()) {
            Some(raw) => format_trend_date(raw),
            None => "Unbekanntes Datum".to_string(),
        };
        let description = trend
            .description
            .as_deref()
            .unwrap_or("Keine Beschreibung verfügbar");

        out.push_str(&format!("{}. {} ({})\n", i + 1, name, category));
        out.push_str(&format!("   Relevanz-Score: {}\n", score));
        out.push_str(&format!("   Datum: {}\n", date));
        out.push_str(&format!("   Beschreibung: {}\n", description));

        if !trend.sources.is_empty() {
            out.push_str("   Quellen:\n");
            for source in trend.sources.iter().take(MAX_SOURCES) {
                out.push_str(&format!(
                    "   - {}: {}\n",
                    source.name.as_deref().unwrap_or("Unbekannte Quelle"),
                    source.url.as_deref().unwrap_or("#")
                ));
            }
        }

        if i + 1 < shown.len() {
            out.push_str(&format!("\n{}\n\n", "-".repeat(50)));
        }
    }

    out
}

/// ISO-8601 → `dd.mm.yyyy`; anything unparsable passes through untouched.
fn format_trend_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn format_trend_instruments(trend: &CatalogTrend) -> String {
    let name = trend.name.as_deref().unwrap_or("Unbekannter Trend");
    let mut out = format!("=== TREND: {} ===\n\n", name);

    if let Some(description) = trend.description.as_deref() {
        out.push_str(description);
        out.push_str("\n\n");
    }

    out.push_str("Top-Instrumente:\n");
    for (i, instrument) in trend.instruments.iter().enumerate() {
        let isin = instrument.isin.as_deref().unwrap_or("ISIN unbekannt");
        let weighting = instrument.weighting.as_deref().unwrap_or("N/A");
        let marker = if instrument.preferred {
            " ★ Nice-5-Empfehlung"
        } else {
            ""
        };
        out.push_str(&format!(
            "{}. ISIN: {} | Gewichtung: {}{}\n",
            i + 1,
            isin,
            weighting,
            marker
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_curated_response() -> CuratedTrendsResponse {
        serde_json::from_value(json!({
            "trends": [
                {
                    "name": "Künstliche Intelligenz im Gesundheitswesen",
                    "score": 95,
                    "category": "Technologie",
                    "date": "2023-05-15T10:30:00Z",
                    "description": "KI wird zunehmend im Gesundheitswesen eingesetzt.",
                    "sources": [
                        { "name": "HealthTech Journal", "url": "https://healthtech-journal.com/ai" }
                    ]
                },
                {
                    "name": "Nachhaltiger E-Commerce",
                    "score": 87,
                    "category": "Wirtschaft",
                    "date": "2023-05-10T08:45:00Z",
                    "description": "Online-Händler setzen auf nachhaltige Verpackungen.",
                    "sources": [
                        { "name": "E-Commerce Today", "url": "https://ecommerce-today.com/sustainable" }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_format_curated_trends() {
        let formatted = format_curated_trends(&sample_curated_response());

        assert!(formatted.starts_with("=== AKTUELLE KURATIERTE TRENDS ==="));
        assert!(formatted.contains("1. Künstliche Intelligenz im Gesundheitswesen (Technologie)"));
        assert!(formatted.contains("Relevanz-Score: 95"));
        assert!(formatted.contains("2. Nachhaltiger E-Commerce (Wirtschaft)"));
        assert!(formatted.contains("Relevanz-Score: 87"));
        assert!(formatted.contains("Datum: 15.05.2023"));
        assert!(formatted.contains("Quellen:"));
        assert!(formatted.contains("- HealthTech Journal: https://healthtech-journal.com/ai"));
    }

    #[test]
    fn test_format_curated_trends_empty() {
        let empty: CuratedTrendsResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(format_curated_trends(&empty), NO_TREND_DATA);

        let empty_list: CuratedTrendsResponse =
            serde_json::from_value(json!({ "trends": [] })).unwrap();
        assert_eq!(format_curated_trends(&empty_list), NO_TREND_DATA);
    }

    #[test]
    fn test_format_curated_trends_caps_entries_and_sources() {
        let many_sources: Vec<_> = (0..6)
            .map(|i| json!({ "name": format!("Quelle {}", i), "url": "https://example.com" }))
            .collect();
        let trends: Vec<_> = (0..8)
            .map(|i| {
                json!({
                    "name": format!("Trend {}", i),
                    "score": 50,
                    "category": "Test",
                    "date": "2023-01-01T00:00:00Z",
                    "description": "Testbeschreibung",
                    "sources": many_sources
                })
            })
            .collect();
        let body: CuratedTrendsResponse =
            serde_json::from_value(json!({ "trends": trends })).unwrap();

        let formatted = format_curated_trends(&body);

        assert!(formatted.contains("5. Trend 4"));
        assert!(!formatted.contains("6. Trend 5"));
        // 5 entries × 3 sources, never more
        assert_eq!(formatted.matches("- Quelle").count(), 15);
        assert!(formatted.contains("- Quelle 2:"));
        assert!(!formatted.contains("- Quelle 3:"));
    }

    #[test]
    fn test_date_reformatting() {
        assert_eq!(format_trend_date("2023-05-15T10:30:00Z"), "15.05.2023");
        assert_eq!(format_trend_date("irgendwann 2023"), "irgendwann 2023");
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let body: CuratedTrendsResponse =
            serde_json::from_value(json!({ "trends": [{}] })).unwrap();
        let formatted = format_curated_trends(&body);

        assert!(formatted.contains("1. Unbekannter Trend (Allgemein)"));
        assert!(formatted.contains("Relevanz-Score: N/A"));
        assert!(formatted.contains("Datum: Unbekanntes Datum"));
        assert!(formatted.contains("Beschreibung: Keine Beschreibung verfügbar"));
    }

    fn sample_catalog() -> Vec<CatalogTrend> {
        serde_json::from_value(json!([
            {
                "name": "Wasserstoff",
                "description": "Brennstoffzellen und grüne Energie",
                "synonyms": ["H2-Wirtschaft"],
                "instruments": [
                    { "isin": "DE000A0D6554", "weighting": "hoch", "preferred": true },
                    { "isin": "US68370D4079", "weighting": "mittel" }
                ]
            },
            {
                "name": "Robotik",
                "description": "Automatisierung in der Industrie, auch Wasserstoffantriebe",
                "synonyms": ["Automation"],
                "instruments": [
                    { "isin": "JP3970300004", "weighting": "hoch" }
                ]
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_find_trend_by_name_substring() {
        let catalog = sample_catalog();
        let found = find_trend(&catalog, "wasserstoff").unwrap();
        assert_eq!(found.name.as_deref(), Some("Wasserstoff"));
    }

    #[test]
    fn test_find_trend_provider_order_wins() {
        // Both trends mention Wasserstoff; the first in provider order is
        // selected even though the second also matches.
        let catalog = sample_catalog();
        let found = find_trend(&catalog, "wasserstoff").unwrap();
        assert_eq!(found.name.as_deref(), Some("Wasserstoff"));
    }

    #[test]
    fn test_find_trend_by_description() {
        let catalog = sample_catalog();
        let found = find_trend(&catalog, "automatisierung").unwrap();
        assert_eq!(found.name.as_deref(), Some("Robotik"));
    }

    #[test]
    fn test_find_trend_by_synonym() {
        let catalog = sample_catalog();
        let found = find_trend(&catalog, "automation").unwrap();
        assert_eq!(found.name.as_deref(), Some("Robotik"));
    }

    #[test]
    fn test_find_trend_tolerates_suffixes() {
        // "brennstoffzelle" matches "Brennstoffzellen" in the description.
        let catalog = sample_catalog();
        let found = find_trend(&catalog, "brennstoffzelle").unwrap();
        assert_eq!(found.name.as_deref(), Some("Wasserstoff"));
    }

    #[test]
    fn test_find_trend_no_match() {
        let catalog = sample_catalog();
        assert!(find_trend(&catalog, "quantencomputer").is_none());
    }

    #[test]
    fn test_format_trend_instruments() {
        let catalog = sample_catalog();
        let formatted = format_trend_instruments(&catalog[0]);

        assert!(formatted.starts_with("=== TREND: Wasserstoff ==="));
        assert!(formatted.contains("Brennstoffzellen und grüne Energie"));
        assert!(formatted.contains("1. ISIN: DE000A0D6554 | Gewichtung: hoch ★ Nice-5-Empfehlung"));
        assert!(formatted.contains("2. ISIN: US68370D4079 | Gewichtung: mittel\n"));
        assert!(!formatted.contains("2. ISIN: US68370D4079 | Gewichtung: mittel ★"));
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        let client = TrendlinkClient::new(TrendlinkConfig {
            base_url: "http://127.0.0.1:0".to_string(),
            api_token: None,
            auth_style: AuthStyle::QueryParam,
        });

        let err = client.fetch_curated_trends(5).await.unwrap_err();
        assert!(matches!(err, TrendlinkError::MissingToken));

        let err = client.fetch_trend_instruments("wasserstoff").await.unwrap_err();
        assert!(matches!(err, TrendlinkError::MissingToken));
    }

}
