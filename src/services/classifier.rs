use regex::Regex;

/// Intent flags derived from a single inbound chat message.
///
/// Purely lexical: the flags are a function of the message text and the
/// configured [`ClassifierRules`], nothing else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub is_finance_related: bool,
    pub is_trend_query: bool,
    pub is_trend_stock_query: bool,
    /// Topic captured from an instrument-request phrasing, whitespace-trimmed.
    pub trend_name: Option<String>,
}

/// The classification ruleset as data: keyword lists plus an ordered list of
/// instrument-request patterns. Pattern order is significant — the first
/// matching pattern wins.
pub struct ClassifierRules {
    /// Terms that must occur (as lowercase substrings) for a message to be
    /// considered on-topic at all.
    pub finance_vocabulary: Vec<&'static str>,
    /// Terms that mark a general trend/market question.
    pub trend_keywords: Vec<&'static str>,
    /// Phrasings like "top 5 aktien für wasserstoff"; capture group 1 is the
    /// requested topic.
    pub instrument_patterns: Vec<Regex>,
}

// The deployment is German-speaking, but users mix in English finance terms
// all the time, so both languages are listed.
const FINANCE_VOCABULARY: &[&str] = &[
    "aktie",
    "börse",
    "fonds",
    "etf",
    "dividende",
    "krypto",
    "bitcoin",
    "anleihe",
    "zins",
    "depot",
    "portfolio",
    "wertpapier",
    "geldanlage",
    "invest",
    "finanz",
    "trend",
    "markt",
    "wirtschaft",
    "stock",
    "share",
    "exchange",
    "fund",
    "dividend",
    "crypto",
    "market",
    "economy",
    "finance",
];

const TREND_KEYWORDS: &[&str] = &[
    "trend",
    "aktuell",
    "neueste",
    "neu",
    "markt",
    "wirtschaft",
    "entwicklung",
    "zukunft",
    "current",
    "latest",
    "market",
    "economy",
    "development",
    "future",
];

const INSTRUMENT_PATTERNS: &[&str] = &[
    r"(?:top|die\s+besten?)\s+\d+\s+(?:aktien|fonds|etfs?|wertpapiere|titel)\s+(?:für|im\s+bereich|in|zum\s+thema|aus)\s+(.+?)[\s?.!]*$",
    r"(?:empfiehl|empfehle|empfehlen\s+sie|nenne)\s+(?:mir\s+)?(?:die\s+)?(?:\d+\s+)?(?:besten\s+)?(?:aktien|fonds|etfs?)\s+(?:für|zu|zum\s+thema|im\s+bereich)\s+(.+?)[\s?.!]*$",
    r"welche\s+(?:aktien|fonds|etfs?|instrumente|titel)\s+(?:gehören|passen)\s+zum?\s+(?:trend\s+)?(.+?)[\s?.!]*$",
    r"(?:top|best)\s+\d+\s+(?:stocks|funds|etfs?)\s+(?:for|in)\s+(.+?)[\s?.!]*$",
];

impl Default for ClassifierRules {
    fn default() -> Self {
        let instrument_patterns = INSTRUMENT_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("invalid built-in instrument pattern"))
            .collect();

        Self {
            finance_vocabulary: FINANCE_VOCABULARY.to_vec(),
            trend_keywords: TREND_KEYWORDS.to_vec(),
            instrument_patterns,
        }
    }
}

/// Keyword/regex intent classifier. Deterministic and order-sensitive by
/// design — only pre-enumerated phrasings are recognized.
pub struct QueryClassifier {
    rules: ClassifierRules,
}

impl QueryClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();
        let mut result = Classification::default();

        result.is_finance_related = self
            .rules
            .finance_vocabulary
            .iter()
            .any(|term| lower.contains(term));
        if !result.is_finance_related {
            // Off-topic: no provider call, no LLM call.
            return result;
        }

        for pattern in &self.rules.instrument_patterns {
            if let Some(caps) = pattern.captures(&lower) {
                result.is_trend_stock_query = true;
                result.trend_name = caps.get(1).map(|m| m.as_str().trim().to_string());
                // General trend detection is skipped for instrument requests.
                return result;
            }
        }

        result.is_trend_query = self
            .rules
            .trend_keywords
            .iter()
            .any(|term| lower.contains(term));

        result
    }
}
