//! Payload, filter and result models shared by the indexing and query paths.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::message::{Message, parse_when};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Metadata stored next to every embedded message. Exactly these four fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub sender: String,
    /// Weekday-qualified date, e.g. "Monday, 05 January 2024".
    pub when: String,
    /// Raw message text.
    pub content: String,
    /// The embedded rich content, kept for display.
    pub document: String,
}

impl MessagePayload {
    /// Parsed `when` field.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_when(&self.when)
    }
}

impl From<&Message> for MessagePayload {
    fn from(msg: &Message) -> Self {
        Self {
            sender: msg.sender().to_string(),
            when: msg.when(),
            content: msg.content().to_string(),
            document: msg.rich_content().to_string(),
        }
    }
}

/// Optional restrictions applied to a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilter {
    /// Exact sender name.
    pub sender_equals: Option<String>,
    /// Keep messages strictly before this date.
    pub date_before: Option<NaiveDate>,
    /// Keep messages strictly after this date.
    pub date_after: Option<NaiveDate>,
}

impl MessageFilter {
    pub fn is_empty(&self) -> bool {
        self.sender_equals.is_none() && !self.has_date_bounds()
    }

    pub fn has_date_bounds(&self) -> bool {
        self.date_before.is_some() || self.date_after.is_some()
    }

    /// Whether a hit satisfies the date bounds. Hits with an unreadable
    /// `when` never match a bounded filter.
    pub fn matches_dates(&self, payload: &MessagePayload) -> bool {
        if !self.has_date_bounds() {
            return true;
        }
        let Some(date) = payload.date() else {
            return false;
        };
        self.date_before.is_none_or(|before| date < before)
            && self.date_after.is_none_or(|after| date > after)
    }
}

/// One ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Point id in the collection.
    pub id: String,
    /// Similarity score
    pub score: f32,
    pub payload: MessagePayload,
}

/// Collection of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that was executed
    pub query: String,

    /// Ranked hits
    pub hits: Vec<SearchHit>,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn new(query: String, hits: Vec<SearchHit>, duration_ms: u64) -> Self {
        Self {
            query,
            hits,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}
