use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PublishError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    News,
    RssAtom,
    Searcher,
}

impl QueueName {
    pub const ALL: [QueueName; 3] = [QueueName::News, QueueName::RssAtom, QueueName::Searcher];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::News => "news",
            QueueName::RssAtom => "rss_atom",
            QueueName::Searcher => "searcher",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueName::ALL
            .into_iter()
            .find(|queue| queue.as_str() == s)
            .ok_or_else(|| PublishError::Validation(format!("No schema defined for queue: {}", s)))
    }
}

/// Work item for the keyword news searcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearcherMessage {
    pub project_id: i64,
    pub topic: String,
    pub keyword_id: i64,
    pub keyword: String,
    #[serde(default)]
    pub searches: i64,
}

/// Work item asking the feed worker to refresh one RSS/Atom source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RssAtomMessage {
    pub rss_atom_id: i64,
    pub feed_url: String,
    pub keywords: Vec<String>,
}

/// Work item for a single article URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsMessage {
    pub keyword_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss_atom_id: Option<i64>,
    pub url: String,
}

/// A message together with the queue it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueMessage {
    News(NewsMessage),
    RssAtom(RssAtomMessage),
    Searcher(SearcherMessage),
}

impl QueueMessage {
    pub fn queue(&self) -> QueueName {
        match self {
            QueueMessage::News(_) => QueueName::News,
            QueueMessage::RssAtom(_) => QueueName::RssAtom,
            QueueMessage::Searcher(_) => QueueName::Searcher,
        }
    }

    /// Parses a raw JSON body against the schema of `queue` and validates it.
    pub fn from_json(queue: QueueName, value: serde_json::Value) -> Result<Self, PublishError> {
        let invalid = |e: serde_json::Error| PublishError::Validation(format!("{}: {}", queue, e));
        let message = match queue {
            QueueName::News => QueueMessage::News(serde_json::from_value(value).map_err(invalid)?),
            QueueName::RssAtom => {
                QueueMessage::RssAtom(serde_json::from_value(value).map_err(invalid)?)
            }
            QueueName::Searcher => {
                QueueMessage::Searcher(serde_json::from_value(value).map_err(invalid)?)
            }
        };
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<(), PublishError> {
        match self {
            QueueMessage::News(m) => {
                positive("keyword_id", m.keyword_id)?;
                if let Some(rss_atom_id) = m.rss_atom_id {
                    positive("rss_atom_id", rss_atom_id)?;
                }
                valid_url("url", &m.url)
            }
            QueueMessage::RssAtom(m) => {
                positive("rss_atom_id", m.rss_atom_id)?;
                valid_url("feed_url", &m.feed_url)?;
                if m.keywords.iter().any(|k| k.trim().is_empty()) {
                    return Err(PublishError::Validation("keyword cannot be empty".into()));
                }
                Ok(())
            }
            QueueMessage::Searcher(m) => {
                positive("project_id", m.project_id)?;
                non_empty("topic", &m.topic)?;
                positive("keyword_id", m.keyword_id)?;
                non_empty("keyword", &m.keyword)?;
                if m.searches < 0 {
                    return Err(PublishError::Validation(
                        "searches must be a non-negative integer".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// JSON body of the message without the queue tag.
    pub fn to_json(&self) -> Result<Vec<u8>, PublishError> {
        let bytes = match self {
            QueueMessage::News(m) => serde_json::to_vec(m),
            QueueMessage::RssAtom(m) => serde_json::to_vec(m),
            QueueMessage::Searcher(m) => serde_json::to_vec(m),
        };
        bytes.map_err(|e| PublishError::Validation(e.to_string()))
    }
}

fn positive(field: &str, value: i64) -> Result<(), PublishError> {
    if value > 0 {
        Ok(())
    } else {
        Err(PublishError::Validation(format!(
            "{} must be a positive integer",
            field
        )))
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), PublishError> {
    if value.trim().is_empty() {
        Err(PublishError::Validation(format!("{} cannot be empty", field)))
    } else {
        Ok(())
    }
}

fn valid_url(field: &str, value: &str) -> Result<(), PublishError> {
    match url::Url::parse(value) {
        Ok(url) if url.has_host() => Ok(()),
        _ => Err(PublishError::Validation(format!(
            "{} must be a valid URL",
            field
        ))),
    }
}
