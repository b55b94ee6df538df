use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub rss_atom_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNews {
    pub keyword_id: i64,
    pub rss_atom_id: Option<i64>,
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedNews {
    pub id: i64,
    pub project_id: i64,
    pub source_news_id: i64,
    pub title: String,
    pub summary: String,
    pub category: Option<String>,
    pub views: i64,
}

/// Saved news joined with the news row it was copied from.
#[derive(Debug, Clone, Serialize)]
pub struct SavedNewsItem {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub summary: String,
    pub category: Option<String>,
    pub views: i64,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSavedNews {
    pub title: Option<String>,
    /// `null` clears the summary to an empty string.
    #[serde(default, deserialize_with = "double_option")]
    pub summary: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
}

fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn empty(query: PageQuery) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: query.page,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl PageQuery {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsFilter {
    pub project_id: i64,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// Comma separated list of source names.
    pub sources: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedNewsFilter {
    pub project_id: i64,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// Comma separated list of categories.
    pub categories: Option<String>,
    pub sources: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl NewsFilter {
    pub fn page_query(&self) -> PageQuery {
        PageQuery::new(self.page, self.limit)
    }

    pub fn source_list(&self) -> Vec<String> {
        split_list(self.sources.as_deref())
    }

    pub fn time_range(&self) -> (Option<i64>, Option<i64>) {
        time_range(self.date_from, self.date_to)
    }
}

impl SavedNewsFilter {
    pub fn page_query(&self) -> PageQuery {
        PageQuery::new(self.page, self.limit)
    }

    pub fn source_list(&self) -> Vec<String> {
        split_list(self.sources.as_deref())
    }

    pub fn category_list(&self) -> Vec<String> {
        split_list(self.categories.as_deref())
    }

    pub fn time_range(&self) -> (Option<i64>, Option<i64>) {
        time_range(self.date_from, self.date_to)
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Unix-second bounds for a day range; the end date is inclusive.
fn time_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> (Option<i64>, Option<i64>) {
    let start = from
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp());
    let end = to
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc().timestamp());
    (start, end)
}
