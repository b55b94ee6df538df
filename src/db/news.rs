use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use crate::error::{AppError, Result};
use crate::models::{
    NewNews, News, NewsFilter, Page, SavedNews, SavedNewsFilter, SavedNewsItem, UpdateSavedNews,
};

use super::repository::{insert_outcome, Insert, Repository};

const NEWS_COLUMNS: &str = "n.id, n.url, n.title, n.summary, n.source, n.published_at, n.rss_atom_id";

const SAVED_NEWS_COLUMNS: &str = "id, project_id, source_news_id, title, summary, category, views";

/// WHERE clause assembled from optional filters, with positional values.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, clause: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.values.extend(values);
    }

    fn push_in(&mut self, column: &str, items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        let placeholders = vec!["?"; items.len()].join(", ");
        self.push(
            format!("{} IN ({})", column, placeholders),
            items.into_iter().map(Value::Text),
        );
    }

    fn push_search(&mut self, title: &str, summary: &str, search: Option<&str>) {
        let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) else {
            return;
        };
        let pattern = format!("%{}%", search);
        self.push(
            format!("({} LIKE ? OR {} LIKE ?)", title, summary),
            [Value::Text(pattern.clone()), Value::Text(pattern)],
        );
    }

    fn push_range(&mut self, column: &str, (start, end): (Option<i64>, Option<i64>)) {
        if let Some(start) = start {
            self.push(format!("{} >= ?", column), [Value::Integer(start)]);
        }
        if let Some(end) = end {
            self.push(format!("{} <= ?", column), [Value::Integer(end)]);
        }
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }
}

enum CreateNews {
    Created(i64),
    DuplicateUrl,
    UnknownKeyword,
}

enum SaveNews {
    Saved(i64),
    MissingNews,
    AlreadySaved,
}

impl Repository {
    // News operations

    /// Inserts a news item and links it to the keyword that matched it.
    pub async fn create_news(&self, news: NewNews) -> Result<News> {
        let published_at = news.published_at.unwrap_or_else(Utc::now).timestamp();

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let result = tx.execute(
                    r#"INSERT INTO news (url, title, summary, source, published_at, rss_atom_id)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    params![
                        news.url,
                        news.title,
                        news.summary,
                        news.source,
                        published_at,
                        news.rss_atom_id,
                    ],
                );
                let news_id = match insert_outcome(&tx, result)? {
                    Insert::Inserted(id) => id,
                    Insert::Duplicate => return Ok(CreateNews::DuplicateUrl),
                    Insert::MissingParent => return Ok(CreateNews::UnknownKeyword),
                };

                let result = tx.execute(
                    "INSERT INTO keywords_to_news (keyword_id, news_id) VALUES (?1, ?2)",
                    params![news.keyword_id, news_id],
                );
                if !matches!(insert_outcome(&tx, result)?, Insert::Inserted(_)) {
                    return Ok(CreateNews::UnknownKeyword);
                }

                tx.commit()?;
                Ok(CreateNews::Created(news_id))
            })
            .await?;

        let id = match outcome {
            CreateNews::Created(id) => id,
            CreateNews::DuplicateUrl => return Err(AppError::Conflict("News already exists".into())),
            CreateNews::UnknownKeyword => {
                return Err(AppError::validation("Unknown keyword or feed for news"))
            }
        };

        self.get_news(id)
            .await?
            .ok_or_else(|| AppError::not_found("News not found"))
    }

    pub async fn get_news(&self, id: i64) -> Result<Option<News>> {
        let news = self
            .conn
            .call(move |conn| {
                let news = conn
                    .query_row(
                        &format!("SELECT {} FROM news n WHERE n.id = ?1", NEWS_COLUMNS),
                        params![id],
                        news_from_row,
                    )
                    .optional()?;
                Ok(news)
            })
            .await?;
        Ok(news)
    }

    pub async fn news_exists(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM news WHERE url = ?1)",
                    params![url],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await?;
        Ok(exists)
    }

    /// News matched by the project's visible keywords and not yet saved in it,
    /// newest first.
    pub async fn list_news(&self, filter: NewsFilter) -> Result<Page<News>> {
        let page = filter.page_query();
        if self.list_keywords(filter.project_id).await?.is_empty() {
            return Ok(Page::empty(page));
        }

        let mut conditions = Conditions::default();
        conditions.push(
            "kn.keyword_id IN (SELECT id FROM keywords WHERE project_id = ? AND visible = 1)",
            [Value::Integer(filter.project_id)],
        );
        conditions.push(
            "n.id NOT IN (SELECT source_news_id FROM saved_news WHERE project_id = ?)",
            [Value::Integer(filter.project_id)],
        );
        conditions.push_search("n.title", "n.summary", filter.search.as_deref());
        conditions.push_in("n.source", filter.source_list());
        conditions.push_range("n.published_at", filter.time_range());

        let (total, data) = self
            .conn
            .call(move |conn| {
                let from = format!(
                    "FROM news n JOIN keywords_to_news kn ON kn.news_id = n.id {}",
                    conditions.where_sql()
                );

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(DISTINCT n.id) {}", from),
                    params_from_iter(conditions.values.iter()),
                    |row| row.get(0),
                )?;

                let mut values = conditions.values.clone();
                values.push(Value::Integer(i64::from(page.limit)));
                values.push(Value::Integer(page.offset()));

                let mut stmt = conn.prepare(&format!(
                    "SELECT DISTINCT {} {} ORDER BY n.published_at DESC, n.id DESC LIMIT ? OFFSET ?",
                    NEWS_COLUMNS, from
                ))?;
                let data = stmt
                    .query_map(params_from_iter(values.iter()), news_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((total, data))
            })
            .await?;

        Ok(Page {
            data,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Distinct sources of the project's news, most frequent first.
    pub async fn news_sources(&self, project_id: i64) -> Result<Vec<String>> {
        let sources = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT n.source FROM news n
                       JOIN keywords_to_news kn ON kn.news_id = n.id
                       JOIN keywords k ON k.id = kn.keyword_id
                       WHERE k.project_id = ?1
                       GROUP BY n.source
                       ORDER BY COUNT(DISTINCT n.id) DESC, n.source ASC"#,
                )?;
                let sources = stmt
                    .query_map(params![project_id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }

    // Saved news operations

    /// Copies a news item into the project's curated list.
    pub async fn save_news(&self, news_id: i64, project_id: i64) -> Result<SavedNews> {
        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let original: Option<(String, Option<String>)> = tx
                    .query_row(
                        "SELECT title, summary FROM news WHERE id = ?1",
                        params![news_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;
                let Some((title, summary)) = original else {
                    return Ok(SaveNews::MissingNews);
                };

                let already: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM saved_news WHERE project_id = ?1 AND source_news_id = ?2)",
                    params![project_id, news_id],
                    |row| row.get(0),
                )?;
                if already {
                    return Ok(SaveNews::AlreadySaved);
                }

                tx.execute(
                    "INSERT INTO saved_news (project_id, source_news_id, title, summary) VALUES (?1, ?2, ?3, ?4)",
                    params![project_id, news_id, title, summary.unwrap_or_default()],
                )?;
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(SaveNews::Saved(id))
            })
            .await?;

        let id = match outcome {
            SaveNews::Saved(id) => id,
            SaveNews::MissingNews => return Err(AppError::not_found("News not found")),
            SaveNews::AlreadySaved => {
                return Err(AppError::already_exists("News already saved in this project"))
            }
        };

        self.get_saved_news(id)
            .await?
            .ok_or_else(|| AppError::not_found("Saved news not found"))
    }

    pub async fn get_saved_news(&self, id: i64) -> Result<Option<SavedNews>> {
        let saved = self
            .conn
            .call(move |conn| {
                let saved = conn
                    .query_row(
                        &format!("SELECT {} FROM saved_news WHERE id = ?1", SAVED_NEWS_COLUMNS),
                        params![id],
                        saved_news_from_row,
                    )
                    .optional()?;
                Ok(saved)
            })
            .await?;
        Ok(saved)
    }

    pub async fn list_saved_news(&self, filter: SavedNewsFilter) -> Result<Page<SavedNewsItem>> {
        let page = filter.page_query();

        let mut conditions = Conditions::default();
        conditions.push("s.project_id = ?", [Value::Integer(filter.project_id)]);
        conditions.push_search("s.title", "s.summary", filter.search.as_deref());
        conditions.push_in("s.category", filter.category_list());
        conditions.push_in("n.source", filter.source_list());
        conditions.push_range("n.published_at", filter.time_range());

        let (total, data) = self
            .conn
            .call(move |conn| {
                let from = format!(
                    "FROM saved_news s JOIN news n ON n.id = s.source_news_id {}",
                    conditions.where_sql()
                );

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) {}", from),
                    params_from_iter(conditions.values.iter()),
                    |row| row.get(0),
                )?;

                let mut values = conditions.values.clone();
                values.push(Value::Integer(i64::from(page.limit)));
                values.push(Value::Integer(page.offset()));

                let mut stmt = conn.prepare(&format!(
                    r#"SELECT s.id, s.project_id, s.title, s.summary, s.category, s.views,
                              n.url, n.source, n.published_at
                       {} ORDER BY s.id DESC LIMIT ? OFFSET ?"#,
                    from
                ))?;
                let data = stmt
                    .query_map(params_from_iter(values.iter()), saved_news_item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((total, data))
            })
            .await?;

        Ok(Page {
            data,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn update_saved_news(&self, id: i64, update: UpdateSavedNews) -> Result<SavedNews> {
        let (set_summary, summary) = match update.summary {
            Some(summary) => (true, summary.unwrap_or_default()),
            None => (false, String::new()),
        };
        let (set_category, category) = match update.category {
            Some(category) => (true, category),
            None => (false, None),
        };

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"UPDATE saved_news SET
                           title = COALESCE(?2, title),
                           summary = CASE WHEN ?3 THEN ?4 ELSE summary END,
                           category = CASE WHEN ?5 THEN ?6 ELSE category END
                       WHERE id = ?1"#,
                    params![id, update.title, set_summary, summary, set_category, category],
                )?;
                Ok(())
            })
            .await?;

        self.get_saved_news(id)
            .await?
            .ok_or_else(|| AppError::not_found("Saved news not found"))
    }

    /// Deletes the curated copy; the news row stays.
    pub async fn delete_saved_news(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute("DELETE FROM saved_news WHERE id = ?1", params![id])?;
                Ok(deleted)
            })
            .await?;

        if deleted == 0 {
            return Err(AppError::not_found("Saved news not found"));
        }
        Ok(())
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn news_from_row(row: &Row) -> rusqlite::Result<News> {
    Ok(News {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        summary: row.get(3)?,
        source: row.get(4)?,
        published_at: timestamp(row.get(5)?),
        rss_atom_id: row.get(6)?,
    })
}

fn saved_news_from_row(row: &Row) -> rusqlite::Result<SavedNews> {
    Ok(SavedNews {
        id: row.get(0)?,
        project_id: row.get(1)?,
        source_news_id: row.get(2)?,
        title: row.get(3)?,
        summary: row.get(4)?,
        category: row.get(5)?,
        views: row.get(6)?,
    })
}

fn saved_news_item_from_row(row: &Row) -> rusqlite::Result<SavedNewsItem> {
    Ok(SavedNewsItem {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        summary: row.get(3)?,
        category: row.get(4)?,
        views: row.get(5)?,
        url: row.get(6)?,
        source: row.get(7)?,
        published_at: timestamp(row.get(8)?),
    })
}
