use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::config::ProjectLimitPolicy;
use crate::error::{AppError, Result};
use crate::models::{
    FeedSource, Keyword, MarkProcessedOutcome, NewFeedSource, NewProject, NewUser, Project, Role,
    UpdateProject, UpdateUser, User,
};

use super::schema::SCHEMA;

pub(super) const KEYWORD_COLUMNS: &str = "id, project_id, content, searches, processed, visible";

const PROJECT_SELECT: &str = r#"SELECT p.id, p.owner_id, p.name, p.description, p.topic,
       (SELECT COUNT(*) FROM users_to_projects m WHERE m.project_id = p.id),
       p.created_at
FROM projects p"#;

const USER_COLUMNS: &str = "id, username, email, role, subscription_id";

const FEED_COLUMNS: &str = "id, project_id, url, provenance, created_at";

pub struct Repository {
    pub(super) conn: Connection,
}

enum AddKeyword {
    Added(Keyword),
    Duplicate,
    MissingProject,
}

enum CreateProject {
    Created(i64),
    MissingUser,
    LimitReached,
}

pub(super) enum Insert {
    Inserted(i64),
    Duplicate,
    MissingParent,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::new(":memory:").await.unwrap()
    }

    // Keyword operations

    /// Adds a keyword, reactivating a soft-deleted one with the same content.
    pub async fn add_keyword(&self, project_id: i64, content: &str) -> Result<Keyword> {
        let content = Keyword::normalize(content);
        if content.is_empty() {
            return Err(AppError::validation("Keyword cannot be empty"));
        }

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                if !row_exists(&tx, "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)", project_id)? {
                    return Ok(AddKeyword::MissingProject);
                }

                let existing = tx
                    .query_row(
                        &format!(
                            "SELECT {} FROM keywords WHERE project_id = ?1 AND content = ?2",
                            KEYWORD_COLUMNS
                        ),
                        params![project_id, content],
                        keyword_from_row,
                    )
                    .optional()?;

                let outcome = match existing {
                    Some(keyword) if keyword.visible => AddKeyword::Duplicate,
                    Some(keyword) => {
                        tx.execute(
                            "UPDATE keywords SET visible = 1 WHERE id = ?1",
                            params![keyword.id],
                        )?;
                        AddKeyword::Added(Keyword {
                            visible: true,
                            ..keyword
                        })
                    }
                    None => {
                        tx.execute(
                            "INSERT INTO keywords (project_id, content) VALUES (?1, ?2)",
                            params![project_id, content],
                        )?;
                        AddKeyword::Added(Keyword {
                            id: tx.last_insert_rowid(),
                            project_id,
                            content,
                            searches: 0,
                            processed: false,
                            visible: true,
                        })
                    }
                };

                tx.commit()?;
                Ok(outcome)
            })
            .await?;

        match outcome {
            AddKeyword::Added(keyword) => Ok(keyword),
            AddKeyword::Duplicate => Err(AppError::already_exists("Keyword already exists")),
            AddKeyword::MissingProject => Err(AppError::not_found("Project not found")),
        }
    }

    #[cfg(test)]
    pub async fn get_keyword(&self, keyword_id: i64) -> Result<Option<Keyword>> {
        let keyword = self
            .conn
            .call(move |conn| {
                let keyword = conn
                    .query_row(
                        &format!("SELECT {} FROM keywords WHERE id = ?1", KEYWORD_COLUMNS),
                        params![keyword_id],
                        keyword_from_row,
                    )
                    .optional()?;
                Ok(keyword)
            })
            .await?;
        Ok(keyword)
    }

    pub async fn list_keywords(&self, project_id: i64) -> Result<Vec<Keyword>> {
        let keywords = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM keywords WHERE project_id = ?1 AND visible = 1 ORDER BY id",
                    KEYWORD_COLUMNS
                ))?;
                let keywords = stmt
                    .query_map(params![project_id], keyword_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(keywords)
            })
            .await?;
        Ok(keywords)
    }

    /// Contents of the project's visible keywords, as sent with feed refreshes.
    pub async fn keyword_contents(&self, project_id: i64) -> Result<Vec<String>> {
        let contents = self
            .list_keywords(project_id)
            .await?
            .into_iter()
            .map(|k| k.content)
            .collect();
        Ok(contents)
    }

    /// Soft delete. Never evaluates the cycle reset.
    pub async fn soft_delete_keyword(&self, project_id: i64, keyword_id: i64) -> Result<()> {
        let updated = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    "UPDATE keywords SET visible = 0 WHERE id = ?1 AND project_id = ?2",
                    params![keyword_id, project_id],
                )?;
                Ok(updated)
            })
            .await?;

        if updated == 0 {
            return Err(AppError::not_found("Keyword not found"));
        }
        Ok(())
    }

    /// Up to `limit` visible keywords with the fewest searches, oldest first on ties.
    pub async fn select_top_for_search(&self, project_id: i64, limit: usize) -> Result<Vec<Keyword>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let keywords = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT {} FROM keywords
                       WHERE project_id = ?1 AND visible = 1
                       ORDER BY searches ASC, id ASC
                       LIMIT ?2"#,
                    KEYWORD_COLUMNS
                ))?;
                let keywords = stmt
                    .query_map(params![project_id, limit], keyword_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(keywords)
            })
            .await?;
        Ok(keywords)
    }

    pub async fn increment_searches(&self, keyword_id: i64) -> Result<()> {
        let updated = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    "UPDATE keywords SET searches = searches + 1 WHERE id = ?1",
                    params![keyword_id],
                )?;
                Ok(updated)
            })
            .await?;

        if updated == 0 {
            return Err(AppError::not_found("Keyword not found"));
        }
        Ok(())
    }

    /// Marks a keyword processed. When that leaves no unprocessed visible
    /// keyword in a non-empty project, the whole visible set starts a new
    /// cycle with `processed = 0` and `searches = 0`.
    pub async fn mark_processed(&self, keyword_id: i64) -> Result<MarkProcessedOutcome> {
        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let updated = tx.execute(
                    "UPDATE keywords SET processed = 1 WHERE id = ?1",
                    params![keyword_id],
                )?;
                if updated == 0 {
                    return Ok(None);
                }

                let project_id: i64 = tx.query_row(
                    "SELECT project_id FROM keywords WHERE id = ?1",
                    params![keyword_id],
                    |row| row.get(0),
                )?;

                let (visible, pending): (i64, i64) = tx.query_row(
                    r#"SELECT COUNT(*), COALESCE(SUM(processed = 0), 0)
                       FROM keywords WHERE project_id = ?1 AND visible = 1"#,
                    params![project_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                let cycle_reset = visible > 0 && pending == 0;
                if cycle_reset {
                    tx.execute(
                        "UPDATE keywords SET processed = 0, searches = 0 WHERE project_id = ?1 AND visible = 1",
                        params![project_id],
                    )?;
                }

                let keyword = tx.query_row(
                    &format!("SELECT {} FROM keywords WHERE id = ?1", KEYWORD_COLUMNS),
                    params![keyword_id],
                    keyword_from_row,
                )?;

                tx.commit()?;
                Ok(Some(MarkProcessedOutcome {
                    keyword,
                    cycle_reset,
                }))
            })
            .await?;

        let outcome = outcome.ok_or_else(|| AppError::not_found("Keyword not found"))?;
        if outcome.cycle_reset {
            tracing::info!(
                "Keyword cycle completed for project {}, counters reset",
                outcome.keyword.project_id
            );
        }
        Ok(outcome)
    }

    // User operations

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let outcome = self
            .conn
            .call(move |conn| {
                let result = conn.execute(
                    "INSERT INTO users (username, email, role, subscription_id) VALUES (?1, ?2, ?3, ?4)",
                    params![user.username, user.email, user.role.as_str(), user.subscription_id],
                );
                Ok(insert_outcome(conn, result)?)
            })
            .await?;

        let id = match outcome {
            Insert::Inserted(id) => id,
            Insert::Duplicate => return Err(AppError::already_exists("User already exists")),
            Insert::MissingParent => return Err(AppError::validation("Unknown subscription")),
        };

        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                        params![id],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                        params![email],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    /// Changes a user's username and/or email. Taken values are rejected.
    pub async fn update_user(&self, id: i64, update: UpdateUser) -> Result<User> {
        let updated = self
            .conn
            .call(move |conn| {
                let result = conn.execute(
                    r#"UPDATE users SET
                           username = COALESCE(?2, username),
                           email = COALESCE(?3, email)
                       WHERE id = ?1"#,
                    params![id, update.username, update.email],
                );
                match result {
                    Ok(_) => Ok(true),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Ok(false)
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        if !updated {
            return Err(AppError::already_exists("Username or email already in use"));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    // Project operations

    /// Creates a project if the owner's subscription allows another one.
    pub async fn create_project(
        &self,
        owner_id: i64,
        project: NewProject,
        policy: ProjectLimitPolicy,
    ) -> Result<Project> {
        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let limit: Option<i64> = tx
                    .query_row(
                        r#"SELECT s.project_limit FROM users u
                           JOIN subscriptions s ON s.id = u.subscription_id
                           WHERE u.id = ?1"#,
                        params![owner_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(limit) = limit else {
                    return Ok(CreateProject::MissingUser);
                };

                let owned: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM projects WHERE owner_id = ?1",
                    params![owner_id],
                    |row| row.get(0),
                )?;
                let counted = match policy {
                    ProjectLimitPolicy::Owned => owned,
                    ProjectLimitPolicy::OwnedAndMember => {
                        let member: i64 = tx.query_row(
                            "SELECT COUNT(*) FROM users_to_projects WHERE user_id = ?1",
                            params![owner_id],
                            |row| row.get(0),
                        )?;
                        owned + member
                    }
                };
                if counted >= limit {
                    return Ok(CreateProject::LimitReached);
                }

                tx.execute(
                    "INSERT INTO projects (owner_id, name, description, topic) VALUES (?1, ?2, ?3, ?4)",
                    params![owner_id, project.name, project.description, project.topic],
                )?;
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(CreateProject::Created(id))
            })
            .await?;

        let id = match outcome {
            CreateProject::Created(id) => id,
            CreateProject::MissingUser => return Err(AppError::not_found("User not found")),
            CreateProject::LimitReached => {
                return Err(AppError::forbidden("Project limit reached for your plan"))
            }
        };

        self.get_project(id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))
    }

    pub async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let project = self
            .conn
            .call(move |conn| {
                let project = conn
                    .query_row(
                        &format!("{} WHERE p.id = ?1", PROJECT_SELECT),
                        params![id],
                        project_from_row,
                    )
                    .optional()?;
                Ok(project)
            })
            .await?;
        Ok(project)
    }

    pub async fn get_all_projects(&self) -> Result<Vec<Project>> {
        let projects = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!("{} ORDER BY p.id", PROJECT_SELECT))?;
                let projects = stmt
                    .query_map([], project_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(projects)
            })
            .await?;
        Ok(projects)
    }

    /// Projects the user owns or is a member of.
    pub async fn projects_for_user(&self, user_id: i64) -> Result<Vec<Project>> {
        let projects = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"{} WHERE p.owner_id = ?1
                          OR p.id IN (SELECT project_id FROM users_to_projects WHERE user_id = ?1)
                       ORDER BY p.id"#,
                    PROJECT_SELECT
                ))?;
                let projects = stmt
                    .query_map(params![user_id], project_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(projects)
            })
            .await?;
        Ok(projects)
    }

    pub async fn is_member(&self, project_id: i64, user_id: i64) -> Result<bool> {
        let exists = self
            .conn
            .call(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM users_to_projects WHERE project_id = ?1 AND user_id = ?2)",
                    params![project_id, user_id],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await?;
        Ok(exists)
    }

    /// Loads the project if the user owns it or is a member.
    pub async fn require_access(&self, project_id: i64, user_id: i64) -> Result<Project> {
        let project = self
            .get_project(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))?;

        if project.owner_id == user_id || self.is_member(project_id, user_id).await? {
            Ok(project)
        } else {
            Err(AppError::forbidden("You do not have access to this project"))
        }
    }

    pub async fn require_owner(&self, project_id: i64, user_id: i64) -> Result<Project> {
        let project = self
            .get_project(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))?;

        if project.owner_id != user_id {
            return Err(AppError::forbidden("You are not the owner of this project"));
        }
        Ok(project)
    }

    pub async fn update_project(&self, id: i64, update: UpdateProject) -> Result<Project> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"UPDATE projects SET
                           name = COALESCE(?2, name),
                           description = COALESCE(?3, description)
                       WHERE id = ?1"#,
                    params![id, update.name, update.description],
                )?;
                Ok(())
            })
            .await?;

        self.get_project(id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))
    }

    /// Removes the project and every row that depends on it.
    pub async fn delete_project(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM users_to_projects WHERE project_id = ?1", params![id])?;
                tx.execute("DELETE FROM saved_news WHERE project_id = ?1", params![id])?;
                tx.execute(
                    "DELETE FROM keywords_to_news WHERE keyword_id IN (SELECT id FROM keywords WHERE project_id = ?1)",
                    params![id],
                )?;
                tx.execute("DELETE FROM keywords WHERE project_id = ?1", params![id])?;
                tx.execute("DELETE FROM rss_atom WHERE project_id = ?1", params![id])?;
                tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Membership

    pub async fn list_members(&self, project_id: i64) -> Result<Vec<User>> {
        let members = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT u.id, u.username, u.email, u.role, u.subscription_id
                       FROM users_to_projects m
                       JOIN users u ON u.id = m.user_id
                       WHERE m.project_id = ?1
                       ORDER BY u.id"#,
                )?;
                let members = stmt
                    .query_map(params![project_id], user_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(members)
            })
            .await?;
        Ok(members)
    }

    pub async fn add_member(&self, project_id: i64, user_id: i64) -> Result<()> {
        let outcome = self
            .conn
            .call(move |conn| {
                let result = conn.execute(
                    "INSERT INTO users_to_projects (user_id, project_id) VALUES (?1, ?2)",
                    params![user_id, project_id],
                );
                Ok(insert_outcome(conn, result)?)
            })
            .await?;

        match outcome {
            Insert::Inserted(_) => Ok(()),
            Insert::Duplicate => Err(AppError::already_exists("User already a member")),
            Insert::MissingParent => Err(AppError::not_found("Project or user not found")),
        }
    }

    /// Returns false when the user was not a member.
    pub async fn remove_member(&self, project_id: i64, user_id: i64) -> Result<bool> {
        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM users_to_projects WHERE project_id = ?1 AND user_id = ?2",
                    params![project_id, user_id],
                )?;
                Ok(removed > 0)
            })
            .await?;
        Ok(removed)
    }

    // Feed source operations

    pub async fn add_feed(&self, project_id: i64, feed: NewFeedSource) -> Result<FeedSource> {
        let parsed = url::Url::parse(feed.url.trim())
            .map_err(|e| AppError::validation(format!("Invalid feed URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::validation("Feed URL must be http or https"));
        }
        let url = parsed.to_string();

        let outcome = self
            .conn
            .call(move |conn| {
                if !row_exists(conn, "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)", project_id)? {
                    return Ok(Insert::MissingParent);
                }
                let result = conn.execute(
                    "INSERT INTO rss_atom (project_id, url, provenance) VALUES (?1, ?2, ?3)",
                    params![project_id, url, feed.provenance.as_str()],
                );
                Ok(insert_outcome(conn, result)?)
            })
            .await?;

        let id = match outcome {
            Insert::Inserted(id) => id,
            Insert::Duplicate => return Err(AppError::already_exists("Feed already exists")),
            Insert::MissingParent => return Err(AppError::not_found("Project not found")),
        };

        let feed = self
            .conn
            .call(move |conn| {
                let feed = conn.query_row(
                    &format!("SELECT {} FROM rss_atom WHERE id = ?1", FEED_COLUMNS),
                    params![id],
                    feed_from_row,
                )?;
                Ok(feed)
            })
            .await?;
        Ok(feed)
    }

    pub async fn list_feeds(&self, project_id: i64) -> Result<Vec<FeedSource>> {
        let feeds = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM rss_atom WHERE project_id = ?1 ORDER BY id",
                    FEED_COLUMNS
                ))?;
                let feeds = stmt
                    .query_map(params![project_id], feed_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    pub async fn get_all_feeds(&self) -> Result<Vec<FeedSource>> {
        let feeds = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {} FROM rss_atom ORDER BY id", FEED_COLUMNS))?;
                let feeds = stmt
                    .query_map([], feed_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    pub async fn delete_feed(&self, project_id: i64, feed_id: i64) -> Result<()> {
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM rss_atom WHERE id = ?1 AND project_id = ?2",
                    params![feed_id, project_id],
                )?;
                Ok(deleted)
            })
            .await?;

        if deleted == 0 {
            return Err(AppError::not_found("Feed not found"));
        }
        Ok(())
    }
}

fn row_exists(conn: &rusqlite::Connection, sql: &str, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(sql, params![id], |row| row.get(0))
}

/// Folds constraint failures of an INSERT into an [`Insert`] outcome.
pub(super) fn insert_outcome(
    conn: &rusqlite::Connection,
    result: rusqlite::Result<usize>,
) -> rusqlite::Result<Insert> {
    match result {
        Ok(_) => Ok(Insert::Inserted(conn.last_insert_rowid())),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Ok(Insert::MissingParent)
        }
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(Insert::Duplicate)
        }
        Err(e) => Err(e),
    }
}

pub(super) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

pub(super) fn keyword_from_row(row: &Row) -> rusqlite::Result<Keyword> {
    Ok(Keyword {
        id: row.get(0)?,
        project_id: row.get(1)?,
        content: row.get(2)?,
        searches: row.get(3)?,
        processed: row.get(4)?,
        visible: row.get(5)?,
    })
}

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        topic: row.get(4)?,
        members: row.get(5)?,
        created_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: Role::from_db(&row.get::<_, String>(3)?),
        subscription_id: row.get(4)?,
    })
}

fn feed_from_row(row: &Row) -> rusqlite::Result<FeedSource> {
    Ok(FeedSource {
        id: row.get(0)?,
        project_id: row.get(1)?,
        url: row.get(2)?,
        provenance: row
            .get::<_, String>(3)?
            .parse()
            .unwrap_or_default(),
        created_at: row
            .get::<_, String>(4)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}
