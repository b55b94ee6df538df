mod runner;
mod trigger;


pub use runner::SchedulerService;
pub use trigger::Trigger;

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;

use crate::db::Repository;
use crate::error::Result;
use crate::queue::{Publisher, QueueMessage, RssAtomMessage, SearcherMessage};

/// One work item that could not be published or recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
    /// The broker was unreachable; the next tick will pick the item up again.
    pub retryable: bool,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub trigger: Trigger,
    pub published: usize,
    pub failed: Vec<ItemFailure>,
}

impl TickReport {
    fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            published: 0,
            failed: Vec::new(),
        }
    }

    fn fail(&mut self, item: String, error: impl Display, retryable: bool) {
        tracing::warn!("{}: {} failed: {}", self.trigger.name(), item, error);
        self.failed.push(ItemFailure {
            item,
            error: error.to_string(),
            retryable,
        });
    }

    pub fn log(&self) {
        if self.failed.is_empty() {
            tracing::info!(
                "{}: published {} work items",
                self.trigger.name(),
                self.published
            );
        } else {
            tracing::warn!(
                "{}: published {} work items, {} failed",
                self.trigger.name(),
                self.published,
                self.failed.len()
            );
        }
    }
}

/// Turns trigger firings into queue work items.
pub struct Scheduler {
    repo: Arc<Repository>,
    publisher: Arc<dyn Publisher>,
    keywords_per_search: usize,
}

impl Scheduler {
    pub fn new(
        repo: Arc<Repository>,
        publisher: Arc<dyn Publisher>,
        keywords_per_search: usize,
    ) -> Self {
        Self {
            repo,
            publisher,
            keywords_per_search,
        }
    }

    /// Runs the cycle registered for `cron`. Unknown strings are ignored.
    pub async fn tick(&self, cron: &str) -> Result<Option<TickReport>> {
        match Trigger::from_cron(cron) {
            Some(trigger) => self.run(trigger).await.map(Some),
            None => {
                tracing::warn!("No scheduled job registered for cron \"{}\"", cron);
                Ok(None)
            }
        }
    }

    pub async fn run(&self, trigger: Trigger) -> Result<TickReport> {
        tracing::info!("Running {} ({})", trigger.name(), trigger.cron());
        let report = match trigger {
            Trigger::SearchNews => self.search_news().await?,
            Trigger::RefreshFeeds => self.refresh_feeds().await?,
        };
        report.log();
        Ok(report)
    }

    /// Publishes the least-searched keywords of every project, counting a
    /// search only once the broker has accepted it.
    async fn search_news(&self) -> Result<TickReport> {
        let mut report = TickReport::new(Trigger::SearchNews);
        let projects = self.repo.get_all_projects().await?;

        for project in projects {
            let keywords = match self
                .repo
                .select_top_for_search(project.id, self.keywords_per_search)
                .await
            {
                Ok(keywords) => keywords,
                Err(e) => {
                    report.fail(format!("project {}", project.id), e, false);
                    continue;
                }
            };

            for keyword in keywords {
                let item = format!("keyword {} ({})", keyword.id, keyword.content);
                let message = QueueMessage::Searcher(SearcherMessage {
                    project_id: project.id,
                    topic: project.topic.clone(),
                    keyword_id: keyword.id,
                    keyword: keyword.content,
                    searches: keyword.searches,
                });

                if let Err(e) = self.publisher.publish(&message).await {
                    let retryable = e.is_retryable();
                    report.fail(item, e, retryable);
                    continue;
                }
                if let Err(e) = self.repo.increment_searches(keyword.id).await {
                    report.fail(item, e, false);
                    continue;
                }
                report.published += 1;
            }
        }

        Ok(report)
    }

    /// Publishes every feed source together with its project's keywords.
    async fn refresh_feeds(&self) -> Result<TickReport> {
        let mut report = TickReport::new(Trigger::RefreshFeeds);
        let feeds = self.repo.get_all_feeds().await?;
        let mut keywords: HashMap<i64, Vec<String>> = HashMap::new();

        for feed in feeds {
            let item = format!("feed {} ({})", feed.id, feed.url);

            if !keywords.contains_key(&feed.project_id) {
                match self.repo.keyword_contents(feed.project_id).await {
                    Ok(contents) => {
                        keywords.insert(feed.project_id, contents);
                    }
                    Err(e) => {
                        report.fail(item, e, false);
                        continue;
                    }
                }
            }

            let message = QueueMessage::RssAtom(RssAtomMessage {
                rss_atom_id: feed.id,
                feed_url: feed.url,
                keywords: keywords
                    .get(&feed.project_id)
                    .cloned()
                    .unwrap_or_default(),
            });

            match self.publisher.publish(&message).await {
                Ok(()) => report.published += 1,
                Err(e) => {
                    let retryable = e.is_retryable();
                    report.fail(item, e, retryable);
                }
            }
        }

        Ok(report)
    }
}
