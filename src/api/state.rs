use std::sync::Arc;

use crate::config::Config;
use crate::db::Repository;
use crate::queue::Publisher;
use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub publisher: Arc<dyn Publisher>,
    pub scheduler: Arc<Scheduler>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, publisher: Arc<dyn Publisher>, config: Config) -> Self {
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&repo),
            Arc::clone(&publisher),
            config.scheduler.keywords_per_search,
        ));
        Self {
            repo,
            publisher,
            scheduler,
            config: Arc::new(config),
        }
    }
}
