mod feed;
mod keyword;
mod news;
mod project;

pub use feed::{FeedSource, NewFeedSource, Provenance};
pub use keyword::{Keyword, MarkProcessedOutcome};
pub use news::{
    NewNews, News, NewsFilter, Page, PageQuery, SavedNews, SavedNewsFilter, SavedNewsItem,
    UpdateSavedNews,
};
pub use project::{NewProject, NewUser, Project, Role, UpdateProject, UpdateUser, User};
