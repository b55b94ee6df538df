use axum::routing::{delete, get, patch, post};
use axum::Router;

use super::handlers::{self, admin, feeds, keywords, news, projects};
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/users", post(admin::create_user))
        .route("/users/me", get(projects::me).patch(projects::update_me))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{id}/members",
            get(projects::list_members).post(projects::add_member),
        )
        .route(
            "/projects/{id}/members/{user_id}",
            delete(projects::remove_member),
        )
        .route(
            "/projects/{id}/keywords",
            get(keywords::list_keywords).post(keywords::add_keyword),
        )
        .route(
            "/projects/{id}/keywords/{keyword_id}",
            delete(keywords::delete_keyword),
        )
        .route(
            "/projects/{id}/feeds",
            get(feeds::list_feeds).post(feeds::add_feed),
        )
        .route("/projects/{id}/feeds/{feed_id}", delete(feeds::delete_feed))
        .route("/news", get(news::list_news))
        .route("/news/sources", get(news::news_sources))
        .route("/news/{id}/save", post(news::save_news))
        .route("/saved-news", get(news::list_saved_news))
        .route(
            "/saved-news/{id}",
            patch(news::update_saved_news).delete(news::delete_saved_news),
        )
        .route("/admin/news", post(admin::create_news))
        .route("/admin/news/exists", get(admin::news_exists))
        .route("/admin/news/enqueue", post(admin::enqueue_news))
        .route("/admin/queues/{queue}", post(admin::publish_to_queue))
        .route(
            "/admin/keywords/{id}/processed",
            post(admin::mark_keyword_processed),
        )
        .route("/admin/scheduler/tick", post(admin::run_tick))
        .fallback(handlers::not_found)
        .with_state(state)
}
