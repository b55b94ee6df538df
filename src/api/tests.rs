use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{create_router, AppState, USER_ID_HEADER};
use crate::config::Config;
use crate::db::Repository;
use crate::models::{NewUser, Role};
use crate::queue::testing::RecordingPublisher;
use crate::queue::QueueMessage;

struct TestApp {
    router: Router,
    repo: Arc<Repository>,
    publisher: Arc<RecordingPublisher>,
    admin: i64,
    owner: i64,
}

impl TestApp {
    async fn new() -> Self {
        let repo = Arc::new(Repository::in_memory().await);
        let publisher = Arc::new(RecordingPublisher::new());
        let state = AppState::new(repo.clone(), publisher.clone(), Config::default());

        let admin = add_user(&repo, "root", Role::Admin, 2).await;
        let owner = add_user(&repo, "ana", Role::User, 1).await;

        Self {
            router: create_router(state),
            repo,
            publisher,
            admin,
            owner,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(id) = user {
            request = request.header(USER_ID_HEADER, id.to_string());
        }
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_project(&self, user: i64, name: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/projects",
                Some(user),
                Some(json!({"name": name, "topic": "energy"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }
}

async fn add_user(repo: &Repository, name: &str, role: Role, subscription_id: i64) -> i64 {
    repo.create_user(NewUser {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        role,
        subscription_id,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn health_check_needs_no_identity() {
    let app = TestApp::new().await;

    let (status, _) = app.send(Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_unknown_identity_is_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = app.send(Method::GET, "/projects", Some(999), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_reports_its_path() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/nowhere", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Not Found - /nowhere"}));
}

#[tokio::test]
async fn malformed_requests_get_a_json_message() {
    let app = TestApp::new().await;
    let project_id = app.create_project(app.owner, "watch").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/projects/{}/keywords", project_id),
            Some(app.owner),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("content"));

    let (status, body) = app
        .send(Method::GET, "/projects/abc", Some(app.owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = app
        .send(Method::GET, "/news?project_id=many", Some(app.owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn users_can_edit_their_own_profile() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/users/me",
            Some(app.owner),
            Some(json!({"email": " ana@news.example.com "})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ana@news.example.com");
    assert_eq!(body["username"], "ana");

    let (status, _) = app
        .send(
            Method::PATCH,
            "/users/me",
            Some(app.owner),
            Some(json!({"username": "root"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PATCH,
            "/users/me",
            Some(app.owner),
            Some(json!({"username": "al"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username must be at least 3 characters");

    let (_, me) = app.send(Method::GET, "/users/me", Some(app.owner), None).await;
    assert_eq!(me["username"], "ana");
    assert_eq!(me["email"], "ana@news.example.com");
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/admin/scheduler/tick",
            Some(app.owner),
            Some(json!({"cron": "0 * * * *"})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn free_plan_allows_a_single_project() {
    let app = TestApp::new().await;
    app.create_project(app.owner, "first").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/projects",
            Some(app.owner),
            Some(json!({"name": "second", "topic": "energy"})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Project limit reached for your plan");
}

#[tokio::test]
async fn keyword_lifecycle_over_http() {
    let app = TestApp::new().await;
    let project_id = app.create_project(app.owner, "watch").await;
    let keywords = format!("/projects/{}/keywords", project_id);

    let (status, keyword) = app
        .send(
            Method::POST,
            &keywords,
            Some(app.owner),
            Some(json!({"content": "  Solar "})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(keyword["content"], "solar");

    let (status, _) = app
        .send(
            Method::POST,
            &keywords,
            Some(app.owner),
            Some(json!({"content": "SOLAR"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = format!("{}/{}", keywords, keyword["id"]);
    let (status, _) = app.send(Method::DELETE, &delete, Some(app.owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = app.send(Method::GET, &keywords, Some(app.owner), None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn members_share_access_but_not_ownership() {
    let app = TestApp::new().await;
    let member = add_user(&app.repo, "bo", Role::User, 1).await;
    let outsider = add_user(&app.repo, "cy", Role::User, 1).await;
    let project_id = app.create_project(app.owner, "watch").await;
    let members = format!("/projects/{}/members", project_id);
    let project = format!("/projects/{}", project_id);

    let (status, _) = app
        .send(
            Method::POST,
            &members,
            Some(app.owner),
            Some(json!({"email": "bo@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send(
            Method::POST,
            &members,
            Some(app.owner),
            Some(json!({"email": "nobody@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(Method::GET, &project, Some(member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"], 1);

    let (status, _) = app.send(Method::GET, &project, Some(outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::DELETE, &project, Some(member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let keywords = format!("{}/keywords", project);
    let (status, _) = app.send(Method::GET, &keywords, Some(member), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::POST,
            &keywords,
            Some(member),
            Some(json!({"content": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].is_string());
    assert!(app.repo.list_keywords(project_id).await.unwrap().is_empty());

    let keyword = app.repo.add_keyword(project_id, "solar").await.unwrap();
    let delete_keyword = format!("{}/{}", keywords, keyword.id);
    let (status, _) = app
        .send(Method::DELETE, &delete_keyword, Some(member), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.repo.list_keywords(project_id).await.unwrap().len(), 1);

    let remove_owner = format!("{}/{}", members, app.owner);
    let (status, _) = app
        .send(Method::DELETE, &remove_owner, Some(app.owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let remove_member = format!("{}/{}", members, member);
    let (status, _) = app
        .send(Method::DELETE, &remove_member, Some(app.owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn marking_every_keyword_processed_resets_the_cycle() {
    let app = TestApp::new().await;
    let project_id = app.create_project(app.owner, "watch").await;
    let a = app.repo.add_keyword(project_id, "solar").await.unwrap();
    let b = app.repo.add_keyword(project_id, "wind").await.unwrap();
    app.repo.increment_searches(a.id).await.unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/admin/keywords/{}/processed", a.id),
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycle_reset"], false);
    assert_eq!(body["keyword"]["processed"], true);

    let (_, body) = app
        .send(
            Method::POST,
            &format!("/admin/keywords/{}/processed", b.id),
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(body["cycle_reset"], true);

    let a = app.repo.get_keyword(a.id).await.unwrap().unwrap();
    assert!(!a.processed);
    assert_eq!(a.searches, 0);

    let (status, _) = app
        .send(Method::POST, "/admin/keywords/999/processed", Some(app.admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manual_tick_runs_the_search_cycle() {
    let app = TestApp::new().await;
    let project_id = app.create_project(app.owner, "watch").await;
    let keyword = app.repo.add_keyword(project_id, "solar").await.unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/scheduler/tick",
            Some(app.admin),
            Some(json!({"cron": "0 * * * *"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["trigger"], "search_news");
    assert_eq!(body["report"]["published"], 1);
    assert_eq!(app.publisher.sent().len(), 1);
    let keyword = app.repo.get_keyword(keyword.id).await.unwrap().unwrap();
    assert_eq!(keyword.searches, 1);

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/scheduler/tick",
            Some(app.admin),
            Some(json!({"cron": "not a cron"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["report"].is_null());
    assert_eq!(app.publisher.attempts(), 1);
}

#[tokio::test]
async fn enqueue_validates_before_publishing() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/admin/news/enqueue",
            Some(app.admin),
            Some(json!({"keyword_id": 0, "url": "https://example.com/a"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.publisher.attempts(), 0);

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/news/enqueue",
            Some(app.admin),
            Some(json!({"keyword_id": 4, "url": "https://example.com/a"})),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["queue"], "news");
    assert!(matches!(app.publisher.sent()[0], QueueMessage::News(_)));
}

#[tokio::test]
async fn unknown_queue_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/queues/emails",
            Some(app.admin),
            Some(json!({})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("emails"));
}

#[tokio::test]
async fn news_can_be_found_saved_and_edited() {
    let app = TestApp::new().await;
    let project_id = app.create_project(app.owner, "watch").await;
    let keyword = app.repo.add_keyword(project_id, "solar").await.unwrap();
    let article = json!({
        "keyword_id": keyword.id,
        "url": "https://news.example.com/solar-record",
        "title": "Solar output hits a record",
        "summary": "Grid operators report a new peak.",
        "source": "reuters",
        "published_at": "2024-05-01T08:00:00Z"
    });

    let (status, news) = app
        .send(Method::POST, "/admin/news", Some(app.admin), Some(article.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .send(Method::POST, "/admin/news", Some(app.admin), Some(article))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, exists) = app
        .send(
            Method::GET,
            "/admin/news/exists?url=https%3A%2F%2Fnews.example.com%2Fsolar-record",
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(exists, json!({"exists": true}));

    let (status, page) = app
        .send(
            Method::GET,
            &format!("/news?project_id={}", project_id),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (status, sources) = app
        .send(
            Method::GET,
            &format!("/news/sources?project_id={}", project_id),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sources, json!({"sources": ["reuters"]}));

    let (status, saved) = app
        .send(
            Method::POST,
            &format!("/news/{}/save", news["id"]),
            Some(app.owner),
            Some(json!({"project_id": project_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["title"], "Solar output hits a record");

    let (_, page) = app
        .send(
            Method::GET,
            &format!("/news?project_id={}", project_id),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(page["total"], 0);

    let saved_url = format!("/saved-news/{}", saved["id"]);
    let (status, updated) = app
        .send(
            Method::PATCH,
            &saved_url,
            Some(app.owner),
            Some(json!({"summary": null, "category": "grid"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["summary"], "");
    assert_eq!(updated["category"], "grid");

    let (_, list) = app
        .send(
            Method::GET,
            &format!("/saved-news?project_id={}&categories=grid", project_id),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["data"][0]["source"], "reuters");

    let (status, _) = app.send(Method::DELETE, &saved_url, Some(app.owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
