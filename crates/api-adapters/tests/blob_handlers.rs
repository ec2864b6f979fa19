//! Router-level tests with mocked ports: auth gating, status mapping and response shapes.

use std::sync::Arc;

use api_adapters::{router, AppState, HttpMetrics};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use domains::{
    ActingUser, DomainError, MockBlobRepository, MockCommentRepository, MockIdentityResolver,
    MockInterestRepository, MockLikeRepository, MockUserRepository, User,
};
use serde_json::Value;
use services::{BlobService, CommentService, LikeService, UserService};
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct Mocks {
    blobs: MockBlobRepository,
    interests: MockInterestRepository,
    comments: MockCommentRepository,
    likes: MockLikeRepository,
    users: MockUserRepository,
}

fn app(mocks: Mocks) -> Router {
    let mut identity = MockIdentityResolver::new();
    identity.expect_resolve().returning(|token| {
        if token == "good" {
            Ok(ActingUser {
                id: "u1".into(),
                email: "u1@example.com".into(),
            })
        } else {
            Err(DomainError::Authentication("unknown session".into()))
        }
    });

    let blobs = Arc::new(mocks.blobs);
    let state = AppState {
        blobs: BlobService::new(blobs.clone(), Arc::new(mocks.interests)),
        comments: CommentService::new(Arc::new(mocks.comments), blobs.clone()),
        likes: LikeService::new(Arc::new(mocks.likes), blobs),
        users: UserService::new(Arc::new(mocks.users)),
        identity: Arc::new(identity),
        metrics: Arc::new(HttpMetrics::new()),
    };
    router(state, &[])
}

fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer good")
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn user() -> User {
    let now = Utc::now();
    User {
        id: "u1".into(),
        name: None,
        email: Some("u1@example.com".into()),
        email_verified: None,
        image: None,
        username: Some("alice".into()),
        bio: None,
        avatar_icon: "user".into(),
        avatar_color: "cyan".into(),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_count().never();
    let app = app(mocks);

    let res = app
        .clone()
        .oneshot(Request::get("/api/blob").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(
            Request::get("/api/blob")
                .header(header::AUTHORIZATION, "Bearer stale")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(json_body(res).await["error"].is_string());
}

#[tokio::test]
async fn health_and_metrics_are_open() {
    let app = app(Mocks::default());
    let res = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_feed_reports_zero_pages() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_count().returning(|| Ok(0));
    mocks.blobs.expect_list_page().never();

    let res = app(mocks)
        .oneshot(authed("GET", "/api/blob").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["total_pages"], 0);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 10);
    assert_eq!(body["has_more"], false);
    assert_eq!(body["blobs"], Value::Array(vec![]));
}

#[tokio::test]
async fn malformed_page_is_bad_request() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_count().never();
    let res = app(mocks)
        .oneshot(authed("GET", "/api/blob?page=0").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_page_param_is_json_bad_request() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_count().never();
    let res = app(mocks)
        .oneshot(
            authed("GET", "/api/blob?page=1&page=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["error"].is_string());
}

#[tokio::test]
async fn oversized_page_offset_is_bad_request() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_count().never();
    let res = app(mocks)
        .oneshot(
            authed("GET", "/api/blob?page=4294967295&size=4294967295")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn request_id_is_generated_or_echoed() {
    let app = app(Mocks::default());
    let res = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(res.headers().contains_key("x-request-id"));

    let res = app
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn unknown_blob_is_404_and_bad_id_is_400() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_find_by_id().returning(|_| Ok(None));
    let app = app(mocks);

    let uri = format!("/api/blob/{}", Uuid::new_v4());
    let res = app
        .clone()
        .oneshot(authed("GET", &uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .oneshot(authed("GET", "/api/blob/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_blob_returns_201_with_interests() {
    let go = Uuid::new_v4();
    let mut mocks = Mocks::default();
    mocks.blobs.expect_create().returning(|_, _| Ok(()));

    let body = serde_json::json!({ "content": "hello", "interests": [go] }).to_string();
    let res = app(mocks)
        .oneshot(
            authed("POST", "/api/blob")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["interests"][0], go.to_string());
}

#[tokio::test]
async fn deleting_foreign_blob_is_403() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_delete_owned().returning(|_, _| Ok(0));
    mocks.blobs.expect_exists().returning(|_| Ok(true));

    let uri = format!("/api/blob/{}", Uuid::new_v4());
    let res = app(mocks)
        .oneshot(authed("DELETE", &uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn second_like_is_409() {
    let mut mocks = Mocks::default();
    mocks.blobs.expect_exists().returning(|_| Ok(true));
    mocks.likes.expect_create().returning(|like| {
        Err(DomainError::AlreadyReacted {
            user_id: like.user_id.clone(),
            blob_id: like.blob_id.to_string(),
        })
    });

    let uri = format!("/api/blob/{}/like", Uuid::new_v4());
    let res = app(mocks)
        .oneshot(authed("POST", &uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn removing_any_comment_is_204() {
    let mut mocks = Mocks::default();
    mocks.comments.expect_delete_owned().returning(|_, _| Ok(0));

    let uri = format!("/api/blob/{}/comment/{}", Uuid::new_v4(), Uuid::new_v4());
    let res = app(mocks)
        .oneshot(authed("DELETE", &uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn like_list_carries_user_logon() {
    let mut mocks = Mocks::default();
    mocks.likes.expect_list_by_blob().returning(|_| Ok(vec![]));
    mocks.users.expect_find_by_id().returning(|_| Ok(Some(user())));

    let uri = format!("/api/blob/{}/like", Uuid::new_v4());
    let res = app(mocks)
        .oneshot(authed("GET", &uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["user_logon"]["username"], "alice");
    assert_eq!(body["user_logon"]["avatar_color"], "cyan");
    assert_eq!(body["content"], Value::Array(vec![]));
}

#[tokio::test]
async fn store_failures_hide_details() {
    let mut mocks = Mocks::default();
    mocks
        .interests
        .expect_list_all()
        .returning(|| Err(DomainError::store("InterestRepository::list_all", "relation missing")));

    let res = app(mocks)
        .oneshot(authed("GET", "/api/interest").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(res).await["error"], "internal server error");
}
