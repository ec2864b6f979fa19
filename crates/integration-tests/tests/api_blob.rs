//! Full HTTP round trips: router → auth layer → services → in-memory store.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use integration_tests::{http::app, Services};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    app: Router,
    services: Services,
}

impl Harness {
    fn new() -> Self {
        let services = Services::new();
        for (user, token) in [("u", "tok-u"), ("v", "tok-v")] {
            services.user(user);
            services
                .store
                .add_session(token, user, Utc::now() + Duration::hours(1));
        }
        services.store.add_interest("go");
        services.store.add_interest("rust");
        Self {
            app: app(&services),
            services,
        }
    }

    async fn send(&self, method: &str, uri: &str, token: &str, body: Option<Value>) -> Response {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.app.clone().oneshot(req.body(body).unwrap()).await.unwrap()
    }
}

async fn json_body(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn blob_round_trip_over_http() {
    let h = Harness::new();

    let res = h.send("GET", "/api/interest", "tok-u", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let interests = json_body(res).await;
    let ids: Vec<Value> = interests
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].clone())
        .collect();

    let res = h
        .send(
            "POST",
            "/api/blob",
            "tok-u",
            Some(json!({ "content": "hello", "interests": ids })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let blob_id = json_body(res).await["id"].as_str().unwrap().to_owned();

    let res = h
        .send(
            "POST",
            &format!("/api/blob/{blob_id}/comment"),
            "tok-v",
            Some(json!({ "content": "welcome" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = h
        .send("POST", &format!("/api/blob/{blob_id}/like"), "tok-v", None)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = h
        .send("POST", &format!("/api/blob/{blob_id}/like"), "tok-v", None)
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = h
        .send("GET", &format!("/api/blob/{blob_id}"), "tok-u", None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let agg = json_body(res).await;
    assert_eq!(agg["user_id"], "u");
    assert_eq!(agg["username"], "u");
    assert_eq!(agg["comments"].as_array().unwrap().len(), 1);
    assert_eq!(agg["likes"].as_array().unwrap().len(), 1);
    assert_eq!(agg["interests"][0]["name"], "go");
    assert_eq!(agg["interests"][1]["name"], "rust");

    let res = h.send("GET", "/api/blob?page=1&size=5", "tok-v", None).await;
    let page = json_body(res).await;
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["blobs"][0]["likes_count"], 1);
    assert_eq!(page["blobs"][0]["comments_count"], 1);
    assert_eq!(page["blobs"][0]["interests"], json!(["go", "rust"]));
}

#[tokio::test]
async fn ownership_rules_over_http() {
    let h = Harness::new();
    let res = h
        .send(
            "POST",
            "/api/blob",
            "tok-u",
            Some(json!({ "content": "mine" })),
        )
        .await;
    let blob_id = json_body(res).await["id"].as_str().unwrap().to_owned();

    let res = h
        .send(
            "POST",
            &format!("/api/blob/{blob_id}/comment"),
            "tok-u",
            Some(json!({ "content": "own comment" })),
        )
        .await;
    let comment_id = json_body(res).await["id"].as_str().unwrap().to_owned();

    // someone else's comment: silently nothing
    let res = h
        .send(
            "DELETE",
            &format!("/api/blob/{blob_id}/comment/{comment_id}"),
            "tok-v",
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(h.services.store.comment_count(), 1);

    let res = h
        .send("DELETE", &format!("/api/blob/{blob_id}"), "tok-v", None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = h
        .send("DELETE", &format!("/api/blob/{blob_id}"), "tok-u", None)
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = h
        .send("GET", &format!("/api/blob/{blob_id}"), "tok-u", None)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_or_unknown_sessions_are_rejected() {
    let h = Harness::new();
    h.services
        .store
        .add_session("tok-old", "u", Utc::now() - Duration::minutes(1));

    for token in ["tok-old", "tok-nobody"] {
        let res = h.send("GET", "/api/blob", token, None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn profile_endpoints() {
    let h = Harness::new();

    let res = h
        .send(
            "PUT",
            "/api/user",
            "tok-u",
            Some(json!({ "bio": "hello there", "name": "" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let me = json_body(res).await;
    assert_eq!(me["bio"], "hello there");
    assert_eq!(me["avatar_icon"], "user");

    let res = h.send("PUT", "/api/user", "tok-u", Some(json!({}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = h.send("GET", "/api/user/v", "tok-u", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["blobs"], json!([]));

    let res = h.send("GET", "/api/user/ghost", "tok-u", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_list_shows_caller_logon() {
    let h = Harness::new();
    let res = h
        .send("POST", "/api/blob", "tok-u", Some(json!({ "content": "x" })))
        .await;
    let blob_id = json_body(res).await["id"].as_str().unwrap().to_owned();

    let res = h
        .send("GET", &format!("/api/blob/{blob_id}/comment"), "tok-v", None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["user_logon"]["id"], "v");
    assert_eq!(body["user_logon"]["email"], "v@example.com");
    assert_eq!(body["content"], json!([]));
}
