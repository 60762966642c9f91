//! End-to-end CRUD flows against a real database. Ignored by default;
//! run with a reachable PostgreSQL (DATABASE_URL or DB_* vars set):
//!
//!     cargo test --test db_flow -- --ignored

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use quillpad::{app::build_app, state::AppState};

async fn spawn_app() -> Router {
    dotenvy::dotenv().ok();
    let state = AppState::init().await.expect("database must be reachable");
    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .expect("migrations should apply");
    build_app(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn user_lifecycle_round_trip() {
    let app = spawn_app().await;

    // Fresh pair per run; the table keeps rows across runs.
    let tag = Uuid::new_v4().simple().to_string();
    let email = format!("{tag}@example.com");
    let login = format!("user-{tag}");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/users/",
            serde_json::json!({ "email": email, "login": login, "password": "p1p1p1p1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_ne!(created["password"], "p1p1p1p1");

    // get-by-id returns exactly one matching record
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched.as_array().unwrap().len(), 1);
    assert_eq!(fetched[0]["email"], email.as_str());
    assert_eq!(fetched[0]["login"], login.as_str());
    assert_ne!(fetched[0]["password"], "p1p1p1p1");

    // duplicate (email, login) pair is rejected and no second row appears
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/users/",
            serde_json::json!({ "email": email, "login": login, "password": "p2p2p2p2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let all = body_json(response).await;
    let matching = all
        .as_array()
        .unwrap()
        .iter()
        .filter(|u| u["email"] == email.as_str() && u["login"] == login.as_str())
        .count();
    assert_eq!(matching, 1);

    // partial update: new login only, email untouched
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/users/{id}"),
            serde_json::json!({ "login": format!("renamed-{tag}") }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["email"], email.as_str());
    assert_eq!(updated["login"], format!("renamed-{tag}"));
    assert!(updated["updatedAt"].as_str().unwrap() >= updated["createdAt"].as_str().unwrap());

    // delete, then delete again: second call is a clean 404
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // and the record is gone
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn post_partial_update_and_cascade_delete() {
    let app = spawn_app().await;

    let tag = Uuid::new_v4().simple().to_string();
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/users/",
            serde_json::json!({
                "email": format!("{tag}@example.com"),
                "login": format!("author-{tag}"),
                "password": "p1p1p1p1"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let author_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/posts",
            serde_json::json!({ "authorId": author_id, "title": "first", "content": "body" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = body_json(response).await;
    let post_id = post["id"].as_str().unwrap().to_string();

    // title-only update leaves content alone and advances updatedAt
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/posts/{post_id}"),
            serde_json::json!({ "title": "second" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["title"], "second");
    assert_eq!(updated["content"], "body");
    assert!(updated["updatedAt"].as_str().unwrap() > post["updatedAt"].as_str().unwrap());

    // deleting the author removes their posts
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{author_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/posts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let remaining = body_json(response).await;
    assert!(remaining
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["authorId"] != author_id.as_str()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/posts/{post_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn post_with_unknown_author_is_rejected() {
    let app = spawn_app().await;

    let ghost = Uuid::new_v4();
    let title = format!("orphan-{ghost}");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/posts",
            serde_json::json!({ "authorId": ghost, "title": title, "content": "c" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // no row was inserted
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/posts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let posts = body_json(response).await;
    assert!(posts
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["title"] != title.as_str()));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn index_page_renders() {
    let app = spawn_app().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<h2>Users"));
    assert!(html.contains("<h2>Posts"));
}
