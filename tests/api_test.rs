//! End-to-end tests for the HTTP API.
//!
//! Each test spawns the full router on an ephemeral port, backed by a
//! temporary SQLite database and photo directory, and drives it with reqwest.

use std::sync::Arc;

use photoshare::config::Config;
use photoshare::db;
use photoshare::photos::PhotoStore;
use photoshare::routes;
use photoshare::state::AppState;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestServer {
    base: String,
    client: reqwest::Client,
    _tmp: TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.resolve_paths(tmp.path());

        let pool = db::create_pool(config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");
        let photos = PhotoStore::new(config.photos_path().to_path_buf()).await.unwrap();

        let state = AppState {
            db: pool,
            config,
            photos: Arc::new(photos),
        };
        let app = routes::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            _tmp: tmp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// POST /session, returning (status, user id).
    async fn session(&self, username: &str) -> (u16, String) {
        let resp = self
            .client
            .post(self.url("/session"))
            .json(&json!({ "username": username }))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let id: String = resp.json().await.unwrap();
        (status, id)
    }

    async fn login(&self, username: &str) -> String {
        self.session(username).await.1
    }

    async fn get(&self, path: &str, token: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn put(&self, path: &str, token: &str, body: Option<Value>) -> (u16, Value) {
        let mut req = self.client.put(self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn delete(&self, path: &str, token: &str) -> u16 {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    }
}

fn usernames(body: &Value) -> Vec<String> {
    body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// SESSION
// ============================================================================

#[tokio::test]
async fn session_creates_then_returns_existing_user() {
    let server = TestServer::spawn().await;

    let (status, first) = server.session("alice").await;
    assert_eq!(status, 201);
    let (status, second) = server.session("alice").await;
    assert_eq!(status, 200);
    assert_eq!(first, second);
}

#[tokio::test]
async fn session_rejects_invalid_usernames() {
    let server = TestServer::spawn().await;

    for bad in ["al", "has space", "waytoolongusername"] {
        let resp = server
            .client
            .post(server.url("/session"))
            .json(&json!({ "username": bad }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400, "username {:?}", bad);
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].is_string());
    }

    let resp = server
        .client
        .post(server.url("/session"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

// ============================================================================
// AUTH
// ============================================================================

#[tokio::test]
async fn requests_without_bearer_token_are_unauthorized() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;

    let resp = server
        .client
        .get(server.url(&format!("/users/{}", alice)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = server
        .client
        .get(server.url(&format!("/users/{}", alice)))
        .header("authorization", format!("Token {}", alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn acting_as_someone_else_is_forbidden() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;

    let (status, _) = server
        .put(&format!("/users/{}/following/{}", alice, bob), &bob, None)
        .await;
    assert_eq!(status, 403);

    let (status, _) = server
        .post(
            &format!("/users/{}/posts", alice),
            &bob,
            json!({ "caption": "not mine" }),
        )
        .await;
    assert_eq!(status, 403);

    assert_eq!(server.delete(&format!("/users/{}", alice), &bob).await, 403);
    let (status, _) = server.get(&format!("/users/{}/feed", alice), &bob).await;
    assert_eq!(status, 403);
}

// ============================================================================
// PROFILES
// ============================================================================

#[tokio::test]
async fn profile_update_and_username_conflict() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    server.login("bob").await;

    let (status, body) = server
        .put(
            &format!("/users/{}", alice),
            &alice,
            Some(json!({ "username": "alice2", "bio": "hello" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["username"], "alice2");
    assert_eq!(body["bio"], "hello");
    assert_eq!(body["followers"], 0);

    let (status, body) = server
        .put(
            &format!("/users/{}", alice),
            &alice,
            Some(json!({ "username": "bob" })),
        )
        .await;
    assert_eq!(status, 409);
    assert!(body["message"].as_str().unwrap().contains("bob"));
}

#[tokio::test]
async fn deleted_user_is_not_found() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;

    assert_eq!(server.delete(&format!("/users/{}", alice), &alice).await, 200);
    let (status, _) = server.get(&format!("/users/{}", alice), &bob).await;
    assert_eq!(status, 404);
}

// ============================================================================
// FOLLOWS
// ============================================================================

#[tokio::test]
async fn follow_then_unfollow_updates_counts() {
    let server = TestServer::spawn().await;

    let (status, alice) = server.session("alice").await;
    assert_eq!(status, 201);
    let (status, bob) = server.session("bob").await;
    assert_eq!(status, 201);

    let (status, _) = server
        .put(&format!("/users/{}/following/{}", alice, bob), &alice, None)
        .await;
    assert_eq!(status, 200);

    let (_, profile) = server.get(&format!("/users/{}", bob), &alice).await;
    assert_eq!(profile["followers"], 1);

    let (status, body) = server
        .get(&format!("/users/{}/following", alice), &alice)
        .await;
    assert_eq!(status, 200);
    assert_eq!(usernames(&body), vec!["bob"]);

    let (_, body) = server
        .get(&format!("/users/{}/followers", bob), &alice)
        .await;
    assert_eq!(usernames(&body), vec!["alice"]);

    assert_eq!(
        server
            .delete(&format!("/users/{}/following/{}", alice, bob), &alice)
            .await,
        200
    );
    let (_, profile) = server.get(&format!("/users/{}", bob), &alice).await;
    assert_eq!(profile["followers"], 0);
    let (_, profile) = server.get(&format!("/users/{}", alice), &alice).await;
    assert_eq!(profile["following"], 0);
}

#[tokio::test]
async fn repeated_follow_and_self_follow() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let path = format!("/users/{}/following/{}", alice, bob);

    assert_eq!(server.put(&path, &alice, None).await.0, 200);
    assert_eq!(server.put(&path, &alice, None).await.0, 200);
    let (_, profile) = server.get(&format!("/users/{}", bob), &bob).await;
    assert_eq!(profile["followers"], 1);

    let (status, _) = server
        .put(&format!("/users/{}/following/{}", alice, alice), &alice, None)
        .await;
    assert_eq!(status, 400);

    let (status, _) = server
        .put(&format!("/users/{}/following/nobody", alice), &alice, None)
        .await;
    assert_eq!(status, 404);
}

// ============================================================================
// BANS
// ============================================================================

#[tokio::test]
async fn banned_viewer_cannot_see_banner() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let carol = server.login("carol").await;

    let (status, _) = server
        .put(&format!("/users/{}/banned/{}", alice, bob), &alice, None)
        .await;
    assert_eq!(status, 200);

    let (status, body) = server.get(&format!("/users/{}/banned", alice), &alice).await;
    assert_eq!(status, 200);
    assert_eq!(usernames(&body), vec!["bob"]);
    let (status, _) = server.get(&format!("/users/{}/banned", alice), &bob).await;
    assert_eq!(status, 403);

    // profile and posts
    let (status, body) = server.get(&format!("/users/{}", alice), &bob).await;
    assert_eq!(status, 403);
    assert!(body["message"].is_string());
    let (status, _) = server.get(&format!("/users/{}/posts", alice), &bob).await;
    assert_eq!(status, 403);
    let (status, _) = server.get(&format!("/users/{}", alice), &carol).await;
    assert_eq!(status, 200);

    // search
    let (_, body) = server.get("/users?username=ali", &bob).await;
    assert!(usernames(&body).is_empty());
    let (_, body) = server.get("/users?username=ali", &carol).await;
    assert_eq!(usernames(&body), vec!["alice"]);

    // follower lists of a third party
    server
        .put(&format!("/users/{}/following/{}", alice, carol), &alice, None)
        .await;
    let (_, body) = server
        .get(&format!("/users/{}/followers", carol), &bob)
        .await;
    assert!(usernames(&body).is_empty());

    // bob cannot follow alice while banned
    let (status, _) = server
        .put(&format!("/users/{}/following/{}", bob, alice), &bob, None)
        .await;
    assert_eq!(status, 403);

    assert_eq!(
        server
            .delete(&format!("/users/{}/banned/{}", alice, bob), &alice)
            .await,
        200
    );
    let (status, _) = server.get(&format!("/users/{}", alice), &bob).await;
    assert_eq!(status, 200);
}

// ============================================================================
// POSTS, LIKES AND COMMENTS
// ============================================================================

async fn create_post(server: &TestServer, author: &str, caption: &str) -> String {
    let (status, body) = server
        .post(
            &format!("/users/{}/posts", author),
            author,
            json!({ "caption": caption, "image": "photo-id" }),
        )
        .await;
    assert_eq!(status, 201);
    body["postId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn post_crud() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let post = create_post(&server, &alice, "sunset").await;
    let path = format!("/users/{}/posts/{}", alice, post);

    let (status, body) = server.get(&path, &bob).await;
    assert_eq!(status, 200);
    assert_eq!(body["caption"], "sunset");
    assert_eq!(body["authorUsername"], "alice");
    assert_eq!(body["likeCount"], 0);

    let (status, body) = server
        .put(&path, &alice, Some(json!({ "caption": "sunrise", "image": "photo-id" })))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["caption"], "sunrise");

    let (_, body) = server.get(&format!("/users/{}/posts", alice), &bob).await;
    assert_eq!(body["posts"][0]["resourceId"], post.as_str());

    // addressed through the wrong author
    let (status, _) = server
        .get(&format!("/users/{}/posts/{}", bob, post), &bob)
        .await;
    assert_eq!(status, 404);

    assert_eq!(server.delete(&path, &alice).await, 200);
    let (status, _) = server.get(&path, &bob).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn like_and_unlike_post_are_idempotent() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let post = create_post(&server, &alice, "cat").await;
    let post_path = format!("/users/{}/posts/{}", alice, post);
    let like_path = format!("{}/likes/{}", post_path, bob);

    assert_eq!(server.put(&like_path, &bob, None).await.0, 200);
    assert_eq!(server.put(&like_path, &bob, None).await.0, 200);
    let (_, body) = server.get(&post_path, &bob).await;
    assert_eq!(body["likeCount"], 1);

    let (_, body) = server.get(&format!("{}/likes", post_path), &alice).await;
    let likes = body["likes"].as_array().unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0]["username"], "bob");
    assert_eq!(likes[0]["resourceId"], post.as_str());

    // alice cannot like as bob
    assert_eq!(server.put(&like_path, &alice, None).await.0, 403);

    assert_eq!(server.delete(&like_path, &bob).await, 200);
    assert_eq!(server.delete(&like_path, &bob).await, 200);
    let (_, body) = server.get(&post_path, &bob).await;
    assert_eq!(body["likeCount"], 0);
}

#[tokio::test]
async fn comment_lifecycle_keeps_counter_in_step() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let post = create_post(&server, &alice, "lake").await;
    let post_path = format!("/users/{}/posts/{}", alice, post);

    let (status, comment) = server
        .post(
            &format!("{}/comments", post_path),
            &bob,
            json!({ "authorId": bob, "caption": "lovely" }),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(comment["authorUsername"], "bob");
    let comment_id = comment["commentId"].as_str().unwrap().to_string();
    let comment_path = format!("{}/comments/{}", post_path, comment_id);

    let (_, body) = server.get(&post_path, &alice).await;
    assert_eq!(body["commentCount"], 1);

    // commenting under someone else's name
    let (status, _) = server
        .post(
            &format!("{}/comments", post_path),
            &alice,
            json!({ "authorId": bob, "caption": "forged" }),
        )
        .await;
    assert_eq!(status, 403);

    // only the comment author may edit
    let (status, _) = server
        .put(&comment_path, &alice, Some(json!({ "caption": "edited" })))
        .await;
    assert_eq!(status, 403);
    let (status, body) = server
        .put(&comment_path, &bob, Some(json!({ "caption": "edited" })))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["caption"], "edited");

    // comment likes
    let like_path = format!("{}/likes/{}", comment_path, alice);
    assert_eq!(server.put(&like_path, &alice, None).await.0, 200);
    let (_, body) = server.get(&comment_path, &alice).await;
    assert_eq!(body["likeCount"], 1);
    let (_, body) = server.get(&format!("{}/likes", comment_path), &bob).await;
    assert_eq!(body["likes"][0]["username"], "alice");

    let (_, body) = server.get(&format!("{}/comments", post_path), &alice).await;
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);

    assert_eq!(server.delete(&comment_path, &bob).await, 200);
    let (_, body) = server.get(&post_path, &alice).await;
    assert_eq!(body["commentCount"], 0);
    assert_eq!(server.delete(&comment_path, &bob).await, 404);
}

#[tokio::test]
async fn deleting_post_removes_its_comments() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let post = create_post(&server, &alice, "tree").await;
    let post_path = format!("/users/{}/posts/{}", alice, post);

    let (_, comment) = server
        .post(
            &format!("{}/comments", post_path),
            &bob,
            json!({ "authorId": bob, "caption": "green" }),
        )
        .await;
    let comment_path = format!("{}/comments/{}", post_path, comment["commentId"].as_str().unwrap());

    assert_eq!(server.delete(&post_path, &alice).await, 200);
    let (status, _) = server.get(&comment_path, &bob).await;
    assert_eq!(status, 404);
}

async fn create_comment(server: &TestServer, post_path: &str, author: &str, caption: &str) -> String {
    let (status, body) = server
        .post(
            &format!("{}/comments", post_path),
            author,
            json!({ "authorId": author, "caption": caption }),
        )
        .await;
    assert_eq!(status, 201);
    body["commentId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn banned_author_can_still_edit_and_delete_own_comment() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let post = create_post(&server, &alice, "pier").await;
    let post_path = format!("/users/{}/posts/{}", alice, post);
    let comment = create_comment(&server, &post_path, &bob, "before").await;
    let comment_path = format!("{}/comments/{}", post_path, comment);

    let (status, _) = server
        .put(&format!("/users/{}/banned/{}", alice, bob), &alice, None)
        .await;
    assert_eq!(status, 200);

    // reading is still denied
    let (status, _) = server.get(&comment_path, &bob).await;
    assert_eq!(status, 403);

    let (status, body) = server
        .put(&comment_path, &bob, Some(json!({ "caption": "after" })))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["caption"], "after");

    assert_eq!(server.delete(&comment_path, &bob).await, 200);
    let (_, body) = server.get(&post_path, &alice).await;
    assert_eq!(body["commentCount"], 0);
}

#[tokio::test]
async fn like_and_unlike_comment_over_http() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let post = create_post(&server, &alice, "dunes").await;
    let post_path = format!("/users/{}/posts/{}", alice, post);
    let comment = create_comment(&server, &post_path, &alice, "windy").await;
    let comment_path = format!("{}/comments/{}", post_path, comment);
    let like_path = format!("{}/likes/{}", comment_path, bob);

    // liking as someone else
    assert_eq!(server.put(&like_path, &alice, None).await.0, 403);
    assert_eq!(server.delete(&like_path, &alice).await, 403);

    assert_eq!(server.put(&like_path, &bob, None).await.0, 200);
    assert_eq!(server.put(&like_path, &bob, None).await.0, 200);
    let (_, body) = server.get(&comment_path, &alice).await;
    assert_eq!(body["likeCount"], 1);

    let (status, body) = server.get(&format!("{}/likes", comment_path), &alice).await;
    assert_eq!(status, 200);
    let likes = body["likes"].as_array().unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0]["userId"], bob.as_str());
    assert_eq!(likes[0]["resourceId"], comment.as_str());

    // the post's own counter is untouched
    let (_, body) = server.get(&post_path, &alice).await;
    assert_eq!(body["likeCount"], 0);

    assert_eq!(server.delete(&like_path, &bob).await, 200);
    assert_eq!(server.delete(&like_path, &bob).await, 200);
    let (_, body) = server.get(&comment_path, &alice).await;
    assert_eq!(body["likeCount"], 0);
    let (_, body) = server.get(&format!("{}/likes", comment_path), &alice).await;
    assert!(body["likes"].as_array().unwrap().is_empty());
}

// ============================================================================
// FEED
// ============================================================================

#[tokio::test]
async fn feed_lists_followed_posts_newest_first() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let carol = server.login("carol").await;

    server
        .put(&format!("/users/{}/following/{}", alice, bob), &alice, None)
        .await;
    let older = create_post(&server, &bob, "first").await;
    let newer = create_post(&server, &bob, "second").await;
    create_post(&server, &carol, "unfollowed").await;

    let (status, body) = server.get(&format!("/users/{}/feed", alice), &alice).await;
    assert_eq!(status, 200);
    let ids: Vec<_> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["resourceId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![newer, older]);
}

// ============================================================================
// PHOTOS
// ============================================================================

async fn upload(server: &TestServer, owner: &str, token: &str, form: Form) -> (u16, Value) {
    let resp = server
        .client
        .post(server.url(&format!("/users/{}/photos", owner)))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn photo_form(bytes: &[u8]) -> Form {
    Form::new().part(
        "photo",
        Part::bytes(bytes.to_vec())
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .unwrap(),
    )
}

#[tokio::test]
async fn photo_upload_read_and_delete() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;
    let jpeg = b"\xff\xd8\xff\xe0fake-jpeg";

    let (status, body) = upload(&server, &alice, &alice, photo_form(jpeg)).await;
    assert_eq!(status, 201);
    let photo_id = body.as_str().unwrap().to_string();
    let photo_url = server.url(&format!("/users/{}/photos/{}", alice, photo_id));

    let resp = server
        .client
        .get(&photo_url)
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-type"], "image/jpeg");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), jpeg);

    // only the owner uploads and deletes
    let (status, _) = upload(&server, &alice, &bob, photo_form(jpeg)).await;
    assert_eq!(status, 403);
    let path = format!("/users/{}/photos/{}", alice, photo_id);
    assert_eq!(server.delete(&path, &bob).await, 403);
    assert_eq!(server.delete(&path, &alice).await, 200);

    let resp = server
        .client
        .get(&photo_url)
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn photo_upload_requires_photo_field() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;

    let form = Form::new().text("caption", "no image here");
    let (status, body) = upload(&server, &alice, &alice, form).await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("photo"));
}

#[tokio::test]
async fn banned_viewer_cannot_fetch_photos() {
    let server = TestServer::spawn().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;

    let (_, body) = upload(&server, &alice, &alice, photo_form(b"jpeg")).await;
    let photo_id = body.as_str().unwrap().to_string();
    server
        .put(&format!("/users/{}/banned/{}", alice, bob), &alice, None)
        .await;

    let (status, _) = server
        .get(&format!("/users/{}/photos/{}", alice, photo_id), &bob)
        .await;
    assert_eq!(status, 403);
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn liveness_needs_no_auth() {
    let server = TestServer::spawn().await;
    let resp = server
        .client
        .get(server.url("/liveness"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}
