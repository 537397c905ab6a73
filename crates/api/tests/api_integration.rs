//! API integration tests.
//!
//! These tests drive the full router (auth middleware included) against an
//! in-memory `SQLite` database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
};
use borohub_api::{AppState, RateLimiterState, middleware::auth_middleware, router as api_router};
use borohub_common::{
    AuthConfig, Config, DatabaseConfig, IdGenerator, LocalStorage, ServerConfig, StorageSettings,
};
use borohub_db::test_utils::TestDatabase;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Create a test configuration.
fn create_test_config(storage_path: PathBuf) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "http://localhost:3000".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 604_800,
            secure_cookies: false,
            admin_emails: vec!["admin@example.com".to_string()],
        },
        storage: StorageSettings {
            base_path: storage_path,
            base_url: "/files".to_string(),
            max_file_size: 1024 * 1024,
        },
    }
}

struct TestApp {
    router: Router,
    storage_path: PathBuf,
    _db: TestDatabase,
}

/// Create the app over a fresh database, wired like the server does.
async fn create_test_app() -> TestApp {
    let db = TestDatabase::new().await.expect("test database");
    let storage_path =
        std::env::temp_dir().join(format!("borohub-api-{}", IdGenerator::new().generate()));
    let config = create_test_config(storage_path.clone());
    let storage = Arc::new(LocalStorage::new(
        storage_path.clone(),
        config.storage.base_url.clone(),
    ));

    let state = AppState::new(db.connection(), storage, &config);
    let router = Router::new()
        .nest("/api", api_router(RateLimiterState::new()))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state);

    TestApp {
        router,
        storage_path,
        _db: db,
    }
}

const BOUNDARY: &str = "borohub-test-boundary";

/// A `multipart/form-data` body built part by part.
#[derive(Default)]
struct Form {
    body: Vec<u8>,
}

impl Form {
    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// Files stored under `dir`, recursively.
fn stored_files(dir: &std::path::Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(stored_files(&path));
        } else {
            files.push(path);
        }
    }
    files
}

struct Reply {
    status: StatusCode,
    cookies: Vec<String>,
    body: Value,
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            cookies,
            body,
        }
    }

    async fn json(&self, method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn multipart(&self, method: &str, uri: &str, cookie: &str, form: Form) -> Reply {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::COOKIE, cookie)
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(req).await
    }

    async fn empty(&self, method: &str, uri: &str, cookie: Option<&str>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Register a member and return its ID.
    async fn register(&self, handle: &str) -> String {
        let reply = self
            .json(
                "POST",
                "/api/auth/initializeAccount",
                None,
                json!({
                    "fullName": format!("{handle} tester"),
                    "handle": handle,
                    "emailAddress": format!("{handle}@example.com"),
                    "plainPassword": "correct-horse",
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["data"]["member"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Sign in and return a `Cookie` header value carrying the access token.
    async fn sign_in(&self, handle: &str) -> String {
        let reply = self
            .json(
                "POST",
                "/api/auth/accessAccount",
                None,
                json!({ "handle": handle, "plainPassword": "correct-horse" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        session_cookie(&reply.cookies, "accessToken")
    }
}

fn session_cookie(set_cookies: &[String], name: &str) -> String {
    set_cookies
        .iter()
        .find(|c| c.starts_with(&format!("{name}=")))
        .and_then(|c| c.split(';').next())
        .expect("session cookie")
        .to_string()
}

// === Auth ===

#[tokio::test]
async fn test_initialize_account_returns_sanitized_member() {
    let app = create_test_app().await;

    let reply = app
        .json(
            "POST",
            "/api/auth/initializeAccount",
            None,
            json!({
                "fullName": "Grace Hopper",
                "handle": "grace",
                "emailAddress": "grace@example.com",
                "plainPassword": "cobol-forever",
                "aboutMe": "compilers",
            }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["success"], true);
    let member = &reply.body["data"]["member"];
    assert_eq!(member["handle"], "grace");
    assert_eq!(member["aboutMe"], "compilers");
    assert_eq!(member["role"], "member");
    assert!(member.get("passwordHash").is_none());
    assert_eq!(member["connections"]["followers"], json!([]));
}

#[tokio::test]
async fn test_duplicate_handle_is_bad_request() {
    let app = create_test_app().await;
    app.register("twin").await;

    let reply = app
        .json(
            "POST",
            "/api/auth/initializeAccount",
            None,
            json!({
                "fullName": "Other Twin",
                "handle": "twin",
                "emailAddress": "other@example.com",
                "plainPassword": "correct-horse",
            }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = create_test_app().await;
    app.register("ada").await;

    let reply = app
        .json(
            "POST",
            "/api/auth/accessAccount",
            None,
            json!({ "emailAddress": "ada@example.com", "plainPassword": "nope-nope" }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "UNAUTHORIZED");
    assert!(reply.cookies.is_empty());
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = create_test_app().await;
    let id = app.register("ada").await;

    let reply = app
        .json(
            "POST",
            "/api/auth/accessAccount",
            None,
            json!({ "handle": "ada", "plainPassword": "correct-horse" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let access = session_cookie(&reply.cookies, "accessToken");
    let refresh = session_cookie(&reply.cookies, "refreshToken");
    assert!(
        reply
            .cookies
            .iter()
            .all(|c| c.contains("HttpOnly") && c.contains("SameSite=None"))
    );

    let session = app.empty("GET", "/api/auth/getSession", Some(&access)).await;
    assert_eq!(session.status, StatusCode::OK);
    assert_eq!(session.body["data"]["member"]["id"], id.as_str());

    let refreshed = app
        .empty("POST", "/api/auth/refreshSession", Some(&refresh))
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    session_cookie(&refreshed.cookies, "accessToken");

    // An access token is not a refresh token.
    let wrong_kind = app
        .empty(
            "POST",
            "/api/auth/refreshSession",
            Some(&access.replacen("accessToken", "refreshToken", 1)),
        )
        .await;
    assert_eq!(wrong_kind.status, StatusCode::UNAUTHORIZED);

    let ended = app.empty("GET", "/api/auth/endSession", Some(&access)).await;
    assert_eq!(ended.status, StatusCode::OK);
    assert!(ended.cookies.iter().any(|c| c.starts_with("accessToken=;")));
}

#[tokio::test]
async fn test_get_session_requires_sign_in() {
    let app = create_test_app().await;

    let reply = app.empty("GET", "/api/auth/getSession", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = app
        .empty("GET", "/api/auth/getSession", Some("accessToken=garbage"))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_is_rate_limited() {
    let app = create_test_app().await;

    for _ in 0..5 {
        let reply = app
            .json(
                "POST",
                "/api/auth/accessAccount",
                None,
                json!({ "handle": "nobody", "plainPassword": "whatever1" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    let reply = app
        .json(
            "POST",
            "/api/auth/accessAccount",
            None,
            json!({ "handle": "nobody", "plainPassword": "whatever1" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.body["error"], "RATE_LIMITED");
}

// === Members ===

#[tokio::test]
async fn test_follow_and_restrict_over_http() {
    let app = create_test_app().await;
    let a = app.register("alpha").await;
    let b = app.register("bravo").await;
    let a_cookie = app.sign_in("alpha").await;

    let reply = app
        .empty("PUT", &format!("/api/member/follow/{b}"), Some(&a_cookie))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body["data"]["memberData"]["connections"]["followers"],
        json!([a.clone()])
    );

    let followers = app
        .empty("GET", &format!("/api/member/followers/{b}"), None)
        .await;
    assert_eq!(followers.body["data"]["members"][0]["handle"], "alpha");

    // A restricts B: the follow edge goes away.
    let reply = app
        .json(
            "POST",
            &format!("/api/member/restricted/{a}"),
            Some(&a_cookie),
            json!({ "restrictedUserId": b }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let b_profile = app.empty("GET", &format!("/api/member/{b}"), None).await;
    assert_eq!(b_profile.body["data"]["connections"]["followers"], json!([]));
    let a_profile = app.empty("GET", &format!("/api/member/{a}"), None).await;
    assert_eq!(a_profile.body["data"]["restrictedUsers"], json!([b.clone()]));

    // Restricting on someone else's behalf is forbidden.
    let reply = app
        .json(
            "POST",
            &format!("/api/member/restricted/{b}"),
            Some(&a_cookie),
            json!({ "restrictedUserId": a }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_follow_requires_session() {
    let app = create_test_app().await;
    let b = app.register("bravo").await;

    let reply = app
        .empty("PUT", &format!("/api/member/follow/{b}"), None)
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);
}

#[tokio::test]
async fn test_avatar_upload() {
    let app = create_test_app().await;
    let id = app.register("pic").await;
    let cookie = app.sign_in("pic").await;

    let form = Form::default().file(
        "avatar",
        "me.png",
        "image/png",
        &[0x89, b'P', b'N', b'G', 1, 2, 3, 4],
    );
    let reply = app
        .multipart("PUT", &format!("/api/member/avatarUpload/{id}"), &cookie, form)
        .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    let avatar = reply.body["data"]["memberData"]["avatar"].as_str().unwrap();
    assert!(avatar.starts_with(&format!("/files/avatars/{id}/")));
    assert!(avatar.ends_with(".png"));
}

#[tokio::test]
async fn test_avatar_for_unknown_member_leaves_no_file() {
    let app = create_test_app().await;
    app.register("admin").await;
    let cookie = app.sign_in("admin").await;

    let form = Form::default().file("avatar", "me.png", "image/png", b"png-bytes");
    let reply = app
        .multipart("PUT", "/api/member/avatarUpload/ghost", &cookie, form)
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND, "{}", reply.body);
    assert!(stored_files(&app.storage_path.join("avatars/ghost")).is_empty());
}

#[tokio::test]
async fn test_admin_delete_requires_admin() {
    let app = create_test_app().await;
    app.register("plain").await;
    let victim = app.register("victim").await;
    let cookie = app.sign_in("plain").await;

    let reply = app
        .empty(
            "DELETE",
            &format!("/api/member/admin/delete/{victim}"),
            Some(&cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_self_delete_removes_member() {
    let app = create_test_app().await;
    let id = app.register("leaving").await;
    let cookie = app.sign_in("leaving").await;

    let reply = app
        .empty("DELETE", &format!("/api/member/delete/{id}"), Some(&cookie))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["report"]["memberId"], id.as_str());

    let reply = app.empty("GET", &format!("/api/member/{id}"), None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "MEMBER_NOT_FOUND");
}

// === Content and comments ===

#[tokio::test]
async fn test_post_like_flow() {
    let app = create_test_app().await;
    app.register("writer").await;
    app.register("reader").await;
    let writer = app.sign_in("writer").await;
    let reader = app.sign_in("reader").await;

    let created = app
        .json(
            "POST",
            "/api/content/create-content",
            Some(&writer),
            json!({ "content": "hello borohub", "media": ["/files/posts/x.png"] }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let post_id = created.body["data"]["post"]["id"].as_str().unwrap().to_string();

    let liked = app
        .empty("PUT", &format!("/api/content/like-content/{post_id}"), Some(&reader))
        .await;
    assert_eq!(liked.status, StatusCode::OK);
    assert_eq!(liked.body["data"]["post"]["likeCount"], 1);

    let again = app
        .empty("PUT", &format!("/api/content/like-content/{post_id}"), Some(&reader))
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);

    let unliked = app
        .empty("PUT", &format!("/api/content/unlike-content/{post_id}"), Some(&reader))
        .await;
    assert_eq!(unliked.body["data"]["post"]["likeCount"], 0);

    let never = app
        .empty("PUT", &format!("/api/content/unlike-content/{post_id}"), Some(&reader))
        .await;
    assert_eq!(never.status, StatusCode::BAD_REQUEST);

    let forbidden = app
        .empty(
            "DELETE",
            &format!("/api/content/delete-content/{post_id}"),
            Some(&reader),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_post_with_images() {
    let app = create_test_app().await;
    let id = app.register("painter").await;
    let cookie = app.sign_in("painter").await;

    let form = Form::default()
        .text("content", "  two sketches  ")
        .file("media", "one.png", "image/png", b"first-image")
        .file("media", "two.webp", "image/webp", b"second-image");
    let reply = app
        .multipart(
            "POST",
            &format!("/api/content/create-content-images/{id}"),
            &cookie,
            form,
        )
        .await;

    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    let post = &reply.body["data"]["post"];
    assert_eq!(post["content"], "two sketches");
    let media: Vec<&str> = post["media"]
        .as_array()
        .unwrap()
        .iter()
        .map(|url| url.as_str().unwrap())
        .collect();
    assert_eq!(media.len(), 2);
    let prefix = format!("/files/posts/{id}/");
    assert!(media[0].starts_with(&prefix) && media[0].ends_with(".png"));
    assert!(media[1].starts_with(&prefix) && media[1].ends_with(".webp"));

    let first = app
        .storage_path
        .join(media[0].trim_start_matches("/files/"));
    assert_eq!(std::fs::read(first).unwrap(), b"first-image");
}

#[tokio::test]
async fn test_create_post_with_too_many_images() {
    let app = create_test_app().await;
    let id = app.register("hoarder").await;
    let cookie = app.sign_in("hoarder").await;

    let form = (0..11).fold(Form::default().text("content", "eleven"), |form, i| {
        form.file("media", &format!("{i}.png"), "image/png", b"png-bytes")
    });
    let reply = app
        .multipart(
            "POST",
            &format!("/api/content/create-content-images/{id}"),
            &cookie,
            form,
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.body);
    assert_eq!(reply.body["success"], false);
    assert!(stored_files(&app.storage_path.join(format!("posts/{id}"))).is_empty());
}

#[tokio::test]
async fn test_create_post_rejects_non_image() {
    let app = create_test_app().await;
    let id = app.register("typist").await;
    let cookie = app.sign_in("typist").await;

    let form = Form::default()
        .text("content", "notes")
        .file("media", "one.png", "image/png", b"png-bytes")
        .file("media", "notes.txt", "text/plain", b"just text");
    let reply = app
        .multipart(
            "POST",
            &format!("/api/content/create-content-images/{id}"),
            &cookie,
            form,
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.body);
    assert!(stored_files(&app.storage_path.join(format!("posts/{id}"))).is_empty());
}

#[tokio::test]
async fn test_create_post_with_blank_content_stores_nothing() {
    let app = create_test_app().await;
    let id = app.register("quiet").await;
    let cookie = app.sign_in("quiet").await;

    let form = Form::default()
        .text("content", "   ")
        .file("media", "one.png", "image/png", b"png-bytes");
    let reply = app
        .multipart(
            "POST",
            &format!("/api/content/create-content-images/{id}"),
            &cookie,
            form,
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.body);
    assert!(stored_files(&app.storage_path.join(format!("posts/{id}"))).is_empty());

    let posts = app
        .empty("GET", &format!("/api/content/get-content/{id}"), None)
        .await;
    assert_eq!(posts.body["data"]["posts"], json!([]));
}

#[tokio::test]
async fn test_create_post_for_another_member_is_forbidden() {
    let app = create_test_app().await;
    app.register("mallory").await;
    let other = app.register("alice").await;
    let cookie = app.sign_in("mallory").await;

    let form = Form::default()
        .text("content", "not mine")
        .file("media", "one.png", "image/png", b"png-bytes");
    let reply = app
        .multipart(
            "POST",
            &format!("/api/content/create-content-images/{other}"),
            &cookie,
            form,
        )
        .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN, "{}", reply.body);
    assert!(stored_files(&app.storage_path.join(format!("posts/{other}"))).is_empty());
}

#[tokio::test]
async fn test_create_post_for_unknown_member_removes_images() {
    let app = create_test_app().await;
    app.register("admin").await;
    let cookie = app.sign_in("admin").await;

    let form = Form::default()
        .text("content", "for nobody")
        .file("media", "one.png", "image/png", b"png-bytes")
        .file("media", "two.gif", "image/gif", b"gif-bytes");
    let reply = app
        .multipart(
            "POST",
            "/api/content/create-content-images/ghost",
            &cookie,
            form,
        )
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND, "{}", reply.body);
    assert!(stored_files(&app.storage_path.join("posts/ghost")).is_empty());
}

#[tokio::test]
async fn test_comment_and_reply_flow() {
    let app = create_test_app().await;
    app.register("writer").await;
    let writer = app.sign_in("writer").await;

    let created = app
        .json(
            "POST",
            "/api/content/create-content",
            Some(&writer),
            json!({ "content": "discuss" }),
        )
        .await;
    let post_id = created.body["data"]["post"]["id"].as_str().unwrap().to_string();

    let comment = app
        .json(
            "POST",
            "/api/comment/create-comment",
            Some(&writer),
            json!({ "postId": post_id, "input": "first" }),
        )
        .await;
    assert_eq!(comment.status, StatusCode::CREATED);
    let comment_id = comment.body["data"]["comment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let reply = app
        .json(
            "POST",
            "/api/comment/comment-reply",
            Some(&writer),
            json!({ "commentId": comment_id, "input": "  " }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = app
        .json(
            "POST",
            "/api/comment/comment-reply",
            Some(&writer),
            json!({ "commentId": comment_id, "input": "second" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let listed = app
        .empty("GET", &format!("/api/comment/post/{post_id}"), None)
        .await;
    assert_eq!(listed.body["data"][0]["replies"][0]["input"], "second");

    let deleted = app
        .empty(
            "DELETE",
            &format!("/api/content/delete-content/{post_id}"),
            Some(&writer),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app
        .empty("GET", &format!("/api/comment/post/{post_id}"), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

// === Chat ===

#[tokio::test]
async fn test_chat_over_http() {
    let app = create_test_app().await;
    app.register("one").await;
    let two = app.register("two").await;
    app.register("three").await;
    let one_cookie = app.sign_in("one").await;
    let three_cookie = app.sign_in("three").await;

    let chat = app
        .json(
            "POST",
            "/api/chat/create-chat",
            Some(&one_cookie),
            json!({ "participantsId": [two] }),
        )
        .await;
    assert_eq!(chat.status, StatusCode::CREATED);
    let chat_id = chat.body["data"]["chat"]["id"].as_str().unwrap().to_string();
    assert_eq!(
        chat.body["data"]["chat"]["participants"]
            .as_array()
            .unwrap()
            .len(),
        2
    );

    let entry = app
        .json(
            "POST",
            &format!("/api/chat/create-chat-entry/{chat_id}"),
            Some(&one_cookie),
            json!({ "content": "hi two" }),
        )
        .await;
    assert_eq!(entry.status, StatusCode::CREATED);
    assert_eq!(entry.body["data"]["chatEntry"]["senderHandle"], "one");

    let outsider = app
        .empty("GET", &format!("/api/chat/get-chat/{chat_id}"), Some(&three_cookie))
        .await;
    assert_eq!(outsider.status, StatusCode::FORBIDDEN);

    let read = app
        .empty("GET", &format!("/api/chat/get-chat/{chat_id}"), Some(&one_cookie))
        .await;
    assert_eq!(read.body["data"]["chat"]["messages"][0]["content"], "hi two");

    let anonymous = app
        .empty("GET", &format!("/api/chat/get-chat/{chat_id}"), None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}
