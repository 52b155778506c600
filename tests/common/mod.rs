#![allow(dead_code)]

use blog_admin::auth::hash_password;
use blog_admin::{app_router, resources, AppState, DataSources, MemoryDataSource, Record, Settings};
use serde_json::{json, Value};
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "adminforth@example.com";
pub const ADMIN_PASSWORD: &str = "adminforth";
pub const DEMO_EMAIL: &str = "demo@adminforth.dev";
pub const DEMO_PASSWORD: &str = "demo";

pub struct TestApp {
    pub base: String,
    pub store: Arc<MemoryDataSource>,
}

pub fn settings(frontend_url: &str) -> Settings {
    let frontend_url = frontend_url.to_string();
    Settings::from_lookup(move |key| match key {
        "AWS_S3_BUCKET" => Some("blog-assets".into()),
        "AWS_S3_REGION" => Some("eu-central-1".into()),
        "FRONTEND_URL" => Some(frontend_url.clone()),
        _ => None,
    })
    .unwrap()
}

pub fn record(v: Value) -> Record {
    v.as_object().cloned().unwrap()
}

pub fn user(id: &str, email: &str, password: &str, public_name: &str, avatar: Option<&str>) -> Record {
    record(json!({
        "id": id,
        "email": email,
        "createdAt": "2024-01-01T00:00:00.000Z",
        "passwordHash": hash_password(password).unwrap(),
        "publicName": public_name,
        "avatar": avatar,
    }))
}

pub fn post(id: &str, title: &str, slug: &str, created_at: &str, published: bool, author: &str) -> Record {
    record(json!({
        "id": id,
        "title": title,
        "slug": slug,
        "picture": format!("post-previews/{}.png", id),
        "content": "<p>body</p>",
        "createdAt": created_at,
        "published": published,
        "authorId": author,
    }))
}

/// Seed the admin and demo accounts, spin up the app on an OS-assigned port.
pub async fn spawn_app(frontend_url: &str) -> TestApp {
    let store = Arc::new(MemoryDataSource::new());
    store.seed(
        "user",
        vec![
            user("admin-1", ADMIN_EMAIL, ADMIN_PASSWORD, "Admin", Some("user-avatars/2024/a/admin.png")),
            user("demo-1", DEMO_EMAIL, DEMO_PASSWORD, "Demo", None),
        ],
    );

    let settings = settings(frontend_url);
    let panel = resources::panel(&settings).unwrap();
    let sources = DataSources::default().with(resources::MAIN_DB, store.clone());
    let state = AppState::new(panel, sources, settings).unwrap();
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestApp {
        base: format!("http://127.0.0.1:{}", port),
        store,
    }
}

/// A client that relays redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
