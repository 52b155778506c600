mod common;

use common::{client, spawn_app, ADMIN_EMAIL, ADMIN_PASSWORD, DEMO_EMAIL, DEMO_PASSWORD};
use reqwest::header;
use serde_json::{json, Value};

const NO_FRONTEND: &str = "http://127.0.0.1:1";

#[tokio::test]
async fn admin_api_requires_basic_auth() {
    let app = spawn_app(NO_FRONTEND).await;

    let resp = client()
        .get(format!("{}/admin/api/resources", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(resp
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("Basic"));

    let resp = client()
        .get(format!("{}/admin/api/resources", app.base))
        .basic_auth(ADMIN_EMAIL, Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn login_page_config_is_public() {
    let app = spawn_app(NO_FRONTEND).await;

    let resp = client()
        .get(format!("{}/admin/api/config", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["brandName"], "My Admin");
    assert_eq!(body["data"]["baseUrl"], "/admin");
}

#[tokio::test]
async fn me_hides_the_password_hash() {
    let app = spawn_app(NO_FRONTEND).await;

    let resp = client()
        .get(format!("{}/admin/api/me", app.base))
        .basic_auth(ADMIN_EMAIL.to_uppercase(), Some(ADMIN_PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], ADMIN_EMAIL);
    assert_eq!(body["data"]["dbUser"]["publicName"], "Admin");
    assert!(!body.to_string().contains("passwordHash"));
    assert!(!body.to_string().contains("$argon2"));
}

#[tokio::test]
async fn user_metadata_never_exposes_the_hash_column() {
    let app = spawn_app(NO_FRONTEND).await;

    let resp = client()
        .get(format!("{}/admin/api/resources/user", app.base))
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let text = resp.text().await.unwrap();
    assert!(text.contains("\"email\""));
    assert!(!text.contains("passwordHash"));

    let resp = client()
        .get(format!("{}/admin/api/resources/nope", app.base))
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn created_post_gets_slug_author_and_shows_up_publicly() {
    let app = spawn_app(NO_FRONTEND).await;

    let resp = client()
        .post(format!("{}/admin/api/resources/post/records", app.base))
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({
            "title": "Hello, World!",
            "content": "<p>hi</p>",
            "published": true,
            "slug": "ignored",
            "authorId": "someone-else",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let created = &body["data"];
    assert_eq!(created["slug"], "hello-world");
    assert_eq!(created["authorId"], "admin-1");
    assert!(created["createdAt"].as_str().is_some());

    let posts: Value = reqwest::get(format!("{}/api/posts", app.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts[0]["id"], created["id"]);
    assert_eq!(posts[0]["author"]["publicName"], "Admin");

    let id = created["id"].as_str().unwrap();
    let resp = client()
        .patch(format!("{}/admin/api/resources/post/records/{}", app.base, id))
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({"title": "Second thoughts"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "second-thoughts");
    assert_eq!(body["data"]["published"], true);
}

fn snapshot(app: &common::TestApp) -> Vec<Vec<blog_admin::Record>> {
    ["user", "post", "contentImage"]
        .iter()
        .map(|table| app.store.rows(table))
        .collect()
}

#[tokio::test]
async fn demo_account_cannot_write_any_resource() {
    let app = spawn_app(NO_FRONTEND).await;
    app.store.seed(
        "post",
        vec![common::post("p1", "Seeded", "seeded", "2024-01-01T00:00:00.000Z", true, "admin-1")],
    );
    app.store.seed(
        "contentImage",
        vec![common::record(json!({
            "id": "ci1",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "img": "post-content/2024/x/a.png",
            "postId": "p1",
            "resourceId": "post",
        }))],
    );
    let before = snapshot(&app);

    let cases: Vec<(reqwest::Method, &str, Option<Value>)> = vec![
        (
            reqwest::Method::POST,
            "user/records",
            Some(json!({"email": "new@example.com", "password": "pw"})),
        ),
        (reqwest::Method::PATCH, "user/records/demo-1", Some(json!({"publicName": "Changed"}))),
        (reqwest::Method::DELETE, "user/records/admin-1", None),
        (
            reqwest::Method::POST,
            "post/records",
            Some(json!({"title": "Sneaky", "published": true})),
        ),
        (reqwest::Method::PATCH, "post/records/p1", Some(json!({"title": "Changed"}))),
        (reqwest::Method::DELETE, "post/records/p1", None),
        (
            reqwest::Method::POST,
            "contentImage/records",
            Some(json!({"img": "post-content/2024/y/b.png", "postId": "p1"})),
        ),
        (
            reqwest::Method::PATCH,
            "contentImage/records/ci1",
            Some(json!({"img": "post-content/2024/z/c.png"})),
        ),
        (reqwest::Method::DELETE, "contentImage/records/ci1", None),
    ];

    for (method, path, body) in cases {
        let mut req = client()
            .request(method.clone(), format!("{}/admin/api/resources/{}", app.base, path))
            .basic_auth(DEMO_EMAIL, Some(DEMO_PASSWORD));
        if let Some(body) = &body {
            req = req.json(body);
        }
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), 400, "{} {}", method, path);
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["error"]["code"], "rejected", "{} {}", method, path);
        assert_eq!(
            err["error"]["message"], "You can't do this as demo@adminforth.dev",
            "{} {}",
            method, path
        );
        assert_eq!(snapshot(&app), before, "{} {} changed the store", method, path);
    }

    let resp = client()
        .get(format!("{}/admin/api/resources/user/records", app.base))
        .basic_auth(DEMO_EMAIL, Some(DEMO_PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["meta"]["count"], 2);
}

#[tokio::test]
async fn created_user_can_sign_in() {
    let app = spawn_app(NO_FRONTEND).await;

    let resp = client()
        .post(format!("{}/admin/api/resources/user/records", app.base))
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({"email": "Writer@Example.com", "password": "s3cret", "publicName": "Writer"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let text = resp.text().await.unwrap();
    assert!(!text.contains("s3cret"));
    assert!(!text.contains("passwordHash"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["data"]["email"], "writer@example.com");

    let resp = client()
        .get(format!("{}/admin/api/me", app.base))
        .basic_auth("writer@example.com", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client()
        .post(format!("{}/admin/api/resources/user/records", app.base))
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({"email": "writer@example.com", "password": "other"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn upload_paths_follow_the_plugin_rules() {
    let app = spawn_app(NO_FRONTEND).await;
    let url = format!("{}/admin/api/resources/user/upload", app.base);

    let resp = client()
        .post(&url)
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({"column": "avatar", "originalFilename": "me", "originalExtension": "PNG", "size": 2048}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let path = body["data"]["path"].as_str().unwrap();
    assert!(path.starts_with("user-avatars/"));
    assert!(path.ends_with("/me.png"));
    assert_eq!(
        body["data"]["previewUrl"],
        format!("https://blog-assets.s3.eu-central-1.amazonaws.com/{}", path)
    );

    let resp = client()
        .post(&url)
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({"column": "avatar", "originalFilename": "x", "originalExtension": "exe", "size": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    let resp = client()
        .post(&url)
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({"column": "email", "originalFilename": "x", "originalExtension": "png", "size": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let app = spawn_app(NO_FRONTEND).await;

    let resp = client()
        .patch(format!("{}/admin/api/resources/post/records/nope", app.base))
        .basic_auth(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
        .json(&json!({"title": "Whatever"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
