use crate::auth::hash_password;
use crate::config::Action;
use crate::hooks::{BeforeSaveHook, HookContext, HookOutcome};
use crate::store::Record;
use async_trait::async_trait;
use serde_json::Value;

/// Rejects any write made by an admin whose login contains a marker (the shared demo account).
pub struct BlockDemoUsers {
    pub needle: String,
    pub message: String,
}

impl Default for BlockDemoUsers {
    fn default() -> Self {
        BlockDemoUsers {
            needle: "demo".into(),
            message: "You can't do this as demo@adminforth.dev".into(),
        }
    }
}

#[async_trait]
impl BeforeSaveHook for BlockDemoUsers {
    fn name(&self) -> &str {
        "blockDemoUsers"
    }

    async fn attempt(&self, _record: &mut Record, ctx: &HookContext<'_>) -> HookOutcome {
        let login = ctx
            .actor
            .db_user
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or(&ctx.actor.username);
        if login.contains(self.needle.as_str()) {
            HookOutcome::Reject(self.message.clone())
        } else {
            HookOutcome::Accept
        }
    }
}

/// Sets `slug` from `title`. On edit only when the change set carries a non-empty title.
#[derive(Default)]
pub struct SlugFromTitle;

#[async_trait]
impl BeforeSaveHook for SlugFromTitle {
    fn name(&self) -> &str {
        "slugFromTitle"
    }

    async fn attempt(&self, record: &mut Record, ctx: &HookContext<'_>) -> HookOutcome {
        let title = record.get("title").and_then(Value::as_str).unwrap_or("");
        match ctx.action {
            Action::Create => {
                let s = slug::slugify(title);
                record.insert("slug".into(), Value::String(s));
            }
            Action::Edit if !title.is_empty() => {
                let s = slug::slugify(title);
                record.insert("slug".into(), Value::String(s));
            }
            _ => {}
        }
        HookOutcome::Accept
    }
}

/// Moves a plaintext `password` into an argon2 `passwordHash`. Empty password means "unchanged".
pub struct HashPassword {
    pub password_column: String,
    pub hash_column: String,
}

impl Default for HashPassword {
    fn default() -> Self {
        HashPassword {
            password_column: "password".into(),
            hash_column: "passwordHash".into(),
        }
    }
}

#[async_trait]
impl BeforeSaveHook for HashPassword {
    fn name(&self) -> &str {
        "hashPassword"
    }

    async fn attempt(&self, record: &mut Record, _ctx: &HookContext<'_>) -> HookOutcome {
        let plain = match record.remove(&self.password_column) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return HookOutcome::Accept,
        };
        match tokio::task::spawn_blocking(move || hash_password(&plain)).await {
            Ok(Ok(hash)) => {
                record.insert(self.hash_column.clone(), Value::String(hash));
                HookOutcome::Accept
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "password hashing failed");
                HookOutcome::Reject("Could not hash password".into())
            }
            Err(e) => {
                tracing::error!(error = %e, "password hashing task failed");
                HookOutcome::Reject("Could not hash password".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{verify_password, AdminUser};
    use crate::config::{RecordLabel, ResourceConfig};
    use serde_json::json;

    fn resource() -> ResourceConfig {
        ResourceConfig::new("post", "post", "maindb", "Posts", RecordLabel::new("", "title"))
    }

    fn user(email: &str) -> AdminUser {
        AdminUser {
            pk: json!("u1"),
            username: email.into(),
            db_user: json!({"id": "u1", "email": email}).as_object().cloned().unwrap(),
        }
    }

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn demo_login_is_rejected_with_fixed_message() {
        let r = resource();
        let demo = user("demo@adminforth.dev");
        let ctx = HookContext {
            action: Action::Delete,
            actor: &demo,
            resource: &r,
            stored: None,
        };
        let out = BlockDemoUsers::default().attempt(&mut Record::new(), &ctx).await;
        assert_eq!(out, HookOutcome::Reject("You can't do this as demo@adminforth.dev".into()));

        // substring match, not exact
        let other = user("my.demo.account@example.com");
        let ctx = HookContext { actor: &other, ..ctx };
        assert!(matches!(
            BlockDemoUsers::default().attempt(&mut Record::new(), &ctx).await,
            HookOutcome::Reject(_)
        ));

        let admin = user("adminforth@example.com");
        let ctx = HookContext { actor: &admin, ..ctx };
        assert_eq!(
            BlockDemoUsers::default().attempt(&mut Record::new(), &ctx).await,
            HookOutcome::Accept
        );
    }

    #[tokio::test]
    async fn slug_follows_title() {
        let r = resource();
        let admin = user("admin@example.com");
        let ctx = HookContext {
            action: Action::Create,
            actor: &admin,
            resource: &r,
            stored: None,
        };
        let mut record = rec(json!({"title": "Hello, World!"}));
        SlugFromTitle.attempt(&mut record, &ctx).await;
        assert_eq!(record["slug"], "hello-world");

        let edit = HookContext {
            action: Action::Edit,
            ..ctx
        };
        let mut changes = rec(json!({"published": true}));
        SlugFromTitle.attempt(&mut changes, &edit).await;
        assert!(!changes.contains_key("slug"));

        let mut changes = rec(json!({"title": "Rust & Axum"}));
        SlugFromTitle.attempt(&mut changes, &edit).await;
        assert_eq!(changes["slug"], "rust-axum");
    }

    #[tokio::test]
    async fn password_is_replaced_by_hash() {
        let r = resource();
        let admin = user("admin@example.com");
        let ctx = HookContext {
            action: Action::Create,
            actor: &admin,
            resource: &r,
            stored: None,
        };
        let mut record = rec(json!({"email": "new@example.com", "password": "s3cret!"}));
        assert_eq!(HashPassword::default().attempt(&mut record, &ctx).await, HookOutcome::Accept);
        assert!(!record.contains_key("password"));
        let hash = record["passwordHash"].as_str().unwrap();
        assert!(verify_password("s3cret!", hash));

        let mut unchanged = rec(json!({"password": ""}));
        HashPassword::default().attempt(&mut unchanged, &ctx).await;
        assert!(!unchanged.contains_key("passwordHash"));
    }
}
