//! Before-save hooks: ordered chains run per resource and action before a write reaches the store.
//!
//! A hook may mutate the pending record (later hooks and the store see the change) or reject the
//! write with a message. The first rejection stops the chain; nothing is persisted.

mod builtin;

pub use builtin::{BlockDemoUsers, HashPassword, SlugFromTitle};

use crate::auth::AdminUser;
use crate::config::{Action, ResourceConfig};
use crate::error::AppError;
use crate::store::Record;
use async_trait::async_trait;
use std::sync::Arc;

/// What a hook sees besides the record it may change.
pub struct HookContext<'a> {
    pub action: Action,
    pub actor: &'a AdminUser,
    pub resource: &'a ResourceConfig,
    /// Current stored row for edit and delete.
    pub stored: Option<&'a Record>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    Accept,
    Reject(String),
}

#[async_trait]
pub trait BeforeSaveHook: Send + Sync {
    fn name(&self) -> &str;

    async fn attempt(&self, record: &mut Record, ctx: &HookContext<'_>) -> HookOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRejection {
    pub hook: String,
    pub message: String,
}

impl From<HookRejection> for AppError {
    fn from(r: HookRejection) -> Self {
        AppError::Rejected(r.message)
    }
}

/// Ordered hooks for one action.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn BeforeSaveHook>>,
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, hook: Arc<dyn BeforeSaveHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.hooks.iter().map(|h| h.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run hooks in order. Stops at the first rejection.
    pub async fn run(&self, record: &mut Record, ctx: &HookContext<'_>) -> Result<(), HookRejection> {
        for hook in &self.hooks {
            match hook.attempt(record, ctx).await {
                HookOutcome::Accept => {
                    tracing::debug!(hook = hook.name(), resource = %ctx.resource.id, action = %ctx.action, "hook accepted");
                }
                HookOutcome::Reject(message) => {
                    tracing::info!(hook = hook.name(), resource = %ctx.resource.id, action = %ctx.action, %message, "hook rejected write");
                    return Err(HookRejection {
                        hook: hook.name().to_string(),
                        message,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResourceHooks {
    pub create: HookChain,
    pub edit: HookChain,
    pub delete: HookChain,
}

impl ResourceHooks {
    pub fn chain(&self, action: Action) -> &HookChain {
        match action {
            Action::Create => &self.create,
            Action::Edit => &self.edit,
            Action::Delete => &self.delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordLabel;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Append(&'static str);

    #[async_trait]
    impl BeforeSaveHook for Append {
        fn name(&self) -> &str {
            self.0
        }

        async fn attempt(&self, record: &mut Record, _ctx: &HookContext<'_>) -> HookOutcome {
            let prev = record.get("trail").and_then(Value::as_str).unwrap_or("").to_string();
            record.insert("trail".into(), json!(format!("{}{}", prev, self.0)));
            HookOutcome::Accept
        }
    }

    struct Deny(Arc<AtomicUsize>);

    #[async_trait]
    impl BeforeSaveHook for Deny {
        fn name(&self) -> &str {
            "deny"
        }

        async fn attempt(&self, _record: &mut Record, _ctx: &HookContext<'_>) -> HookOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            HookOutcome::Reject("nope".into())
        }
    }

    fn actor() -> AdminUser {
        AdminUser {
            pk: json!("u1"),
            username: "admin@example.com".into(),
            db_user: Record::new(),
        }
    }

    #[tokio::test]
    async fn hooks_run_in_order_and_see_earlier_mutations() {
        let resource = ResourceConfig::new("post", "post", "maindb", "Posts", RecordLabel::new("", "title"));
        let user = actor();
        let ctx = HookContext {
            action: Action::Create,
            actor: &user,
            resource: &resource,
            stored: None,
        };
        let chain = HookChain::new().then(Arc::new(Append("a"))).then(Arc::new(Append("b")));
        let mut rec = Record::new();
        chain.run(&mut rec, &ctx).await.unwrap();
        assert_eq!(rec["trail"], "ab");
        assert_eq!(chain.names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn first_rejection_short_circuits() {
        let resource = ResourceConfig::new("post", "post", "maindb", "Posts", RecordLabel::new("", "title"));
        let user = actor();
        let ctx = HookContext {
            action: Action::Delete,
            actor: &user,
            resource: &resource,
            stored: None,
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = HookChain::new()
            .then(Arc::new(Deny(calls.clone())))
            .then(Arc::new(Deny(calls.clone())));
        let err = chain.run(&mut Record::new(), &ctx).await.unwrap_err();
        assert_eq!(err.hook, "deny");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(AppError::from(err).to_string(), "nope");
    }

    #[tokio::test]
    async fn empty_chain_accepts() {
        let resource = ResourceConfig::new("post", "post", "maindb", "Posts", RecordLabel::new("", "title"));
        let user = actor();
        let ctx = HookContext {
            action: Action::Edit,
            actor: &user,
            resource: &resource,
            stored: None,
        };
        assert!(HookChain::new().run(&mut Record::new(), &ctx).await.is_ok());
    }
}
