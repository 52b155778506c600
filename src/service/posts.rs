//! Public read API: published posts with their author, newest first.

use crate::config::{AdminPanel, S3Location};
use crate::error::AppError;
use crate::resources::{POST, USER};
use crate::store::{DataSources, Filter, ListQuery, Record, Sort};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub slug: Option<String>,
}

impl PostsQuery {
    pub fn to_list_query(&self) -> ListQuery {
        let mut filters = vec![Filter::Eq("published".into(), Value::Bool(true))];
        if let Some(slug) = self.slug.as_deref().filter(|s| !s.is_empty()) {
            filters.push(Filter::Like("slug".into(), slug.to_string()));
        }
        ListQuery {
            filters,
            sort: vec![Sort::desc("createdAt")],
            limit: self.limit,
            offset: self.offset,
        }
    }
}

pub struct PostService;

impl PostService {
    pub async fn list(
        panel: &AdminPanel,
        sources: &DataSources,
        storage: &S3Location,
        query: &PostsQuery,
    ) -> Result<Vec<Record>, AppError> {
        let posts_resource = panel
            .resource(POST)
            .ok_or_else(|| AppError::NotFound(format!("resource {}", POST)))?;
        let users_resource = panel
            .resource(USER)
            .ok_or_else(|| AppError::NotFound(format!("resource {}", USER)))?;

        let posts = sources
            .for_resource(posts_resource)?
            .list(posts_resource, &query.to_list_query())
            .await?;

        let mut author_ids: Vec<Value> = Vec::new();
        for p in &posts {
            if let Some(id) = p.get("authorId").filter(|v| !v.is_null()) {
                if !author_ids.contains(id) {
                    author_ids.push(id.clone());
                }
            }
        }
        let authors: HashMap<String, Record> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            let q = ListQuery {
                limit: Some(author_ids.len() as u32),
                ..ListQuery::filtered(vec![Filter::In("id".into(), author_ids)])
            };
            sources
                .for_resource(users_resource)?
                .list(users_resource, &q)
                .await?
                .into_iter()
                .filter_map(|u| Some((key(u.get("id")?), u)))
                .collect()
        };
        tracing::debug!(posts = posts.len(), authors = authors.len(), "posts loaded");

        Ok(posts
            .into_iter()
            .map(|p| decorate(p, &authors, storage))
            .collect())
    }
}

fn key(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Storage key -> public URL. Null and non-string values pass through.
fn object_url(storage: &S3Location, v: Option<&Value>) -> Value {
    match v {
        Some(Value::String(k)) if !k.is_empty() => Value::String(storage.object_url(k)),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

fn decorate(mut post: Record, authors: &HashMap<String, Record>, storage: &S3Location) -> Record {
    let author = post
        .get("authorId")
        .and_then(|id| authors.get(&key(id)))
        .map(|u| {
            json!({
                "publicName": u.get("publicName").cloned().unwrap_or(Value::Null),
                "avatar": object_url(storage, u.get("avatar")),
            })
        })
        .unwrap_or(Value::Null);
    let picture = object_url(storage, post.get("picture"));
    post.insert("picture".into(), picture);
    post.insert("author".into(), author);
    post
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3() -> S3Location {
        S3Location::new("blog-assets", "eu-central-1")
    }

    #[test]
    fn empty_slug_means_no_slug_filter() {
        let q = PostsQuery {
            slug: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(q.to_list_query().filters.len(), 1);
        let q = PostsQuery {
            slug: Some("rust".into()),
            ..Default::default()
        };
        assert_eq!(q.to_list_query().filters[1], Filter::Like("slug".into(), "rust".into()));
    }

    #[test]
    fn decorate_rewrites_keys_and_handles_missing_author() {
        let mut authors = HashMap::new();
        authors.insert(
            "u1".to_string(),
            json!({"id": "u1", "publicName": "Ann", "avatar": "user-avatars/2025/x/a.png", "passwordHash": "h"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let post = json!({"id": "p1", "authorId": "u1", "picture": "post-previews/p.png"})
            .as_object()
            .cloned()
            .unwrap();
        let out = decorate(post, &authors, &s3());
        assert_eq!(
            out["picture"],
            "https://blog-assets.s3.eu-central-1.amazonaws.com/post-previews/p.png"
        );
        assert_eq!(out["author"]["publicName"], "Ann");
        assert_eq!(
            out["author"]["avatar"],
            "https://blog-assets.s3.eu-central-1.amazonaws.com/user-avatars/2025/x/a.png"
        );
        assert!(out["author"].get("passwordHash").is_none());

        let orphan = json!({"id": "p2", "authorId": "gone", "picture": null})
            .as_object()
            .cloned()
            .unwrap();
        let out = decorate(orphan, &authors, &s3());
        assert_eq!(out["author"], Value::Null);
        assert_eq!(out["picture"], Value::Null);
    }
}
