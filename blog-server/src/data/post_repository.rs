use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::domain::error::DomainError;
use crate::domain::filter::PostFilter;
use crate::domain::post::{NewPost, Post, PostId, PostPatch};

/// Durable storage for posts.
///
/// `get`, `update` and `delete` report a missing id as
/// [`DomainError::PostNotFound`]; any other error is an infrastructure failure.
/// `list` returns newest first (`created_at` descending, then `id` descending).
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    async fn get(&self, id: PostId) -> Result<Post, DomainError>;
    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError>;
    async fn update(&self, id: PostId, patch: PostPatch) -> Result<Post, DomainError>;
    async fn delete(&self, id: PostId) -> Result<(), DomainError>;
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            status: row.status.parse().map_err(DomainError::Internal)?,
            title: row.title,
            content: row.content,
            author: row.author,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const POST_COLUMNS: &str = "id, title, content, author, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the filter's constraints as `AND` clauses.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    if let Some(status) = &filter.status {
        builder.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(author) = &filter.author {
        builder.push(" AND author = ").push_bind(author.clone());
    }
    if let Some(pattern) = filter.search_pattern() {
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (title, content, author, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.author)
        .bind(post.status.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::from(e)
        })?;

        info!(post_id = row.id, "post created");
        Post::try_from(row)
    }

    async fn get(&self, id: PostId) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error get post {}: {}", id, e);
                DomainError::from(e)
            })?;

        row.map(Post::try_from)
            .transpose()?
            .ok_or(DomainError::PostNotFound(id))
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE TRUE"));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while listing posts: {}", e);
                DomainError::from(e)
            })?;

        rows.into_iter().map(Post::try_from).collect()
    }

    async fn update(&self, id: PostId, patch: PostPatch) -> Result<Post, DomainError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                author = COALESCE($3, author),
                status = COALESCE($4, status),
                updated_at = GREATEST($5, created_at)
            WHERE id = $6
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.author)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::from(e)
        })?;

        let row = row.ok_or(DomainError::PostNotFound(id))?;
        info!(post_id = id, "post updated");
        Post::try_from(row)
    }

    async fn delete(&self, id: PostId) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::from(e)
            })?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::PostNotFound(id));
        }

        info!(post_id = id, "post deleted");
        Ok(())
    }
}

#[derive(Default)]
struct PostTable {
    last_id: PostId,
    rows: BTreeMap<PostId, Post>,
}

/// Process-local post store. Each operation runs under a single lock
/// acquisition, so readers never see a half-applied update.
#[derive(Default)]
pub struct MemoryPostStore {
    table: RwLock<PostTable>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let now = Utc::now();
        let post = Post {
            id: table.last_id,
            title: post.title,
            content: post.content,
            author: post.author,
            status: post.status,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(post.id, post.clone());

        info!(post_id = post.id, "post created");
        Ok(post)
    }

    async fn get(&self, id: PostId) -> Result<Post, DomainError> {
        let table = self.table.read().await;
        table.rows.get(&id).cloned().ok_or(DomainError::PostNotFound(id))
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        let table = self.table.read().await;
        let mut posts: Vec<Post> = table
            .rows
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn update(&self, id: PostId, patch: PostPatch) -> Result<Post, DomainError> {
        let mut table = self.table.write().await;
        let post = table.rows.get_mut(&id).ok_or(DomainError::PostNotFound(id))?;
        patch.apply(post);
        post.updated_at = Utc::now().max(post.created_at);

        info!(post_id = id, "post updated");
        Ok(post.clone())
    }

    async fn delete(&self, id: PostId) -> Result<(), DomainError> {
        let mut table = self.table.write().await;
        table.rows.remove(&id).ok_or(DomainError::PostNotFound(id))?;

        info!(post_id = id, "post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::post::PostStatus;
    use std::sync::Arc;

    fn new_post(title: &str, status: PostStatus) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: format!("{title} content"),
            author: "Taro".to_string(),
            status,
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let store = MemoryPostStore::new();
        let created = store.create(new_post("New Post", PostStatus::Draft)).await.unwrap();
        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let store = MemoryPostStore::new();
        let first = store.create(new_post("a", PostStatus::Draft)).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.create(new_post("b", PostStatus::Draft)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(MemoryPostStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(new_post(&format!("p{i}"), PostStatus::Draft)).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryPostStore::new();
        for title in ["first", "second", "third"] {
            store.create(new_post(title, PostStatus::Published)).await.unwrap();
        }
        let posts = store.list(&PostFilter::default()).await.unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert!(posts.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn list_applies_filter() {
        let store = MemoryPostStore::new();
        store.create(new_post("draft", PostStatus::Draft)).await.unwrap();
        store.create(new_post("pub one", PostStatus::Published)).await.unwrap();
        store.create(new_post("pub two", PostStatus::Published)).await.unwrap();

        let filter = PostFilter::resolve(Some("published"), None, None);
        let posts = store.list(&filter).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.status == PostStatus::Published));

        let none = store
            .list(&PostFilter::resolve(None, Some("Nobody"), None))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_is_partial_and_refreshes_timestamp() {
        let store = MemoryPostStore::new();
        let created = store.create(new_post("Original", PostStatus::Draft)).await.unwrap();
        let patch = PostPatch {
            title: Some("Updated Title".into()),
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        let updated = store.update(created.id, patch).await.unwrap();
        assert_eq!(updated.title, "Updated Title");
        assert_eq!(updated.status, PostStatus::Published);
        assert_eq!(updated.author, created.author);
        assert_eq!(updated.content, created.content);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = MemoryPostStore::new();
        assert!(matches!(store.get(999).await, Err(DomainError::PostNotFound(999))));
        assert!(matches!(
            store.update(999, PostPatch::default()).await,
            Err(DomainError::PostNotFound(999))
        ));
        assert!(matches!(store.delete(999).await, Err(DomainError::PostNotFound(999))));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryPostStore::new();
        let created = store.create(new_post("gone", PostStatus::Draft)).await.unwrap();
        store.delete(created.id).await.unwrap();
        assert!(matches!(store.get(created.id).await, Err(DomainError::PostNotFound(_))));
    }
}
