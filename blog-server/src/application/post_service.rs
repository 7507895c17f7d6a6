use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::instrument;

use crate::data::post_repository::PostStore;
use crate::domain::error::DomainError;
use crate::domain::filter::PostFilter;
use crate::domain::post::{NewPost, Post, PostId, PostPatch};

/// Validates incoming payloads and drives the post store.
///
/// Every mutation is validated in full before the store is touched.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post, DomainError> {
        self.store.get(id).await
    }

    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        self.store.list(filter).await
    }

    #[instrument(skip(self, payload))]
    pub async fn create_post(&self, payload: &Map<String, Value>) -> Result<Post, DomainError> {
        let post = NewPost::validate(payload)?;
        self.store.create(post).await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_post(&self, id: PostId, payload: &Map<String, Value>) -> Result<Post, DomainError> {
        self.store.get(id).await?;
        let patch = PostPatch::validate(payload)?;
        self.store.update(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: PostId) -> Result<(), DomainError> {
        self.store.get(id).await?;
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::post_repository::MemoryPostStore;
    use crate::domain::post::PostStatus;
    use serde_json::json;

    fn service() -> PostService {
        PostService::new(Arc::new(MemoryPostStore::new()))
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn invalid_create_stores_nothing() {
        let service = service();
        let err = service
            .create_post(&payload(json!({ "title": "only a title" })))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(service.list_posts(&PostFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_post_is_not_found_before_validation() {
        let service = service();
        let err = service
            .update_post(999, &payload(json!({ "status": "bogus" })))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(999)));
    }

    #[tokio::test]
    async fn invalid_update_leaves_post_untouched() {
        let service = service();
        let post = service
            .create_post(&payload(json!({ "title": "t", "content": "c", "author": "a" })))
            .await
            .unwrap();
        let err = service
            .update_post(post.id, &payload(json!({ "title": "new", "author": "" })))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let stored = service.get_post(post.id).await.unwrap();
        assert_eq!(stored.title, "t");
        assert_eq!(stored.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn delete_removes_post() {
        let service = service();
        let post = service
            .create_post(&payload(json!({ "title": "t", "content": "c", "author": "a" })))
            .await
            .unwrap();
        service.delete_post(post.id).await.unwrap();
        assert!(matches!(service.get_post(post.id).await, Err(DomainError::PostNotFound(_))));
        assert!(matches!(service.delete_post(post.id).await, Err(DomainError::PostNotFound(_))));
    }
}
