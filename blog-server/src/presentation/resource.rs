//! Wire representations of stored entities.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::domain::post::{Post, PostId, PostStatus};
use crate::domain::user::{User, UserId};

/// Timestamps as ISO-8601 with microseconds, e.g. `2025-01-01T10:00:00.000000Z`.
pub fn iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResource {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: String,
    pub status: PostStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Post> for PostResource {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            created_at: iso8601(&post.created_at),
            updated_at: iso8601(&post.updated_at),
            title: post.title,
            content: post.content,
            author: post.author,
            status: post.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResource {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResource {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: iso8601(&user.created_at),
            updated_at: iso8601(&user.updated_at),
            name: user.name,
            email: user.email,
        }
    }
}

/// `{"data": ...}` envelope used for post responses.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl Data<PostResource> {
    pub fn post(post: Post) -> Self {
        Data { data: post.into() }
    }
}

impl Data<Vec<PostResource>> {
    pub fn posts(posts: Vec<Post>) -> Self {
        Data {
            data: posts.into_iter().map(PostResource::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResource,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Post {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        Post {
            id: 3,
            title: "New Post".into(),
            content: "This is content".into(),
            author: "Taro".into(),
            status: PostStatus::Published,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn post_maps_to_wire_shape() {
        let json = serde_json::to_value(PostResource::from(sample())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "title": "New Post",
                "content": "This is content",
                "author": "Taro",
                "status": "published",
                "created_at": "2025-01-01T10:00:00.000000Z",
                "updated_at": "2025-01-01T10:00:00.000000Z",
            })
        );
    }

    #[test]
    fn collections_are_wrapped_in_data() {
        let json = serde_json::to_value(Data::posts(vec![sample(), sample()])).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 2);

        let empty = serde_json::to_value(Data::posts(Vec::new())).unwrap();
        assert_eq!(empty, serde_json::json!({ "data": [] }));
    }
}
