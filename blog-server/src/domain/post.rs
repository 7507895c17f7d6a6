use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::validation::{FieldRules, Rule, ValidationErrors, evaluate, string_field};

pub type PostId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub const ALL: &'static [&'static str] = &["draft", "published"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a post that passed the create rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub status: PostStatus,
}

/// Fields of a post that passed the update rules; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub status: Option<PostStatus>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.author.is_none() && self.status.is_none()
    }

    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(author) = self.author {
            post.author = author;
        }
        if let Some(status) = self.status {
            post.status = status;
        }
    }
}

pub const TITLE_MAX: usize = 255;
pub const AUTHOR_MAX: usize = 100;

pub const CREATE_RULES: &[FieldRules] = &[
    FieldRules {
        field: "title",
        rules: &[Rule::Required, Rule::String, Rule::Max(TITLE_MAX)],
    },
    FieldRules {
        field: "content",
        rules: &[Rule::Required, Rule::String],
    },
    FieldRules {
        field: "author",
        rules: &[Rule::Required, Rule::String, Rule::Max(AUTHOR_MAX)],
    },
    FieldRules {
        field: "status",
        rules: &[Rule::Nullable, Rule::OneOf(PostStatus::ALL)],
    },
];

pub const UPDATE_RULES: &[FieldRules] = &[
    FieldRules {
        field: "title",
        rules: &[Rule::String, Rule::Filled, Rule::Max(TITLE_MAX)],
    },
    FieldRules {
        field: "content",
        rules: &[Rule::String, Rule::Filled],
    },
    FieldRules {
        field: "author",
        rules: &[Rule::String, Rule::Filled, Rule::Max(AUTHOR_MAX)],
    },
    FieldRules {
        field: "status",
        rules: &[Rule::OneOf(PostStatus::ALL)],
    },
];

fn status_field(payload: &Map<String, Value>) -> Option<PostStatus> {
    string_field(payload, "status").and_then(|s| s.parse().ok())
}

impl NewPost {
    pub fn validate(payload: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        evaluate(CREATE_RULES, payload)?;
        Ok(Self {
            title: string_field(payload, "title").unwrap_or_default(),
            content: string_field(payload, "content").unwrap_or_default(),
            author: string_field(payload, "author").unwrap_or_default(),
            status: status_field(payload).unwrap_or_default(),
        })
    }
}

impl PostPatch {
    pub fn validate(payload: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        evaluate(UPDATE_RULES, payload)?;
        Ok(Self {
            title: string_field(payload, "title"),
            content: string_field(payload, "content"),
            author: string_field(payload, "author"),
            status: status_field(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_defaults_status_to_draft() {
        let post = NewPost::validate(&payload(json!({
            "title": "New Post",
            "content": "This is content",
            "author": "Taro",
        })))
        .unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.title, "New Post");
    }

    #[test]
    fn create_accepts_null_status() {
        let post = NewPost::validate(&payload(json!({
            "title": "t", "content": "c", "author": "a", "status": null,
        })))
        .unwrap();
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[test]
    fn create_without_title_names_title() {
        let errors = NewPost::validate(&payload(json!({
            "content": "This is content", "author": "Taro", "status": "draft",
        })))
        .unwrap_err();
        assert!(errors.contains("title"));
        assert!(!errors.contains("content"));
    }

    #[test]
    fn create_with_empty_fields_names_all_three() {
        let errors = NewPost::validate(&payload(json!({ "content": "", "author": "" }))).unwrap_err();
        for field in ["title", "content", "author"] {
            assert!(errors.contains(field), "missing {field}");
        }
        assert!(!errors.contains("status"));
    }

    #[test]
    fn create_enforces_length_limits() {
        let errors = NewPost::validate(&payload(json!({
            "title": "x".repeat(256),
            "content": "c",
            "author": "y".repeat(101),
            "status": "archived",
        })))
        .unwrap_err();
        assert_eq!(
            errors.get("title").unwrap(),
            ["The title field must not be greater than 255 characters."]
        );
        assert!(errors.contains("author"));
        assert_eq!(errors.get("status").unwrap(), ["The selected status is invalid."]);
    }

    #[test]
    fn update_only_checks_present_fields() {
        let patch = PostPatch::validate(&payload(json!({ "status": "published" }))).unwrap();
        assert_eq!(patch.status, Some(PostStatus::Published));
        assert!(patch.title.is_none());
        assert!(patch.author.is_none());
    }

    #[test]
    fn update_rejects_blank_and_wrong_types() {
        let errors = PostPatch::validate(&payload(json!({
            "title": "",
            "content": 12,
            "status": null,
        })))
        .unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["The title field must have a value."]);
        assert_eq!(errors.get("content").unwrap(), ["The content field must be a string."]);
        assert!(errors.contains("status"));
    }

    #[test]
    fn update_ignores_unknown_keys() {
        let patch = PostPatch::validate(&payload(json!({ "id": 7, "created_at": "x" }))).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn patch_apply_keeps_absent_fields() {
        let now = Utc::now();
        let mut post = Post {
            id: 1,
            title: "Original".into(),
            content: "Body".into(),
            author: "Taro".into(),
            status: PostStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        PostPatch {
            title: Some("Updated Title".into()),
            status: Some(PostStatus::Published),
            ..Default::default()
        }
        .apply(&mut post);
        assert_eq!(post.title, "Updated Title");
        assert_eq!(post.author, "Taro");
        assert_eq!(post.content, "Body");
        assert_eq!(post.status, PostStatus::Published);
    }
}
