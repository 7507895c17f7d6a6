use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::filter::PostFilter;

// ======================= POSTS =======================

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub status: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
}

impl ListPostsQuery {
    pub fn to_filter(&self) -> PostFilter {
        PostFilter::resolve(self.status.as_deref(), self.author.as_deref(), self.search.as_deref())
    }
}

// ======================= Utils =======================

/// Request bodies are validated field by field, so they arrive as raw JSON.
/// Anything other than an object is treated as an empty payload.
pub fn into_payload(body: Value) -> Map<String, Value> {
    match body {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
