//! HTTP client for the blog API.
//!
//! Authentication state lives in a [`Session`] owned by the caller. Every call
//! that needs a token takes the session explicitly, and only `register`,
//! `login` and `logout` change it.

mod error;
mod http_client;
mod model;
mod session;

pub use error::{BlogClientError, FieldErrors};
pub use http_client::BlogClient;
pub use model::{NewPost, Post, PostChanges, PostQuery, PostStatus, User};
pub use session::{DEFAULT_SESSION_FILE, Session};
