use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BlogClientError;
use crate::model::User;

pub const DEFAULT_SESSION_FILE: &str = ".blog_session";

/// The caller's authentication state: the current token and who it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Value for the `Authorization` header, if logged in.
    pub fn bearer(&self) -> Option<String> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {t}"))
    }

    pub(crate) fn sign_in(&mut self, user: User, token: String) {
        self.user = Some(user);
        self.token = Some(token);
    }

    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Reads a saved session. A missing file is an empty session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BlogClientError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the session, or removes the file once the session is empty.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BlogClientError> {
        let path = path.as_ref();
        if !self.is_authenticated() {
            return match fs::remove_file(path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            };
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file() -> PathBuf {
        std::env::temp_dir().join(format!("blog-session-{}.json", uuid::Uuid::new_v4()))
    }

    fn user() -> User {
        User {
            id: 1,
            name: "Test User".into(),
            email: "test@example.com".into(),
            created_at: "2025-01-01T10:00:00.000000Z".into(),
            updated_at: "2025-01-01T10:00:00.000000Z".into(),
        }
    }

    #[test]
    fn bearer_only_when_signed_in() {
        let mut session = Session::default();
        assert!(session.bearer().is_none());

        session.sign_in(user(), "1|abc".into());
        assert_eq!(session.bearer().as_deref(), Some("Bearer 1|abc"));

        session.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn saved_session_loads_back() {
        let path = scratch_file();
        let mut session = Session::default();
        session.sign_in(user(), "1|abc".into());

        session.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), session);

        session.clear();
        session.save(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_an_empty_session() {
        let session = Session::load(scratch_file()).unwrap();
        assert_eq!(session, Session::default());
    }
}
