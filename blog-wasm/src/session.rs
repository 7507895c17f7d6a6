use dioxus::logger::tracing::warn;
use dioxus::prelude::*;
use gloo_storage::errors::StorageError;
use gloo_storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};

use crate::model::{AuthResponse, User};

const SESSION_KEY: &str = "blog_session";

/// Who is logged in, and the token their requests carry.
///
/// One instance lives in a context signal for the whole app; it only changes
/// through [`sign_in`] and [`sign_out`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn restore() -> Self {
        LocalStorage::get::<Session>(SESSION_KEY)
            .ok()
            .filter(Session::is_authenticated)
            .unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn bearer(&self) -> Option<String> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {t}"))
    }
}

pub fn use_session() -> Signal<Session> {
    use_context::<Signal<Session>>()
}

pub fn sign_in(mut session: Signal<Session>, auth: AuthResponse) {
    let next = Session {
        token: Some(auth.token),
        user: Some(auth.user),
    };
    stored(LocalStorage::set(SESSION_KEY, &next));
    session.set(next);
}

/// Logs a failed write; the session then only lasts until reload.
fn stored(result: Result<(), StorageError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "session not saved to local storage");
            false
        }
    }
}

pub fn sign_out(mut session: Signal<Session>) {
    LocalStorage::delete(SESSION_KEY);
    session.set(Session::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failure_is_reported() {
        assert!(stored(Ok(())));
        assert!(!stored(Err(StorageError::KeyNotFound(SESSION_KEY.into()))));
    }

    #[test]
    fn blank_token_is_not_a_login() {
        let session = Session {
            token: Some(String::new()),
            user: None,
        };
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer(), None);
    }
}
