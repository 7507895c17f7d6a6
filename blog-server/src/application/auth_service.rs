use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::data::token_repository::TokenStore;
use crate::data::user_repository::UserStore;
use crate::domain::error::DomainError;
use crate::domain::user::{Credentials, NewUser, Registration, TokenId, User, UserId};
use crate::domain::validation::ValidationErrors;
use crate::infrastructure::security::{
    PlainTextToken, generate_token_secret, hash_password, hash_token, verify_password,
};

/// A user together with the plain-text token just issued to them.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    token_ttl: Option<Duration>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>, token_ttl: Option<Duration>) -> Self {
        Self {
            users,
            tokens,
            token_ttl,
        }
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound(id))
    }

    #[instrument(skip(self, payload))]
    pub async fn register(&self, payload: &Map<String, Value>) -> Result<IssuedToken, DomainError> {
        let registration = Registration::validate(payload)?;
        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(email_taken().into());
        }

        let password_hash =
            hash_password(&registration.password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = self
            .users
            .create(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                DomainError::UserAlreadyExists(_) => email_taken().into(),
                other => other,
            })?;

        let token = self.issue_token(user.id).await?;
        Ok(IssuedToken { user, token })
    }

    #[instrument(skip(self, payload))]
    pub async fn login(&self, payload: &Map<String, Value>) -> Result<IssuedToken, DomainError> {
        let credentials = Credentials::validate(payload)?;
        let user = self
            .users
            .find_by_email(&credentials.email)
            .await?
            .ok_or_else(bad_credentials)?;

        let valid = verify_password(&credentials.password, &user.password_hash)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        if !valid {
            return Err(bad_credentials());
        }

        let token = self.issue_token(user.id).await?;
        Ok(IssuedToken { user, token })
    }

    /// Resolves a bearer token to its owner and the token's id.
    pub async fn authenticate(&self, raw_token: &str) -> Result<(User, TokenId), DomainError> {
        let presented = PlainTextToken::parse(raw_token).ok_or(DomainError::Unauthenticated)?;
        let token = self
            .tokens
            .find(presented.id)
            .await?
            .ok_or(DomainError::Unauthenticated)?;

        if token.token_hash != hash_token(&presented.secret) {
            return Err(DomainError::Unauthenticated);
        }

        let now = Utc::now();
        if let Some(ttl) = self.token_ttl {
            let age = (now - token.created_at).to_std().unwrap_or_default();
            if age > ttl {
                debug!(token_id = token.id, "expired token presented");
                self.tokens.delete(token.id).await?;
                return Err(DomainError::Unauthenticated);
            }
        }

        self.tokens.touch(token.id, now).await?;
        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(DomainError::Unauthenticated)?;
        Ok((user, token.id))
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, token_id: TokenId) -> Result<(), DomainError> {
        self.tokens.delete(token_id).await?;
        Ok(())
    }

    async fn issue_token(&self, user_id: UserId) -> Result<String, DomainError> {
        let secret = generate_token_secret();
        let token = self.tokens.create(user_id, hash_token(&secret)).await?;
        Ok(PlainTextToken { id: token.id, secret }.render())
    }
}

fn email_taken() -> ValidationErrors {
    ValidationErrors::single("email", "The email has already been taken.")
}

fn bad_credentials() -> DomainError {
    ValidationErrors::single("email", "The provided credentials are incorrect.").into()
}
