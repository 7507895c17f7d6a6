use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::validation::{FieldRules, Rule, ValidationErrors, evaluate, string_field};

pub type UserId = i64;
pub type TokenId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user waiting to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Persisted bearer token. Only the SHA-256 of the secret is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

pub const REGISTER_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        rules: &[Rule::Required, Rule::String, Rule::Max(255)],
    },
    FieldRules {
        field: "email",
        rules: &[Rule::Required, Rule::String, Rule::Email, Rule::Max(255)],
    },
    FieldRules {
        field: "password",
        rules: &[Rule::Required, Rule::String, Rule::Min(8), Rule::Confirmed],
    },
];

pub const LOGIN_RULES: &[FieldRules] = &[
    FieldRules {
        field: "email",
        rules: &[Rule::Required, Rule::String, Rule::Email],
    },
    FieldRules {
        field: "password",
        rules: &[Rule::Required, Rule::String],
    },
];

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(payload: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        evaluate(REGISTER_RULES, payload)?;
        Ok(Self {
            name: string_field(payload, "name").unwrap_or_default(),
            email: string_field(payload, "email").unwrap_or_default().to_lowercase(),
            password: string_field(payload, "password").unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(payload: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        evaluate(LOGIN_RULES, payload)?;
        Ok(Self {
            email: string_field(payload, "email").unwrap_or_default().to_lowercase(),
            password: string_field(payload, "password").unwrap_or_default(),
        })
    }
}
