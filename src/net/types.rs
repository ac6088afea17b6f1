//! Wire DTOs for the client/server boundary.
//!
//! DESIGN
//! ======
//! Field names mirror the REST payloads exactly so serde stays the only
//! translation layer between JSON and the session/UI code.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// The authenticated user as returned by `/api/auth/user/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A wall message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Server-assigned identifier; stable ordering key.
    pub id: i64,
    /// Author display name.
    pub user: String,
    pub content: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// Token-bearing response from login and registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub key: String,
}

/// Credentials for `POST /api/auth/login/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LoginPayload {
    Username { username: String, password: String },
    Email { email: String, password: String },
}

impl LoginPayload {
    /// Treat anything containing `@` as an email address, otherwise a username.
    pub fn from_identifier(identifier: &str, password: &str) -> Self {
        if identifier.contains('@') {
            Self::Email { email: identifier.to_owned(), password: password.to_owned() }
        } else {
            Self::Username { username: identifier.to_owned(), password: password.to_owned() }
        }
    }
}

/// Fields for `POST /api/auth/registration/`.
///
/// Confirmation equality is checked by the form before this is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Body for `POST /api/messages/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewPost<'a> {
    pub content: &'a str,
}
