use super::validation::{is_valid_email, is_valid_username, FieldErrors};
use super::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERNAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = validate_identity(&self.username, &self.email);
        errors.max_chars("first_name", &self.first_name, NAME_MAX_LEN);
        errors.max_chars("last_name", &self.last_name, NAME_MAX_LEN);
        if self.password.chars().count() < 8 {
            errors.add(
                "password",
                "This password is too short. It must contain at least 8 characters.",
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginUserRequest {
    pub username: String,
    pub password: String,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = validate_identity(&self.username, &self.email);
        errors.max_chars("first_name", &self.first_name, NAME_MAX_LEN);
        errors.max_chars("last_name", &self.last_name, NAME_MAX_LEN);
        errors.into_result()
    }
}

impl From<&User> for UpdateProfileRequest {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

fn validate_identity(username: &str, email: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();
    errors.require("username", username);
    errors.max_chars("username", username, USERNAME_MAX_LEN);
    if !username.trim().is_empty() && !is_valid_username(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    errors.require("email", email);
    errors.max_chars("email", email, EMAIL_MAX_LEN);
    if !email.trim().is_empty() && !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
    errors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            is_staff: user.is_staff,
            created_at: user.created_at,
        }
    }
}

/// Public view of a user shown on their profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

/// Author reference embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(username: &str, email: &str) -> UpdateProfileRequest {
        UpdateProfileRequest {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: email.to_string(),
        }
    }

    #[test]
    fn profile_requires_username_and_email() {
        let err = profile("", "").validate().unwrap_err();
        match err {
            DomainError::Validation(fields) => {
                assert!(fields.get("username").is_some());
                assert!(fields.get("email").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn profile_rejects_bad_username_characters() {
        assert!(profile("anna k", "anna@example.com").validate().is_err());
        assert!(profile("anna_k", "anna@example.com").validate().is_ok());
    }

    #[test]
    fn register_enforces_password_length() {
        let req = RegisterUserRequest {
            username: "anna".into(),
            email: "anna@example.com".into(),
            password: "short".into(),
            first_name: String::new(),
            last_name: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
