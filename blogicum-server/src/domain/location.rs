use super::validation::FieldErrors;
use super::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const VERBOSE_NAME: &str = "местоположение";
pub const VERBOSE_NAME_PLURAL: &str = "Местоположения";

pub const NAME_MAX_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationSummary {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    pub name: String,
    #[serde(default = "super::default_published")]
    pub is_published: bool,
}

impl NewLocation {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        validate_name(&mut errors, &self.name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub is_published: Option<bool>,
}

impl LocationUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        if let Some(name) = &self.name {
            validate_name(&mut errors, name);
        }
        errors.into_result()
    }
}

fn validate_name(errors: &mut FieldErrors, name: &str) {
    errors.require("name", name);
    errors.max_chars("name", name, NAME_MAX_LEN);
}
