use crate::application::redirect::{Redirect, WriteOutcome};
use crate::data::UserRepository;
use crate::domain::user::{UpdateProfileRequest, UserResponse};
use crate::domain::validation::FieldErrors;
use crate::domain::{DomainError, User};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ProfileEditForm {
    pub user: UserResponse,
    pub form: UpdateProfileRequest,
}

pub struct ProfileService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl ProfileService {
    pub fn new(user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { user_repo }
    }

    pub async fn current(&self, user_id: i64) -> Result<ProfileEditForm, DomainError> {
        let user = self.user_repo.find_by_id(user_id).await?;
        let form = UpdateProfileRequest::from(&user);
        Ok(ProfileEditForm {
            user: UserResponse::from(user),
            form,
        })
    }

    /// Saves the requester's own profile and sends them to it, under the
    /// possibly new username.
    pub async fn update(
        &self,
        user_id: i64,
        req: UpdateProfileRequest,
    ) -> Result<WriteOutcome<UserResponse>, DomainError> {
        req.validate()?;
        self.check_unique(user_id, &req).await?;

        let user = self.user_repo.update_profile(user_id, &req).await?;
        tracing::info!("Profile updated: id={}, username={}", user.id, user.username);

        Ok(WriteOutcome::Done {
            redirect: Redirect::Profile(user.username.clone()),
            value: UserResponse::from(user),
        })
    }

    async fn check_unique(
        &self,
        user_id: i64,
        req: &UpdateProfileRequest,
    ) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        if taken_by_other(self.user_repo.find_by_username(&req.username).await, user_id)? {
            errors.add("username", "A user with that username already exists.");
        }
        if taken_by_other(self.user_repo.find_by_email(&req.email).await, user_id)? {
            errors.add("email", "A user with that email already exists.");
        }
        errors.into_result()
    }
}

fn taken_by_other(
    lookup: Result<User, DomainError>,
    user_id: i64,
) -> Result<bool, DomainError> {
    match lookup {
        Ok(user) => Ok(user.id != user_id),
        Err(DomainError::UserNotFound) => Ok(false),
        Err(e) => Err(e),
    }
}
