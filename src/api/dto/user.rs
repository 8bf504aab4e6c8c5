//! DTOs for user account endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::application::services::user_service::{
    MAX_FULL_NAME_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
};
use crate::domain::entities::{Role, User, UserChanges};

// `validator` length bounds are `u64`.
const MAX_FULL_NAME_LENGTH_U64: u64 = MAX_FULL_NAME_LENGTH as u64;
const MIN_PASSWORD_LENGTH_U64: u64 = MIN_PASSWORD_LENGTH as u64;
const MAX_PASSWORD_LENGTH_U64: u64 = MAX_PASSWORD_LENGTH as u64;

/// Request body of `POST /v1/user/create`.
#[derive(Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = MAX_FULL_NAME_LENGTH_U64))]
    #[serde(default)]
    pub full_name: String,

    #[validate(length(min = MIN_PASSWORD_LENGTH_U64, max = MAX_PASSWORD_LENGTH_U64))]
    pub password: String,
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &"***")
            .finish()
    }
}

/// Request body of `PUT /v1/user`. Absent fields are left unchanged.
#[derive(Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub id: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = MAX_FULL_NAME_LENGTH_U64))]
    pub full_name: Option<String>,

    /// Required together with `new_password`.
    pub current_password: Option<String>,

    #[validate(length(min = MIN_PASSWORD_LENGTH_U64, max = MAX_PASSWORD_LENGTH_U64))]
    pub new_password: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_parts(self) -> (String, UserChanges) {
        (
            self.id,
            UserChanges {
                email: self.email,
                full_name: self.full_name,
                current_password: self.current_password,
                new_password: self.new_password,
            },
        )
    }
}

impl fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// User record as returned to clients. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: BTreeSet<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            roles: user.roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
