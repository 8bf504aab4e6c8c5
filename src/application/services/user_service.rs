//! User account usecases and credential checks.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::OnceCell;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::domain::entities::{Claims, NewUser, Role, User, UserChanges};
use crate::domain::policy::ensure_authorized;
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::deadline::with_deadline;
use crate::utils::password::{hash_password, verify_password};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 30;
pub const MAX_FULL_NAME_LENGTH: usize = 30;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Same refusal for an unknown email and a wrong password.
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Plaintext behind the hash checked when no account matches a login.
const DECOY_PASSWORD: &str = "decoy-password";

/// Service for user registration, profile changes and login.
pub struct UserService<U: UserRepository + ?Sized> {
    user_repository: Arc<U>,
    timeout: Duration,
    token_ttl: Duration,
    bcrypt_cost: u32,
    decoy_hash: OnceCell<String>,
}

impl<U: UserRepository + ?Sized> UserService<U> {
    pub fn new(user_repository: Arc<U>) -> Self {
        Self {
            user_repository,
            timeout: DEFAULT_TIMEOUT,
            token_ttl: DEFAULT_TOKEN_TTL,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            decoy_hash: OnceCell::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Lifetime of the claims returned by [`Self::authenticate`].
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Retrieves a user by id.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if `id` is not a UUID
    /// - [`AppError::NotFound`] if no user has that id
    pub async fn get_by_id(&self, id: &str) -> Result<User, AppError> {
        with_deadline(self.timeout, "user.get", async {
            let id = parse_user_id(id)?;
            self.find(id).await
        })
        .await
    }

    /// Registers a new account.
    ///
    /// An empty `roles` set means [`Role::User`]. The password is hashed
    /// before anything reaches the store.
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] for malformed input or an email already in use.
    pub async fn create_user(
        &self,
        email: String,
        full_name: String,
        password: String,
        roles: BTreeSet<Role>,
    ) -> Result<User, AppError> {
        with_deadline(self.timeout, "user.create", async {
            let email = normalize_email(email)?;
            let full_name = validate_full_name(full_name)?;
            validate_password(&password)?;

            if self.user_repository.find_by_email(&email).await?.is_some() {
                return Err(email_taken(&email));
            }

            let roles = if roles.is_empty() {
                BTreeSet::from([Role::User])
            } else {
                roles
            };

            let new_user = NewUser {
                id: Uuid::new_v4(),
                email,
                full_name,
                roles,
                password_hash: hash_password(password, self.bcrypt_cost).await?,
            };

            let user = self
                .user_repository
                .create(new_user)
                .await
                .map_err(conflict_as_taken_email)?;

            tracing::info!(user_id = %user.id, "User registered");
            Ok(user)
        })
        .await
    }

    /// Applies `changes` to the account `id` on behalf of `claims`.
    ///
    /// A password change requires the current password.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad id, malformed fields, an email in
    ///   use by someone else, or no changes at all
    /// - [`AppError::NotFound`] if the account does not exist
    /// - [`AppError::Forbidden`] unless the caller is the account owner or an admin
    /// - [`AppError::Unauthorized`] if the current password does not match
    /// - [`AppError::NoAffected`] if the store updated nothing
    pub async fn update_user(
        &self,
        id: &str,
        changes: UserChanges,
        claims: &Claims,
    ) -> Result<User, AppError> {
        with_deadline(self.timeout, "user.update", async {
            let id = parse_user_id(id)?;
            if changes.email.is_none() && changes.full_name.is_none() && changes.new_password.is_none() {
                return Err(AppError::bad_request(
                    "Nothing to update",
                    json!({ "fields": ["email", "full_name", "new_password"] }),
                ));
            }

            let mut user = self.find(id).await?;
            ensure_authorized(claims, &user.id.to_string(), "user")?;

            if let Some(new_password) = changes.new_password {
                validate_password(&new_password)?;
                let current = changes.current_password.ok_or_else(|| {
                    AppError::bad_request(
                        "Current password is required to set a new one",
                        json!({ "field": "current_password" }),
                    )
                })?;

                if !verify_password(current, user.password_hash.clone()).await? {
                    tracing::warn!(user_id = %user.id, "Password change refused: current password mismatch");
                    return Err(AppError::unauthorized(
                        "Current password is incorrect",
                        json!({}),
                    ));
                }

                user.password_hash = hash_password(new_password, self.bcrypt_cost).await?;
            }

            if let Some(email) = changes.email {
                let email = normalize_email(email)?;
                if email != user.email {
                    if let Some(other) = self.user_repository.find_by_email(&email).await?
                        && other.id != user.id
                    {
                        return Err(email_taken(&email));
                    }
                    user.email = email;
                }
            }

            if let Some(full_name) = changes.full_name {
                user.full_name = validate_full_name(full_name)?;
            }

            user.updated_at = Utc::now();

            let updated = self
                .user_repository
                .update(&user)
                .await
                .map_err(conflict_as_taken_email)?;
            if !updated {
                return Err(AppError::no_affected(
                    "User was not updated",
                    json!({ "id": id }),
                ));
            }

            tracing::info!(user_id = %user.id, subject = claims.subject(), "User updated");
            Ok(user)
        })
        .await
    }

    /// Checks credentials and returns claims for the account.
    ///
    /// The claims carry `sub` = user id, the stored roles, `iat` = `now` and
    /// expire after the configured token lifetime.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`] with the same message for an unknown email
    /// and a wrong password.
    pub async fn authenticate(
        &self,
        now: DateTime<Utc>,
        email: &str,
        password: &str,
    ) -> Result<Claims, AppError> {
        with_deadline(self.timeout, "user.authenticate", async {
            let email = email.trim().to_lowercase();
            let refused = || AppError::unauthorized(BAD_CREDENTIALS, json!({}));

            let Some(user) = self.user_repository.find_by_email(&email).await? else {
                // Pay the same bcrypt cost as a wrong password.
                let decoy = self.decoy_hash().await?;
                verify_password(password.to_string(), decoy.to_string()).await?;
                tracing::debug!("Login refused: unknown email");
                return Err(refused());
            };

            if !verify_password(password.to_string(), user.password_hash.clone()).await? {
                tracing::warn!(user_id = %user.id, "Login refused: wrong password");
                return Err(refused());
            }

            tracing::info!(user_id = %user.id, "User authenticated");
            Ok(Claims::new(
                user.id.to_string(),
                user.roles.iter().copied(),
                now,
                self.token_ttl,
            ))
        })
        .await
    }

    /// Deletes the account `id`.
    ///
    /// Authorization is the caller's job: this operation does not see claims.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if `id` is not a UUID
    /// - [`AppError::NoAffected`] if no account was removed
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        with_deadline(self.timeout, "user.delete", async {
            let id = parse_user_id(id)?;

            if !self.user_repository.delete(id).await? {
                return Err(AppError::no_affected(
                    "User was not deleted",
                    json!({ "id": id }),
                ));
            }

            tracing::info!(user_id = %id, "User deleted");
            Ok(())
        })
        .await
    }

    /// Adds `role` to the account `id`. Operator tooling only; no policy check.
    pub async fn grant_role(&self, id: &str, role: Role) -> Result<User, AppError> {
        with_deadline(self.timeout, "user.grant_role", async {
            let id = parse_user_id(id)?;
            let mut user = self.find(id).await?;

            if user.roles.insert(role) {
                user.updated_at = Utc::now();
                if !self.user_repository.update(&user).await? {
                    return Err(AppError::no_affected(
                        "User was not updated",
                        json!({ "id": id }),
                    ));
                }
                tracing::info!(user_id = %id, role = %role, "Role granted");
            }

            Ok(user)
        })
        .await
    }

    /// Hash at the configured cost, computed on first use.
    async fn decoy_hash(&self) -> Result<&str, AppError> {
        self.decoy_hash
            .get_or_try_init(|| hash_password(DECOY_PASSWORD.to_string(), self.bcrypt_cost))
            .await
            .map(String::as_str)
    }

    async fn find(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "id": id })))
    }
}

fn parse_user_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id)
        .map_err(|_| AppError::bad_request("Invalid user id", json!({ "id": id })))
}

fn normalize_email(email: String) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(AppError::bad_request(
            "Invalid email address",
            json!({ "field": "email" }),
        ));
    }
    Ok(email)
}

fn validate_full_name(full_name: String) -> Result<String, AppError> {
    let full_name = full_name.trim().to_string();
    if full_name.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(AppError::bad_request(
            "Full name is too long",
            json!({ "field": "full_name", "max": MAX_FULL_NAME_LENGTH }),
        ));
    }
    Ok(full_name)
}

fn validate_password(password: &str) -> Result<(), AppError> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(AppError::bad_request(
            "Password must be 8-30 characters",
            json!({ "field": "password" }),
        ));
    }
    Ok(())
}

fn email_taken(email: &str) -> AppError {
    AppError::bad_request("Email is already registered", json!({ "email": email }))
}

fn conflict_as_taken_email(e: AppError) -> AppError {
    match e {
        AppError::Conflict { .. } => {
            AppError::bad_request("Email is already registered", json!({ "field": "email" }))
        }
        other => other,
    }
}
