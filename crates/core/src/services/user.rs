//! Accounts, sessions and administrator controls over users.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use owr_common::{AppError, AppResult, IdGenerator, config::AdminSettings};
use owr_db::{
    entities::{
        user::{self, UserStatus},
        user_role::{self, Role},
    },
    repositories::{UserRepository, UserRoleRepository},
};
use sea_orm::{Set, Unchanged};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for signing up.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
    #[validate(length(min = 1, max = 128))]
    pub full_name: Option<String>,
}

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// A user together with the admin flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: user::Model,
    pub is_admin: bool,
}

/// Result of signing up or in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

/// User service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    role_repo: UserRoleRepository,
    admin: AdminSettings,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        role_repo: UserRoleRepository,
        admin: AdminSettings,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            admin,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an account and return its first token.
    ///
    /// Emails on the admin bootstrap list also get the admin role.
    pub async fn sign_up(&self, input: SignUpInput) -> AppResult<AuthSession> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(user_id.clone()),
            email: Set(email.clone()),
            full_name: Set(input.full_name.map(|n| n.trim().to_string())),
            password_hash: Set(password_hash),
            token: Set(Some(token.clone())),
            status: Set(UserStatus::Active),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let is_admin = self.admin.is_bootstrap_admin(&email);
        let mut roles = vec![self.role_model(&user_id, Role::User)];
        if is_admin {
            roles.push(self.role_model(&user_id, Role::Admin));
        }

        let user = self.user_repo.create(model, roles).await?;
        tracing::info!(user_id = %user.id, is_admin, "User signed up");

        Ok(AuthSession {
            token,
            user: UserProfile { user, is_admin },
        })
    }

    /// Check credentials and return the current token.
    pub async fn sign_in(&self, input: SignInInput) -> AppResult<AuthSession> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }
        if user.is_banned() {
            return Err(AppError::Forbidden("This account is banned".to_string()));
        }

        let token = match &user.token {
            Some(token) => token.clone(),
            None => self.rotate_token(&user.id).await?,
        };
        let is_admin = self.role_repo.has_role(&user.id, Role::Admin).await?;

        tracing::info!(user_id = %user.id, "User signed in");
        Ok(AuthSession {
            token,
            user: UserProfile { user, is_admin },
        })
    }

    /// Invalidate the caller's token.
    pub async fn sign_out(&self, user_id: &str) -> AppResult<()> {
        self.rotate_token(user_id).await?;
        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// Resolve a bearer token. Banned accounts do not authenticate.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if user.is_banned() {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }

    /// Whether the user currently holds the admin role.
    pub async fn is_admin(&self, user_id: &str) -> AppResult<bool> {
        self.role_repo.has_role(user_id, Role::Admin).await
    }

    /// Profile of the caller.
    pub async fn me(&self, user: user::Model) -> AppResult<UserProfile> {
        let is_admin = self.is_admin(&user.id).await?;
        Ok(UserProfile { user, is_admin })
    }

    /// Users newest first with their admin flag.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<UserProfile>> {
        let users = self.user_repo.list(limit, offset).await?;
        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        let admins = self.role_repo.holders_among(&ids, Role::Admin).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let is_admin = admins.contains(&user.id);
                UserProfile { user, is_admin }
            })
            .collect())
    }

    /// Grant or revoke the admin role. Admins cannot demote themselves.
    pub async fn toggle_admin(&self, caller_id: &str, target_id: &str) -> AppResult<UserProfile> {
        let user = self.user_repo.get_by_id(target_id).await?;
        let is_admin = self.role_repo.has_role(target_id, Role::Admin).await?;

        if is_admin {
            if caller_id == target_id {
                return Err(AppError::BadRequest(
                    "You cannot remove your own admin role".to_string(),
                ));
            }
            self.role_repo.revoke(target_id, Role::Admin).await?;
        } else {
            self.role_repo
                .grant(self.role_model(target_id, Role::Admin))
                .await?;
        }

        tracing::info!(
            caller_id = %caller_id,
            target_id = %target_id,
            is_admin = !is_admin,
            "Admin role toggled",
        );
        Ok(UserProfile {
            user,
            is_admin: !is_admin,
        })
    }

    /// Switch a user between active and banned. Admins cannot ban themselves.
    pub async fn toggle_ban(&self, caller_id: &str, target_id: &str) -> AppResult<UserProfile> {
        if caller_id == target_id {
            return Err(AppError::BadRequest("You cannot ban yourself".to_string()));
        }
        let existing = self.user_repo.get_by_id(target_id).await?;
        let status = match existing.status {
            UserStatus::Active => UserStatus::Banned,
            UserStatus::Banned => UserStatus::Active,
        };

        let model = user::ActiveModel {
            id: Unchanged(existing.id),
            status: Set(status),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        let user = self.user_repo.update(model).await?;
        let is_admin = self.is_admin(target_id).await?;

        tracing::info!(
            caller_id = %caller_id,
            target_id = %target_id,
            status = ?status,
            "User ban toggled",
        );
        Ok(UserProfile { user, is_admin })
    }

    /// Delete a user with their votes, certificates and appointments.
    pub async fn delete(&self, caller_id: &str, target_id: &str) -> AppResult<()> {
        if caller_id == target_id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account here".to_string(),
            ));
        }
        if !self.user_repo.delete(target_id).await? {
            return Err(AppError::NotFound(format!("User not found: {target_id}")));
        }
        tracing::info!(caller_id = %caller_id, target_id = %target_id, "User deleted");
        Ok(())
    }

    async fn rotate_token(&self, user_id: &str) -> AppResult<String> {
        let token = self.id_gen.generate_token();
        let model = user::ActiveModel {
            id: Unchanged(user_id.to_string()),
            token: Set(Some(token.clone())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        self.user_repo.update(model).await?;
        Ok(token)
    }

    fn role_model(&self, user_id: &str, role: Role) -> user_role::ActiveModel {
        user_role::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            role: Set(role),
            created_at: Set(Utc::now()),
        }
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
