//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use storyvault_common::{AppError, AppResult, IdGenerator};
use storyvault_db::{entities::user, repositories::UserRepository};
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for password login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Identity asserted by a federated provider after its own verification.
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedProfile {
    pub provider: String,
    pub provider_id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new local account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(Some(password_hash)),
            provider: Set(None),
            provider_id: Set(None),
            avatar_url: Set(None),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(Utc::now().into()),
        };

        self.user_repo.create(model).await
    }

    /// Verify credentials and rotate the bearer token.
    ///
    /// All failure modes collapse into the same `Unauthorized` so the
    /// response does not reveal whether the email exists.
    pub async fn authenticate(&self, input: LoginInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, hash)? {
            return Err(AppError::Unauthorized);
        }

        let model = user::ActiveModel {
            id: Set(user.id),
            token: Set(Some(self.id_gen.generate_token())),
            ..Default::default()
        };

        self.user_repo.update(model).await
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Invalidate the user's bearer token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            token: Set(None),
            ..Default::default()
        };
        self.user_repo.update(model).await?;
        Ok(())
    }

    /// Get a user by ID.
    pub async fn get(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Look up a federated identity, creating the account on first sign-in.
    ///
    /// The provider has already verified the identity; no password is stored
    /// for these accounts.
    pub async fn find_or_create_from_provider(
        &self,
        profile: FederatedProfile,
    ) -> AppResult<user::Model> {
        if let Some(user) = self
            .user_repo
            .find_by_provider(&profile.provider, &profile.provider_id)
            .await?
        {
            return Ok(user);
        }

        // An existing local account with the same email gets linked rather
        // than duplicated.
        if let Some(user) = self.user_repo.find_by_email(&profile.email).await? {
            let model = user::ActiveModel {
                id: Set(user.id),
                provider: Set(Some(profile.provider)),
                provider_id: Set(Some(profile.provider_id)),
                ..Default::default()
            };
            return self.user_repo.update(model).await;
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(profile.username),
            email: Set(profile.email),
            password_hash: Set(None),
            provider: Set(Some(profile.provider)),
            provider_id: Set(Some(profile.provider_id)),
            avatar_url: Set(profile.avatar_url),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(Utc::now().into()),
        };

        self.user_repo.create(model).await
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
