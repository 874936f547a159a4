use crate::auth::{
    hash_password, verify_password, AuthResponse, ChangePasswordRequest, LoginRequest,
    RegisterRequest, TokenService,
};
use crate::error::AppError;
use crate::models::{User, UserFilter, UserPatch};
use crate::repository::{Pagination, Repository};
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Registration, login and token-to-user resolution.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn Repository<User>>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

/// Runs bcrypt off the async executor.
async fn hash_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Verification task failed: {}", e)))
}

impl AuthService {
    pub fn new(users: Arc<dyn Repository<User>>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let mut found = self
            .users
            .list(&UserFilter::by_email(email), Pagination { skip: 0, limit: 1 })
            .await?;
        Ok(found.pop())
    }

    /// Creates an account. Fails with `Conflict` if the email is already registered.
    pub async fn register(&self, input: RegisterRequest) -> Result<User, AppError> {
        input.validate()?;

        if self.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_blocking(input.password, self.bcrypt_cost).await?;
        let user = User::new(&input.email, input.name, password_hash);

        let user = self.users.create(user).await.map_err(|e| match e {
            // Lost a race with a concurrent registration of the same email.
            AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
            other => other,
        })?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Checks credentials and issues an access token.
    ///
    /// An unknown email and a wrong password produce the same error so callers cannot
    /// find out which accounts exist.
    pub async fn login(&self, input: LoginRequest) -> Result<AuthResponse, AppError> {
        input.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".into());
        let user = self.find_by_email(&input.email).await?.ok_or_else(invalid)?;

        if !verify_blocking(input.password, user.password_hash.clone()).await? {
            warn!("Failed login attempt for user {}", user.id);
            return Err(invalid());
        }

        let token = self.tokens.issue_token(&user.id.to_string())?;
        info!("User {} logged in", user.id);
        Ok(AuthResponse::bearer(token, user.id))
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let subject = self.tokens.validate_token(token)?;
        let user_id = Uuid::parse_str(&subject)
            .map_err(|_| AppError::Unauthorized("Could not validate credentials".into()))?;

        match self.users.get(user_id).await {
            Ok(user) => Ok(user),
            Err(AppError::NotFound(_)) => {
                Err(AppError::Unauthorized("Could not validate credentials".into()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users.get(user_id).await
    }

    /// Replaces the password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        input: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        input.validate()?;

        let user = self.users.get(user_id).await?;
        if !verify_blocking(input.current_password, user.password_hash).await? {
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }

        let password_hash = hash_blocking(input.new_password, self.bcrypt_cost).await?;
        self.users
            .update(
                user_id,
                UserPatch {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        info!("Password changed for user {}", user_id);
        Ok(())
    }
}
