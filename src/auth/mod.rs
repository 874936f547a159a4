pub mod extractors;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use password::validate_password_bytes;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

/// Represents the payload for a user login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Optional display name, at most 100 characters.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Password for the new account.
    /// At least 6 characters and at most 72 bytes, the most bcrypt will read.
    #[validate(length(min = 6), custom = "validate_password_bytes")]
    pub password: String,
}

/// Payload for changing the password of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 6), custom = "validate_password_bytes")]
    pub new_password: String,
}

/// Response structure after a successful login.
/// Contains the access token and the ID of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// The signed access token.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// The unique identifier of the authenticated user.
    pub user_id: Uuid,
}

impl AuthResponse {
    pub fn bearer(access_token: String, user_id: Uuid) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user_id,
        }
    }
}
