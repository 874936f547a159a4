use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::TokenService;
use crate::error::AppError;

/// Subject of a validated bearer token.
///
/// Reads `Authorization: Bearer <token>` and checks it with the `TokenService` registered
/// as app data (`web::Data<TokenService>`). A missing or invalid token yields a 401; a
/// missing `TokenService` is a configuration error and yields a 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn subject(&self) -> &str {
        &self.0
    }
}

/// Pulls the raw token out of an `Authorization` header value.
fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized(
            "Invalid authorization header format".into(),
        )),
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::Configuration("TokenService not registered".into()))?;

    let token = bearer_token(req)?;
    tokens.validate_token(token).map(AuthenticatedUser)
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError; // AppError converts through ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(ActixError::from))
    }
}
