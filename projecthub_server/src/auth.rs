//! Access tokens and their extraction from requests.
//!
//! Tokens are HS256 JWTs carrying the user id, email and roles. They are issued by [`TokenIssuer`] at login and
//! checked by [`JwtVerifier`]. Handlers receive the verified claims through the [`JwtClaims`] extractor: a
//! missing token is a 401, a token that fails verification is a 403.

use std::future::{ready, Ready};

use actix_web::{http::header, web, FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use projecthub_engine::db_types::{Role, User};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: i64,
    pub email: String,
    pub roles: Vec<Role>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    lifetime: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { encoding_key, lifetime: config.token_lifetime }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, ServerError> {
        let exp = (Utc::now() + self.lifetime).timestamp();
        let claims = JwtClaims { sub: user.id, email: user.email.clone(), roles: vec![user.role], exp };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }
}

#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { decoding_key }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

/// Pulls the bearer token out of the `Authorization` header. `None` when the header is absent, an error when it
/// is present but not a bearer token.
pub fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AuthError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|e| AuthError::ValidationError(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::ValidationError("Authorization header is not a bearer token".to_string()))?;
    Ok(Some(token))
}

pub fn validate_token(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    // Middleware further up the chain may already have verified the token.
    if let Some(claims) = req.extensions().get::<JwtClaims>() {
        return Ok(claims.clone());
    }
    let token = bearer_token(req)?.ok_or(AuthError::MissingToken)?;
    let verifier = req
        .app_data::<web::Data<JwtVerifier>>()
        .ok_or_else(|| ServerError::InitializeError("JwtVerifier is not registered on the app".to_string()))?;
    let claims = verifier.validate(token)?;
    debug!("🔐️ Verified access token for [{}]", claims.email);
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(validate_token(req))
    }
}
