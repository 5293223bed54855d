use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, Utc};
use log::debug;
use ph_common::Secret;
use projecthub_engine::db_types::{Role, User, UserStatus};
use serde::Serialize;

use crate::{
    auth::{JwtVerifier, TokenIssuer},
    config::AuthConfig,
};

// A fixed signing secret for endpoint tests. DO NOT re-use it anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-test-signing-secret".to_string()),
        token_lifetime: Duration::hours(1),
    }
}

pub fn test_user(id: i64, email: &str, role: Role) -> User {
    User {
        id,
        email: email.to_string(),
        password_hash: String::default(),
        contact: None,
        status: UserStatus::Active,
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn issue_token(user: &User) -> String {
    let signer = TokenIssuer::new(&get_auth_config());
    signer.issue_token(user).unwrap()
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    send(req, configure).await
}

pub async fn post_request<T: Serialize>(
    token: &str,
    path: &str,
    body: &T,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    send(req, configure).await
}

async fn send(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let verifier = JwtVerifier::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(verifier)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
