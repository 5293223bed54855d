use actix_web::{http::StatusCode, web, web::ServiceConfig};
use projecthub_engine::{db_types::Role, traits::AuthApiError, AuthApi};
use serde_json::json;

use super::{
    helpers::{get_auth_config, post_request, test_user},
    mocks::MockUserManager,
};
use crate::{
    auth::{JwtVerifier, TokenIssuer},
    routes::{LoginRoute, RegisterRoute},
};

fn configure(manager: MockUserManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let config = get_auth_config();
        let api = AuthApi::new(manager);
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(TokenIssuer::new(&config)))
            .service(RegisterRoute::<MockUserManager>::new())
            .service(LoginRoute::<MockUserManager>::new());
    }
}

#[actix_web::test]
async fn register_a_new_account() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockUserManager::new();
    manager.expect_insert_user().returning(|u| {
        let mut user = test_user(1, &u.email, Role::User);
        user.status = projecthub_engine::db_types::UserStatus::Pending;
        Ok(user)
    });
    let body = json!({"email": "alice@example.com", "password": "hunter2hunter2"});
    let (status, body) = post_request("", "/auth/register", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::CREATED);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["email"], "alice@example.com");
    assert_eq!(response["status"], "Pending");
    // The hash never leaves the server.
    assert!(response.get("password_hash").is_none());
}

#[actix_web::test]
async fn register_rejects_duplicate_emails() {
    let mut manager = MockUserManager::new();
    manager.expect_insert_user().returning(|_| Err(AuthApiError::EmailAlreadyExists));
    let body = json!({"email": "alice@example.com", "password": "hunter2hunter2"});
    let (status, body) = post_request("", "/auth/register", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"An account with this email already exists"}"#);
}

#[actix_web::test]
async fn register_rejects_malformed_input() {
    let manager = MockUserManager::new();
    let body = json!({"email": "not-an-email", "password": "hunter2hunter2"});
    let (status, _) = post_request("", "/auth/register", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let manager = MockUserManager::new();
    let body = json!({"email": "alice@example.com", "password": "short"});
    let (status, body) = post_request("", "/auth/register", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least 8 characters"), "was: {body}");
}

#[actix_web::test]
async fn login_issues_a_verifiable_token() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockUserManager::new();
    let password = "hunter2hunter2";
    let hash = hash_for(password);
    manager.expect_fetch_user_by_email().returning(move |email| {
        let mut user = test_user(42, email, Role::Admin);
        user.password_hash = hash.clone();
        Ok(Some(user))
    });
    let body = json!({"email": "admin@example.com", "password": password});
    let (status, body) = post_request("", "/auth/login", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["user"]["id"], 42);
    assert_eq!(response["user"]["email"], "admin@example.com");
    assert_eq!(response["user"]["status"], "Active");
    assert_eq!(response["user"]["is_admin"], true);
    let verifier = JwtVerifier::new(&get_auth_config());
    let claims = verifier.validate(response["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, 42);
    assert!(claims.is_admin());
}

#[actix_web::test]
async fn login_hides_whether_the_email_exists() {
    let mut manager = MockUserManager::new();
    manager.expect_fetch_user_by_email().returning(|_| Ok(None));
    let body = json!({"email": "nobody@example.com", "password": "whatever123"});
    let (status, body) = post_request("", "/auth/login", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Invalid credentials."}"#);

    let mut manager = MockUserManager::new();
    let hash = hash_for("the-real-password");
    manager.expect_fetch_user_by_email().returning(move |email| {
        let mut user = test_user(7, email, Role::User);
        user.password_hash = hash.clone();
        Ok(Some(user))
    });
    let body = json!({"email": "bob@example.com", "password": "wrong-password"});
    let (status, body) = post_request("", "/auth/login", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Invalid credentials."}"#);
}

#[actix_web::test]
async fn login_rejects_unapproved_accounts() {
    let mut manager = MockUserManager::new();
    let password = "hunter2hunter2";
    let hash = hash_for(password);
    manager.expect_fetch_user_by_email().returning(move |email| {
        let mut user = test_user(7, email, Role::User);
        user.status = projecthub_engine::db_types::UserStatus::Pending;
        user.password_hash = hash.clone();
        Ok(Some(user))
    });
    let body = json!({"email": "bob@example.com", "password": password});
    let (status, body) = post_request("", "/auth/login", &body, configure(manager)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Account pending approval."}"#);
}

fn hash_for(password: &str) -> String {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default().hash_password(password.as_bytes(), &salt).unwrap().to_string()
}
