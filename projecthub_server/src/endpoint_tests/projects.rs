use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use projecthub_engine::{
    db_types::{Project, ProjectStatus, QuotePaymentStatus, Role},
    ProjectApi,
};

use super::{
    helpers::{get_request, issue_token, test_user},
    mocks::{MockBackend, MockProjectManager},
};
use crate::routes::{AllProjectsRoute, MyProjectsRoute};

fn sample_project(id: i64, user_id: i64) -> Project {
    Project {
        id,
        user_id,
        project_name: "Inventory tracker".to_string(),
        project_summary: "Track stock across branches".to_string(),
        project_details: "Full writeup".to_string(),
        budget_estimate: None,
        completion_date: None,
        contact_name: None,
        contact_details: None,
        attachments: vec![],
        final_quote: None,
        status: ProjectStatus::PendingAdminReview,
        payment_status: QuotePaymentStatus::NotQuoted,
        completion_percentage: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ProjectApi::new(backend);
        cfg.app_data(web::Data::new(api)).service(MyProjectsRoute::<MockBackend>::new());
    }
}

fn configure_admin(manager: MockProjectManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ProjectApi::new(manager);
        cfg.app_data(web::Data::new(api)).service(AllProjectsRoute::<MockProjectManager>::new());
    }
}

#[actix_web::test]
async fn listing_projects_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/projects/my-projects", configure(MockBackend::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn garbage_tokens_are_rejected() {
    let (status, body) = get_request("not.a.jwt", "/projects/my-projects", configure(MockBackend::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Access token is invalid"), "was: {body}");
}

#[actix_web::test]
async fn users_see_their_own_projects() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_projects_for_user().returning(|user_id| Ok(vec![sample_project(1, user_id)]));
    backend.expect_fetch_payments_for_project().returning(|_| Ok(vec![]));
    backend.expect_fetch_delivery_files().returning(|_| Ok(vec![]));
    let token = issue_token(&test_user(5, "alice@example.com", Role::User));
    let (status, body) = get_request(&token, "/projects/my-projects", configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let projects: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["user_id"], 5);
    assert_eq!(projects[0]["status"], "Pending Admin Review");
    assert_eq!(projects[0]["payments"], serde_json::json!([]));
    assert_eq!(projects[0]["delivery_files"], serde_json::json!([]));
}

#[actix_web::test]
async fn the_admin_listing_is_admin_only() {
    let token = issue_token(&test_user(5, "alice@example.com", Role::User));
    let (status, body) = get_request(&token, "/admin/projects", configure_admin(MockProjectManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "was: {body}");
}

#[actix_web::test]
async fn admins_see_every_project() {
    let mut manager = MockProjectManager::new();
    manager.expect_fetch_all_projects().returning(|| Ok(vec![]));
    let token = issue_token(&test_user(1, "admin@example.com", Role::Admin));
    let (status, body) = get_request(&token, "/admin/projects", configure_admin(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}
