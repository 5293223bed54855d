//! End-to-end payment flow through the HTTP layer, backed by a throwaway sqlite database and a stubbed gateway.

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ph_common::{Paise, Secret};
use projecthub_engine::{
    db_types::{NewProject, NewUser, User},
    helpers::payment_signature,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{ProjectManagement, UserManagement},
    PaymentFlowApi,
    ProjectApi,
    SqliteDatabase,
};
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, post_request},
    mocks::MockGateway,
};
use crate::{
    gateway::GatewayOrderResponse,
    routes::{ConfirmProjectPaymentRoute, CreateOrderRoute, GatewayKeyId, MyPaymentsRoute},
};

const GATEWAY_SECRET: &str = "endpoint-test-gateway-secret";

fn stub_gateway(order_id: &'static str) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().returning(move |amount, currency, _receipt| {
        Ok(GatewayOrderResponse { id: order_id.to_string(), amount: amount.value(), currency: currency.to_string() })
    });
    gateway
}

fn configure(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let payment_api = PaymentFlowApi::new(db, Secret::new(GATEWAY_SECRET.to_string()));
        cfg.app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(GatewayKeyId("rzp_test_key".to_string())))
            .service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new())
            .service(ConfirmProjectPaymentRoute::<SqliteDatabase>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new());
    }
}

async fn quoted_project(db: &SqliteDatabase, quote: i64) -> (User, i64) {
    let user = db
        .insert_user(NewUser {
            email: format!("buyer{}@example.com", rand::random::<u32>()),
            password_hash: String::default(),
            contact: None,
        })
        .await
        .unwrap();
    let user = db.activate_user(user.id).await.unwrap();
    let project = db
        .insert_project(NewProject {
            user_id: user.id,
            project_name: "Portfolio site".to_string(),
            project_summary: "A small portfolio site".to_string(),
            project_details: "Three pages and a contact form".to_string(),
            budget_estimate: None,
            completion_date: None,
            contact_name: None,
            contact_details: None,
            attachments: vec![],
        })
        .await
        .unwrap();
    let api = ProjectApi::new(db.clone());
    let project = api.send_quote(project.id, quote).await.unwrap();
    (user, project.id)
}

#[actix_web::test]
async fn the_first_instalment_round_trips() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 2).await.unwrap();
    let (user, project_id) = quoted_project(&db, 10_000).await;
    let token = issue_token(&user);

    let body = json!({"payment_type": "Initial_50", "project_id": project_id});
    let (status, body) =
        post_request(&token, "/payment/create-order", &body, configure(db.clone(), stub_gateway("order_ep_1"))).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order_id"], "order_ep_1");
    assert_eq!(order["amount"], Paise::from_rupees(5_000).value());
    assert_eq!(order["key_id"], "rzp_test_key");

    let signature = payment_signature("order_ep_1", "pay_ep_1", GATEWAY_SECRET);
    let confirm = json!({
        "razorpay_order_id": "order_ep_1",
        "razorpay_payment_id": "pay_ep_1",
        "razorpay_signature": signature,
    });
    let path = format!("/projects/confirm-payment/{project_id}");
    let (status, body) =
        post_request(&token, &path, &confirm, configure(db.clone(), stub_gateway("order_ep_1"))).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let payment: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["gateway_payment_id"], "pay_ep_1");
    assert_eq!(payment["payment_type"], "Initial_50");

    let (status, body) = get_request(&token, "/projects/my-payments", configure(db, stub_gateway("unused"))).await;
    assert_eq!(status, StatusCode::OK);
    let payments: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(payments.len(), 1);
}

#[actix_web::test]
async fn tampered_signatures_are_a_400() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 2).await.unwrap();
    let (user, project_id) = quoted_project(&db, 10_000).await;
    let token = issue_token(&user);

    let body = json!({"payment_type": "Initial_50", "project_id": project_id});
    let (status, _) =
        post_request(&token, "/payment/create-order", &body, configure(db.clone(), stub_gateway("order_ep_2"))).await;
    assert_eq!(status, StatusCode::OK);

    let confirm = json!({
        "razorpay_order_id": "order_ep_2",
        "razorpay_payment_id": "pay_ep_2",
        "razorpay_signature": "00ff00ff00ff00ff00ff00ff00ff00ff00ff00ff00ff00ff00ff00ff00ff00f",
    });
    let path = format!("/projects/confirm-payment/{project_id}");
    let (status, body) = post_request(&token, &path, &confirm, configure(db, stub_gateway("order_ep_2"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payment verification failed."}"#);
}

#[actix_web::test]
async fn orders_against_someone_elses_project_are_rejected() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 2).await.unwrap();
    let (_owner, project_id) = quoted_project(&db, 10_000).await;
    let stranger = db
        .insert_user(NewUser {
            email: "stranger@example.com".to_string(),
            password_hash: String::default(),
            contact: None,
        })
        .await
        .unwrap();
    let stranger = db.activate_user(stranger.id).await.unwrap();
    let token = issue_token(&stranger);

    let body = json!({"payment_type": "Initial_50", "project_id": project_id});
    let (status, body) =
        post_request(&token, "/payment/create-order", &body, configure(db, stub_gateway("order_ep_3"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "was: {body}");
}
