//! End-to-end exercise of the quote and payment flow against a real SQLite database.

use log::*;
use ph_common::{Paise, Secret};
use projecthub_engine::{
    db_types::{NewProject, PaymentType, ProjectStatus, QuotePaymentStatus},
    helpers::payment_signature,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AuthApi,
    CatalogApi,
    OrderTarget,
    PaymentFlowApi,
    PaymentFlowError,
    ProjectApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

const GATEWAY_SECRET: &str = "hub-test-secret";

fn new_project_request(user_id: i64) -> NewProject {
    NewProject {
        user_id,
        project_name: "Inventory tracker".to_string(),
        project_summary: "Track stock across three warehouses".to_string(),
        project_details: "Barcode scanning, low-stock alerts, CSV export".to_string(),
        budget_estimate: Some("10-15k".to_string()),
        completion_date: None,
        contact_name: Some("Asha".to_string()),
        contact_details: Some("+91 90000 00000".to_string()),
        attachments: vec![],
    }
}

#[test]
fn full_custom_project_flow() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let auth = AuthApi::new(db.clone());
        let projects = ProjectApi::new(db.clone());
        let payments = PaymentFlowApi::new(db.clone(), Secret::new(GATEWAY_SECRET.to_string()));

        let user = auth.register("asha@example.com", "hunter2hunter2", None).await.unwrap();
        let project = projects.submit_request(new_project_request(user.id)).await.unwrap();
        assert_eq!(project.status, ProjectStatus::PendingAdminReview);
        assert_eq!(project.payment_status, QuotePaymentStatus::NotQuoted);

        // Admin quotes ₹10,000.
        let project = projects.send_quote(project.id, 10_000).await.unwrap();
        assert_eq!(project.status, ProjectStatus::QuoteSent);
        assert_eq!(project.final_quote, Some(10_000));

        // The 50% instalment is exactly half the quote, in paise.
        let prepared =
            payments.prepare_order(user.id, OrderTarget::CustomProject(project.id), PaymentType::Initial50).await.unwrap();
        assert_eq!(prepared.amount, Paise::from_rupees(5_000));
        payments.record_order("order_IT1", prepared).await.unwrap();

        let sig = payment_signature("order_IT1", "pay_IT1", GATEWAY_SECRET);
        let outcome = payments.confirm_payment("order_IT1", "pay_IT1", &sig, Some(project.id)).await.unwrap();
        assert!(!outcome.replayed);
        assert_eq!(outcome.payment.amount, Paise::from_rupees(5_000));

        let project = projects.project_detail(project.id, user.id, false).await.unwrap().project;
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.payment_status, QuotePaymentStatus::FiftyPaid);

        // Progress to 100% and take the balance payment.
        let project = projects.set_progress(project.id, 100).await.unwrap();
        assert_eq!(project.status, ProjectStatus::AwaitingFinalPayment);

        let prepared =
            payments.prepare_order(user.id, OrderTarget::CustomProject(project.id), PaymentType::Final100).await.unwrap();
        assert_eq!(prepared.amount, Paise::from_rupees(5_000));
        payments.record_order("order_IT2", prepared).await.unwrap();
        let sig = payment_signature("order_IT2", "pay_IT2", GATEWAY_SECRET);
        payments.confirm_payment("order_IT2", "pay_IT2", &sig, Some(project.id)).await.unwrap();

        let project = projects.project_detail(project.id, user.id, false).await.unwrap().project;
        assert_eq!(project.status, ProjectStatus::Delivered);
        assert_eq!(project.payment_status, QuotePaymentStatus::HundredPaid);

        // Ledger holds exactly two rows totalling the full quote.
        let ledger = payments.payments_for_user(user.id).await.unwrap();
        assert_eq!(ledger.len(), 2);
        let total: Paise = ledger.iter().map(|p| p.payment.amount).sum();
        assert_eq!(total, Paise::from_rupees(10_000));
        info!("🔄️ Full flow complete");
    });
}

#[test]
fn odd_quote_splits_with_floor() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let auth = AuthApi::new(db.clone());
        let projects = ProjectApi::new(db.clone());
        let payments = PaymentFlowApi::new(db.clone(), Secret::new(GATEWAY_SECRET.to_string()));

        let user = auth.register("odd@example.com", "hunter2hunter2", None).await.unwrap();
        let project = projects.submit_request(new_project_request(user.id)).await.unwrap();
        projects.send_quote(project.id, 10_001).await.unwrap();

        let prepared =
            payments.prepare_order(user.id, OrderTarget::CustomProject(project.id), PaymentType::Initial50).await.unwrap();
        // floor(10001 / 2) = 5000 rupees. The balance carries the odd rupee.
        assert_eq!(prepared.amount, Paise::from_rupees(5_000));
        payments.record_order("order_ODD1", prepared).await.unwrap();
        let sig = payment_signature("order_ODD1", "pay_ODD1", GATEWAY_SECRET);
        payments.confirm_payment("order_ODD1", "pay_ODD1", &sig, Some(project.id)).await.unwrap();

        let prepared =
            payments.prepare_order(user.id, OrderTarget::CustomProject(project.id), PaymentType::Final100).await.unwrap();
        assert_eq!(prepared.amount, Paise::from_rupees(5_001));
    });
}

#[test]
fn replayed_confirmation_is_harmless() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let auth = AuthApi::new(db.clone());
        let projects = ProjectApi::new(db.clone());
        let payments = PaymentFlowApi::new(db.clone(), Secret::new(GATEWAY_SECRET.to_string()));

        let user = auth.register("replay@example.com", "hunter2hunter2", None).await.unwrap();
        let project = projects.submit_request(new_project_request(user.id)).await.unwrap();
        projects.send_quote(project.id, 8_000).await.unwrap();
        let prepared =
            payments.prepare_order(user.id, OrderTarget::CustomProject(project.id), PaymentType::Initial50).await.unwrap();
        payments.record_order("order_RP1", prepared).await.unwrap();
        let sig = payment_signature("order_RP1", "pay_RP1", GATEWAY_SECRET);

        let first = payments.confirm_payment("order_RP1", "pay_RP1", &sig, Some(project.id)).await.unwrap();
        assert!(!first.replayed);
        let second = payments.confirm_payment("order_RP1", "pay_RP1", &sig, Some(project.id)).await.unwrap();
        assert!(second.replayed);
        assert_eq!(second.payment.id, first.payment.id);

        // Still exactly one ledger row, and the project is still exactly one step along.
        let ledger = payments.payments_for_user(user.id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        let project = projects.project_detail(project.id, user.id, false).await.unwrap().project;
        assert_eq!(project.status, ProjectStatus::InProgress);
    });
}

#[test]
fn bad_signatures_and_wrong_targets_are_rejected() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let auth = AuthApi::new(db.clone());
        let projects = ProjectApi::new(db.clone());
        let payments = PaymentFlowApi::new(db.clone(), Secret::new(GATEWAY_SECRET.to_string()));

        let user = auth.register("sig@example.com", "hunter2hunter2", None).await.unwrap();
        let project = projects.submit_request(new_project_request(user.id)).await.unwrap();
        projects.send_quote(project.id, 6_000).await.unwrap();
        let prepared =
            payments.prepare_order(user.id, OrderTarget::CustomProject(project.id), PaymentType::Initial50).await.unwrap();
        payments.record_order("order_SG1", prepared).await.unwrap();

        // A signature over different identifiers does not verify.
        let sig = payment_signature("order_SG1", "pay_OTHER", GATEWAY_SECRET);
        let err = payments.confirm_payment("order_SG1", "pay_SG1", &sig, Some(project.id)).await.unwrap_err();
        assert!(matches!(err, PaymentFlowError::InvalidSignature));

        // A valid signature for an order that targets a different project is rejected.
        let sig = payment_signature("order_SG1", "pay_SG1", GATEWAY_SECRET);
        let err = payments.confirm_payment("order_SG1", "pay_SG1", &sig, Some(project.id + 99)).await.unwrap_err();
        assert!(matches!(err, PaymentFlowError::TargetMismatch));

        // Unknown order ids are rejected even with a valid signature.
        let sig = payment_signature("order_NOPE", "pay_SG1", GATEWAY_SECRET);
        let err = payments.confirm_payment("order_NOPE", "pay_SG1", &sig, None).await.unwrap_err();
        assert!(matches!(err, PaymentFlowError::OrderNotFound(_)));

        // Nothing made it into the ledger.
        assert!(payments.payments_for_user(user.id).await.unwrap().is_empty());
    });
}

#[test]
fn catalog_purchase_records_and_lists() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let auth = AuthApi::new(db.clone());
        let catalog = CatalogApi::new(db.clone());
        let payments = PaymentFlowApi::new(db.clone(), Secret::new(GATEWAY_SECRET.to_string()));

        let user = auth.register("buyer@example.com", "hunter2hunter2", None).await.unwrap();
        let item = catalog
            .add_item(projecthub_engine::db_types::NewPortfolioProject {
                name: "React storefront".to_string(),
                description: "A ready-made shop".to_string(),
                demo_url: "https://demo.example.com".to_string(),
                price: "INR 2,499".to_string(),
                features: vec!["Cart".to_string()],
                tech_stacks: vec!["React".to_string(), "Node".to_string()],
                image_urls: vec![],
            })
            .await
            .unwrap();

        let prepared =
            payments.prepare_order(user.id, OrderTarget::CatalogItem(item.id), PaymentType::Prebuilt100).await.unwrap();
        assert_eq!(prepared.amount, Paise::from_rupees(2_499));
        payments.record_order("order_CAT1", prepared).await.unwrap();
        let sig = payment_signature("order_CAT1", "pay_CAT1", GATEWAY_SECRET);
        let outcome = payments.confirm_payment("order_CAT1", "pay_CAT1", &sig, None).await.unwrap();
        assert_eq!(outcome.payment.portfolio_project_name.as_deref(), Some("React storefront"));

        let purchases = payments.purchases_for_user(user.id).await.unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].id, item.id);
    });
}

#[test]
fn unquoted_projects_cannot_take_payment() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let auth = AuthApi::new(db.clone());
        let projects = ProjectApi::new(db.clone());
        let payments = PaymentFlowApi::new(db.clone(), Secret::new(GATEWAY_SECRET.to_string()));

        let user = auth.register("early@example.com", "hunter2hunter2", None).await.unwrap();
        let project = projects.submit_request(new_project_request(user.id)).await.unwrap();

        let err = payments
            .prepare_order(user.id, OrderTarget::CustomProject(project.id), PaymentType::Initial50)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentFlowError::InvalidTransition(_)));

        // Another user cannot pay for a project they do not own.
        let other = auth.register("other@example.com", "hunter2hunter2", None).await.unwrap();
        projects.send_quote(project.id, 4_000).await.unwrap();
        let err = payments
            .prepare_order(other.id, OrderTarget::CustomProject(project.id), PaymentType::Initial50)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentFlowError::AccessDenied));
    });
}
