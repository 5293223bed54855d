use std::fmt::Display;

use chrono::{DateTime, Utc};
use projecthub_engine::db_types::UserStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub email: String,
    pub status: UserStatus,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRequest {
    pub percentage: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusOverrideRequest {
    pub status: String,
}

/// The create-order input. Exactly one of `project_id` / `portfolio_project_id` must be set; the charge amount
/// is always derived server-side from the stored quote or catalog price.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// "Initial_50" or "Final_100" for custom projects, "Prebuilt_100" for catalog items.
    pub payment_type: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub portfolio_project_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    /// Amount in paise, the unit the gateway checkout expects.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuyRequestBody {
    pub portfolio_project_id: i64,
}

/// The JSON fields accepted by the catalog create/update endpoints. List-valued fields arrive either as JSON
/// arrays or as JSON-encoded strings (multipart forms send the latter).
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioItemForm {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub demo_url: String,
    pub price: String,
    #[serde(default)]
    pub features: Value,
    #[serde(default)]
    pub tech_stacks: Value,
    /// On updates without new uploads, the existing image list is echoed back in this field.
    #[serde(default)]
    pub image_urls: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRequestForm {
    pub project_name: String,
    pub project_summary: String,
    pub project_details: String,
    #[serde(default)]
    pub budget_estimate: Option<String>,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_details: Option<String>,
}
