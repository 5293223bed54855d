//! Record types and the closed enums backing the marketplace's state labels.
//!
//! The wire and storage representations of the enums are the human-readable labels the storefront displays
//! ("Quote Sent - Awaiting 50% Payment" and friends), so every enum carries matching `sqlx(rename)` and
//! `serde(rename)` attributes plus `Display`/`FromStr` impls for the same strings.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use ph_common::Paise;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Unrecognised value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------      UserStatus       --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum UserStatus {
    /// Freshly registered, awaiting admin approval. Cannot log in.
    Pending,
    /// Approved by an admin.
    Active,
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Pending => write!(f, "Pending"),
            UserStatus::Active => write!(f, "Active"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Active" => Ok(Self::Active),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------         Role          --------------------------------------------------------
/// Authorisation role carried on the user row and inside access tokens. Admin routes require [`Role::Admin`];
/// there is no admin-by-email convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     ProjectStatus     --------------------------------------------------------
/// Lifecycle label for a custom project request. The original store kept this as free text; here the set is closed
/// and transitions go through [`crate::state::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[sqlx(rename = "Pending Admin Review")]
    #[serde(rename = "Pending Admin Review")]
    PendingAdminReview,
    #[sqlx(rename = "Quote Sent - Awaiting 50% Payment")]
    #[serde(rename = "Quote Sent - Awaiting 50% Payment")]
    QuoteSent,
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sqlx(rename = "Awaiting Final Payment")]
    #[serde(rename = "Awaiting Final Payment")]
    AwaitingFinalPayment,
    Delivered,
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::PendingAdminReview => write!(f, "Pending Admin Review"),
            ProjectStatus::QuoteSent => write!(f, "Quote Sent - Awaiting 50% Payment"),
            ProjectStatus::InProgress => write!(f, "In Progress"),
            ProjectStatus::AwaitingFinalPayment => write!(f, "Awaiting Final Payment"),
            ProjectStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending Admin Review" => Ok(Self::PendingAdminReview),
            "Quote Sent - Awaiting 50% Payment" => Ok(Self::QuoteSent),
            "In Progress" => Ok(Self::InProgress),
            "Awaiting Final Payment" => Ok(Self::AwaitingFinalPayment),
            "Delivered" => Ok(Self::Delivered),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------  QuotePaymentStatus   --------------------------------------------------------
/// The payment axis of a custom project, tracked independently of [`ProjectStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum QuotePaymentStatus {
    #[sqlx(rename = "Not Quoted")]
    #[serde(rename = "Not Quoted")]
    NotQuoted,
    #[sqlx(rename = "Pending 50%")]
    #[serde(rename = "Pending 50%")]
    PendingFifty,
    #[sqlx(rename = "50% Paid")]
    #[serde(rename = "50% Paid")]
    FiftyPaid,
    #[sqlx(rename = "100% Paid")]
    #[serde(rename = "100% Paid")]
    HundredPaid,
}

impl Display for QuotePaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotePaymentStatus::NotQuoted => write!(f, "Not Quoted"),
            QuotePaymentStatus::PendingFifty => write!(f, "Pending 50%"),
            QuotePaymentStatus::FiftyPaid => write!(f, "50% Paid"),
            QuotePaymentStatus::HundredPaid => write!(f, "100% Paid"),
        }
    }
}

impl FromStr for QuotePaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Quoted" => Ok(Self::NotQuoted),
            "Pending 50%" => Ok(Self::PendingFifty),
            "50% Paid" => Ok(Self::FiftyPaid),
            "100% Paid" => Ok(Self::HundredPaid),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------      PaymentType      --------------------------------------------------------
/// Which leg of the purchase a gateway order (and its eventual ledger row) belongs to. Initial/final instalments
/// target a custom project; `Prebuilt100` targets a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentType {
    #[sqlx(rename = "Initial_50")]
    #[serde(rename = "Initial_50")]
    Initial50,
    #[sqlx(rename = "Final_100")]
    #[serde(rename = "Final_100")]
    Final100,
    #[sqlx(rename = "Prebuilt_100")]
    #[serde(rename = "Prebuilt_100")]
    Prebuilt100,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::Initial50 => write!(f, "Initial_50"),
            PaymentType::Final100 => write!(f, "Final_100"),
            PaymentType::Prebuilt100 => write!(f, "Prebuilt_100"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Initial_50" => Ok(Self::Initial50),
            "Final_100" => Ok(Self::Final100),
            "Prebuilt_100" => Ok(Self::Prebuilt100),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     PaymentStatus     --------------------------------------------------------
/// Ledger rows are only ever written after a successful verification, so the set has a single member. It is kept as
/// an enum so the column stays closed if refunds ever land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Success,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Success")
    }
}

//--------------------------------------     FileCategory      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum FileCategory {
    Video,
    Code,
    Asset,
}

impl Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileCategory::Video => write!(f, "Video"),
            FileCategory::Code => write!(f, "Code"),
            FileCategory::Asset => write!(f, "Asset"),
        }
    }
}

/// The single-slot delivery artifacts on a catalog item. Assets are not a slot; they accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverySlot {
    SetupVideo,
    ProjectCode,
}

//--------------------------------------         User          --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub contact: Option<String>,
    pub status: UserStatus,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub contact: Option<String>,
}

/// The admin view of an unapproved registration.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingUser {
    pub id: i64,
    pub email: String,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Project        --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub project_name: String,
    pub project_summary: String,
    pub project_details: String,
    pub budget_estimate: Option<String>,
    pub completion_date: Option<DateTime<Utc>>,
    pub contact_name: Option<String>,
    pub contact_details: Option<String>,
    #[sqlx(json)]
    pub attachments: Vec<String>,
    /// The agreed price in whole rupees. Set once by the admin quote; both instalments derive from it.
    pub final_quote: Option<i64>,
    pub status: ProjectStatus,
    pub payment_status: QuotePaymentStatus,
    pub completion_percentage: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: i64,
    pub project_name: String,
    pub project_summary: String,
    pub project_details: String,
    pub budget_estimate: Option<String>,
    pub completion_date: Option<DateTime<Utc>>,
    pub contact_name: Option<String>,
    pub contact_details: Option<String>,
    pub attachments: Vec<String>,
}

/// A project joined with its owner's contact details, for the admin listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectWithOwner {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,
    pub user_email: String,
    pub user_contact: Option<String>,
}

//--------------------------------------   PortfolioProject    --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PortfolioProject {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub demo_url: String,
    /// Free-text price as entered by the admin ("INR 50,000", "50000", ...). Digits are extracted for billing.
    pub price: String,
    #[sqlx(json)]
    pub features: Vec<String>,
    #[sqlx(json)]
    pub tech_stacks: Vec<String>,
    #[sqlx(json)]
    pub image_urls: Vec<String>,
    pub setup_video_url: Option<String>,
    pub project_code_url: Option<String>,
    #[sqlx(json)]
    pub asset_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPortfolioProject {
    pub name: String,
    pub description: String,
    pub demo_url: String,
    pub price: String,
    pub features: Vec<String>,
    pub tech_stacks: Vec<String>,
    pub image_urls: Vec<String>,
}

/// Field-by-field update for a catalog item. `image_urls = None` keeps the stored set.
#[derive(Debug, Clone)]
pub struct PortfolioProjectUpdate {
    pub name: String,
    pub description: String,
    pub demo_url: String,
    pub price: String,
    pub features: Vec<String>,
    pub tech_stacks: Vec<String>,
    pub image_urls: Option<Vec<String>>,
}

//--------------------------------------     GatewayOrder      --------------------------------------------------------
/// Server-side record of an order minted at the payment gateway. Verification re-derives the buyer, target and
/// payment type from this row; nothing echoed by the client is trusted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GatewayOrder {
    pub id: i64,
    pub order_id: String,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub portfolio_project_id: Option<i64>,
    pub payment_type: PaymentType,
    pub amount: Paise,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGatewayOrder {
    pub order_id: String,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub portfolio_project_id: Option<i64>,
    pub payment_type: PaymentType,
    pub amount: Paise,
    pub currency: String,
}

//--------------------------------------        Payment        --------------------------------------------------------
/// One immutable ledger row. Created only after signature verification succeeds; never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount: Paise,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub portfolio_project_id: Option<i64>,
    pub portfolio_project_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount: Paise,
    pub payment_type: PaymentType,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub portfolio_project_id: Option<i64>,
    pub portfolio_project_name: Option<String>,
}

/// A ledger row joined with the buyer's email and a displayable project name, for listings and receipts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentWithContext {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub user_email: String,
    pub project_name: Option<String>,
}

//--------------------------------------       BuyRequest      --------------------------------------------------------
/// A non-binding "I want this" inquiry for a catalog item, recorded before or without payment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BuyRequest {
    pub id: i64,
    pub user_id: i64,
    pub portfolio_project_id: i64,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBuyRequest {
    pub user_id: i64,
    pub portfolio_project_id: i64,
    pub project_name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BuyRequestWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: BuyRequest,
    pub user_email: String,
    pub user_contact: Option<String>,
}

//--------------------------------------     DeliveryFile      --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeliveryFile {
    pub id: i64,
    pub project_id: i64,
    pub filename: String,
    pub url: String,
    pub file_type: FileCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDeliveryFile {
    pub filename: String,
    pub url: String,
    pub file_type: FileCategory,
}
