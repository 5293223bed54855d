//! The payment flow: order preparation, gateway confirmation and the ledger views.
//!
//! Confirmation never trusts anything the client echoes back beyond the two gateway identifiers and the
//! signature. The buyer, target and amount are re-derived from the [`GatewayOrder`] row stored when the order
//! was minted, and the signature check runs in constant time.

use chrono::{DateTime, Utc};
use log::*;
use ph_common::{Paise, Secret, INR_CURRENCY_CODE};
use serde::Serialize;

use crate::{
    db_types::{
        GatewayOrder,
        NewGatewayOrder,
        NewPayment,
        Payment,
        PaymentType,
        PaymentWithContext,
        PortfolioProject,
        ProjectStatus,
    },
    helpers::{instalment_amount, parse_catalog_price, verify_payment_signature},
    state::{apply, LifecycleView, ProjectEvent, StateChange},
    traits::{CatalogManagement, PaymentFlowError, PaymentLedger, ProjectManagement},
};

/// What a payment is for.
#[derive(Debug, Clone, Copy)]
pub enum OrderTarget {
    CustomProject(i64),
    CatalogItem(i64),
}

/// The validated amount and target for a gateway order, computed server-side before the order is minted.
#[derive(Debug, Clone)]
pub struct PreparedOrder {
    pub user_id: i64,
    pub amount: Paise,
    pub currency: String,
    pub payment_type: PaymentType,
    pub project_id: Option<i64>,
    pub portfolio_project_id: Option<i64>,
    pub portfolio_project_name: Option<String>,
}

/// The result of a confirmed payment. `replayed` is true when the confirmation had been processed before.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub replayed: bool,
}

/// The fields a receipt renders.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptData {
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount: Paise,
    pub payment_type: PaymentType,
    pub paid_by: String,
    pub project_name: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl From<PaymentWithContext> for ReceiptData {
    fn from(p: PaymentWithContext) -> Self {
        ReceiptData {
            gateway_payment_id: p.payment.gateway_payment_id,
            gateway_order_id: p.payment.gateway_order_id,
            amount: p.payment.amount,
            payment_type: p.payment.payment_type,
            paid_by: p.user_email,
            project_name: p.project_name,
            paid_at: p.payment.created_at,
        }
    }
}

pub struct PaymentFlowApi<B> {
    db: B,
    gateway_secret: Secret<String>,
    currency: String,
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B, gateway_secret: Secret<String>) -> Self {
        Self { db, gateway_secret, currency: INR_CURRENCY_CODE.to_string() }
    }

    /// Overrides the ISO currency code stamped on gateway orders. Defaults to INR.
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentLedger + ProjectManagement + CatalogManagement
{
    /// Works out what the caller owes for the given target and payment type. Everything is derived from stored
    /// rows; the client does not name an amount.
    pub async fn prepare_order(
        &self,
        user_id: i64,
        target: OrderTarget,
        payment_type: PaymentType,
    ) -> Result<PreparedOrder, PaymentFlowError> {
        match (target, payment_type) {
            (OrderTarget::CustomProject(project_id), PaymentType::Initial50) => {
                let project = self.owned_project(project_id, user_id).await?;
                if project.status != ProjectStatus::QuoteSent {
                    return Err(PaymentFlowError::InvalidTransition(
                        crate::state::InvalidTransition::InitialPaymentNotExpected(project.status),
                    ));
                }
                let quote = project.final_quote.ok_or(PaymentFlowError::NoQuote)?;
                Ok(self.project_order(user_id, project_id, PaymentType::Initial50, instalment_amount(quote)))
            },
            (OrderTarget::CustomProject(project_id), PaymentType::Final100) => {
                let project = self.owned_project(project_id, user_id).await?;
                if !matches!(project.status, ProjectStatus::InProgress | ProjectStatus::AwaitingFinalPayment) {
                    return Err(PaymentFlowError::InvalidTransition(
                        crate::state::InvalidTransition::FinalPaymentNotExpected(project.status),
                    ));
                }
                let quote = project.final_quote.ok_or(PaymentFlowError::NoQuote)?;
                // The balance picks up the extra rupee an odd quote leaves behind.
                let balance = Paise::from_rupees(quote) - instalment_amount(quote);
                Ok(self.project_order(user_id, project_id, PaymentType::Final100, balance))
            },
            (OrderTarget::CatalogItem(item_id), PaymentType::Prebuilt100) => {
                let item = self
                    .db
                    .fetch_portfolio_project(item_id)
                    .await
                    .map_err(PaymentFlowError::from)?
                    .ok_or(PaymentFlowError::ItemNotFound(item_id))?;
                let amount = parse_catalog_price(&item.price)?;
                Ok(PreparedOrder {
                    user_id,
                    amount,
                    currency: self.currency.clone(),
                    payment_type: PaymentType::Prebuilt100,
                    project_id: None,
                    portfolio_project_id: Some(item_id),
                    portfolio_project_name: Some(item.name),
                })
            },
            (OrderTarget::CustomProject(_), PaymentType::Prebuilt100) |
            (OrderTarget::CatalogItem(_), PaymentType::Initial50) |
            (OrderTarget::CatalogItem(_), PaymentType::Final100) => Err(PaymentFlowError::TargetMismatch),
        }
    }

    /// Stores the server-side record of an order the gateway has just minted. Confirmation later reads this row
    /// back as the source of truth.
    pub async fn record_order(
        &self,
        gateway_order_id: &str,
        prepared: PreparedOrder,
    ) -> Result<GatewayOrder, PaymentFlowError> {
        let order = NewGatewayOrder {
            order_id: gateway_order_id.to_string(),
            user_id: prepared.user_id,
            project_id: prepared.project_id,
            portfolio_project_id: prepared.portfolio_project_id,
            payment_type: prepared.payment_type,
            amount: prepared.amount,
            currency: prepared.currency,
        };
        let row = self.db.insert_gateway_order(order).await?;
        info!("🔄️ Gateway order {} minted for {} ({})", row.order_id, row.amount, row.payment_type);
        Ok(row)
    }

    /// Verifies a gateway confirmation and records the payment.
    ///
    /// The same routine serves both the custom-project and the catalog confirmation endpoints. When
    /// `expected_project` is given, the stored order must target that project; a mismatch is rejected before
    /// anything is written. Replays of an already processed confirmation succeed without side effects.
    pub async fn confirm_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
        expected_project: Option<i64>,
    ) -> Result<PaymentOutcome, PaymentFlowError> {
        if !verify_payment_signature(order_id, payment_id, signature, self.gateway_secret.reveal()) {
            warn!("🔄️ Signature verification failed for order {order_id}");
            return Err(PaymentFlowError::InvalidSignature);
        }
        let order = self
            .db
            .fetch_gateway_order(order_id)
            .await?
            .ok_or_else(|| PaymentFlowError::OrderNotFound(order_id.to_string()))?;
        // A replayed confirmation must succeed even though the project has already moved on, so the ledger
        // check comes before any lifecycle validation.
        if let Some(existing) = self.db.fetch_payment(payment_id).await? {
            info!("🔄️ Confirmation for payment {} replayed. No state was changed.", existing.gateway_payment_id);
            return Ok(PaymentOutcome { payment: existing, replayed: true });
        }
        if let Some(project_id) = expected_project {
            if order.project_id != Some(project_id) {
                warn!("🔄️ Order {order_id} does not target project #{project_id}. Rejecting confirmation.");
                return Err(PaymentFlowError::TargetMismatch);
            }
        }
        let project_update = self.project_update_for(&order).await?;
        let payment = NewPayment {
            gateway_payment_id: payment_id.to_string(),
            gateway_order_id: order.order_id.clone(),
            amount: order.amount,
            payment_type: order.payment_type,
            user_id: order.user_id,
            project_id: order.project_id,
            portfolio_project_id: order.portfolio_project_id,
            portfolio_project_name: self.portfolio_name_for(&order).await?,
        };
        let (payment, replayed) = self.db.record_verified_payment(payment, project_update).await?;
        if !replayed {
            info!("🔄️ Payment {} of {} confirmed and recorded", payment.gateway_payment_id, payment.amount);
        }
        Ok(PaymentOutcome { payment, replayed })
    }

    /// Receipt data for a single payment. Non-admin callers only see their own payments.
    pub async fn receipt(
        &self,
        gateway_payment_id: &str,
        requester_id: i64,
        is_admin: bool,
    ) -> Result<ReceiptData, PaymentFlowError> {
        let payment = self
            .db
            .fetch_payment_with_context(gateway_payment_id)
            .await?
            .ok_or_else(|| PaymentFlowError::PaymentNotFound(gateway_payment_id.to_string()))?;
        if !is_admin && payment.payment.user_id != requester_id {
            return Err(PaymentFlowError::AccessDenied);
        }
        Ok(payment.into())
    }

    pub async fn payments_for_user(&self, user_id: i64) -> Result<Vec<PaymentWithContext>, PaymentFlowError> {
        self.db.fetch_payments_for_user(user_id).await
    }

    pub async fn all_payments(&self) -> Result<Vec<PaymentWithContext>, PaymentFlowError> {
        self.db.fetch_all_payments().await
    }

    pub async fn purchases_for_user(&self, user_id: i64) -> Result<Vec<PortfolioProject>, PaymentFlowError> {
        self.db.fetch_purchases_for_user(user_id).await
    }

    async fn owned_project(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> Result<crate::db_types::Project, PaymentFlowError> {
        let project = self
            .db
            .fetch_project(project_id)
            .await
            .map_err(PaymentFlowError::from)?
            .ok_or(PaymentFlowError::ProjectNotFound(project_id))?;
        if project.user_id != user_id {
            return Err(PaymentFlowError::AccessDenied);
        }
        Ok(project)
    }

    fn project_order(
        &self,
        user_id: i64,
        project_id: i64,
        payment_type: PaymentType,
        amount: Paise,
    ) -> PreparedOrder {
        PreparedOrder {
            user_id,
            amount,
            currency: self.currency.clone(),
            payment_type,
            project_id: Some(project_id),
            portfolio_project_id: None,
            portfolio_project_name: None,
        }
    }

    /// The lifecycle change a confirmed payment entails, derived from the stored order. Catalog purchases have
    /// none.
    async fn project_update_for(&self, order: &GatewayOrder) -> Result<Option<(i64, StateChange)>, PaymentFlowError> {
        let event = match order.payment_type {
            PaymentType::Initial50 => ProjectEvent::InitialPaymentVerified,
            PaymentType::Final100 => ProjectEvent::FinalPaymentVerified,
            PaymentType::Prebuilt100 => return Ok(None),
        };
        let project_id = order.project_id.ok_or_else(|| {
            PaymentFlowError::DatabaseError(format!("Order {} has no project target", order.order_id))
        })?;
        let project = self
            .db
            .fetch_project(project_id)
            .await
            .map_err(PaymentFlowError::from)?
            .ok_or(PaymentFlowError::ProjectNotFound(project_id))?;
        let view = LifecycleView {
            status: project.status,
            payment_status: project.payment_status,
            final_quote: project.final_quote,
            completion_percentage: project.completion_percentage,
        };
        let change = apply(view, event)?;
        Ok(Some((project_id, change)))
    }

    async fn portfolio_name_for(&self, order: &GatewayOrder) -> Result<Option<String>, PaymentFlowError> {
        let Some(item_id) = order.portfolio_project_id else {
            return Ok(None);
        };
        let name = self
            .db
            .fetch_portfolio_project(item_id)
            .await
            .map_err(PaymentFlowError::from)?
            .map(|item| item.name);
        Ok(name)
    }
}
