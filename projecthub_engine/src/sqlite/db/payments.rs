use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{
        GatewayOrder,
        NewGatewayOrder,
        NewPayment,
        Payment,
        PaymentStatus,
        PaymentType,
        PaymentWithContext,
        PortfolioProject,
    },
    traits::PaymentFlowError,
};

pub async fn insert_gateway_order(
    order: NewGatewayOrder,
    conn: &mut SqliteConnection,
) -> Result<GatewayOrder, PaymentFlowError> {
    let row = sqlx::query_as::<_, GatewayOrder>(
        r#"INSERT INTO gateway_orders (order_id, user_id, project_id, portfolio_project_id, payment_type, amount, currency)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *"#,
    )
    .bind(&order.order_id)
    .bind(order.user_id)
    .bind(order.project_id)
    .bind(order.portfolio_project_id)
    .bind(order.payment_type)
    .bind(order.amount)
    .bind(&order.currency)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Gateway order {} recorded for {} ({})", row.order_id, row.amount, row.payment_type);
    Ok(row)
}

pub async fn gateway_order_by_order_id(
    order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<GatewayOrder>, PaymentFlowError> {
    let row = sqlx::query_as::<_, GatewayOrder>("SELECT * FROM gateway_orders WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn payment_by_gateway_id(
    gateway_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, PaymentFlowError> {
    let row = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE gateway_payment_id = $1")
        .bind(gateway_payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Inserts a verified payment, unless a row for this gateway payment id already exists. Returns the stored row
/// and whether this call was a replay. The UNIQUE index on `gateway_payment_id` backstops the check against
/// concurrent confirmations.
pub async fn idempotent_insert(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<(Payment, bool), PaymentFlowError> {
    if let Some(existing) = payment_by_gateway_id(&payment.gateway_payment_id, conn).await? {
        debug!("📝️ Payment {} has already been recorded. Nothing further to do.", existing.gateway_payment_id);
        return Ok((existing, true));
    }
    let result = sqlx::query_as::<_, Payment>(
        r#"INSERT INTO payments (
            gateway_payment_id, gateway_order_id, amount, payment_type, status, user_id,
            project_id, portfolio_project_id, portfolio_project_name
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *"#,
    )
    .bind(&payment.gateway_payment_id)
    .bind(&payment.gateway_order_id)
    .bind(payment.amount)
    .bind(payment.payment_type)
    .bind(PaymentStatus::Success)
    .bind(payment.user_id)
    .bind(payment.project_id)
    .bind(payment.portfolio_project_id)
    .bind(&payment.portfolio_project_name)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(row) => {
            debug!("📝️ Payment {} of {} recorded in the ledger", row.gateway_payment_id, row.amount);
            Ok((row, false))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let existing = payment_by_gateway_id(&payment.gateway_payment_id, conn)
                .await?
                .ok_or_else(|| PaymentFlowError::DatabaseError("Duplicate payment row has vanished".to_string()))?;
            Ok((existing, true))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn payments_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentWithContext>, PaymentFlowError> {
    let rows = sqlx::query_as::<_, PaymentWithContext>(
        r#"SELECT payments.*, users.email AS user_email,
            COALESCE(projects.project_name, payments.portfolio_project_name) AS project_name
        FROM payments
        INNER JOIN users ON payments.user_id = users.id
        LEFT JOIN projects ON payments.project_id = projects.id
        WHERE payments.user_id = $1
        ORDER BY payments.created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn payments_for_project(
    project_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, PaymentFlowError> {
    let rows = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE project_id = $1 ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn all_payments(conn: &mut SqliteConnection) -> Result<Vec<PaymentWithContext>, PaymentFlowError> {
    let rows = sqlx::query_as::<_, PaymentWithContext>(
        r#"SELECT payments.*, users.email AS user_email,
            COALESCE(projects.project_name, payments.portfolio_project_name) AS project_name
        FROM payments
        INNER JOIN users ON payments.user_id = users.id
        LEFT JOIN projects ON payments.project_id = projects.id
        ORDER BY payments.created_at DESC"#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn payment_with_context(
    gateway_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentWithContext>, PaymentFlowError> {
    let row = sqlx::query_as::<_, PaymentWithContext>(
        r#"SELECT payments.*, users.email AS user_email,
            COALESCE(projects.project_name, payments.portfolio_project_name) AS project_name
        FROM payments
        INNER JOIN users ON payments.user_id = users.id
        LEFT JOIN projects ON payments.project_id = projects.id
        WHERE payments.gateway_payment_id = $1"#,
    )
    .bind(gateway_payment_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn purchases_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PortfolioProject>, PaymentFlowError> {
    let rows = sqlx::query_as::<_, PortfolioProject>(
        r#"SELECT DISTINCT portfolio_projects.*
        FROM portfolio_projects
        INNER JOIN payments ON payments.portfolio_project_id = portfolio_projects.id
        WHERE payments.user_id = $1 AND payments.payment_type = $2 AND payments.status = $3"#,
    )
    .bind(user_id)
    .bind(PaymentType::Prebuilt100)
    .bind(PaymentStatus::Success)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
