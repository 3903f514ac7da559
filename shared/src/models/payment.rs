//! Payment Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

text_enum! {
    pub enum PaymentMethod {
        Cash => "cash",
        Card => "card",
        Upi => "upi",
        Online => "online",
    }
}

text_enum! {
    /// What a payment settled
    pub enum PaymentKind {
        Order => "order",
        Subscription => "subscription",
    }
}

/// Payment record (order settlement or subscription charge)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub kind: PaymentKind,
    pub order_id: Option<i64>,
    pub subscription_id: Option<i64>,
    pub method: PaymentMethod,
    pub amount: Decimal,
    /// Gateway payment id or till receipt number
    pub reference: Option<String>,
    pub recorded_by: Option<i64>,
    pub created_at: i64,
}

/// Record order payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPayment {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<String>,
}

/// Payment list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentQuery {
    pub kind: Option<PaymentKind>,
}

/// The amount must settle the order exactly. A zero-total order is settled
/// by a zero payment.
pub fn check_amount(amount: Decimal, outstanding: Decimal) -> AppResult<()> {
    if amount.is_zero() && outstanding.is_zero() {
        return Ok(());
    }
    if amount <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "Payment amount must be positive",
        ));
    }
    if amount < outstanding {
        return Err(AppError::with_message(
            ErrorCode::PaymentInsufficientAmount,
            format!("Payment of {amount} is less than the outstanding {outstanding}"),
        )
        .with_detail("outstanding", outstanding.to_string()));
    }
    if amount > outstanding {
        return Err(AppError::with_message(
            ErrorCode::PaymentAmountExceeds,
            format!("Payment of {amount} exceeds the outstanding {outstanding}"),
        )
        .with_detail("outstanding", outstanding.to_string()));
    }
    Ok(())
}
