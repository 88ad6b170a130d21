// Flux de commande PayPal en deux étapes:
//   1. create_order: ligne PENDING dans transactions, commande chez PayPal, payment_id stocké
//   2. capture_order: capture chez PayPal, puis COMPLETED (crédit ou achat) ou FAILED

use rust_decimal::Decimal;
use sea_orm::*;
use serde::Serialize;

use crate::error::AppError;
use crate::models::enums::{TransactionKind, TransactionStatus};
use crate::models::{product_purchases, products, transactions};
use crate::services::paypal::PaymentGateway;
use crate::services::purchase_service::PurchaseService;
use crate::services::wallet_service::{NewTransaction, WalletService};

pub const PROVIDER_PAYPAL: &str = "PAYPAL";

/// Montant maximum d'une recharge de solde
pub const MAX_DEPOSIT: i64 = 10_000;

pub struct PaymentService;

/// Ce que l'utilisateur paie: un produit précis ou une recharge libre
#[derive(Debug, Clone)]
pub enum OrderTarget {
    Product(i32),
    Deposit(Decimal),
}

#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub transaction_id: i32,
    pub order_id: String,
    pub approve_url: Option<String>,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct CapturedOrder {
    pub transaction: transactions::Model,
    pub purchase: Option<product_purchases::Model>,
}

impl PaymentService {
    pub async fn create_order(
        db: &DatabaseConnection,
        gateway: &dyn PaymentGateway,
        user_id: i32,
        currency: &str,
        target: OrderTarget,
    ) -> Result<CreatedOrder, AppError> {
        let (kind, amount, product_id, description) = match target {
            OrderTarget::Product(product_id) => {
                if PurchaseService::find_completed(db, user_id, product_id).await?.is_some() {
                    return Err(AppError::conflict("Product already purchased"));
                }
                let product = PurchaseService::find_active_product(db, product_id).await?;
                if product.creator_id == user_id {
                    return Err(AppError::bad_request("You cannot purchase your own product"));
                }
                (
                    TransactionKind::Purchase,
                    product.price,
                    Some(product.id),
                    format!("PayPal purchase of \"{}\"", product.title),
                )
            }
            OrderTarget::Deposit(amount) => {
                validate_deposit(amount)?;
                (TransactionKind::Deposit, amount, None, "PayPal deposit".to_string())
            }
        };

        let pending = WalletService::record_transaction(
            db,
            NewTransaction {
                user_id,
                kind,
                amount,
                currency,
                status: TransactionStatus::Pending,
                provider: Some(PROVIDER_PAYPAL),
                product_id,
                description: Some(description),
            },
        )
        .await?;

        let order = match gateway
            .create_order(amount, currency, &format!("TX-{}", pending.id))
            .await
        {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    transaction_id = pending.id,
                    error = %e,
                    "paypal create order failed"
                );
                WalletService::settle_transaction(db, pending.id, TransactionStatus::Failed).await?;
                return Err(AppError::Gateway(e));
            }
        };

        let transaction_id = pending.id;
        let mut active: transactions::ActiveModel = pending.into();
        active.payment_id = Set(Some(order.order_id.clone()));
        active.updated_at = Set(chrono::Utc::now());
        active.update(db).await?;

        tracing::info!(
            transaction_id,
            order_id = %order.order_id,
            amount = %amount,
            "paypal order created"
        );

        Ok(CreatedOrder {
            transaction_id,
            order_id: order.order_id,
            approve_url: order.approve_url,
            amount,
            currency: currency.to_string(),
        })
    }

    pub async fn capture_order(
        db: &DatabaseConnection,
        gateway: &dyn PaymentGateway,
        user_id: i32,
        order_id: &str,
    ) -> Result<CapturedOrder, AppError> {
        let pending = transactions::Entity::find()
            .filter(transactions::Column::PaymentId.eq(order_id))
            .filter(transactions::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        match pending.status {
            TransactionStatus::Completed => {
                return Ok(CapturedOrder {
                    transaction: pending,
                    purchase: None,
                });
            }
            TransactionStatus::Failed => {
                return Err(AppError::bad_request("Order has already failed"));
            }
            TransactionStatus::Pending => {}
        }

        let capture = match gateway.capture_order(order_id).await {
            Ok(capture) => capture,
            Err(e) => {
                tracing::error!(transaction_id = pending.id, error = %e, "paypal capture failed");
                WalletService::settle_transaction(db, pending.id, TransactionStatus::Failed).await?;
                return Err(AppError::Gateway(e));
            }
        };

        if !capture.is_completed() {
            tracing::warn!(
                transaction_id = pending.id,
                status = %capture.status,
                "paypal capture not completed"
            );
            WalletService::settle_transaction(db, pending.id, TransactionStatus::Failed).await?;
            return Err(AppError::PaymentDeclined(capture.status));
        }

        let txn = db.begin().await?;

        // Une capture concurrente a déjà réglé la ligne: rollback, rien n'est crédité
        WalletService::settle_transaction(&txn, pending.id, TransactionStatus::Completed).await?;
        let completed = transactions::Model {
            status: TransactionStatus::Completed,
            updated_at: chrono::Utc::now(),
            ..pending
        };

        let purchase = match (completed.kind, completed.product_id) {
            (TransactionKind::Purchase, Some(product_id)) => {
                Self::fulfil_product(&txn, &completed, product_id).await?
            }
            _ => {
                WalletService::credit_balance(&txn, user_id, completed.amount).await?;
                None
            }
        };

        txn.commit().await?;

        tracing::info!(
            transaction_id = completed.id,
            order_id,
            amount = %completed.amount,
            "paypal order captured"
        );

        Ok(CapturedOrder {
            transaction: completed,
            purchase,
        })
    }

    /// Crée l'achat payé par PayPal. Si un achat existe déjà (payé au solde entre
    /// la création et la capture), le montant est crédité sur le solde.
    async fn fulfil_product(
        txn: &DatabaseTransaction,
        paid: &transactions::Model,
        product_id: i32,
    ) -> Result<Option<product_purchases::Model>, AppError> {
        if PurchaseService::find_completed(txn, paid.user_id, product_id).await?.is_some() {
            tracing::warn!(
                transaction_id = paid.id,
                product_id,
                "product already owned, crediting balance instead"
            );
            WalletService::credit_balance(txn, paid.user_id, paid.amount).await?;
            return Ok(None);
        }

        let product = products::Entity::find_by_id(product_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;
        let purchase =
            PurchaseService::record_purchase(txn, paid.user_id, &product, paid.id).await?;
        Ok(Some(purchase))
    }
}

pub fn validate_deposit(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::bad_request("Amount must be greater than 0"));
    }
    if amount > Decimal::from(MAX_DEPOSIT) {
        return Err(AppError::bad_request(format!(
            "Amount must not exceed {}",
            MAX_DEPOSIT
        )));
    }
    if amount.scale() > 2 && amount != amount.round_dp(2) {
        return Err(AppError::bad_request("Amount must have at most 2 decimals"));
    }
    Ok(())
}
