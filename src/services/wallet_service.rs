use sea_orm::*;
use sea_orm::sea_query::Expr;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::AppError;
use crate::models::enums::{TransactionKind, TransactionStatus, WithdrawalStatus};
use crate::models::{transactions, users, withdrawals};

pub struct WalletService;

/// Vue d'ensemble du portefeuille d'un utilisateur
#[derive(Debug, Clone, Serialize)]
pub struct WalletSummary {
    pub currency: String,
    pub balance: Decimal,
    pub points: i64,
    pub points_value: Decimal,      // Valeur des points convertis
    pub pending_withdrawals: Decimal,
}

/// Convertit des points en montant (arrondi à l'inférieur au centime)
pub fn points_to_cash(points: i64, points_per_dollar: i64) -> Decimal {
    if points <= 0 || points_per_dollar <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(points) / Decimal::from(points_per_dollar))
        .round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

impl WalletService {
    pub async fn summary(
        db: &DatabaseConnection,
        user_id: i32,
        currency: &str,
        points_per_dollar: i64,
    ) -> Result<WalletSummary, AppError> {
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let pending = withdrawals::Entity::find()
            .filter(withdrawals::Column::UserId.eq(user_id))
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .all(db)
            .await?;

        let pending_withdrawals = pending.iter().map(|w| w.amount).sum();

        Ok(WalletSummary {
            currency: currency.to_string(),
            balance: user.balance,
            points: user.points,
            points_value: points_to_cash(user.points, points_per_dollar),
            pending_withdrawals,
        })
    }

    /// Historique du ledger, plus récent d'abord
    pub async fn history(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .all(db)
            .await
    }

    /// Vérifie le solde avant un débit
    pub fn ensure_funds(user: &users::Model, required: Decimal) -> Result<(), AppError> {
        if user.balance < required {
            tracing::warn!(
                user_id = user.id,
                available = %user.balance,
                required = %required,
                "insufficient balance"
            );
            return Err(AppError::InsufficientBalance {
                available: user.balance,
                required,
            });
        }
        Ok(())
    }

    /// Débite le solde seulement s'il reste suffisant (UPDATE ... WHERE balance >= amount).
    /// À appeler dans la transaction DB du flux appelant.
    pub async fn debit_balance<C: ConnectionTrait>(
        conn: &C,
        user: &users::Model,
        amount: Decimal,
    ) -> Result<(), AppError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Balance, Expr::col(users::Column::Balance).sub(amount))
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::Balance.gte(amount))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::InsufficientBalance {
                available: user.balance,
                required: amount,
            });
        }
        Ok(())
    }

    pub async fn credit_balance<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        amount: Decimal,
    ) -> Result<(), DbErr> {
        users::Entity::update_many()
            .col_expr(users::Column::Balance, Expr::col(users::Column::Balance).add(amount))
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;
        Ok(())
    }

    pub async fn debit_points<C: ConnectionTrait>(
        conn: &C,
        user: &users::Model,
        points: i64,
    ) -> Result<(), AppError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Points, Expr::col(users::Column::Points).sub(points))
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::Points.gte(points))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::InsufficientPoints {
                available: user.points,
                required: points,
            });
        }
        Ok(())
    }

    pub async fn credit_points<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        points: i64,
    ) -> Result<(), DbErr> {
        users::Entity::update_many()
            .col_expr(users::Column::Points, Expr::col(users::Column::Points).add(points))
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Ajoute une ligne au ledger
    pub async fn record_transaction<C: ConnectionTrait>(
        conn: &C,
        entry: NewTransaction<'_>,
    ) -> Result<transactions::Model, DbErr> {
        let now = chrono::Utc::now();

        transactions::ActiveModel {
            user_id: Set(entry.user_id),
            kind: Set(entry.kind),
            amount: Set(entry.amount),
            currency: Set(entry.currency.to_string()),
            status: Set(entry.status),
            provider: Set(entry.provider.map(str::to_string)),
            payment_id: Set(None),
            product_id: Set(entry.product_id),
            description: Set(entry.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
    }

    /// Passe une ligne PENDING à son statut final (UPDATE ... WHERE status = 'PENDING').
    /// 409 si une autre requête l'a déjà fait.
    pub async fn settle_transaction<C: ConnectionTrait>(
        conn: &C,
        transaction_id: i32,
        status: TransactionStatus,
    ) -> Result<(), AppError> {
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::Status, Expr::value(status))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(transactions::Column::Id.eq(transaction_id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending))
            .exec(conn)
            .await?;

        if result.rows_affected != 1 {
            tracing::warn!(transaction_id, status = ?status, "transaction already settled");
            return Err(AppError::conflict("Transaction already processed"));
        }
        Ok(())
    }
}

/// Données d'une nouvelle ligne de ledger
pub struct NewTransaction<'a> {
    pub user_id: i32,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: &'a str,
    pub status: TransactionStatus,
    pub provider: Option<&'a str>,
    pub product_id: Option<i32>,
    pub description: Option<String>,
}
