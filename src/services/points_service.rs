use sea_orm::*;
use sea_orm::sea_query::Expr;
use serde::Serialize;

use crate::error::AppError;
use crate::models::enums::{TransactionKind, TransactionStatus, WithdrawalStatus};
use crate::models::{content, content_views, users, withdrawals};
use crate::services::wallet_service::{NewTransaction, WalletService, points_to_cash};

pub struct PointsService;

/// Règles de conversion des points (lues depuis AppConfig)
#[derive(Debug, Clone)]
pub struct PointsPolicy {
    pub points_per_dollar: i64,
    pub min_withdrawal_points: i64,
}

#[derive(Debug, Serialize)]
pub struct ViewOutcome {
    pub content_id: i32,
    pub views: i64,
    pub points_awarded: i64,
    pub first_view: bool,
}

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub points: i64,
    pub method: String,
    pub destination: String,
}

impl PointsPolicy {
    /// Vérifie le seuil et calcule le montant versé
    pub fn quote(&self, points: i64) -> Result<rust_decimal::Decimal, AppError> {
        if points < self.min_withdrawal_points {
            return Err(AppError::bad_request(format!(
                "Minimum withdrawal is {} points",
                self.min_withdrawal_points
            )));
        }
        let amount = points_to_cash(points, self.points_per_dollar);
        if amount <= rust_decimal::Decimal::ZERO {
            return Err(AppError::bad_request("Withdrawal amount is too small"));
        }
        Ok(amount)
    }
}

impl PointsService {
    /// Enregistre une vue. Les points ne sont attribués qu'à la première vue
    /// d'un contenu par un utilisateur, jamais au créateur lui-même.
    pub async fn record_view(
        db: &DatabaseConnection,
        user_id: i32,
        content_id: i32,
    ) -> Result<ViewOutcome, AppError> {
        let item = content::Entity::find_by_id(content_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Content not found"))?;

        let previous = content_views::Entity::find()
            .filter(content_views::Column::UserId.eq(user_id))
            .filter(content_views::Column::ContentId.eq(content_id))
            .one(db)
            .await?;

        let txn = db.begin().await?;

        content::Entity::update_many()
            .col_expr(content::Column::Views, Expr::col(content::Column::Views).add(1))
            .filter(content::Column::Id.eq(content_id))
            .exec(&txn)
            .await?;

        let first_view = previous.is_none();
        let mut points_awarded = 0;

        if first_view {
            if item.creator_id != user_id {
                points_awarded = item.points_reward.max(0);
            }

            content_views::ActiveModel {
                user_id: Set(user_id),
                content_id: Set(content_id),
                points_awarded: Set(points_awarded),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            if points_awarded > 0 {
                WalletService::credit_points(&txn, user_id, points_awarded).await?;
            }
        }

        txn.commit().await?;

        if points_awarded > 0 {
            tracing::info!(user_id, content_id, points_awarded, "points awarded for view");
        }

        Ok(ViewOutcome {
            content_id,
            views: item.views + 1,
            points_awarded,
            first_view,
        })
    }

    /// Demande de retrait: débit des points, ligne PAYOUT PENDING, withdrawal PENDING
    pub async fn request_withdrawal(
        db: &DatabaseConnection,
        policy: &PointsPolicy,
        currency: &str,
        user_id: i32,
        request: WithdrawalRequest,
    ) -> Result<withdrawals::Model, AppError> {
        let amount = policy.quote(request.points)?;

        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if user.points < request.points {
            return Err(AppError::InsufficientPoints {
                available: user.points,
                required: request.points,
            });
        }

        let txn = db.begin().await?;

        WalletService::debit_points(&txn, &user, request.points).await?;

        let ledger = WalletService::record_transaction(
            &txn,
            NewTransaction {
                user_id,
                kind: TransactionKind::Payout,
                amount,
                currency,
                status: TransactionStatus::Pending,
                provider: Some(request.method.as_str()),
                product_id: None,
                description: Some(format!("Withdrawal of {} points", request.points)),
            },
        )
        .await?;

        let withdrawal = withdrawals::ActiveModel {
            user_id: Set(user_id),
            points: Set(request.points),
            amount: Set(amount),
            method: Set(request.method),
            destination: Set(request.destination),
            status: Set(WithdrawalStatus::Pending),
            transaction_id: Set(ledger.id),
            created_at: Set(chrono::Utc::now()),
            processed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(
            user_id,
            withdrawal_id = withdrawal.id,
            points = withdrawal.points,
            amount = %withdrawal.amount,
            "withdrawal requested"
        );

        Ok(withdrawal)
    }

    /// Validation (COMPLETED) ou refus (REJECTED, points rendus) par un ADMIN
    pub async fn review_withdrawal(
        db: &DatabaseConnection,
        withdrawal_id: i32,
        approve: bool,
    ) -> Result<withdrawals::Model, AppError> {
        let withdrawal = withdrawals::Entity::find_by_id(withdrawal_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Withdrawal not found"))?;

        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(AppError::conflict("Withdrawal already processed"));
        }

        let (status, ledger_status) = if approve {
            (WithdrawalStatus::Completed, TransactionStatus::Completed)
        } else {
            (WithdrawalStatus::Rejected, TransactionStatus::Failed)
        };

        let now = chrono::Utc::now();
        let txn = db.begin().await?;

        // Deux ADMIN sur la même demande: seul le premier UPDATE touche la ligne
        let result = withdrawals::Entity::update_many()
            .col_expr(withdrawals::Column::Status, Expr::value(status))
            .col_expr(withdrawals::Column::ProcessedAt, Expr::value(now))
            .filter(withdrawals::Column::Id.eq(withdrawal_id))
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected != 1 {
            return Err(AppError::conflict("Withdrawal already processed"));
        }

        WalletService::settle_transaction(&txn, withdrawal.transaction_id, ledger_status).await?;

        if !approve {
            WalletService::credit_points(&txn, withdrawal.user_id, withdrawal.points).await?;
        }

        txn.commit().await?;

        tracing::info!(withdrawal_id, approve, "withdrawal reviewed");

        Ok(withdrawals::Model {
            status,
            processed_at: Some(now),
            ..withdrawal
        })
    }

    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<withdrawals::Model>, DbErr> {
        withdrawals::Entity::find()
            .filter(withdrawals::Column::UserId.eq(user_id))
            .order_by_desc(withdrawals::Column::CreatedAt)
            .all(db)
            .await
    }

    pub async fn list_by_status(
        db: &DatabaseConnection,
        status: Option<WithdrawalStatus>,
    ) -> Result<Vec<withdrawals::Model>, DbErr> {
        let mut query = withdrawals::Entity::find();
        if let Some(status) = status {
            query = query.filter(withdrawals::Column::Status.eq(status));
        }
        query
            .order_by_asc(withdrawals::Column::CreatedAt)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn policy() -> PointsPolicy {
        PointsPolicy {
            points_per_dollar: 100,
            min_withdrawal_points: 1000,
        }
    }

    #[test]
    fn test_quote_below_threshold() {
        assert!(matches!(policy().quote(999), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_quote_converts_points() {
        assert_eq!(policy().quote(1000).unwrap(), Decimal::new(10, 0));
        assert_eq!(policy().quote(2345).unwrap(), Decimal::new(2345, 2));
    }
}
