use chrono::{DateTime, Duration, Utc};
use sea_orm::*;
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::enums::{TransactionKind, TransactionStatus};
use crate::models::{content, plans, transactions, users};
use crate::services::wallet_service::{NewTransaction, WalletService};

pub struct PromotionService;

#[derive(Debug, Serialize)]
pub struct PromotionOutcome {
    pub content: content::Model,
    pub transaction: transactions::Model,
}

impl PromotionService {
    /// Plans actifs visibles par tous, du plus prioritaire au moins prioritaire
    pub async fn active_plans(db: &DatabaseConnection) -> Result<Vec<plans::Model>, DbErr> {
        plans::Entity::find()
            .filter(plans::Column::IsActive.eq(true))
            .order_by_desc(plans::Column::Priority)
            .order_by_asc(plans::Column::Price)
            .all(db)
            .await
    }

    /// Achat d'un plan pour mettre un contenu en avant.
    /// Si une promotion est encore active, la nouvelle durée s'ajoute à la fin.
    pub async fn promote_content(
        db: &DatabaseConnection,
        user: &AuthUser,
        content_id: i32,
        plan_id: i32,
        currency: &str,
    ) -> Result<PromotionOutcome, AppError> {
        let item = content::Entity::find_by_id(content_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Content not found"))?;

        user.require_owner(item.creator_id)?;

        let plan = plans::Entity::find_by_id(plan_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Plan not found"))?;

        if !plan.is_active {
            return Err(AppError::bad_request("Plan is not available"));
        }

        let payer = users::Entity::find_by_id(user.user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        WalletService::ensure_funds(&payer, plan.price)?;

        let promoted_until = promotion_end(item.promoted_until, Utc::now(), plan.duration_days);

        let txn = db.begin().await?;

        WalletService::debit_balance(&txn, &payer, plan.price).await?;

        let ledger = WalletService::record_transaction(
            &txn,
            NewTransaction {
                user_id: payer.id,
                kind: TransactionKind::Promotion,
                amount: -plan.price,
                currency,
                status: TransactionStatus::Completed,
                provider: None,
                product_id: None,
                description: Some(format!("Plan \"{}\" for content #{}", plan.name, content_id)),
            },
        )
        .await?;

        let mut active: content::ActiveModel = item.into();
        active.plan_id = Set(Some(plan.id));
        active.priority = Set(plan.priority);
        active.promoted_until = Set(Some(promoted_until));
        let promoted = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            user_id = payer.id,
            content_id,
            plan_id = plan.id,
            until = %promoted_until,
            "content promoted"
        );

        Ok(PromotionOutcome {
            content: promoted,
            transaction: ledger,
        })
    }
}

/// Fin de la nouvelle promotion: prolonge celle encore active, sinon part de maintenant
pub fn promotion_end(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration_days: i32,
) -> DateTime<Utc> {
    let start = match current {
        Some(until) if until > now => until,
        _ => now,
    };
    start + Duration::days(i64::from(duration_days))
}
