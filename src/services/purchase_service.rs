use sea_orm::*;
use sea_orm::sea_query::Expr;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::enums::{PurchaseStatus, Role, TransactionKind, TransactionStatus};
use crate::models::{product_purchases, products, users};
use crate::services::wallet_service::{NewTransaction, WalletService};

pub struct PurchaseService;

impl PurchaseService {
    /// Achat d'un produit avec le solde du compte.
    ///
    /// 1. Refuse si un achat COMPLETED existe déjà pour (user, produit)
    /// 2. Vérifie le solde
    /// 3. Dans une transaction DB: débit, ledger, achat, compteur du produit
    pub async fn purchase_product(
        db: &DatabaseConnection,
        user_id: i32,
        product_id: i32,
        currency: &str,
    ) -> Result<product_purchases::Model, AppError> {
        if Self::find_completed(db, user_id, product_id).await?.is_some() {
            return Err(AppError::conflict("Product already purchased"));
        }

        let product = Self::find_active_product(db, product_id).await?;

        if product.creator_id == user_id {
            return Err(AppError::bad_request("You cannot purchase your own product"));
        }

        let buyer = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        WalletService::ensure_funds(&buyer, product.price)?;

        // Le drop de `txn` sans commit annule tout en cas d'erreur
        let txn = db.begin().await?;

        WalletService::debit_balance(&txn, &buyer, product.price).await?;

        let ledger = WalletService::record_transaction(
            &txn,
            NewTransaction {
                user_id,
                kind: TransactionKind::Purchase,
                amount: -product.price,
                currency,
                status: TransactionStatus::Completed,
                provider: None,
                product_id: Some(product.id),
                description: Some(format!("Purchase of \"{}\"", product.title)),
            },
        )
        .await?;

        let purchase = Self::record_purchase(&txn, user_id, &product, ledger.id).await?;

        txn.commit().await?;

        tracing::info!(
            user_id,
            product_id = product.id,
            purchase_id = purchase.id,
            price = %product.price,
            "product purchased with balance"
        );

        Ok(purchase)
    }

    /// Insère l'achat et incrémente le compteur du produit.
    /// Utilisé par l'achat au solde et par la capture PayPal.
    pub async fn record_purchase<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        product: &products::Model,
        transaction_id: i32,
    ) -> Result<product_purchases::Model, DbErr> {
        let purchase = product_purchases::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product.id),
            transaction_id: Set(transaction_id),
            amount: Set(product.price),
            status: Set(PurchaseStatus::Completed),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        products::Entity::update_many()
            .col_expr(
                products::Column::PurchaseCount,
                Expr::col(products::Column::PurchaseCount).add(1),
            )
            .filter(products::Column::Id.eq(product.id))
            .exec(conn)
            .await?;

        Ok(purchase)
    }

    pub async fn find_completed<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<product_purchases::Model>, DbErr> {
        product_purchases::Entity::find()
            .filter(product_purchases::Column::UserId.eq(user_id))
            .filter(product_purchases::Column::ProductId.eq(product_id))
            .filter(product_purchases::Column::Status.eq(PurchaseStatus::Completed))
            .one(conn)
            .await
    }

    pub async fn find_active_product<C: ConnectionTrait>(
        conn: &C,
        product_id: i32,
    ) -> Result<products::Model, AppError> {
        products::Entity::find_by_id(product_id)
            .one(conn)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::not_found("Product not found"))
    }

    /// Téléchargement autorisé pour l'acheteur, le créateur ou un ADMIN
    pub async fn can_download(
        db: &DatabaseConnection,
        user: &AuthUser,
        product: &products::Model,
    ) -> Result<bool, DbErr> {
        if user.role == Role::Admin || product.creator_id == user.user_id {
            return Ok(true);
        }
        Ok(Self::find_completed(db, user.user_id, product.id).await?.is_some())
    }

    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<(product_purchases::Model, Option<products::Model>)>, DbErr> {
        product_purchases::Entity::find()
            .filter(product_purchases::Column::UserId.eq(user_id))
            .find_also_related(products::Entity)
            .order_by_desc(product_purchases::Column::CreatedAt)
            .all(db)
            .await
    }
}
