use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::error::AppError;
use crate::models::dto::AdminStats;
use crate::models::enums::{PurchaseStatus, Role, WithdrawalStatus};
use crate::models::{content, plans, product_purchases, products, users, withdrawals};

pub struct AdminService;

/// Champs d'un plan (création ou remplacement complet)
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_days: i32,
    pub priority: i32,
    pub is_active: bool,
}

impl AdminService {
    pub async fn list_users(
        db: &DatabaseConnection,
        role: Option<Role>,
    ) -> Result<Vec<users::Model>, DbErr> {
        let mut query = users::Entity::find();
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role));
        }
        query.order_by_asc(users::Column::Id).all(db).await
    }

    pub async fn set_role(
        db: &DatabaseConnection,
        admin_id: i32,
        user_id: i32,
        role: Role,
    ) -> Result<users::Model, AppError> {
        // Un admin ne peut pas se retirer ses propres droits
        if admin_id == user_id && role != Role::Admin {
            return Err(AppError::bad_request("You cannot change your own role"));
        }

        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let previous = user.role;
        let mut active: users::ActiveModel = user.into();
        active.role = Set(role);
        let updated = active.update(db).await?;

        tracing::info!(
            admin_id,
            user_id,
            from = previous.as_str(),
            to = role.as_str(),
            "role changed"
        );
        Ok(updated)
    }

    pub async fn stats(db: &DatabaseConnection) -> Result<AdminStats, DbErr> {
        let users_total = users::Entity::find().count(db).await?;
        let creators = users::Entity::find()
            .filter(users::Column::Role.eq(Role::Creator))
            .count(db)
            .await?;
        let streamers = users::Entity::find()
            .filter(users::Column::Role.eq(Role::Streamer))
            .count(db)
            .await?;
        let contents = content::Entity::find().count(db).await?;
        let products_total = products::Entity::find().count(db).await?;
        let purchases = product_purchases::Entity::find()
            .filter(product_purchases::Column::Status.eq(PurchaseStatus::Completed))
            .count(db)
            .await?;

        let revenue: Option<Decimal> = product_purchases::Entity::find()
            .select_only()
            .column_as(Expr::col(product_purchases::Column::Amount).sum(), "revenue")
            .filter(product_purchases::Column::Status.eq(PurchaseStatus::Completed))
            .into_tuple::<Option<Decimal>>()
            .one(db)
            .await?
            .flatten();

        let pending_withdrawals = withdrawals::Entity::find()
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .count(db)
            .await?;

        Ok(AdminStats {
            users: users_total,
            creators,
            streamers,
            contents,
            products: products_total,
            purchases,
            revenue: revenue.unwrap_or(Decimal::ZERO),
            pending_withdrawals,
        })
    }

    pub async fn create_plan(
        db: &DatabaseConnection,
        input: PlanInput,
    ) -> Result<plans::Model, AppError> {
        input.validate()?;
        Self::ensure_name_free(db, &input.name, None).await?;

        let plan = plans::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            duration_days: Set(input.duration_days),
            priority: Set(input.priority),
            is_active: Set(input.is_active),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(plan_id = plan.id, name = %plan.name, "plan created");
        Ok(plan)
    }

    /// Les contenus déjà promus gardent leur date de fin
    pub async fn update_plan(
        db: &DatabaseConnection,
        plan_id: i32,
        input: PlanInput,
    ) -> Result<plans::Model, AppError> {
        input.validate()?;

        let plan = plans::Entity::find_by_id(plan_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Plan not found"))?;

        if plan.name != input.name {
            Self::ensure_name_free(db, &input.name, Some(plan_id)).await?;
        }

        let mut active: plans::ActiveModel = plan.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.price = Set(input.price);
        active.duration_days = Set(input.duration_days);
        active.priority = Set(input.priority);
        active.is_active = Set(input.is_active);
        let updated = active.update(db).await?;

        tracing::info!(plan_id, "plan updated");
        Ok(updated)
    }

    async fn ensure_name_free(
        db: &DatabaseConnection,
        name: &str,
        except: Option<i32>,
    ) -> Result<(), AppError> {
        let mut query = plans::Entity::find().filter(plans::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(plans::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(AppError::conflict("A plan with this name already exists"));
        }
        Ok(())
    }
}

impl PlanInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::bad_request("Plan name is required"));
        }
        if self.price <= Decimal::ZERO {
            return Err(AppError::bad_request("Plan price must be greater than 0"));
        }
        if self.duration_days <= 0 {
            return Err(AppError::bad_request("duration_days must be greater than 0"));
        }
        if self.priority < 0 {
            return Err(AppError::bad_request("priority must not be negative"));
        }
        Ok(())
    }
}
