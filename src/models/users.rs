use serde::{Deserialize, Serialize};
use sea_orm::entity::prelude::*;

use super::enums::Role;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,
    // Format: pbkdf2:sha256:iterations$salt$hash, NULL pour les comptes OAuth
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub balance: Decimal, // Solde en devise, jamais négatif
    pub points: i64,      // Points gagnés en consommant du contenu
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::profiles::Entity")]
    Profile,

    #[sea_orm(has_many = "super::accounts::Entity")]
    Account,

    #[sea_orm(has_many = "super::content::Entity")]
    Content,

    #[sea_orm(has_many = "super::products::Entity")]
    Product,

    #[sea_orm(has_many = "super::transactions::Entity")]
    Transaction,

    #[sea_orm(has_many = "super::product_purchases::Entity")]
    ProductPurchase,

    #[sea_orm(has_many = "super::withdrawals::Entity")]
    Withdrawal,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Content.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::product_purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductPurchase.def()
    }
}

impl Related<super::withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
