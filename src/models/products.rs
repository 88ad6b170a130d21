use serde::{Deserialize, Serialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub creator_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(skip_serializing)]
    pub file_path: String,
    pub file_name: String, // Nom d'origine, renvoyé dans Content-Disposition
    pub mime_type: String,
    pub file_size: i64,
    pub purchase_count: i32,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatorId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,

    #[sea_orm(has_many = "super::product_purchases::Entity")]
    ProductPurchase,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::product_purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductPurchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
