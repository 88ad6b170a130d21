use serde::{Deserialize, Serialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub creator_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub content_type: String, // Type MIME du fichier uploadé
    #[serde(skip_serializing)] // Chemin disque, jamais exposé
    pub file_path: String,
    pub file_size: i64,
    pub points_reward: i64, // Points gagnés par un streamer à la première vue
    pub views: i64,

    // Promotion (plan acheté par le créateur)
    pub plan_id: Option<i32>,
    pub priority: i32,
    pub promoted_until: Option<DateTimeUtc>,

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

    #[sea_orm(
        belongs_to = "super::plans::Entity",
        from = "Column::PlanId",
        to = "super::plans::Column::Id"
    )]
    Plan,

    #[sea_orm(has_many = "super::content_views::Entity")]
    ContentView,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl Related<super::content_views::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentView.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
