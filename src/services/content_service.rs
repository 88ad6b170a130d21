use std::path::Path;

use chrono::Utc;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::*;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::content;
use crate::models::dto::{PageQuery, PageResponse};
use crate::services::upload_service::{self, UploadForm, UploadKind};

pub struct ContentService;

impl ContentService {
    /// Liste paginée. Les contenus promus (promotion encore active) passent
    /// d'abord, par priorité du plan, puis les plus récents.
    pub async fn list(
        db: &DatabaseConnection,
        query: &PageQuery,
    ) -> Result<PageResponse<content::Model>, DbErr> {
        let mut select = content::Entity::find();
        if let Some(creator_id) = query.creator_id {
            select = select.filter(content::Column::CreatorId.eq(creator_id));
        }

        let paginator = select
            .order_by(active_priority(), Order::Desc)
            .order_by_desc(content::Column::CreatedAt)
            .order_by_desc(content::Column::Id)
            .paginate(db, query.per_page());

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page() - 1).await?;

        Ok(PageResponse {
            items,
            page: query.page(),
            per_page: query.per_page(),
            total,
        })
    }

    pub async fn get(db: &DatabaseConnection, content_id: i32) -> Result<content::Model, AppError> {
        content::Entity::find_by_id(content_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Content not found"))
    }

    /// Enregistre le fichier puis la ligne en BD. Si l'insert échoue,
    /// le fichier écrit est supprimé.
    pub async fn create(
        db: &DatabaseConnection,
        creator_id: i32,
        upload_dir: &Path,
        form: UploadForm,
    ) -> Result<content::Model, AppError> {
        let title = form.required_text("title")?.to_string();
        let description = form.text("description").map(str::to_string);
        let points_reward = match form.text("points_reward") {
            Some(raw) => parse_points_reward(raw)?,
            None => 0,
        };

        let file = form
            .file
            .ok_or_else(|| AppError::bad_request("Missing file"))?;

        let stored = upload_service::store_file(upload_dir, UploadKind::Content, &file).await?;

        let inserted = content::ActiveModel {
            creator_id: Set(creator_id),
            title: Set(title),
            description: Set(description),
            content_type: Set(file.mime_type),
            file_path: Set(stored.path.to_string_lossy().into_owned()),
            file_size: Set(stored.size),
            points_reward: Set(points_reward),
            views: Set(0),
            plan_id: Set(None),
            priority: Set(0),
            promoted_until: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await;

        match inserted {
            Ok(item) => {
                tracing::info!(
                    content_id = item.id,
                    creator_id,
                    size = item.file_size,
                    "content uploaded"
                );
                Ok(item)
            }
            Err(e) => {
                upload_service::remove_file(&stored.path).await;
                Err(e.into())
            }
        }
    }

    /// Suppression par le propriétaire ou un ADMIN (ligne puis fichier)
    pub async fn delete(
        db: &DatabaseConnection,
        user: &AuthUser,
        content_id: i32,
    ) -> Result<(), AppError> {
        let item = Self::get(db, content_id).await?;
        user.require_owner(item.creator_id)?;

        content::Entity::delete_by_id(item.id).exec(db).await?;
        upload_service::remove_file(Path::new(&item.file_path)).await;

        tracing::info!(content_id, user_id = user.user_id, "content deleted");
        Ok(())
    }
}

// priority si la promotion est encore active, 0 sinon
fn active_priority() -> SimpleExpr {
    Expr::case(
        Expr::col(content::Column::PromotedUntil).gt(Utc::now()),
        Expr::col(content::Column::Priority),
    )
    .finally(0)
    .into()
}

fn parse_points_reward(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(points) if points >= 0 => Ok(points),
        _ => Err(AppError::bad_request("points_reward must be a non-negative integer")),
    }
}
