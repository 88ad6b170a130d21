use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::*;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{PageQuery, PageResponse};
use crate::models::products;
use crate::services::purchase_service::PurchaseService;
use crate::services::upload_service::{self, UploadForm, UploadKind};

/// Prix max d'un produit
const MAX_PRICE: i64 = 10_000;

pub struct ProductService;

/// Fichier ouvert, envoyé au client par morceaux
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub file: tokio::fs::File,
}

impl ProductService {
    /// Vitrine: seulement les produits actifs, plus récents d'abord
    pub async fn list(
        db: &DatabaseConnection,
        query: &PageQuery,
    ) -> Result<PageResponse<products::Model>, DbErr> {
        let mut select = products::Entity::find().filter(products::Column::IsActive.eq(true));
        if let Some(creator_id) = query.creator_id {
            select = select.filter(products::Column::CreatorId.eq(creator_id));
        }

        let paginator = select
            .order_by_desc(products::Column::CreatedAt)
            .order_by_desc(products::Column::Id)
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

    pub async fn create(
        db: &DatabaseConnection,
        creator_id: i32,
        upload_dir: &Path,
        form: UploadForm,
    ) -> Result<products::Model, AppError> {
        let title = form.required_text("title")?.to_string();
        let description = form.text("description").map(str::to_string);
        let price = parse_price(form.required_text("price")?)?;

        let file = form
            .file
            .ok_or_else(|| AppError::bad_request("Missing file"))?;

        let stored = upload_service::store_file(upload_dir, UploadKind::Product, &file).await?;

        let inserted = products::ActiveModel {
            creator_id: Set(creator_id),
            title: Set(title),
            description: Set(description),
            price: Set(price),
            file_path: Set(stored.path.to_string_lossy().into_owned()),
            file_name: Set(file.original_name),
            mime_type: Set(file.mime_type),
            file_size: Set(stored.size),
            purchase_count: Set(0),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await;

        match inserted {
            Ok(product) => {
                tracing::info!(
                    product_id = product.id,
                    creator_id,
                    price = %product.price,
                    "product created"
                );
                Ok(product)
            }
            Err(e) => {
                upload_service::remove_file(&stored.path).await;
                Err(e.into())
            }
        }
    }

    /// Ouvre le fichier pour l'acheteur, le créateur ou un ADMIN.
    /// Un produit désactivé reste téléchargeable par ceux qui l'ont payé.
    pub async fn download(
        db: &DatabaseConnection,
        user: &AuthUser,
        product_id: i32,
    ) -> Result<Download, AppError> {
        let product = products::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        if !PurchaseService::can_download(db, user, &product).await? {
            return Err(AppError::forbidden("Purchase required to download this product"));
        }

        let file = match tokio::fs::File::open(&product.file_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(
                    product_id,
                    path = %product.file_path,
                    "product file missing on disk"
                );
                return Err(AppError::not_found("File not found"));
            }
            Err(e) => return Err(e.into()),
        };

        let size = file.metadata().await?.len();

        Ok(Download {
            file_name: product.file_name,
            mime_type: product.mime_type,
            size,
            file,
        })
    }
}

/// Prix en devise: > 0, au plus 2 décimales
pub fn parse_price(raw: &str) -> Result<Decimal, AppError> {
    let price = Decimal::from_str(raw.trim())
        .map_err(|_| AppError::bad_request("price must be a decimal number"))?;
    if price <= Decimal::ZERO || price > Decimal::from(MAX_PRICE) {
        return Err(AppError::bad_request(format!(
            "price must be between 0 and {}",
            MAX_PRICE
        )));
    }
    if price != price.round_dp(2) {
        return Err(AppError::bad_request("price must have at most 2 decimals"));
    }
    Ok(price.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("9.99").unwrap(), Decimal::new(999, 2));
        assert_eq!(parse_price(" 5 ").unwrap(), Decimal::new(5, 0));
        assert!(parse_price("0").is_err());
        assert!(parse_price("-3").is_err());
        assert!(parse_price("1.999").is_err());
        assert!(parse_price("abc").is_err());
        assert!(parse_price("10001").is_err());
    }
}
