use actix_web::{HttpResponse, get, put, web};
use chrono::Utc;
use sea_orm::*;
use serde::Deserialize;
use validator::{Validate, ValidateUrl, ValidationError};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{ProfileResponse, PublicProfile};
use crate::models::{profiles, users};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(custom(function = "validate_avatar_url"))]
    pub avatar_url: Option<String>,
    #[validate(email(message = "payout_email must be a valid email"))]
    pub payout_email: Option<String>,
}

// "" efface l'avatar, sinon une URL valide
fn validate_avatar_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_url() {
        return Ok(());
    }
    Err(ValidationError::new("url").with_message("avatar_url must be a valid URL".into()))
}

/// GET /profile - Profil complet de l'utilisateur connecté
#[get("")]
pub async fn get_own_profile(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (user, profile) = load_user_with_profile(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::new(user, profile)))
}

/// PUT /profile - Mise à jour partielle (les champs absents ne changent pas)
#[put("")]
pub async fn update_profile(
    auth_user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let (user, profile) = load_user_with_profile(db.get_ref(), auth_user.user_id).await?;

    let txn = db.begin().await?;

    let user = match body.name {
        Some(name) => {
            let mut active: users::ActiveModel = user.into();
            active.name = Set(clean(name));
            active.update(&txn).await?
        }
        None => user,
    };

    let mut active: profiles::ActiveModel = match profile {
        Some(existing) => existing.into(),
        None => profiles::ActiveModel {
            user_id: Set(user.id),
            ..Default::default()
        },
    };

    if let Some(v) = body.display_name {
        active.display_name = Set(clean(v));
    }
    if let Some(v) = body.bio {
        active.bio = Set(clean(v));
    }
    if let Some(v) = body.avatar_url {
        active.avatar_url = Set(clean(v));
    }
    if let Some(v) = body.payout_email {
        active.payout_email = Set(clean(v));
    }
    active.updated_at = Set(Utc::now());

    let saved = active.save(&txn).await?.try_into_model()?;

    txn.commit().await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::new(user, Some(saved))))
}

/// GET /profile/{user_id} - Profil public (PUBLIC)
#[get("/{user_id}")]
pub async fn get_public_profile(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (user, profile) = load_user_with_profile(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PublicProfile::new(user, profile)))
}

async fn load_user_with_profile(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<(users::Model, Option<profiles::Model>), AppError> {
    users::Entity::find_by_id(user_id)
        .find_also_related(profiles::Entity)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

// Espaces retirés, chaîne vide = None
fn clean(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .service(get_own_profile)
            .service(update_profile)
            .service(get_public_profile),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(avatar_url: &str) -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: None,
            display_name: None,
            bio: None,
            avatar_url: Some(avatar_url.to_string()),
            payout_email: None,
        }
    }

    #[test]
    fn test_empty_avatar_url_clears_it() {
        assert!(request("").validate().is_ok());
        assert!(request("  ").validate().is_ok());
        assert_eq!(clean(String::new()), None);
    }

    #[test]
    fn test_avatar_url_must_be_a_url() {
        assert!(request("https://cdn.example.com/a.png").validate().is_ok());
        assert!(request("not a url").validate().is_err());
    }
}
