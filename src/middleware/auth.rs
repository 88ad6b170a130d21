use actix_web::{Error, FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::enums::Role;
use crate::models::users;
use crate::utils::jwt;

/// Nom du cookie de session (contient le même JWT que le header Authorization)
pub const SESSION_COOKIE: &str = "session";

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Vérifie que l'utilisateur a l'un des rôles demandés (403 sinon).
    /// ADMIN passe toujours.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if self.role == Role::Admin || allowed.contains(&self.role) {
            return Ok(());
        }
        tracing::warn!(user_id = self.user_id, role = self.role.as_str(), "role check failed");
        Err(AppError::forbidden("Insufficient role for this action"))
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Admin])
    }

    /// Propriétaire de la ressource ou ADMIN
    pub fn require_owner(&self, owner_id: i32) -> Result<(), AppError> {
        if self.role == Role::Admin || self.user_id == owner_id {
            return Ok(());
        }
        Err(AppError::forbidden("You do not own this resource"))
    }
}

/// Implémentation de FromRequest pour AuthUser
/// Token lu dans "Authorization: Bearer <token>" puis, à défaut, dans le cookie de session.
/// Le rôle vient de la BD: un changement de rôle s'applique sans attendre l'expiration du token.
impl FromRequest for AuthUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let verified = verify_request(req);

        Box::pin(async move {
            let (claims, db) = verified?;
            load_user(&db, claims).await.map_err(Error::from)
        })
    }
}

fn verify_request(
    req: &HttpRequest,
) -> Result<(jwt::Claims, web::Data<DatabaseConnection>), AppError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::Internal("AppConfig is not registered".to_string()))?;
    let db = req
        .app_data::<web::Data<DatabaseConnection>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("DatabaseConnection is not registered".to_string()))?;

    let token = extract_token(req)?;
    let claims = jwt::verify_token(&config.jwt_secret, &token).map_err(AppError::Unauthorized)?;

    Ok((claims, db))
}

async fn load_user(db: &DatabaseConnection, claims: jwt::Claims) -> Result<AuthUser, AppError> {
    let user = users::Entity::find_by_id(claims.sub)
        .one(db)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

    if user.role != claims.role {
        tracing::info!(
            user_id = user.id,
            token_role = claims.role.as_str(),
            role = user.role.as_str(),
            "role changed since token was issued"
        );
    }

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}

fn extract_token(req: &HttpRequest) -> Result<String, AppError> {
    if let Some(header) = req.headers().get("Authorization") {
        let auth_str = header
            .to_str()
            .map_err(|_| AppError::unauthorized("Invalid Authorization header"))?;

        return match auth_str.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(AppError::unauthorized(
                "Invalid Authorization format (expected: Bearer <token>)",
            )),
        };
    }

    match req.cookie(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => Ok(cookie.value().to_string()),
        _ => Err(AppError::unauthorized("Authentication required")),
    }
}
