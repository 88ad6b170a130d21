use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::{AuthUser, SESSION_COOKIE};
use crate::models::enums::Role;
use crate::models::{accounts, profiles, users};
use crate::utils::{jwt, password};

// DTO pour l'inscription
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
    pub role: Option<Role>,
}

// DTO pour la connexion
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// DTO pour changer le mot de passe
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub new_password: String,
}

// Réponse après login/register
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: users::Model,
}

/// POST /auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    // ADMIN ne s'obtient que via /admin/users/{id}/role
    let role = body.role.unwrap_or_default();
    if role == Role::Admin {
        return Err(AppError::bad_request("Role must be CREATOR or STREAMER"));
    }

    let email = normalize_email(&body.email);

    // 1. Vérifier si l'email est déjà utilisé
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(&email))
        .one(db.get_ref())
        .await?;
    if existing.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    // 2. Hash le mot de passe
    let password_hash = password::hash_password(&body.password).map_err(AppError::Internal)?;

    // 3. Créer l'utilisateur et son profil ensemble
    let name = body.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let now = Utc::now();

    let txn = db.begin().await?;

    let user = users::ActiveModel {
        email: Set(email),
        name: Set(name.clone()),
        password_hash: Set(Some(password_hash)),
        role: Set(role),
        balance: Set(Decimal::ZERO),
        points: Set(0),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    profiles::ActiveModel {
        user_id: Set(user.id),
        display_name: Set(name),
        bio: Set(None),
        avatar_url: Set(None),
        payout_email: Set(None),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "user registered");

    // 4. Générer le JWT et le cookie de session
    let token = jwt::generate_token(&config.jwt_secret, user.id, &user.email, user.role)
        .map_err(AppError::Internal)?;

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&token, config.cookie_secure))
        .json(AuthResponse { token, user }))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let invalid = || AppError::unauthorized("Invalid email or password");

    // 1. Trouver l'utilisateur
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(normalize_email(&body.email)))
        .one(db.get_ref())
        .await?
        .ok_or_else(invalid)?;

    // 2. Vérifier le mot de passe (les comptes OAuth n'en ont pas)
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !password::verify_password(&body.password, hash).map_err(AppError::Internal)? {
        tracing::warn!(user_id = user.id, "failed login");
        return Err(invalid());
    }

    // 3. Générer le JWT
    let token = jwt::generate_token(&config.jwt_secret, user.id, &user.email, user.role)
        .map_err(AppError::Internal)?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&token, config.cookie_secure))
        .json(AuthResponse { token, user }))
}

/// POST /auth/logout - Supprime le cookie de session (PUBLIC)
#[post("/logout")]
pub async fn logout(config: web::Data<AppConfig>) -> HttpResponse {
    let mut cookie = session_cookie("", config.cookie_secure);
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "success": true }))
}

/// GET /auth/me - Utilisateur courant (PROTÉGÉE)
#[get("/me")]
pub async fn me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = users::Entity::find_by_id(auth_user.user_id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(user))
}

/// POST /auth/change-password - Changer son mot de passe (PROTÉGÉE)
#[post("/change-password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    // 1. Récupérer l'utilisateur
    let user = users::Entity::find_by_id(auth_user.user_id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    // 2. Vérifier l'ancien mot de passe
    let current_hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::bad_request("This account has no password"))?;

    if !password::verify_password(&body.current_password, current_hash)
        .map_err(AppError::Internal)?
    {
        return Err(AppError::unauthorized("Current password is incorrect"));
    }

    // 3. Hasher et enregistrer le nouveau mot de passe
    let new_hash = password::hash_password(&body.new_password).map_err(AppError::Internal)?;

    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(Some(new_hash));
    active.update(db.get_ref()).await?;

    tracing::info!(user_id = auth_user.user_id, "password changed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

/// GET /auth/accounts - Comptes OAuth liés (PROTÉGÉE, lecture seule)
#[get("/accounts")]
pub async fn list_accounts(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let linked = accounts::Entity::find()
        .filter(accounts::Column::UserId.eq(auth_user.user_id))
        .order_by_asc(accounts::Column::CreatedAt)
        .all(db.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(linked))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(jwt::TOKEN_TTL_HOURS))
        .finish()
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(logout)
            .service(me)
            .service(change_password)
            .service(list_accounts),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie("abc", true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: None,
            role: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
