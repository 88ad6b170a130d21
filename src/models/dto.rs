// Objets de réponse/requête partagés entre plusieurs routes
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::Role;
use super::{profiles, users};

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;
/// Au-delà, per_page * page déborde dans le paginator
pub const MAX_PAGE: u64 = u32::MAX as u64;

/// Query string des listes paginées: ?page=1&per_page=20&creator_id=3
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub creator_id: Option<i32>,
}

impl PageQuery {
    /// Numéro de page à partir de 1
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// Profil complet, renvoyé uniquement à son propriétaire
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: i32,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub payout_email: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileResponse {
    pub fn new(user: users::Model, profile: Option<profiles::Model>) -> Self {
        let profile = profile.unwrap_or_else(|| empty_profile(user.id));
        Self {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            payout_email: profile.payout_email,
            updated_at: (profile.id != 0).then_some(profile.updated_at),
        }
    }
}

/// Profil public (sans email ni infos de paiement)
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub user_id: i32,
    pub name: Option<String>,
    pub role: Role,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl PublicProfile {
    pub fn new(user: users::Model, profile: Option<profiles::Model>) -> Self {
        let profile = profile.unwrap_or_else(|| empty_profile(user.id));
        Self {
            user_id: user.id,
            name: user.name,
            role: user.role,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
        }
    }
}

// Profil vide pour les comptes créés avant la table profiles
fn empty_profile(user_id: i32) -> profiles::Model {
    profiles::Model {
        id: 0,
        user_id,
        display_name: None,
        bio: None,
        avatar_url: None,
        payout_email: None,
        updated_at: Utc::now(),
    }
}

/// Totaux pour le tableau de bord admin
#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub users: u64,
    pub creators: u64,
    pub streamers: u64,
    pub contents: u64,
    pub products: u64,
    pub purchases: u64,
    pub revenue: Decimal,
    pub pending_withdrawals: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults_and_clamp() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), DEFAULT_PER_PAGE);

        let q = PageQuery {
            page: Some(0),
            per_page: Some(1000),
            creator_id: None,
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn test_page_is_capped() {
        let q = PageQuery {
            page: Some(u64::MAX),
            per_page: Some(MAX_PER_PAGE),
            creator_id: None,
        };
        assert_eq!(q.page(), MAX_PAGE);
        assert!(q.per_page().checked_mul(q.page()).is_some());
    }

    #[test]
    fn test_public_profile_hides_email() {
        let user = users::Model {
            id: 7,
            email: "a@b.c".to_string(),
            name: Some("Ann".to_string()),
            password_hash: None,
            role: Role::Creator,
            balance: Decimal::ZERO,
            points: 0,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(PublicProfile::new(user, None)).unwrap();
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["role"], "CREATOR");
        assert!(json.get("email").is_none());
    }
}
