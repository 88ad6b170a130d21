// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - enums : Rôles et statuts stockés en texte (ADMIN, PENDING, ...)
//   - health : Health check API
//   - dto : Data Transfer Objects partagés par les routes
//   - users : Utilisateurs (email unique, rôle, solde, points)
//   - profiles : Profil public 1-1 avec users
//   - accounts : Comptes OAuth liés (lecture seule)
//   - content : Contenus uploadés par les créateurs
//   - content_views : Vues de contenu (points attribués une seule fois)
//   - products : Produits numériques vendus par les créateurs
//   - transactions : Ledger (achat, dépôt, retrait, promotion)
//   - product_purchases : Achats de produits (max 1 COMPLETED par user/produit)
//   - withdrawals : Demandes de conversion points -> argent
//   - plans : Plans payants de mise en avant du contenu
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les montants sont des Decimal, les points des i64
//   - Les relations entre tables sont définies dans chaque modèle
//
// ============================================================================

pub mod enums;
pub mod health;
pub mod dto;
pub mod users;
pub mod profiles;
pub mod accounts;
pub mod content;
pub mod content_views;
pub mod products;
pub mod transactions;
pub mod product_purchases;
pub mod withdrawals;
pub mod plans;
