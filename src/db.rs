// connexion BD et création du schéma

use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

use crate::config::AppConfig;
use crate::models::{
    accounts, content, content_views, plans, product_purchases, products, profiles, transactions,
    users, withdrawals,
};

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.max_connections(20).sqlx_logging(false);

    Database::connect(options).await
}

/// CREATE TABLE IF NOT EXISTS pour chaque entité (AUTO_MIGRATE=true).
/// L'ordre respecte les clés étrangères.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(profiles::Entity),
        schema.create_table_from_entity(accounts::Entity),
        schema.create_table_from_entity(plans::Entity),
        schema.create_table_from_entity(content::Entity),
        schema.create_table_from_entity(content_views::Entity),
        schema.create_table_from_entity(products::Entity),
        schema.create_table_from_entity(transactions::Entity),
        schema.create_table_from_entity(product_purchases::Entity),
        schema.create_table_from_entity(withdrawals::Entity),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;
    }

    // Contraintes d'unicité sur plusieurs colonnes
    for sql in UNIQUE_INDEXES {
        db.execute_unprepared(sql).await?;
    }

    tracing::info!("database schema is up to date");
    Ok(())
}

const UNIQUE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_content_views_user_content \
     ON content_views (user_id, content_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_accounts_provider_account \
     ON accounts (provider, provider_account_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_purchases_completed \
     ON product_purchases (user_id, product_id) WHERE status = 'COMPLETED'",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_transactions_payment_id \
     ON transactions (payment_id) WHERE payment_id IS NOT NULL",
];
