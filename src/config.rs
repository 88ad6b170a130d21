// Configuration lue depuis l'environnement (.env chargé par main.rs)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub paypal: PayPalConfig,
    /// Devise du ledger et des commandes PayPal
    pub currency: String,
    /// Nombre de points pour 1 unité de devise (ex: 100 points = 1 USD)
    pub points_per_dollar: i64,
    /// Seuil minimum pour demander un retrait
    pub min_withdrawal_points: i64,
    pub auto_migrate: bool,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: optional("BIND_ADDR", "127.0.0.1:8080".to_string())?,
            upload_dir: PathBuf::from(optional("UPLOAD_DIR", "public/uploads".to_string())?),
            max_upload_bytes: optional("MAX_UPLOAD_BYTES", 100 * 1024 * 1024)?,
            paypal: PayPalConfig {
                client_id: required("PAYPAL_CLIENT_ID")?,
                client_secret: required("PAYPAL_CLIENT_SECRET")?,
                api_base: optional(
                    "PAYPAL_API_BASE",
                    "https://api-m.sandbox.paypal.com".to_string(),
                )?,
            },
            currency: optional("CURRENCY", "USD".to_string())?,
            points_per_dollar: positive("POINTS_PER_DOLLAR", 100)?,
            min_withdrawal_points: positive("MIN_WITHDRAWAL_POINTS", 1000)?,
            auto_migrate: optional("AUTO_MIGRATE", false)?,
            cookie_secure: optional("COOKIE_SECURE", false)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        _ => Ok(default),
    }
}

fn positive(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    let value = optional(name, default)?;
    if value <= 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_number_is_an_error() {
        // SAFETY: variable propre à ce test, jamais lue ailleurs
        unsafe { env::set_var("STREAMRICH_TEST_BAD_NUMBER", "abc") };
        let result: Result<i64, _> = optional("STREAMRICH_TEST_BAD_NUMBER", 5);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_missing_optional_uses_default() {
        let result: Result<i64, _> = optional("STREAMRICH_TEST_UNSET_NUMBER", 42);
        assert_eq!(result.unwrap(), 42);
    }
}
