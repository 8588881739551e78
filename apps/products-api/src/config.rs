//! Configuration for Products API

use core_config::{app_info, env_or_default, server::ServerConfig, AppInfo, FromEnv};
use database::mongodb::MongoConfig;
use domain_products::mongodb::DEFAULT_COLLECTION;

pub use core_config::Environment;

/// Port used when `PORT` is unset
pub const DEFAULT_PORT: u16 = 3000;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// `PRODUCTS_COLLECTION`, defaults to `products`
    pub products_collection: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let app = app_info!();
        let environment = Environment::from_env();
        let server = ServerConfig::from_env_with_port(DEFAULT_PORT)?;

        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(app.name);
        }

        Ok(Self {
            app,
            mongodb,
            server,
            environment,
            products_collection: env_or_default("PRODUCTS_COLLECTION", DEFAULT_COLLECTION),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://mongo:27017")),
                ("MONGODB_DATABASE", Some("shop")),
                ("MONGODB_APP_NAME", None),
                ("PORT", None),
                ("PRODUCTS_COLLECTION", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.server.port, 3000);
                assert_eq!(config.products_collection, "products");
                assert_eq!(config.mongodb.database(), "shop");
                assert_eq!(config.mongodb.app_name.as_deref(), Some("products_api"));
            },
        );
    }

    #[test]
    fn test_config_overrides() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://mongo:27017")),
                ("MONGODB_DATABASE", Some("shop")),
                ("PORT", Some("4000")),
                ("PRODUCTS_COLLECTION", Some("catalog_items")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.server.port, 4000);
                assert_eq!(config.products_collection, "catalog_items");
            },
        );
    }

    #[test]
    fn test_config_requires_mongodb_url() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", None::<&str>),
                ("MONGO_URL", None),
                ("MONGODB_DATABASE", Some("shop")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}
