//! Reverse-proxy gateway in front of the products API.
//!
//! The gateway is the only externally reachable endpoint. It answers
//! `/health` itself and forwards everything under `/api` to one upstream.
//!
//! ```rust,no_run
//! use gateway::{config::UpstreamConfig, proxy::ProxyClient, routes};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let proxy = ProxyClient::new(&UpstreamConfig::new("http://localhost:3000"))?;
//! let app = routes::router(proxy)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod proxy;
pub mod routes;

pub use config::{Config, UpstreamConfig};
pub use proxy::{ProxyClient, ProxyError};
