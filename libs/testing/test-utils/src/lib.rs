//! Shared test utilities for domain testing
//!
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongodb")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_mongo_test");
//!     let db = mongo.database(&builder.database_name());
//!
//!     let body = builder.product("main");
//! }
//! ```

use serde_json::{Value, json};

#[cfg(feature = "mongodb")]
mod mongo;

#[cfg(feature = "mongodb")]
pub use mongo::TestMongo;

/// Builder for test data with deterministic randomization
///
/// The same seed always yields the same names, ids and product bodies.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_product");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Unique, human-readable name
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(12345);
    /// assert_eq!(builder.name("product", "main"), "test-product-12345-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Database name that is valid for MongoDB (no dots, under 64 bytes)
    pub fn database_name(&self) -> String {
        format!("test_{:x}", self.seed)
    }

    /// Deterministic ObjectId derived from the seed
    #[cfg(feature = "mongodb")]
    pub fn object_id(&self) -> mongodb::bson::oid::ObjectId {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&self.seed.to_be_bytes());
        bytes[8..].copy_from_slice(&(self.seed as u32).rotate_left(7).to_be_bytes());
        mongodb::bson::oid::ObjectId::from_bytes(bytes)
    }

    /// Valid create body with a price and stock derived from the seed
    pub fn product(&self, suffix: &str) -> Value {
        json!({
            "name": self.name("product", suffix),
            "price": (self.seed % 100_000) as f64 / 100.0,
            "description": format!("Fixture product {}", suffix),
            "category": "Fixtures",
            "stock": self.seed % 50 + 1,
        })
    }
}

/// Test assertion helpers
pub mod assertions {
    use serde_json::Value;

    /// Assert an error body has the expected short code
    pub fn assert_error_code(body: &Value, expected: &str) {
        assert_eq!(
            body.get("error").and_then(Value::as_str),
            Some(expected),
            "unexpected error body: {}",
            body
        );
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
