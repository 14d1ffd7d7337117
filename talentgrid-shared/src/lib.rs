//! # TalentGrid Shared Library
//!
//! Domain types and persistence shared by the TalentGrid API server.
//!
//! ## Module Organization
//!
//! - `registry`: The membership registry trait with PostgreSQL and in-memory stores
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations
//! - `credentials`: Password hashing
//! - `enrichment`: HTTP client for the AI enrichment service
//! - `error`: Common error types

pub mod credentials;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod registry;

/// Current version of the TalentGrid shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
