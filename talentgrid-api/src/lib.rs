//! # TalentGrid API Server Library
//!
//! HTTP surface over the membership registry and its satellite records.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors that reject with `ApiError`
//! - `middleware`: Response hardening
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
