//! Identity and session-authorization module for Staynest Engine
//!
//! This module provides the core identity functionality including:
//! - Local registration and credential verification
//! - Federated identity resolution and provider linking
//! - Session token issuance and validation
//! - Principal resolution for request authorization
//!
//! Persistence is behind the [`repository::AccountRepository`] trait; an
//! in-memory implementation is provided for development and testing.
//!
//! # Example
//!
//! ```rust,ignore
//! use identity_engine::{IdentityService, IdentityConfig, InMemoryAccountRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = Arc::new(InMemoryAccountRepository::new());
//!     let service = IdentityService::new(repo, IdentityConfig::default())?;
//!
//!     let session = service.register_local(new_account).await?;
//!     let principal = service.authenticate_token(&session.token.token).await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod tokens;

pub use config::*;
pub use error::*;
pub use models::*;
pub use repository::{AccountRepository, InMemoryAccountRepository};
pub use service::*;
pub use tokens::{IssuedToken, SessionClaims, SessionTokenService};
