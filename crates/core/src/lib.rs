//! Clothes Catalog Core - Shared types library.
//!
//! This crate provides the types and traits shared by the catalog server
//! and its tests:
//! - Newtype IDs, prices and quantities
//! - The catalog entities and their JSON shape
//! - The [`StoreError`] taxonomy
//! - [`OpContext`], the deadline/cancellation carrier for store calls
//! - The [`CatalogStore`] and [`ConnectionLifecycle`] traits
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no database access and
//! no HTTP. Store implementations live in the server crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod context;
pub mod error;
pub mod models;
pub mod store;
pub mod types;

pub use context::OpContext;
pub use error::{StoreError, StoreResult};
pub use models::*;
pub use store::{CatalogStore, ConnectionLifecycle, Store};
pub use types::*;
