//! Helix Research Core - storefront domain library.
//!
//! This crate holds the storefront's domain logic, used by the `storefront`
//! binary and its tests.
//!
//! # Architecture
//!
//! The core crate contains only types and state machines - no HTTP, no
//! sessions, no filesystem access beyond optional catalog loading. State that
//! a browser would keep (consent, age gate, terms) goes through the
//! [`storage::KeyValueStore`] trait so it can be driven from memory in tests.
//!
//! # Modules
//!
//! - [`types`] - Product ids and prices
//! - [`catalog`] - Static product catalog
//! - [`cart`] - Cart store with change notification
//! - [`storage`] - Key/value storage abstraction
//! - [`consent`] - Cookie consent state machine and audit log
//! - [`compliance`] - Age gate and terms banner
//! - [`crawler`] - Known-crawler classification

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod compliance;
pub mod consent;
pub mod crawler;
pub mod storage;
pub mod types;

pub use cart::{CartError, CartItem, CartState, CartStore};
pub use catalog::{Catalog, CatalogError, ChemicalProfile, Product};
pub use storage::{KeyValueStore, MemoryStorage, StorageChange};
pub use types::*;
