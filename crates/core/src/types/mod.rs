//! Core value types for Helix Research.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;

pub use id::{ProductId, ProductIdError};
pub use price::Price;
