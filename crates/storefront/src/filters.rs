//! Custom Askama template filters.
//!
//! Askama resolves `|name` against a `filters` module in scope, so every
//! module that defines a template rendering `base.html` imports this one.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::Datelike;

/// Year for the footer copyright line.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    Ok(chrono::Utc::now().year())
}

/// Cart quantity with its unit: `1 item`, `3 items`.
///
/// Usage in templates: `{{ cart.item_count|item_count_label }}`
#[askama::filter_fn]
pub fn item_count_label(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(count_label(&count.to_string()))
}

fn count_label(count: &str) -> String {
    if count == "1" {
        "1 item".to_string()
    } else {
        format!("{count} items")
    }
}
