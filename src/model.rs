// Core structs: Product, PricePoint, Prediction
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::utils::generate_id;

/// A tracked item whose price history is analyzed.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: generate_id(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// One observed price for a product. Several points may share a date and
/// the series may arrive unsorted; the analyzer tolerates both.
#[derive(Debug, Clone)]
pub struct PricePoint {
    pub id: String,
    pub product_id: String,
    pub price: f64,
    pub date: NaiveDate,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(product_id: &str, price: f64, date: NaiveDate, note: &str) -> Self {
        Self {
            id: generate_id(),
            product_id: product_id.to_string(),
            price,
            date,
            note: note.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Cached per-product summary kept in the store.
#[derive(Debug, Clone)]
pub struct ProductStats {
    pub product_id: String,
    pub avg_price: f64,
    pub std_dev: f64,
    pub last_updated: DateTime<Utc>,
}

/// Classified direction of recent price movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Forecast for a single product, recomputed from scratch on every pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub trend: Trend,
    /// 0..=100, lower with higher relative volatility.
    pub confidence: u8,
    /// Regression line evaluated one step past the last observation,
    /// clamped so it never goes below zero.
    pub predicted_price: f64,
    pub analysis: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),
    #[error("rejected input: {0}")]
    RejectedInput(#[from] ValidationError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("price is not a finite number")]
    NonFinitePrice,
    #[error("price must not be negative, got {0}")]
    NegativePrice(f64),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
