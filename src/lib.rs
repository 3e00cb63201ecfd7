//! CSV Storefront
//!
//! Catalog, discount code and checkout backend for a small storefront whose
//! datastore is a pair of CSV files.
//!
//! ## Features
//! - Product catalog reads and edits over `product_list.csv`
//! - Stock decrement after purchase
//! - Discount code management over `discount_codes.csv`
//! - Cart quotes with tax and discount
//! - Hosted checkout sessions

pub mod api;
pub mod config;
pub mod domain;
pub mod payments;
pub mod store;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;

use crate::domain::aggregates::ProductError;
use crate::domain::value_objects::{DiscountPercentError, ProductIdError, PromoCodeError, QuantityError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    Validation(String),

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Discount code {0} not found")]
    DiscountNotFound(String),

    #[error("Product {0} already exists")]
    DuplicateProduct(String),

    #[error("Discount code {0} already exists")]
    DuplicateCode(String),

    #[error("Only {available} of product {product_id} left in stock")]
    InsufficientInventory { product_id: String, available: u32 },

    #[error("Checkout needs at least one item with a positive total")]
    EmptyCheckout,

    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("Payment provider error: {0}")]
    PaymentGateway(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StorefrontError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ProductNotFound(_) | Self::DiscountNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateProduct(_) | Self::DuplicateCode(_) | Self::InsufficientInventory { .. } => StatusCode::CONFLICT,
            Self::EmptyCheckout => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
            Self::MalformedCatalog(_) | Self::Io(_) | Self::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

macro_rules! validation_from {
    ($($t:ty),*) => {
        $(impl From<$t> for StorefrontError {
            fn from(e: $t) -> Self { StorefrontError::Validation(e.to_string()) }
        })*
    };
}

validation_from!(ProductError, ProductIdError, PromoCodeError, DiscountPercentError, QuantityError, validator::ValidationErrors);

pub type Result<T> = std::result::Result<T, StorefrontError>;
