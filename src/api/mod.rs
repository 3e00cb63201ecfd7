//! JSON endpoints the storefront SPA and its admin dashboard call.

pub mod dto;

use std::sync::Arc;

use axum::{body::Bytes, extract::{Path, State}, http::StatusCode, response::IntoResponse, routing::{get, patch, post}, Json, Router};
use rust_decimal::Decimal;
use serde_json::json;
use validator::Validate;

use crate::config::Config;
use crate::domain::aggregates::{Cart, CartItem, DiscountPatch};
use crate::domain::value_objects::{DiscountPercent, ProductId, PromoCode};
use crate::payments::{CheckoutGateway, CheckoutRequest};
use crate::store::{DiscountBook, ProductCatalog, Purchase};
use crate::{Result, StorefrontError};
use dto::*;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ProductCatalog>,
    pub discounts: Arc<DiscountBook>,
    pub checkout: Arc<dyn CheckoutGateway>,
    pub currency: String,
    pub tax_rate: Decimal,
}

impl AppState {
    pub fn new(config: &Config, checkout: Arc<dyn CheckoutGateway>) -> Self {
        Self {
            catalog: Arc::new(ProductCatalog::open(&config.product_csv, &config.currency)),
            discounts: Arc::new(DiscountBook::open(&config.discount_csv)),
            checkout,
            currency: config.currency.clone(),
            tax_rate: config.tax_rate,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "csv-storefront"})) }))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/cart/quote", post(quote_cart))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/update-quantities", post(update_quantities))
        .route("/discount-codes", get(list_discount_codes).post(create_discount_code))
        .route("/discount-codes/:id", patch(patch_discount_code).delete(delete_discount_code))
        .route("/verify-discount", post(verify_discount))
        .route("/update-product", post(update_product))
        .route("/add-product", post(add_product))
        .with_state(state)
}

/// File I/O runs on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| StorefrontError::Io(std::io::Error::other(e)))?
}

async fn list_products(State(s): State<AppState>) -> Result<Json<serde_json::Value>> {
    let catalog = s.catalog.clone();
    let products = blocking(move || catalog.list()).await?;
    let views: Vec<ProductView> = products.iter().map(ProductView::from).collect();
    Ok(Json(json!({ "success": true, "products": views })))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>> {
    let id = ProductId::new(id)?;
    let catalog = s.catalog.clone();
    let product = blocking(move || catalog.get(&id)).await?;
    Ok(Json(json!({ "success": true, "product": ProductView::from(&product) })))
}

/// Prices a cart from the catalog, checks stock and applies an active discount code.
async fn build_cart(s: &AppState, req: ItemsRequest) -> Result<Cart> {
    req.validate()?;
    let mut wanted = Vec::with_capacity(req.items.len());
    for item in &req.items {
        item.validate()?;
        wanted.push((ProductId::new(item.product_id.clone())?, item.quantity));
    }

    let catalog = s.catalog.clone();
    let discounts = s.discounts.clone();
    let code = req.discount_code.filter(|c| !c.trim().is_empty());
    let (products, discount) = blocking(move || {
        let products = catalog.list()?;
        let discount = match &code {
            Some(raw) => Some(discounts.find_active(raw)?.ok_or_else(|| StorefrontError::Validation(format!("Invalid discount code '{}'", raw.trim())))?),
            None => None,
        };
        Ok((products, discount))
    }).await?;

    let mut cart = Cart::new(&s.currency, s.tax_rate);
    for (id, quantity) in wanted {
        let product = products.iter().find(|p| p.id() == &id).ok_or_else(|| StorefrontError::ProductNotFound(id.to_string()))?;
        cart.add_item(CartItem {
            product_id: id,
            name: product.name().to_string(),
            image_url: Some(product.image_url().to_string()),
            quantity,
            unit_price: product.price().clone(),
        });
    }
    for product in &products {
        let asked = cart.quantity_of(product.id());
        if asked > product.quantity().value() {
            return Err(StorefrontError::InsufficientInventory { product_id: product.id().to_string(), available: product.quantity().value() });
        }
    }
    if let Some(dc) = discount {
        cart.apply_discount(dc.code().clone(), dc.discount());
    }
    Ok(cart)
}

async fn quote_cart(State(s): State<AppState>, Json(req): Json<ItemsRequest>) -> Result<Json<serde_json::Value>> {
    let cart = build_cart(&s, req).await?;
    Ok(Json(json!({ "success": true, "quote": cart.quote() })))
}

async fn create_checkout_session(State(s): State<AppState>, Json(req): Json<ItemsRequest>) -> Result<impl IntoResponse> {
    let cart = build_cart(&s, req).await?;
    let request = CheckoutRequest::from_cart(&cart)?;
    let session = s.checkout.create_session(&request).await?;
    Ok(Json(session))
}

async fn update_quantities(State(s): State<AppState>, Json(req): Json<ItemsRequest>) -> Result<Json<serde_json::Value>> {
    req.validate()?;
    let mut purchases = Vec::with_capacity(req.items.len());
    for item in &req.items {
        item.validate()?;
        purchases.push(Purchase { product_id: ProductId::new(item.product_id.clone())?, quantity: item.quantity });
    }
    let catalog = s.catalog.clone();
    let update = blocking(move || catalog.update_quantities(&purchases)).await?;
    Ok(Json(json!({ "success": true, "updated": update.updated, "missing": update.missing })))
}

async fn list_discount_codes(State(s): State<AppState>) -> Result<Json<serde_json::Value>> {
    let discounts = s.discounts.clone();
    let codes = blocking(move || discounts.list()).await?;
    Ok(Json(json!({ "success": true, "discountCodes": codes })))
}

async fn create_discount_code(State(s): State<AppState>, Json(req): Json<CreateDiscountRequest>) -> Result<impl IntoResponse> {
    req.validate()?;
    let code = PromoCode::new(req.code)?;
    let pct = DiscountPercent::new(req.discount)?;
    let discounts = s.discounts.clone();
    let codes = blocking(move || discounts.add(code, pct)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "discountCodes": codes }))))
}

/// An empty body flips `isActive`; a JSON body edits the given fields.
async fn patch_discount_code(State(s): State<AppState>, Path(id): Path<String>, body: Bytes) -> Result<Json<serde_json::Value>> {
    let discounts = s.discounts.clone();
    let codes = if body.iter().all(u8::is_ascii_whitespace) {
        blocking(move || discounts.toggle(&id)).await?
    } else {
        let req: PatchDiscountRequest = serde_json::from_slice(&body)
            .map_err(|e| StorefrontError::Validation(format!("Invalid JSON body: {}", e)))?;
        let patch = DiscountPatch {
            code: req.code.map(PromoCode::new).transpose()?,
            discount: req.discount.map(DiscountPercent::new).transpose()?,
            is_active: req.is_active,
        };
        blocking(move || discounts.update(&id, patch)).await?
    };
    Ok(Json(json!({ "success": true, "discountCodes": codes })))
}

async fn delete_discount_code(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>> {
    let discounts = s.discounts.clone();
    let codes = blocking(move || discounts.delete(&id)).await?;
    Ok(Json(json!({ "success": true, "discountCodes": codes })))
}

async fn verify_discount(State(s): State<AppState>, Json(req): Json<VerifyDiscountRequest>) -> Result<Json<serde_json::Value>> {
    let discounts = s.discounts.clone();
    let raw = req.code.clone();
    let found = blocking(move || discounts.find_active(&raw)).await?;
    Ok(Json(match found {
        Some(dc) => json!({ "success": true, "valid": true, "code": dc.code(), "discount": dc.discount().value() }),
        None => json!({ "success": true, "valid": false, "error": "Invalid discount code." }),
    }))
}

async fn update_product(State(s): State<AppState>, Json(req): Json<UpdateProductRequest>) -> Result<Json<serde_json::Value>> {
    let id = ProductId::new(req.product_id)?;
    let fields = req.updated_product.fields();
    let catalog = s.catalog.clone();
    let product = blocking(move || catalog.update_product(&id, &fields)).await?;
    Ok(Json(json!({ "success": true, "product": ProductView::from(&product) })))
}

async fn add_product(State(s): State<AppState>, Json(req): Json<AddProductRequest>) -> Result<impl IntoResponse> {
    let id = req.new_product.product_id.as_deref().filter(|id| !id.trim().is_empty()).map(ProductId::new).transpose()?;
    let fields = req.new_product.fields();
    let catalog = s.catalog.clone();
    let product = blocking(move || catalog.add_product(id, &fields)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "product": ProductView::from(&product) }))))
}
