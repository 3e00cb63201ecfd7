//! Domain events
use crate::domain::value_objects::{DiscountPercent, ProductId, PromoCode};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub enum DomainEvent {
    Product(ProductEvent),
    Discount(DiscountEvent),
}

#[derive(Clone, Debug)]
pub enum ProductEvent {
    Created { product_id: ProductId, at: DateTime<Utc> },
    Updated { product_id: ProductId, at: DateTime<Utc> },
    InventoryRemoved { product_id: ProductId, requested: u32, old_quantity: u32, new_quantity: u32 },
}

#[derive(Clone, Debug)]
pub enum DiscountEvent {
    Created { id: String, code: PromoCode, discount: DiscountPercent },
    Updated { id: String, code: PromoCode },
    Toggled { id: String, is_active: bool },
    Deleted { id: String, code: PromoCode },
}

impl DomainEvent {
    /// Writes the event to the log. Stores call this for everything they drain.
    pub fn log(&self) {
        match self {
            DomainEvent::Product(ProductEvent::Created { product_id, at }) =>
                tracing::info!(%product_id, %at, "product created"),
            DomainEvent::Product(ProductEvent::Updated { product_id, at }) =>
                tracing::info!(%product_id, %at, "product updated"),
            DomainEvent::Product(ProductEvent::InventoryRemoved { product_id, requested, old_quantity, new_quantity }) =>
                tracing::info!(%product_id, requested, old = old_quantity, new = new_quantity, "inventory removed"),
            DomainEvent::Discount(DiscountEvent::Created { id, code, discount }) =>
                tracing::info!(%id, %code, discount = discount.value(), "discount code created"),
            DomainEvent::Discount(DiscountEvent::Updated { id, code }) =>
                tracing::info!(%id, %code, "discount code updated"),
            DomainEvent::Discount(DiscountEvent::Toggled { id, is_active }) =>
                tracing::info!(%id, is_active, "discount code toggled"),
            DomainEvent::Discount(DiscountEvent::Deleted { id, code }) =>
                tracing::info!(%id, %code, "discount code deleted"),
        }
    }
}
