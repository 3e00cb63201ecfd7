//! Product Aggregate

use chrono::Utc;
use crate::domain::value_objects::{Money, ProductId, Quantity};
use crate::domain::events::{DomainEvent, ProductEvent};

/// Catalog columns, in the order a fresh catalog file lists them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductColumn { Id, Category, Name, Price, Description, Quantity, ImageUrl }

impl ProductColumn {
    pub const ALL: [ProductColumn; 7] = [
        Self::Id, Self::Category, Self::Name, Self::Price, Self::Description, Self::Quantity, Self::ImageUrl,
    ];
    /// Columns an edit overwrites. The key column is never rewritten.
    pub const EDITABLE: [ProductColumn; 6] = [
        Self::Category, Self::Name, Self::Price, Self::Description, Self::Quantity, Self::ImageUrl,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::Id => "ProductID",
            Self::Category => "Category",
            Self::Name => "Name",
            Self::Price => "Price",
            Self::Description => "Description",
            Self::Quantity => "Quantity",
            Self::ImageUrl => "ImageURL",
        }
    }
}

/// Raw editable fields as an admin form submits them.
#[derive(Clone, Debug, Default)]
pub struct ProductFields {
    pub category: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub quantity: String,
    pub image_url: String,
}

#[derive(Clone, Debug)]
pub struct Product {
    id: ProductId,
    category: String,
    name: String,
    price: Money,
    description: String,
    quantity: Quantity,
    image_url: String,
    events: Vec<DomainEvent>,
}

impl Product {
    /// Rebuilds a product from stored cells. Stored quantities are read leniently.
    pub fn restore(id: ProductId, cells: &ProductFields, currency: &str) -> Result<Self, ProductError> {
        let price = Money::parse(&cells.price, currency).map_err(|e| ProductError::InvalidPrice(e.to_string()))?;
        Ok(Self {
            id,
            category: cells.category.clone(),
            name: cells.name.clone(),
            price,
            description: cells.description.clone(),
            quantity: Quantity::from_cell(&cells.quantity),
            image_url: cells.image_url.clone(),
            events: vec![],
        })
    }

    pub fn create(id: ProductId, fields: &ProductFields, currency: &str) -> Result<Self, ProductError> {
        let mut product = Self {
            id: id.clone(), category: String::new(), name: String::new(), price: Money::zero(currency),
            description: String::new(), quantity: Quantity::default(), image_url: String::new(), events: vec![],
        };
        product.assign(fields)?;
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, at: Utc::now() }));
        Ok(product)
    }

    pub fn id(&self) -> &ProductId { &self.id }
    pub fn category(&self) -> &str { &self.category }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> &Money { &self.price }
    pub fn description(&self) -> &str { &self.description }
    pub fn quantity(&self) -> Quantity { self.quantity }
    pub fn image_url(&self) -> &str { &self.image_url }
    pub fn is_in_stock(&self) -> bool { !self.quantity.is_zero() }

    pub fn update(&mut self, fields: &ProductFields) -> Result<(), ProductError> {
        self.assign(fields)?;
        self.raise_event(DomainEvent::Product(ProductEvent::Updated { product_id: self.id.clone(), at: Utc::now() }));
        Ok(())
    }

    /// Cell text for one column.
    pub fn cell(&self, column: ProductColumn) -> String {
        match column {
            ProductColumn::Id => self.id.to_string(),
            ProductColumn::Category => self.category.clone(),
            ProductColumn::Name => self.name.clone(),
            ProductColumn::Price => self.price.amount().to_string(),
            ProductColumn::Description => self.description.clone(),
            ProductColumn::Quantity => self.quantity.to_string(),
            ProductColumn::ImageUrl => self.image_url.clone(),
        }
    }

    fn assign(&mut self, fields: &ProductFields) -> Result<(), ProductError> {
        if fields.name.trim().is_empty() { return Err(ProductError::MissingName); }
        let price = Money::parse(&fields.price, self.price.currency()).map_err(|e| ProductError::InvalidPrice(e.to_string()))?;
        let quantity = Quantity::parse(&fields.quantity).map_err(|e| ProductError::InvalidQuantity(e.to_string()))?;
        self.category = fields.category.trim().to_string();
        self.name = fields.name.trim().to_string();
        self.price = price;
        self.description = fields.description.clone();
        self.quantity = quantity;
        self.image_url = fields.image_url.trim().to_string();
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

/// Stock of one catalog row, read from just its Name and Quantity cells so a decrement
/// works even when other cells of the row do not parse.
#[derive(Clone, Debug)]
pub struct StockLevel {
    id: ProductId,
    name: String,
    quantity: Quantity,
    events: Vec<DomainEvent>,
}

impl StockLevel {
    pub fn restore(id: ProductId, name: &str, quantity: &str) -> Self {
        Self { id, name: name.to_string(), quantity: Quantity::from_cell(quantity), events: vec![] }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn quantity(&self) -> Quantity { self.quantity }

    /// Takes purchased units out of stock. Overselling clamps at zero.
    pub fn remove(&mut self, qty: u32) -> (Quantity, Quantity) {
        let old = self.quantity;
        self.quantity = old.saturating_subtract(qty);
        self.events.push(DomainEvent::Product(ProductEvent::InventoryRemoved {
            product_id: self.id.clone(), requested: qty, old_quantity: old.value(), new_quantity: self.quantity.value(),
        }));
        (old, self.quantity)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingName, InvalidPrice(String), InvalidQuantity(String) }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Missing name"),
            Self::InvalidPrice(e) | Self::InvalidQuantity(e) => write!(f, "{}", e),
        }
    }
}
