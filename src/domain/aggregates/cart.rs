//! Cart Aggregate

use rust_decimal::Decimal;
use serde::Serialize;
use crate::domain::value_objects::{DiscountPercent, Money, ProductId, PromoCode};

#[derive(Clone, Debug)]
pub struct Cart {
    items: Vec<CartItem>,
    discount: Option<(PromoCode, DiscountPercent)>,
    tax_rate: Decimal,
    currency: String,
}

#[derive(Clone, Debug)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    /// Charged per unit: the catalog price rounded to cents.
    pub fn charged_unit_price(&self) -> Money { self.unit_price.round_cents() }
    pub fn line_total(&self) -> Money { self.charged_unit_price().multiply(self.quantity) }
}

/// Priced summary of a cart, amounts rounded to cents.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub currency: String,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub discount_code: Option<String>,
    pub discount_percent: Option<u8>,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Cart {
    pub fn new(currency: &str, tax_rate: Decimal) -> Self {
        Self { items: vec![], discount: None, tax_rate, currency: currency.to_string() }
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn discount_percent(&self) -> Option<DiscountPercent> { self.discount.as_ref().map(|(_, p)| *p) }
    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Adds a line; the same product twice merges into one line.
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
    }

    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items.iter().filter(|i| &i.product_id == product_id).map(|i| i.quantity).sum()
    }

    pub fn apply_discount(&mut self, code: PromoCode, percent: DiscountPercent) { self.discount = Some((code, percent)); }

    pub fn subtotal(&self) -> Money {
        self.items.iter().fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc))
    }

    /// Sum of the lines at their discounted, cent-rounded unit prices.
    pub fn discounted_subtotal(&self) -> Money {
        self.items.iter().fold(Money::zero(&self.currency), |acc, i| {
            acc.add(&self.discounted_unit_price(i).multiply(i.quantity)).unwrap_or(acc)
        })
    }

    /// The difference between the subtotal and what the discounted lines charge, so a quote
    /// always agrees with the checkout total.
    pub fn discount_amount(&self) -> Money {
        let subtotal = self.subtotal();
        subtotal.subtract(&self.discounted_subtotal()).unwrap_or_else(|_| Money::zero(&self.currency))
    }

    /// Tax is charged on the undiscounted subtotal.
    pub fn tax(&self) -> Money { self.subtotal().scale(self.tax_rate).round_cents() }

    pub fn total(&self) -> Money {
        let subtotal = self.subtotal();
        let gross = subtotal.add(&self.tax()).unwrap_or(subtotal);
        gross.subtract(&self.discount_amount()).unwrap_or(gross)
    }

    /// Unit price after the percentage discount, rounded to cents, as charged by the hosted checkout.
    pub fn discounted_unit_price(&self, item: &CartItem) -> Money {
        match &self.discount {
            Some((_, pct)) => item.charged_unit_price().scale(Decimal::ONE - pct.as_fraction()).round_cents(),
            None => item.charged_unit_price(),
        }
    }

    pub fn quote(&self) -> CartQuote {
        CartQuote {
            currency: self.currency.clone(),
            item_count: self.unit_count(),
            subtotal: self.subtotal().amount(),
            discount_code: self.discount.as_ref().map(|(c, _)| c.to_string()),
            discount_percent: self.discount_percent().map(|p| p.value()),
            discount: self.discount_amount().amount(),
            tax: self.tax().amount(),
            total: self.total().amount(),
        }
    }
}
