//! Discount Code Aggregate

use serde::Serialize;
use crate::domain::value_objects::{DiscountPercent, PromoCode};
use crate::domain::events::{DiscountEvent, DomainEvent};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    id: String,
    code: PromoCode,
    discount: DiscountPercent,
    is_active: bool,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Partial edit; absent fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct DiscountPatch {
    pub code: Option<PromoCode>,
    pub discount: Option<DiscountPercent>,
    pub is_active: Option<bool>,
}

impl DiscountCode {
    pub fn restore(id: impl Into<String>, code: PromoCode, discount: DiscountPercent, is_active: bool) -> Self {
        Self { id: id.into(), code, discount, is_active, events: vec![] }
    }

    pub fn create(id: impl Into<String>, code: PromoCode, discount: DiscountPercent) -> Self {
        let mut dc = Self::restore(id, code, discount, true);
        dc.raise_event(DomainEvent::Discount(DiscountEvent::Created { id: dc.id.clone(), code: dc.code.clone(), discount }));
        dc
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn code(&self) -> &PromoCode { &self.code }
    pub fn discount(&self) -> DiscountPercent { self.discount }
    pub fn is_active(&self) -> bool { self.is_active }
    pub fn redeemable(&self, raw: &str) -> bool { self.is_active && self.code.matches(raw) }

    pub fn apply(&mut self, patch: DiscountPatch) {
        if let Some(code) = patch.code { self.code = code; }
        if let Some(discount) = patch.discount { self.discount = discount; }
        if let Some(active) = patch.is_active { self.is_active = active; }
        self.raise_event(DomainEvent::Discount(DiscountEvent::Updated { id: self.id.clone(), code: self.code.clone() }));
    }

    pub fn toggle(&mut self) {
        self.is_active = !self.is_active;
        self.raise_event(DomainEvent::Discount(DiscountEvent::Toggled { id: self.id.clone(), is_active: self.is_active }));
    }

    /// Marks the code as removed; the caller drops it from the book afterwards.
    pub fn retire(&mut self) {
        self.raise_event(DomainEvent::Discount(DiscountEvent::Deleted { id: self.id.clone(), code: self.code.clone() }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}
