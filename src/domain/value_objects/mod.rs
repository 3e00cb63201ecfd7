//! Value Objects for the storefront catalog

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog key, matched verbatim against the first CSV column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Result<Self, ProductIdError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ProductIdError::Empty); }
        if value.contains(['\n', '\r']) { return Err(ProductIdError::LineBreak); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductIdError { Empty, LineBreak }
impl std::error::Error for ProductIdError {}
impl fmt::Display for ProductIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "ProductID empty"), Self::LineBreak => write!(f, "ProductID contains a line break") }
    }
}

/// Discount code as typed by shoppers, normalized to upper case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    pub const MAX_LEN: usize = 32;

    pub fn new(value: impl Into<String>) -> Result<Self, PromoCodeError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(PromoCodeError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(PromoCodeError::TooLong); }
        if value.contains(['\n', '\r']) { return Err(PromoCodeError::LineBreak); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn matches(&self, raw: &str) -> bool { self.0.eq_ignore_ascii_case(raw.trim()) }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PromoCodeError { Empty, TooLong, LineBreak }
impl std::error::Error for PromoCodeError {}
impl fmt::Display for PromoCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Discount code empty"),
            Self::TooLong => write!(f, "Discount code longer than {} characters", PromoCode::MAX_LEN),
            Self::LineBreak => write!(f, "Discount code contains a line break"),
        }
    }
}

/// Whole-number percentage off, 1 to 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    pub fn new(value: i64) -> Result<Self, DiscountPercentError> {
        if !(1..=100).contains(&value) { return Err(DiscountPercentError::OutOfRange(value)); }
        Ok(Self(value as u8))
    }
    pub fn value(&self) -> u8 { self.0 }
    pub fn as_fraction(&self) -> Decimal { Decimal::from(self.0) / Decimal::ONE_HUNDRED }
}

impl TryFrom<u8> for DiscountPercent {
    type Error = DiscountPercentError;
    fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value.into()) }
}

impl From<DiscountPercent> for u8 {
    fn from(p: DiscountPercent) -> u8 { p.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum DiscountPercentError { OutOfRange(i64) }
impl std::error::Error for DiscountPercentError {}
impl fmt::Display for DiscountPercentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::OutOfRange(v) => write!(f, "Discount must be between 1 and 100, got {}", v) }
    }
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, "USD") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }

    /// Parses a catalog price such as `19.99`. A leading `$` is tolerated.
    pub fn parse(raw: &str, currency: &str) -> Result<Self, MoneyError> {
        let trimmed = raw.trim().trim_start_matches('$');
        let amount = Decimal::from_str(trimmed).map_err(|_| MoneyError::Unparsable(raw.to_string()))?;
        if amount.is_sign_negative() { return Err(MoneyError::Negative); }
        Ok(Self::new(amount, currency))
    }

    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount - other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
    pub fn scale(&self, factor: Decimal) -> Money { Money::new(self.amount * factor, &self.currency) }

    /// Rounded to cents, half away from zero.
    pub fn round_cents(&self) -> Money {
        Money::new(self.amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero), &self.currency)
    }

    /// Integer minor units (cents) as payment providers expect them.
    pub fn minor_units(&self) -> i64 {
        (self.amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { CurrencyMismatch, Negative, Unparsable(String) }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrencyMismatch => write!(f, "Currency mismatch"),
            Self::Negative => write!(f, "Price cannot be negative"),
            Self::Unparsable(raw) => write!(f, "Invalid price '{}'", raw),
        }
    }
}

/// Stock count. Never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }

    /// Lenient reading of a stored cell. The leading whole number counts, so `10.0` reads as 10.
    /// Text without one reads as zero; negatives clamp to zero.
    pub fn from_cell(raw: &str) -> Self {
        let raw = raw.trim();
        let sign = usize::from(raw.starts_with(['-', '+']));
        let end = sign + raw[sign..].find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len() - sign);
        match raw[..end].parse::<i64>() {
            Ok(v) => Self(v.clamp(0, u32::MAX as i64) as u32),
            Err(_) if end > sign && !raw.starts_with('-') => Self(u32::MAX),
            Err(_) => Self(0),
        }
    }

    /// Strict reading of user input.
    pub fn parse(raw: &str) -> Result<Self, QuantityError> {
        raw.trim().parse::<u32>().map(Self).map_err(|_| QuantityError::Unparsable(raw.to_string()))
    }

    pub fn value(&self) -> u32 { self.0 }
    pub fn saturating_subtract(&self, other: u32) -> Self { Self(self.0.saturating_sub(other)) }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { Unparsable(String) }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Unparsable(raw) => write!(f, "Invalid quantity '{}'", raw) }
    }
}
