//! Request and response bodies. Product bodies use the catalog's column names as keys.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::domain::aggregates::{Product, ProductFields};

/// Ids, prices and quantities arrive either as JSON strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar { Text(String), Int(i64), Float(f64) }

impl Scalar {
    fn into_text(self) -> String {
        match self { Scalar::Text(t) => t, Scalar::Int(i) => i.to_string(), Scalar::Float(f) => f.to_string() }
    }
}

fn scalar<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(Scalar::into_text)
}

fn optional_scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_text))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[serde(deserialize_with = "scalar")]
    #[validate(length(min = 1, message = "productId is required"))]
    pub product_id: String,
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemsRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<ItemRequest>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductInput {
    #[serde(rename = "ProductID", default, deserialize_with = "optional_scalar")]
    pub product_id: Option<String>,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Price", deserialize_with = "scalar")]
    pub price: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Quantity", deserialize_with = "scalar")]
    pub quantity: String,
    #[serde(rename = "ImageURL", default)]
    pub image_url: String,
}

impl ProductInput {
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            category: self.category.clone(),
            name: self.name.clone(),
            price: self.price.clone(),
            description: self.description.clone(),
            quantity: self.quantity.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(rename = "productId", deserialize_with = "scalar")]
    pub product_id: String,
    #[serde(rename = "updatedProduct")]
    pub updated_product: ProductInput,
}

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    #[serde(rename = "newProduct")]
    pub new_product: ProductInput,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiscountRequest {
    #[validate(length(min = 1, max = 32, message = "code must be 1 to 32 characters"))]
    pub code: String,
    #[validate(range(min = 1, max = 100, message = "discount must be between 1 and 100"))]
    pub discount: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDiscountRequest {
    pub code: Option<String>,
    pub discount: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyDiscountRequest {
    pub code: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProductView {
    #[serde(rename = "ProductID")]
    pub id: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "ImageURL")]
    pub image_url: String,
    #[serde(rename = "inStock")]
    pub in_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id().to_string(),
            category: p.category().to_string(),
            name: p.name().to_string(),
            price: p.price().amount().to_string(),
            description: p.description().to_string(),
            quantity: p.quantity().value(),
            image_url: p.image_url().to_string(),
            in_stock: p.is_in_stock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_input_accepts_numbers_and_strings() {
        let input: ProductInput = serde_json::from_value(json!({
            "ProductID": 105, "Category": "Tools", "Name": "Saw", "Price": 9.5, "Quantity": "100"
        })).unwrap();
        assert_eq!(input.product_id.as_deref(), Some("105"));
        assert_eq!(input.price, "9.5");
        assert_eq!(input.quantity, "100");
        assert_eq!(input.image_url, "");
    }

    #[test]
    fn test_item_validation() {
        let items: ItemsRequest = serde_json::from_value(json!({ "items": [{ "productId": 101, "quantity": 0 }] })).unwrap();
        assert_eq!(items.items[0].product_id, "101");
        assert!(items.items[0].validate().is_err());
        let empty: ItemsRequest = serde_json::from_value(json!({ "items": [] })).unwrap();
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
        assert!(items.validate().is_ok());
    }
}
