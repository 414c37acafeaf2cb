//! Catalog entities: categories, products and suppliers.

use serde::{Deserialize, Serialize};

use super::de::{f64_lenient, i64_lenient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body for creating or renaming a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryForm {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "f64_lenient")]
    pub price: f64,
    #[serde(deserialize_with = "i64_lenient")]
    pub stock: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub supplier_name: Option<String>,
}

impl Product {
    /// Category name, falling back to the raw id, then "-".
    pub fn category_display(&self) -> String {
        match (&self.category_name, self.category_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "-".to_string(),
        }
    }

    pub fn supplier_display(&self) -> String {
        match (&self.supplier_name, self.supplier_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "-".to_string(),
        }
    }

    pub fn price_display(&self) -> String {
        format!("{:.2}", self.price)
    }
}

/// Body for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForm {
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category_id: i64,
    pub supplier_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Body for creating or updating a supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplierForm {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// `{ "id": n }` as returned by create endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    #[serde(deserialize_with = "i64_lenient")]
    pub id: i64,
}
