//! Typed CRUD operations for the catalog, orders and users.

use serde_json::Value;

use crate::models::{
    Category, CategoryForm, Created, NewOrder, Order, OrderStatus, OrderUpdate, Product,
    ProductForm, Supplier, SupplierForm, User, UserForm,
};

use super::client::local_validation;
use super::{ApiClient, ApiRequest, ApiResult, PendingDelete};

const CATEGORIES: &str = "categories";
const PRODUCTS: &str = "products";
const SUPPLIERS: &str = "suppliers";
const ORDERS: &str = "orders";
const USERS: &str = "users";

/// Optional filters for `GET /orders`. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<OrderStatus>,
    pub product_id: Option<i64>,
}

impl OrderFilter {
    pub fn to_request(&self) -> ApiRequest {
        let mut request = ApiRequest::get(format!("/{}", ORDERS));
        if let Some(ref from) = self.from {
            request = request.query("from", from);
        }
        if let Some(ref to) = self.to {
            request = request.query("to", to);
        }
        if let Some(status) = self.status {
            request = request.query("status", status);
        }
        if let Some(product_id) = self.product_id {
            request = request.query("product_id", product_id);
        }
        request
    }
}

fn collection(resource: &str) -> String {
    format!("/{}", resource)
}

fn member(resource: &str, id: i64) -> String {
    format!("/{}/{}", resource, id)
}

fn require_name(name: &str, what: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(local_validation(&format!("{} name is required", what)));
    }
    Ok(())
}

impl ApiClient {
    // ===== Categories =====

    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        self.get(&collection(CATEGORIES)).await
    }

    pub async fn create_category(&self, form: &CategoryForm) -> ApiResult<Created> {
        require_name(&form.name, "Category")?;
        self.post(&collection(CATEGORIES), form).await
    }

    pub async fn update_category(&self, id: i64, form: &CategoryForm) -> ApiResult<()> {
        require_name(&form.name, "Category")?;
        self.put::<Value, _>(&member(CATEGORIES, id), form).await?;
        Ok(())
    }

    pub fn delete_category(&self, id: i64) -> PendingDelete {
        PendingDelete::new(CATEGORIES, id)
    }

    // ===== Products =====

    pub async fn list_products(&self) -> ApiResult<Vec<Product>> {
        self.get(&collection(PRODUCTS)).await
    }

    pub async fn create_product(&self, form: &ProductForm) -> ApiResult<Created> {
        validate_product(form)?;
        self.post(&collection(PRODUCTS), form).await
    }

    pub async fn update_product(&self, id: i64, form: &ProductForm) -> ApiResult<()> {
        validate_product(form)?;
        self.put::<Value, _>(&member(PRODUCTS, id), form).await?;
        Ok(())
    }

    pub fn delete_product(&self, id: i64) -> PendingDelete {
        PendingDelete::new(PRODUCTS, id)
    }

    // ===== Suppliers =====

    pub async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        self.get(&collection(SUPPLIERS)).await
    }

    pub async fn create_supplier(&self, form: &SupplierForm) -> ApiResult<Created> {
        require_name(&form.name, "Supplier")?;
        self.post(&collection(SUPPLIERS), form).await
    }

    pub async fn update_supplier(&self, id: i64, form: &SupplierForm) -> ApiResult<()> {
        require_name(&form.name, "Supplier")?;
        self.put::<Value, _>(&member(SUPPLIERS, id), form).await?;
        Ok(())
    }

    pub fn delete_supplier(&self, id: i64) -> PendingDelete {
        PendingDelete::new(SUPPLIERS, id)
    }

    // ===== Orders =====

    pub async fn list_orders(&self, filter: &OrderFilter) -> ApiResult<Vec<Order>> {
        self.execute(filter.to_request()).await
    }

    pub async fn get_order(&self, id: i64) -> ApiResult<Order> {
        self.get(&member(ORDERS, id)).await
    }

    pub async fn create_order(&self, order: &NewOrder) -> ApiResult<Order> {
        if order.quantity <= 0 {
            return Err(local_validation("Quantity must be a positive integer"));
        }
        self.post(&collection(ORDERS), order).await
    }

    pub async fn update_order(&self, id: i64, update: &OrderUpdate) -> ApiResult<Order> {
        if update.is_empty() {
            return Err(local_validation("Nothing to update"));
        }
        if matches!(update.quantity, Some(q) if q <= 0) {
            return Err(local_validation("Quantity must be a positive integer"));
        }
        self.put(&member(ORDERS, id), update).await
    }

    pub fn delete_order(&self, id: i64) -> PendingDelete {
        PendingDelete::new(ORDERS, id)
    }

    // ===== Users =====

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.get(&collection(USERS)).await
    }

    pub async fn create_user(&self, form: &UserForm) -> ApiResult<Created> {
        require_name(&form.username, "User")?;
        if form.password.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(local_validation("Password is required to create a user"));
        }
        self.post(&collection(USERS), form).await
    }

    pub async fn update_user(&self, id: i64, form: &UserForm) -> ApiResult<()> {
        require_name(&form.username, "User")?;
        let mut form = form.clone();
        form.password = form.password.filter(|p| !p.trim().is_empty());
        self.put::<Value, _>(&member(USERS, id), &form).await?;
        Ok(())
    }

    pub fn delete_user(&self, id: i64) -> PendingDelete {
        PendingDelete::new(USERS, id)
    }
}

fn validate_product(form: &ProductForm) -> ApiResult<()> {
    require_name(&form.name, "Product")?;
    if !form.price.is_finite() || form.price < 0.0 {
        return Err(local_validation("Price must be a non-negative number"));
    }
    if form.stock < 0 {
        return Err(local_validation("Stock cannot be negative"));
    }
    Ok(())
}
