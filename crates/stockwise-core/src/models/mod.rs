//! Data models for inventory entities.
//!
//! This module contains the structures exchanged with the backend:
//!
//! - `Category`, `Product`, `Supplier`: catalog rows and their form bodies
//! - `Order`, `OrderStatus`: purchase orders and their lifecycle
//! - `User`: accounts managed by administrators
//! - Report types: `DashboardMetrics`, `StockByCategory`, `OrdersHistoryPoint`, `LowStockItem`

pub mod catalog;
mod de;
pub mod order;
pub mod report;
pub mod user;

pub use catalog::{Category, CategoryForm, Created, Product, ProductForm, Supplier, SupplierForm};
pub use order::{NewOrder, Order, OrderStatus, OrderUpdate};
pub use report::{DashboardMetrics, DashboardSnapshot, LowStockItem, OrdersHistoryPoint, StockByCategory};
pub use user::{User, UserForm};
