use serde::{Deserialize, Serialize};

use super::de::i64_lenient;

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct DashboardMetrics {
    pub products: i64,
    pub categories: i64,
    pub suppliers: i64,
    pub orders_today: i64,
    pub low_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct StockByCategory {
    pub category: String,
    #[serde(deserialize_with = "i64_lenient")]
    pub total_stock: i64,
}

/// Order count for one `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct OrdersHistoryPoint {
    pub month: String,
    #[serde(deserialize_with = "i64_lenient")]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct LowStockItem {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "i64_lenient")]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Everything the dashboard shows, fetched in one go after login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct DashboardSnapshot {
    pub metrics: DashboardMetrics,
    pub stock_by_category: Vec<StockByCategory>,
    pub orders_history: Vec<OrdersHistoryPoint>,
}
