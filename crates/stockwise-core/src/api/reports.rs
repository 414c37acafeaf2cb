//! Dashboard metrics, reports and file exports.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::{
    DashboardMetrics, DashboardSnapshot, LowStockItem, OrdersHistoryPoint, StockByCategory,
};

use super::client::{local_validation, write_file};
use super::{ApiClient, ApiRequest, ApiResult, ClientError};

/// Stock at or below this level counts as low when no threshold is given.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Upper bound on the post-login dashboard preload.
/// Past this the dashboard opens with whatever arrived.
const PRELOAD_BUDGET_MS: u64 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Header row of the low-stock CSV.
const LOW_STOCK_COLUMNS: [&str; 4] = ["id", "name", "category", "stock"];

/// Anything that can be exported as CSV or PDF.
///
/// The low-stock list has no backend export; it is written as CSV from
/// [`ApiClient::low_stock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Categories,
    Products,
    Suppliers,
    StockByCategory,
    OrdersHistory,
    LowStock,
}

impl ExportTarget {
    fn base_path(&self) -> Option<&'static str> {
        match self {
            ExportTarget::Categories => Some("/categories"),
            ExportTarget::Products => Some("/products"),
            ExportTarget::Suppliers => Some("/suppliers"),
            ExportTarget::StockByCategory => Some("/reports/stock-by-category"),
            ExportTarget::OrdersHistory => Some("/reports/orders-history"),
            ExportTarget::LowStock => None,
        }
    }

    /// Backend download path, or `None` for exports built locally.
    pub fn export_path(&self, format: ExportFormat) -> Option<String> {
        self.base_path()
            .map(|base| format!("{}/export/{}", base, format.extension()))
    }

    /// File name suggested when the user gives none.
    pub fn default_file_name(&self, format: ExportFormat) -> String {
        let stem = match self {
            ExportTarget::Categories => "categories",
            ExportTarget::Products => "products",
            ExportTarget::Suppliers => "suppliers",
            ExportTarget::StockByCategory => "stock_by_category",
            ExportTarget::OrdersHistory => "orders_history",
            ExportTarget::LowStock => "low_stock",
        };
        format!("{}.{}", stem, format.extension())
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportTarget::Categories => "categories",
            ExportTarget::Products => "products",
            ExportTarget::Suppliers => "suppliers",
            ExportTarget::StockByCategory => "stock-by-category",
            ExportTarget::OrdersHistory => "orders-history",
            ExportTarget::LowStock => "low-stock",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "categories" => Ok(ExportTarget::Categories),
            "products" => Ok(ExportTarget::Products),
            "suppliers" => Ok(ExportTarget::Suppliers),
            "stock-by-category" | "stock" => Ok(ExportTarget::StockByCategory),
            "orders-history" | "history" => Ok(ExportTarget::OrdersHistory),
            "low-stock" => Ok(ExportTarget::LowStock),
            other => Err(format!("unknown export target: {}", other)),
        }
    }
}

impl ApiClient {
    pub async fn dashboard_metrics(&self) -> ApiResult<DashboardMetrics> {
        self.get("/dashboard/metrics").await
    }

    pub async fn stock_by_category(&self) -> ApiResult<Vec<StockByCategory>> {
        self.get("/reports/stock-by-category").await
    }

    pub async fn orders_history(&self) -> ApiResult<Vec<OrdersHistoryPoint>> {
        self.get("/reports/orders-history").await
    }

    /// Products at or below `threshold` units.
    ///
    /// Backends without the report answer 404; the list is then derived from
    /// `/products`.
    pub async fn low_stock(&self, threshold: i64) -> ApiResult<Vec<LowStockItem>> {
        let request = ApiRequest::get("/reports/low-stock").query("threshold", threshold);
        match self.execute(request).await {
            Err(ClientError::Api(ref e)) if e.is_not_found() => {
                debug!("Low-stock report unavailable, filtering products");
                let products = self.list_products().await?;
                Ok(products
                    .into_iter()
                    .filter(|p| p.stock <= threshold)
                    .map(|p| LowStockItem {
                        category: Some(p.category_display()),
                        id: p.id,
                        name: p.name,
                        stock: p.stock,
                    })
                    .collect())
            }
            other => other,
        }
    }

    /// Write an export to `dest`. Returns the byte count.
    ///
    /// `threshold` only applies to the low-stock list, which is CSV only.
    pub async fn export(
        &self,
        target: ExportTarget,
        format: ExportFormat,
        threshold: i64,
        dest: &Path,
    ) -> ApiResult<usize> {
        if let Some(path) = target.export_path(format) {
            return self.download_to(&path, dest).await;
        }
        if format != ExportFormat::Csv {
            return Err(local_validation("Low-stock export is only available as CSV"));
        }

        let items = self.low_stock(threshold).await?;
        let csv = low_stock_csv(&items);
        write_file(dest, csv.as_bytes())?;
        debug!(rows = items.len(), dest = %dest.display(), "Low-stock CSV written");
        Ok(csv.len())
    }

    /// Fetch metrics and both charts concurrently, bounded by a short budget.
    ///
    /// Never fails: parts that error or miss the budget come back empty.
    pub async fn preload_dashboard(&self) -> DashboardSnapshot {
        let budget = Duration::from_millis(PRELOAD_BUDGET_MS);
        let (metrics, stock_by_category, orders_history) = futures::join!(
            within(budget, "metrics", self.dashboard_metrics()),
            within(budget, "stock-by-category", self.stock_by_category()),
            within(budget, "orders-history", self.orders_history()),
        );

        DashboardSnapshot {
            metrics,
            stock_by_category,
            orders_history,
        }
    }
}

/// Low-stock rows as CSV. Every value is quoted with inner quotes doubled.
pub fn low_stock_csv(items: &[LowStockItem]) -> String {
    let mut lines = vec![LOW_STOCK_COLUMNS.join(",")];
    for item in items {
        let row = [
            item.id.to_string(),
            item.name.clone(),
            item.category.clone().unwrap_or_default(),
            item.stock.to_string(),
        ];
        lines.push(row.iter().map(|v| csv_field(v)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

async fn within<T, F>(budget: Duration, part: &str, fetch: F) -> T
where
    T: Default,
    F: std::future::Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(budget, fetch).await {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!(part = part, error = %e, "Dashboard preload part failed");
            T::default()
        }
        Err(_) => {
            warn!(part = part, "Dashboard preload part exceeded budget");
            T::default()
        }
    }
}
