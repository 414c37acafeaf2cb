//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stockwise_core::api::reports::DEFAULT_LOW_STOCK_THRESHOLD;
use stockwise_core::api::{ExportFormat, ExportTarget};
use stockwise_core::auth::Role;
use stockwise_core::models::OrderStatus;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inventory management from the terminal", long_about = None)]
pub struct Cli {
    /// Backend origin, e.g. http://127.0.0.1:5000
    #[arg(long, global = true, env = "STOCKWISE_API_URL")]
    pub origin: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "STOCKWISE_TIMEOUT_SECS")]
    pub timeout: Option<String>,

    /// Also write logs to a daily file in the cache directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the role of the current session
    Whoami,
    /// Show dashboard counters and charts data
    Dashboard,
    /// Create an account (administrators only)
    Register {
        #[arg(short, long)]
        username: String,
        /// user, admin (general is accepted as user)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
    #[command(subcommand)]
    Categories(CategoryCommand),
    #[command(subcommand)]
    Products(ProductCommand),
    #[command(subcommand)]
    Suppliers(SupplierCommand),
    #[command(subcommand)]
    Orders(OrderCommand),
    #[command(subcommand)]
    Users(UserCommand),
    #[command(subcommand)]
    Reports(ReportCommand),
    /// Download a CSV or PDF export (administrators only)
    Export {
        /// categories, products, suppliers, stock-by-category, orders-history, low-stock
        target: ExportTarget,
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,
        /// Destination file; defaults to <target>.<format> in the current directory
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Stock level for the low-stock export
        #[arg(short, long, default_value_t = DEFAULT_LOW_STOCK_THRESHOLD)]
        threshold: i64,
    },
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: i64,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    List,
    Create {
        #[arg(short, long)]
        name: String,
    },
    Update {
        id: i64,
        #[arg(short, long)]
        name: String,
    },
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ProductArgs {
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub price: f64,
    #[arg(short, long)]
    pub stock: i64,
    #[arg(short, long)]
    pub category: i64,
    #[arg(long)]
    pub supplier: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    List,
    Create(ProductArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductArgs,
    },
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct SupplierArgs {
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(short, long)]
    pub phone: Option<String>,
    #[arg(short, long)]
    pub contact: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SupplierCommand {
    List,
    Create(SupplierArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: SupplierArgs,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    List {
        /// YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(long)]
        product: Option<i64>,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(short, long)]
        product: i64,
        #[arg(short, long)]
        quantity: i64,
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    Update {
        id: i64,
        #[arg(short, long)]
        quantity: Option<i64>,
        #[arg(short, long)]
        status: Option<OrderStatus>,
        /// YYYY-MM-DD HH:MM:SS
        #[arg(long)]
        receipt_date: Option<String>,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    List,
    Create {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, default_value = "user", value_parser = parse_role)]
        role: Role,
    },
    Update {
        id: i64,
        #[arg(short, long)]
        username: String,
        #[arg(short, long, value_parser = parse_role)]
        role: Role,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Total stock per category
    Stock,
    /// Orders per month
    History,
    /// Products at or below a stock threshold
    LowStock {
        #[arg(short, long, default_value_t = DEFAULT_LOW_STOCK_THRESHOLD)]
        threshold: i64,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| format!("invalid role: {} (use user or admin)", s))
}
