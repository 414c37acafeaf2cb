//! Subcommand handlers.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use stockwise_core::api::{NewAccount, OrderFilter, PendingDelete};
use stockwise_core::config::Config;
use stockwise_core::models::{
    CategoryForm, DashboardMetrics, NewOrder, OrderUpdate, OrdersHistoryPoint, ProductForm,
    StockByCategory, SupplierForm, UserForm,
};
use stockwise_core::{ApiClient, ClientError, SessionCapability};
use tracing::{debug, warn};

use crate::cli::{
    CategoryCommand, Command, DeleteArgs, OrderCommand, ProductArgs, ProductCommand,
    ReportCommand, SupplierArgs, SupplierCommand, UserCommand,
};
use crate::output::{bar, format_optional, format_timestamp, Table};

const BAR_WIDTH: usize = 30;

pub async fn run(client: &ApiClient, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => login(client, config, username).await,
        Command::Logout => {
            client.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => whoami(client).await,
        command => {
            if !client.ensure_authenticated() {
                return Err(ClientError::SessionExpired {
                    redirected_to: client.config().login_route.clone(),
                }
                .into());
            }
            run_authenticated(client, command).await
        }
    }
}

async fn run_authenticated(client: &ApiClient, command: Command) -> Result<()> {
    match command {
        Command::Dashboard => dashboard(client).await,
        Command::Register { username, role } => {
            let capability = client.require_admin().await?;
            register(client, &capability, &username, &role).await
        }
        Command::Categories(cmd) => categories(client, cmd).await,
        Command::Products(cmd) => products(client, cmd).await,
        Command::Suppliers(cmd) => suppliers(client, cmd).await,
        Command::Orders(cmd) => orders(client, cmd).await,
        Command::Users(cmd) => {
            let capability = client.require_admin().await?;
            users(client, &capability, cmd).await
        }
        Command::Reports(cmd) => reports(client, cmd).await,
        Command::Export { target, format, out, threshold } => {
            client.require_admin().await?;
            let dest = out.unwrap_or_else(|| PathBuf::from(target.default_file_name(format)));
            let bytes = client.export(target, format, threshold, &dest).await?;
            println!("Saved {} ({} bytes)", dest.display(), bytes);
            Ok(())
        }
        Command::Login { .. } | Command::Logout | Command::Whoami => Ok(()),
    }
}

// ===== Session =====

async fn login(client: &ApiClient, config: &Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password = prompt_password("Password: ")?;

    let outcome = client.login(&username, &password).await?;

    // Reload so command-line overrides don't end up in the saved file
    let mut stored = Config::load().unwrap_or_default();
    stored.last_username = Some(username.trim().to_string());
    if let Err(e) = stored.save() {
        warn!(error = %e, "Failed to remember username");
    }

    let role = outcome.role.map(|r| r.as_str()).unwrap_or("user");
    println!("Signed in as {} ({}).", username.trim(), role);

    let snapshot = client.preload_dashboard().await;
    debug!(route = %config.dashboard_route, "Dashboard preloaded");
    print_metrics(&snapshot.metrics);
    Ok(())
}

async fn whoami(client: &ApiClient) -> Result<()> {
    let capability = client.session_capability().await;
    match (capability.role, capability.user_id) {
        (Some(role), Some(id)) => println!("Signed in as {} (user #{}).", role.as_str(), id),
        (Some(role), None) => println!("Signed in as {}.", role.as_str()),
        (None, _) if client.has_token() => println!("Signed in; role could not be confirmed."),
        (None, _) => println!("Not signed in. Run `stockwise login`."),
    }
    Ok(())
}

async fn register(
    client: &ApiClient,
    capability: &SessionCapability,
    username: &str,
    role: &str,
) -> Result<()> {
    debug!(admin = ?capability.user_id, "Registering account");
    let password = prompt_new_password()?;
    let account = NewAccount::new(username, &password, role)?;
    client.register(&account).await?;
    println!("Account {} created ({}).", account.username, account.role.as_str());
    Ok(())
}

// ===== Dashboard and reports =====

async fn dashboard(client: &ApiClient) -> Result<()> {
    let (metrics, stock, history) = tokio::join!(
        client.dashboard_metrics(),
        client.stock_by_category(),
        client.orders_history(),
    );
    print_metrics(&metrics?);
    println!();
    print_stock(&stock?);
    println!();
    print_history(&history?);
    Ok(())
}

fn print_metrics(metrics: &DashboardMetrics) {
    println!("Products:     {}", metrics.products);
    println!("Categories:   {}", metrics.categories);
    println!("Suppliers:    {}", metrics.suppliers);
    println!("Orders today: {}", metrics.orders_today);
    println!("Low stock:    {}", metrics.low_stock);
}

fn print_stock(rows: &[StockByCategory]) {
    let max = rows.iter().map(|r| r.total_stock).max().unwrap_or(0);
    let mut table = Table::new(vec!["Category", "Stock", ""]);
    for row in rows {
        table.row(vec![
            row.category.clone(),
            row.total_stock.to_string(),
            bar(row.total_stock, max, BAR_WIDTH),
        ]);
    }
    table.print("No stock recorded.");
}

fn print_history(points: &[OrdersHistoryPoint]) {
    let max = points.iter().map(|p| p.count).max().unwrap_or(0);
    let mut table = Table::new(vec!["Month", "Orders", ""]);
    for point in points {
        table.row(vec![
            point.month.clone(),
            point.count.to_string(),
            bar(point.count, max, BAR_WIDTH),
        ]);
    }
    table.print("No orders yet.");
}

async fn reports(client: &ApiClient, cmd: ReportCommand) -> Result<()> {
    match cmd {
        ReportCommand::Stock => print_stock(&client.stock_by_category().await?),
        ReportCommand::History => print_history(&client.orders_history().await?),
        ReportCommand::LowStock { threshold } => {
            let items = client.low_stock(threshold).await?;
            let mut table = Table::new(vec!["ID", "Product", "Stock", "Category"]);
            for item in &items {
                table.row(vec![
                    item.id.to_string(),
                    item.name.clone(),
                    item.stock.to_string(),
                    format_optional(&item.category),
                ]);
            }
            table.print(&format!("No products at or below {} units.", threshold));
        }
    }
    Ok(())
}

// ===== Catalog =====

async fn categories(client: &ApiClient, cmd: CategoryCommand) -> Result<()> {
    match cmd {
        CategoryCommand::List => {
            let mut table = Table::new(vec!["ID", "Name"]);
            for category in client.list_categories().await? {
                table.row(vec![category.id.to_string(), category.name]);
            }
            table.print("No categories.");
        }
        CategoryCommand::Create { name } => {
            let created = client.create_category(&CategoryForm { name }).await?;
            println!("Created category #{}.", created.id);
        }
        CategoryCommand::Update { id, name } => {
            client.update_category(id, &CategoryForm { name }).await?;
            println!("Updated category #{}.", id);
        }
        CategoryCommand::Delete(args) => delete(client, client.delete_category(args.id), &args).await?,
    }
    Ok(())
}

fn product_form(args: ProductArgs) -> ProductForm {
    ProductForm {
        name: args.name,
        price: args.price,
        stock: args.stock,
        category_id: args.category,
        supplier_id: args.supplier,
    }
}

async fn products(client: &ApiClient, cmd: ProductCommand) -> Result<()> {
    match cmd {
        ProductCommand::List => {
            let mut table = Table::new(vec!["ID", "Name", "Price", "Stock", "Category", "Supplier"]);
            for product in client.list_products().await? {
                table.row(vec![
                    product.id.to_string(),
                    product.name.clone(),
                    product.price_display(),
                    product.stock.to_string(),
                    product.category_display(),
                    product.supplier_display(),
                ]);
            }
            table.print("No products.");
        }
        ProductCommand::Create(args) => {
            let created = client.create_product(&product_form(args)).await?;
            println!("Created product #{}.", created.id);
        }
        ProductCommand::Update { id, fields } => {
            client.update_product(id, &product_form(fields)).await?;
            println!("Updated product #{}.", id);
        }
        ProductCommand::Delete(args) => delete(client, client.delete_product(args.id), &args).await?,
    }
    Ok(())
}

fn supplier_form(args: SupplierArgs) -> SupplierForm {
    SupplierForm {
        name: args.name,
        email: args.email,
        phone: args.phone,
        contact: args.contact,
    }
}

async fn suppliers(client: &ApiClient, cmd: SupplierCommand) -> Result<()> {
    match cmd {
        SupplierCommand::List => {
            let mut table = Table::new(vec!["ID", "Name", "Email", "Phone", "Contact"]);
            for supplier in client.list_suppliers().await? {
                table.row(vec![
                    supplier.id.to_string(),
                    supplier.name,
                    format_optional(&supplier.email),
                    format_optional(&supplier.phone),
                    format_optional(&supplier.contact),
                ]);
            }
            table.print("No suppliers.");
        }
        SupplierCommand::Create(args) => {
            let created = client.create_supplier(&supplier_form(args)).await?;
            println!("Created supplier #{}.", created.id);
        }
        SupplierCommand::Update { id, fields } => {
            client.update_supplier(id, &supplier_form(fields)).await?;
            println!("Updated supplier #{}.", id);
        }
        SupplierCommand::Delete(args) => delete(client, client.delete_supplier(args.id), &args).await?,
    }
    Ok(())
}

// ===== Orders =====

async fn orders(client: &ApiClient, cmd: OrderCommand) -> Result<()> {
    match cmd {
        OrderCommand::List { from, to, status, product } => {
            let filter = OrderFilter {
                from,
                to,
                status,
                product_id: product,
            };
            let mut table = Table::new(vec!["ID", "Product", "Qty", "Status", "Ordered", "Received"]);
            for order in client.list_orders(&filter).await? {
                table.row(vec![
                    order.id.to_string(),
                    order
                        .product_name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", order.product_id)),
                    order.quantity.to_string(),
                    order.status.to_string(),
                    format_timestamp(&order.order_date),
                    format_timestamp(&order.receipt_date),
                ]);
            }
            table.print("No orders match.");
        }
        OrderCommand::Show { id } => {
            let order = client.get_order(id).await?;
            println!("Order #{}", order.id);
            println!("  Product:  {}", order.product_name.as_deref().unwrap_or("-"));
            println!("  Quantity: {}", order.quantity);
            println!("  Status:   {}", order.status);
            println!("  Ordered:  {}", format_timestamp(&order.order_date));
            println!("  Received: {}", format_timestamp(&order.receipt_date));
        }
        OrderCommand::Create { product, quantity, status } => {
            let order = client
                .create_order(&NewOrder {
                    product_id: product,
                    quantity,
                    status,
                })
                .await?;
            println!("Created order #{} ({}).", order.id, order.status);
        }
        OrderCommand::Update { id, quantity, status, receipt_date } => {
            let update = OrderUpdate {
                quantity,
                status,
                receipt_date,
            };
            if update.is_empty() {
                bail!("Nothing to update: pass --quantity, --status or --receipt-date");
            }
            let order = client.update_order(id, &update).await?;
            println!("Order #{} is now {}.", order.id, order.status);
        }
        OrderCommand::Delete(args) => delete(client, client.delete_order(args.id), &args).await?,
    }
    Ok(())
}

// ===== Users =====

async fn users(client: &ApiClient, capability: &SessionCapability, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::List => {
            let mut table = Table::new(vec!["ID", "Username", "Role", "Created"]);
            for user in client.list_users().await? {
                let marker = if Some(user.id) == capability.user_id { " (you)" } else { "" };
                table.row(vec![
                    user.id.to_string(),
                    format!("{}{}", user.username, marker),
                    user.role.clone(),
                    format_timestamp(&user.created_at),
                ]);
            }
            table.print("No users.");
        }
        UserCommand::Create { username, role } => {
            let password = prompt_new_password()?;
            let created = client
                .create_user(&UserForm {
                    username,
                    role,
                    password: Some(password),
                })
                .await?;
            println!("Created user #{}.", created.id);
        }
        UserCommand::Update { id, username, role, password } => {
            let password = if password { Some(prompt_new_password()?) } else { None };
            client
                .update_user(id, &UserForm { username, role, password })
                .await?;
            println!("Updated user #{}.", id);
        }
        UserCommand::Delete(args) => {
            if Some(args.id) == capability.user_id {
                bail!("Refusing to delete the account you are signed in with");
            }
            delete(client, client.delete_user(args.id), &args).await?
        }
    }
    Ok(())
}

// ===== Prompts =====

async fn delete(client: &ApiClient, pending: PendingDelete, args: &DeleteArgs) -> Result<()> {
    if !args.yes && !confirm(&pending.prompt())? {
        println!("Cancelled.");
        return Ok(());
    }
    let outcome = pending.confirm(client).await?;
    println!("Deleted {} #{}.", outcome.resource, outcome.id);
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;
    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = username.trim();
    match (username.is_empty(), last) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(username.to_string()),
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

fn prompt_new_password() -> Result<String> {
    let password = prompt_password("New password: ")?;
    let again = prompt_password("Repeat password: ")?;
    if password != again {
        bail!("Passwords do not match");
    }
    Ok(password)
}
