//! Order command handlers.

use clap::Subcommand;
use shopfront_client::{ApiClient, ProductCache};
use shopfront_core::{format_currency, CreateOrderRequest, EntityId, Order};

use crate::catalog::truncate;

/// Sub-commands available under `order`.
#[derive(Debug, Subcommand)]
pub enum OrderCommands {
    /// Place an order from the current cart
    Create {
        /// Payment method code
        #[arg(long, default_value = "1")]
        method: i64,
        /// Note for the shop
        #[arg(long)]
        note: Option<String>,
    },
}

/// Sub-commands available under `orders`.
#[derive(Debug, Subcommand)]
pub enum OrdersCommands {
    /// List the signed-in user's orders
    List,
    /// Show one order with its lines
    Show { id: String },
}

/// # Errors
///
/// Returns an error if no order endpoint accepts the order.
pub(crate) async fn run_order(client: &ApiClient, command: OrderCommands) -> anyhow::Result<()> {
    match command {
        OrderCommands::Create { method, note } => {
            let mut request = CreateOrderRequest::new(method);
            request.note = note;
            if let Some(user) = client.current_user().await? {
                request.shipping_address = user.default_address();
            }

            let receipt = client.create_order(&request).await?;
            let reference = receipt.reference();
            if reference.is_empty() {
                println!("order placed");
            } else {
                println!("order placed: {reference}");
            }
            if let Some(total) = receipt.total {
                println!("total: {}", format_currency(total));
            }
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the session is missing or rejected, or the order
/// cannot be found.
pub(crate) async fn run_orders(client: &ApiClient, command: OrdersCommands) -> anyhow::Result<()> {
    match command {
        OrdersCommands::List => {
            let orders = client.my_orders().await?;
            print_order_list(&orders);
        }
        OrdersCommands::Show { id } => {
            let order = client.get_order(&EntityId::from(id)).await?;
            print_order(client, &order).await;
        }
    }
    Ok(())
}

fn fmt_created(order: &Order) -> String {
    order.created_at().map_or_else(
        || "-".to_owned(),
        |d| d.format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn print_order_list(orders: &[Order]) {
    if orders.is_empty() {
        println!("no orders found");
        return;
    }
    println!("{:<14}{:<14}{:<18}TOTAL", "ORDER", "STATUS", "PLACED");
    for order in orders {
        println!(
            "{:<14}{:<14}{:<18}{}",
            order.display_code(),
            order.status(),
            fmt_created(order),
            format_currency(order.total)
        );
    }
}

async fn print_order(client: &ApiClient, order: &Order) {
    println!("Order {}", order.display_code());
    println!("Status: {}", order.status());
    println!("Placed: {}", fmt_created(order));
    if let Some(address) = &order.shipping_address {
        println!("Ship to: {}", address.display_line());
    }
    if let Some(user_id) = &order.user_id {
        match client.user_by_id(user_id).await {
            Ok(user) => {
                let name = user.name.as_deref().unwrap_or("-");
                println!("Customer: {name} (#{})", user.id);
                if let Some(address) = user.default_address() {
                    println!("Account address: {}", address.display_line());
                }
            }
            Err(err) => tracing::warn!(user_id = %user_id, error = %err, "could not load order customer"),
        }
    }
    if let Some(note) = order.note.as_deref().filter(|n| !n.trim().is_empty()) {
        println!("Note: {note}");
    }

    let cache = ProductCache::new(client.clone());
    let ids = order.product_ids();
    let products = cache.get_many(&ids).await;

    println!();
    println!("{:<32}{:<16}{:<6}UNIT", "PRODUCT", "OPTION", "QTY");
    for line in &order.items {
        let name = line
            .owning_product_id()
            .and_then(|id| products.get(id))
            .map_or_else(|| "-".to_owned(), |p| truncate(&p.name, 28));
        let option = line.variant.as_ref().map_or_else(
            || "-".to_owned(),
            |v| {
                format!(
                    "{}/{}",
                    v.color.as_deref().unwrap_or("-"),
                    v.size.as_deref().unwrap_or("-")
                )
            },
        );
        let unit = line
            .price
            .or_else(|| line.variant.as_ref().and_then(|v| v.price))
            .map_or_else(|| "-".to_owned(), format_currency);
        println!("{name:<32}{option:<16}{:<6}{unit}", line.quantity);
    }
    println!();
    println!("Total: {}", format_currency(order.total));
}
