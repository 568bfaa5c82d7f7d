//! Cart command handlers.
//!
//! Every mutation goes through [`CartController`] so the CLI exercises the
//! same clamping, debouncing, and snapshot replacement a long-lived view
//! would. A one-shot command flushes before printing.

use clap::Subcommand;
use shopfront_client::{ApiClient, CartController, CartEvent, ControllerSettings, ProductCache};
use shopfront_core::{format_currency, AppConfig, Cart, EntityId};
use tokio::sync::broadcast;

use crate::catalog::truncate;

/// Sub-commands available under `cart`.
#[derive(Debug, Subcommand)]
pub enum CartCommands {
    /// Show the cart
    Show,
    /// Add a product variant to the cart
    Add {
        /// Product id
        product: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
    /// Set a line's quantity (clamped to available stock; 0 removes it)
    Set {
        line: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { line: String },
    /// Remove every line
    Clear,
}

/// # Errors
///
/// Returns an error if the cart cannot be loaded or the mutation fails.
pub(crate) async fn run(
    client: &ApiClient,
    config: &AppConfig,
    command: CartCommands,
) -> anyhow::Result<()> {
    let controller = CartController::new(client.clone(), ControllerSettings::from_config(config));
    controller.refresh().await?;

    let result = apply(client, &controller, command).await;
    controller.close();
    result?;

    print_cart(client, &controller.cart()).await;
    Ok(())
}

async fn apply(
    client: &ApiClient,
    controller: &CartController,
    command: CartCommands,
) -> anyhow::Result<()> {
    match command {
        CartCommands::Show => {}
        CartCommands::Add {
            product,
            color,
            size,
            quantity,
        } => {
            let (product, variants) = client
                .get_product_with_variants(&EntityId::from(product))
                .await?;
            controller
                .add(
                    &product,
                    &variants,
                    color.as_deref(),
                    size.as_deref(),
                    quantity,
                )
                .await?;
            println!("added {} to cart", product.name);
        }
        CartCommands::Set { line, quantity } => {
            let mut events = controller.subscribe();
            let change = controller.request_quantity_change(&EntityId::from(line), quantity)?;
            if change.was_clamped() {
                println!(
                    "requested {} but line {} allows {}",
                    change.requested, change.line_id, change.quantity
                );
            }
            controller.flush().await;
            if let Some(message) = commit_failure(&mut events) {
                anyhow::bail!("could not update line {}: {message}", change.line_id);
            }
        }
        CartCommands::Remove { line } => {
            controller.remove_line(&EntityId::from(line)).await?;
        }
        CartCommands::Clear => {
            controller.clear().await?;
        }
    }
    Ok(())
}

/// The last commit failure published since `events` was created, if any.
fn commit_failure(events: &mut broadcast::Receiver<CartEvent>) -> Option<String> {
    let mut failure = None;
    while let Ok(event) = events.try_recv() {
        match event {
            CartEvent::CommitFailed { message, .. } => failure = Some(message),
            CartEvent::Committed { .. } => failure = None,
            CartEvent::Changed(_) => {}
        }
    }
    failure
}

async fn print_cart(client: &ApiClient, cart: &Cart) {
    if cart.items.is_empty() {
        println!("cart is empty");
        return;
    }

    let cache = ProductCache::new(client.clone());
    let products = cache
        .get_many(cart.items.iter().filter_map(|line| line.owning_product_id()))
        .await;

    println!(
        "{:<8}{:<32}{:<16}{:<6}{:<14}TOTAL",
        "LINE", "PRODUCT", "OPTION", "QTY", "UNIT"
    );
    for line in &cart.items {
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
        println!(
            "{:<8}{:<32}{:<16}{:<6}{:<14}{}",
            line.id,
            name,
            option,
            line.quantity,
            format_currency(line.unit_price()),
            format_currency(line.line_total.unwrap_or_else(|| line.estimated_total()))
        );
    }
    println!();
    println!("{} item(s), total {}", cart.unit_count(), format_currency(cart.total));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> CartEvent {
        CartEvent::CommitFailed {
            line_id: Some(EntityId::from(1u64)),
            quantity: Some(2),
            message: message.to_owned(),
            cart: Cart::empty(),
        }
    }

    #[test]
    fn commit_failure_reports_last_outcome() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(CartEvent::Changed(Cart::empty())).unwrap();
        tx.send(failed("HTTP 500")).unwrap();
        assert_eq!(commit_failure(&mut rx).as_deref(), Some("HTTP 500"));

        tx.send(failed("HTTP 500")).unwrap();
        tx.send(CartEvent::Committed {
            line_id: None,
            cart: Cart::empty(),
        })
        .unwrap();
        assert_eq!(commit_failure(&mut rx), None);
    }
}
