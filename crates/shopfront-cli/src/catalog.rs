//! Read-only catalog commands: product listing, product detail, and the
//! catalog's color and size options.

use shopfront_client::{ApiClient, ProductQuery};
use shopfront_core::{
    distinct_colors, distinct_sizes, find_variant, format_currency, EntityId, Product, Variant,
};

/// Truncates `text` to `max` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_owned()
    }
}

/// # Errors
///
/// Returns an error if the product listing cannot be fetched.
pub(crate) async fn run_products(client: &ApiClient, query: &ProductQuery) -> anyhow::Result<()> {
    let products = client.list_products(query).await?;
    if products.is_empty() {
        println!("no products found");
        return Ok(());
    }

    println!("{:<10}{:<42}{:<16}{:<8}CATEGORY", "ID", "NAME", "PRICE", "STOCK");
    for product in &products {
        println!(
            "{:<10}{:<42}{:<16}{:<8}{}",
            product.id,
            truncate(&product.name, 38),
            format_currency(product.price),
            product.stock,
            product.category
        );
    }
    Ok(())
}

/// Prints a product, the options its variants offer, and the variant the
/// given selection resolves to.
///
/// # Errors
///
/// Returns an error if the product or its variants cannot be fetched.
pub(crate) async fn run_product(
    client: &ApiClient,
    id: &EntityId,
    color: Option<&str>,
    size: Option<&str>,
) -> anyhow::Result<()> {
    let (product, variants) = client.get_product_with_variants(id).await?;

    println!("{} (#{})", product.name, product.id);
    println!("Price: {}", format_currency(product.price));
    if !product.category.is_empty() {
        println!("Category: {}", product.category);
    }
    if let Some(image) = product.image() {
        println!("Image: {image}");
    }
    if !product.description.trim().is_empty() {
        println!();
        println!("{}", product.description.trim());
    }

    if variants.is_empty() {
        println!();
        match &product.default_variant_id {
            Some(default) => println!("single variant #{default}, stock {}", product.stock),
            None => println!("no variants available"),
        }
        return Ok(());
    }

    println!();
    println!("Colors: {}", distinct_colors(&variants).join(", "));
    println!("Sizes:  {}", distinct_sizes(&variants).join(", "));
    println!();
    print_variants(&product, &variants);

    if let Some(selected) = find_variant(&variants, color, size) {
        println!();
        println!(
            "Selected: #{} {} / {} at {}{}",
            selected.id,
            selected.color.as_deref().unwrap_or("-"),
            selected.size.as_deref().unwrap_or("-"),
            format_currency(selected.effective_price(product.price)),
            if selected.in_stock() { "" } else { " (out of stock)" }
        );
    }
    Ok(())
}

fn print_variants(product: &Product, variants: &[Variant]) {
    println!("{:<10}{:<14}{:<8}{:<16}STOCK", "VARIANT", "COLOR", "SIZE", "PRICE");
    for variant in variants {
        let stock = variant
            .stock
            .map_or_else(|| "unlimited".to_owned(), |s| s.to_string());
        println!(
            "{:<10}{:<14}{:<8}{:<16}{}",
            variant.id,
            variant.color.as_deref().unwrap_or("-"),
            variant.size.as_deref().unwrap_or("-"),
            format_currency(variant.effective_price(product.price)),
            stock
        );
    }
}

/// # Errors
///
/// Returns an error if either option list cannot be fetched.
pub(crate) async fn run_options(client: &ApiClient) -> anyhow::Result<()> {
    let (colors, sizes) = tokio::try_join!(client.list_colors(), client.list_sizes())?;
    println!("Colors: {}", colors.join(", "));
    println!("Sizes:  {}", sizes.join(", "));
    Ok(())
}
