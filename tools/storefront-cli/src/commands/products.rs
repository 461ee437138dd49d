//! List one page of the catalog.

use anyhow::{Context as _, Result};
use storefront_commerce::gateway::ProductCatalog;
use storefront_commerce::search::{ProductPage, ProductQuery};

use super::ProductsArgs;
use crate::context::Context;
use crate::output::{page_footer, stock_badge};

/// Run the products command.
pub async fn run(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    let size = args.size.unwrap_or(ctx.config.search.page_size);
    let mut query = ProductQuery::new().with_pagination(args.page, size);
    if let Some(ref term) = args.search {
        query = query.with_search(term);
    }

    let spinner = ctx.output.spinner("Loading products...");
    let result = client.fetch_products(&query).await;
    spinner.finish_and_clear();

    let page = result.context("Failed to load products")?;

    if ctx.output.is_json() {
        ctx.output.json(&page);
        return Ok(());
    }

    let title = match query.search {
        Some(ref term) => format!("Products matching \"{}\"", term),
        None => "Products".to_string(),
    };
    ctx.output.header(&title);
    print_product_page(ctx, &page);

    Ok(())
}

/// Print a product table followed by pagination info.
pub(crate) fn print_product_page(ctx: &Context, page: &ProductPage) {
    if page.is_empty() {
        ctx.output.info("No products found");
        return;
    }

    let widths = [6, 32, 14, 14];
    ctx.output
        .table_row(&["ID", "Name", "Price", "Availability"], &widths);
    for product in &page.content {
        ctx.output.table_row(
            &[
                &product.id.to_string(),
                &product.name,
                &ctx.money(product.price),
                &stock_badge(product),
            ],
            &widths,
        );
    }

    ctx.output.info(&format!(
        "{} ({} products)",
        page_footer(page),
        page.total_elements
    ));
}
