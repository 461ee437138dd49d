//! Place a one-shot order.

use std::collections::HashMap;

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use serde_json::json;
use storefront_commerce::cart::{Cart, CartStore};
use storefront_commerce::catalog::Product;
use storefront_commerce::checkout::{CheckoutOutcome, CheckoutReconciler, OrderResponse};
use storefront_commerce::gateway::{OrderSubmitter, ProductCatalog};
use storefront_commerce::ids::ProductId;
use storefront_commerce::search::{ProductQuery, MAX_PAGE_SIZE};

use super::OrderArgs;
use crate::context::Context;
use crate::output::cart_badge;

/// One `--item ID:QTY` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpec {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Parse `ID:QTY`; a bare `ID` means one unit.
pub fn parse_item(s: &str) -> Result<ItemSpec, String> {
    let (id, qty) = match s.split_once(':') {
        Some((id, qty)) => (id, Some(qty)),
        None => (s, None),
    };

    let product_id = id
        .parse::<ProductId>()
        .map_err(|_| format!("invalid product id '{}'", id.trim()))?;
    let quantity = match qty {
        Some(q) => q
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid quantity '{}'", q.trim()))?,
        None => 1,
    };
    if quantity == 0 {
        return Err("quantity must be at least 1".to_string());
    }

    Ok(ItemSpec {
        product_id,
        quantity,
    })
}

/// Run the order command.
pub async fn run(args: OrderArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let wanted: Vec<ProductId> = args.items.iter().map(|i| i.product_id).collect();

    let spinner = ctx.output.spinner("Looking up products...");
    let found = find_products(&client, &wanted).await;
    spinner.finish_and_clear();
    let found = found.context("Failed to load products")?;

    let store = CartStore::new();
    for item in &args.items {
        match found.get(&item.product_id) {
            Some(product) if product.is_purchasable() => {
                store.add_item(product.clone(), item.quantity);
            }
            Some(product) => ctx
                .output
                .warn(&format!("Skipping {}: not available", product.name)),
            None => ctx
                .output
                .warn(&format!("Skipping product #{}: not found", item.product_id)),
        }
    }

    let cart = store.snapshot();
    if cart.is_empty() {
        bail!("Nothing to order");
    }

    ctx.output.header(&cart_badge(cart.item_count()));
    print_cart(ctx, &cart);

    if !args.yes && !ctx.output.is_json() {
        ctx.output.info("");
        let confirmed = Confirm::new()
            .with_prompt("Place this order?")
            .default(true)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Order cancelled");
            return Ok(());
        }
    }

    let reconciler = CheckoutReconciler::new(store, client);
    submit(&reconciler, ctx).await
}

/// Run one checkout and report it; conflicts and failures become errors.
pub(crate) async fn submit<S: OrderSubmitter>(
    reconciler: &CheckoutReconciler<S>,
    ctx: &Context,
) -> Result<()> {
    let spinner = ctx.output.spinner("Submitting order...");
    let outcome = reconciler.checkout().await;
    spinner.finish_and_clear();

    if ctx.output.is_json() {
        ctx.output.json(&outcome_json(&outcome));
    }

    match outcome {
        CheckoutOutcome::Succeeded(ref order) => {
            if let Some(msg) = outcome.message() {
                ctx.output.success(&msg);
            }
            print_order(ctx, order);
            Ok(())
        }
        CheckoutOutcome::Conflict(ref conflict) => {
            for shortfall in &conflict.details {
                let name = reconciler
                    .store()
                    .snapshot()
                    .get_item(shortfall.product_id)
                    .map(|i| i.product.name.clone())
                    .unwrap_or_else(|| format!("product #{}", shortfall.product_id));
                ctx.output
                    .warn(&format!("{}: only {} available", name, shortfall.available));
            }
            bail!("{}", conflict.message_or_default())
        }
        CheckoutOutcome::Failed(ref e) => {
            tracing::debug!(error = %e, "checkout failed");
            if ctx.output.is_verbose() {
                ctx.output.warn(&e.to_string());
            }
            bail!("{}", outcome.message().unwrap_or_default())
        }
        CheckoutOutcome::EmptyCart => bail!("Cart is empty"),
        CheckoutOutcome::Busy => bail!("A checkout is already in progress"),
    }
}

/// Page through the catalog until every wanted product is seen.
async fn find_products<C: ProductCatalog>(
    catalog: &C,
    wanted: &[ProductId],
) -> Result<HashMap<ProductId, Product>> {
    let mut found = HashMap::new();
    let mut page_number = 0;

    loop {
        let query = ProductQuery::new().with_pagination(page_number, MAX_PAGE_SIZE);
        let page = catalog.fetch_products(&query).await?;

        for product in page.content.iter() {
            if wanted.contains(&product.id) {
                found.insert(product.id, product.clone());
            }
        }

        let done = wanted.iter().all(|id| found.contains_key(id));
        if done || !page.has_next() {
            return Ok(found);
        }
        page_number += 1;
    }
}

/// Print cart lines and the total.
pub(crate) fn print_cart(ctx: &Context, cart: &Cart) {
    if ctx.output.is_json() {
        ctx.output.json(cart);
        return;
    }
    if cart.is_empty() {
        ctx.output.info("Your cart is empty");
        return;
    }

    let widths = [6, 32, 6, 14];
    ctx.output.table_row(&["ID", "Product", "Qty", "Subtotal"], &widths);
    for item in cart.items() {
        ctx.output.table_row(
            &[
                &item.product.id.to_string(),
                &item.product.name,
                &item.quantity.to_string(),
                &ctx.money(item.line_total()),
            ],
            &widths,
        );
    }
    ctx.output.kv("Total", &ctx.money(cart.total()));
}

fn print_order(ctx: &Context, order: &OrderResponse) {
    if ctx.output.is_json() {
        return;
    }

    for line in &order.items {
        ctx.output.list_item(&format!(
            "{} x{} @ {} = {}",
            line.product_name,
            line.quantity,
            ctx.money(line.unit_price),
            ctx.money(line.line_total)
        ));
    }
    ctx.output.kv("Total", &ctx.money(order.total));
    if let Some(created_at) = order.created_at {
        ctx.output
            .kv("Created", &created_at.format("%Y-%m-%d %H:%M:%S").to_string());
    }
}

fn outcome_json(outcome: &CheckoutOutcome) -> serde_json::Value {
    match outcome {
        CheckoutOutcome::Succeeded(order) => json!({
            "status": "succeeded",
            "message": outcome.message(),
            "order": order,
        }),
        CheckoutOutcome::Conflict(conflict) => json!({
            "status": "conflict",
            "message": outcome.message(),
            "details": conflict.details,
        }),
        CheckoutOutcome::Failed(e) => json!({
            "status": "failed",
            "message": outcome.message(),
            "error": e.to_string(),
        }),
        CheckoutOutcome::EmptyCart => json!({ "status": "empty_cart" }),
        CheckoutOutcome::Busy => json!({ "status": "busy" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_commerce::checkout::{StockConflict, StockError};
    use storefront_commerce::error::ApiError;

    #[test]
    fn test_parse_item() {
        assert_eq!(
            parse_item("7:3").unwrap(),
            ItemSpec {
                product_id: ProductId::new(7),
                quantity: 3
            }
        );
        assert_eq!(parse_item("12").unwrap().quantity, 1);
        assert_eq!(parse_item(" 5 : 2 ").unwrap().product_id, ProductId::new(5));
    }

    #[test]
    fn test_parse_item_rejects_bad_input() {
        assert!(parse_item("abc:1").is_err());
        assert!(parse_item("1:x").is_err());
        assert!(parse_item("1:0").is_err());
        assert!(parse_item("1:-2").is_err());
    }

    #[test]
    fn test_outcome_json() {
        let conflict = CheckoutOutcome::Conflict(StockConflict::new(
            None,
            vec![StockError::new(ProductId::new(7), 1)],
        ));
        let value = outcome_json(&conflict);
        assert_eq!(value["status"], "conflict");
        assert_eq!(value["message"], "Insufficient stock");
        assert_eq!(value["details"][0]["productId"], 7);

        let failed = outcome_json(&CheckoutOutcome::Failed(ApiError::Transport("x".into())));
        assert_eq!(failed["status"], "failed");
    }
}
