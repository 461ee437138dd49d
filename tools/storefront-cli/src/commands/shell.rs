//! Interactive shopping session.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use storefront_commerce::cart::CartStore;
use storefront_commerce::checkout::CheckoutReconciler;
use storefront_commerce::ids::ProductId;
use storefront_commerce::search::{ProductSearch, SearchConfig, SearchState};
use storefront_data::StorefrontClient;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::order::{print_cart, submit};
use super::products::print_product_page;
use super::ShellArgs;
use crate::context::Context;
use crate::output::{cart_badge, page_label};

const HELP: &[(&str, &str)] = &[
    ("search <term>", "Search products (empty term lists everything)"),
    ("list", "Show the current page of products"),
    ("next / prev", "Go to the next or previous page"),
    ("page <n>", "Go to page n"),
    ("add <id> [qty]", "Add a product from the current page"),
    ("remove <id>", "Remove a product from the cart"),
    ("qty <id> <n>", "Set a quantity (0 removes)"),
    ("inc <id> / dec <id>", "Step a quantity up or down"),
    ("cart", "Show the cart"),
    ("checkout", "Place the order"),
    ("help", "Show this help"),
    ("quit", "Leave the shell"),
];

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Search(String),
    List,
    Next,
    Prev,
    /// 0-indexed page.
    Page(u32),
    Add { product_id: ProductId, quantity: u32 },
    Remove(ProductId),
    Qty { product_id: ProductId, quantity: i64 },
    Inc(ProductId),
    Dec(ProductId),
    Cart,
    Checkout,
    Help,
    Quit,
    Nothing,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match (cmd.to_lowercase().as_str(), args.as_slice()) {
        ("", _) => ShellCommand::Nothing,
        ("search" | "s", _) => ShellCommand::Search(rest.to_string()),
        ("list" | "ls", []) => ShellCommand::List,
        ("next" | "n", []) => ShellCommand::Next,
        ("prev" | "p", []) => ShellCommand::Prev,
        ("page", [n]) => {
            let n: u32 = n.parse().map_err(|_| format!("invalid page '{}'", n))?;
            if n == 0 {
                return Err("pages start at 1".to_string());
            }
            ShellCommand::Page(n - 1)
        }
        ("add" | "a", [id]) => ShellCommand::Add {
            product_id: parse_id(id)?,
            quantity: 1,
        },
        ("add" | "a", [id, qty]) => {
            let quantity: u32 = qty
                .parse()
                .map_err(|_| format!("invalid quantity '{}'", qty))?;
            if quantity == 0 {
                return Err("quantity must be at least 1".to_string());
            }
            ShellCommand::Add {
                product_id: parse_id(id)?,
                quantity,
            }
        }
        ("remove" | "rm", [id]) => ShellCommand::Remove(parse_id(id)?),
        ("qty", [id, n]) => ShellCommand::Qty {
            product_id: parse_id(id)?,
            quantity: n.parse().map_err(|_| format!("invalid quantity '{}'", n))?,
        },
        ("inc" | "+", [id]) => ShellCommand::Inc(parse_id(id)?),
        ("dec" | "-", [id]) => ShellCommand::Dec(parse_id(id)?),
        ("cart" | "c", []) => ShellCommand::Cart,
        ("checkout", []) => ShellCommand::Checkout,
        ("help" | "?", _) => ShellCommand::Help,
        ("quit" | "exit" | "q", []) => ShellCommand::Quit,
        (other, _) if is_known(other) => {
            return Err(format!("wrong arguments for '{}' (try 'help')", other));
        }
        (other, _) => return Err(format!("unknown command '{}' (try 'help')", other)),
    };

    Ok(command)
}

fn is_known(cmd: &str) -> bool {
    HELP.iter()
        .flat_map(|(usage, _)| usage.split(" / "))
        .any(|usage| usage.split_whitespace().next() == Some(cmd))
}

fn parse_id(s: &str) -> Result<ProductId, String> {
    s.parse().map_err(|_| format!("invalid product id '{}'", s))
}

struct Session<'a> {
    ctx: &'a Context,
    store: CartStore,
    search: ProductSearch<StorefrontClient>,
    reconciler: CheckoutReconciler<StorefrontClient>,
    wait_limit: Duration,
}

/// How long to wait for a search to settle: the debounce window plus one
/// request, with a little slack.
fn wait_limit(search: &SearchConfig, request_timeout: Duration) -> Duration {
    search
        .quiescence
        .saturating_add(request_timeout)
        .saturating_add(Duration::from_millis(100))
}

/// Run the shell command.
pub async fn run(args: ShellArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let search_config = ctx.config.search_config();

    let store = CartStore::new();
    let badge = Arc::new(AtomicU64::new(0));
    let _badge_subscription = {
        let badge = Arc::clone(&badge);
        store.subscribe(move |cart| badge.store(cart.item_count(), Ordering::Relaxed))
    };

    let session = Session {
        ctx,
        store: store.clone(),
        search: ProductSearch::spawn(client.clone(), search_config),
        reconciler: CheckoutReconciler::new(store, client),
        wait_limit: wait_limit(&search_config, ctx.config.timeout()),
    };

    ctx.output.header("Storefront");
    ctx.output.info("Type 'help' for commands.");

    match args.search {
        Some(term) => session.search_term(term.trim()).await,
        None => {
            session.search.load();
            let state = session.settle(|s| !s.loading).await;
            session.show(&state);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} > ", cart_badge(badge.load(Ordering::Relaxed)));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_command(&line) {
            Ok(ShellCommand::Quit) => break,
            Ok(command) => session.execute(command).await,
            Err(msg) => ctx.output.warn(&msg),
        }
    }

    Ok(())
}

impl Session<'_> {
    async fn execute(&self, command: ShellCommand) {
        let out = &self.ctx.output;

        match command {
            ShellCommand::Search(term) => self.search_term(term.trim()).await,
            ShellCommand::List => self.show(&self.search.state()),
            ShellCommand::Next => {
                if self.search.next_page() {
                    self.show_after_page_change().await;
                } else {
                    out.warn("Already on the last page");
                }
            }
            ShellCommand::Prev => {
                if self.search.prev_page() {
                    self.show_after_page_change().await;
                } else {
                    out.warn("Already on the first page");
                }
            }
            ShellCommand::Page(n) => {
                if self.search.go_to_page(n) {
                    self.show_after_page_change().await;
                } else {
                    out.warn(&format!("No page {}", n + 1));
                }
            }
            ShellCommand::Add {
                product_id,
                quantity,
            } => self.add(product_id, quantity),
            ShellCommand::Remove(product_id) => {
                if self.in_cart(product_id) {
                    self.store.remove_item(product_id);
                    out.success(&format!("Removed product #{}", product_id));
                }
            }
            ShellCommand::Qty {
                product_id,
                quantity,
            } => {
                if self.in_cart(product_id) {
                    self.store.set_quantity(product_id, quantity);
                    print_cart(self.ctx, &self.store.snapshot());
                }
            }
            ShellCommand::Inc(product_id) => {
                if self.in_cart(product_id) {
                    self.store.increment(product_id);
                    print_cart(self.ctx, &self.store.snapshot());
                }
            }
            ShellCommand::Dec(product_id) => {
                if self.in_cart(product_id) {
                    self.store.decrement(product_id);
                    print_cart(self.ctx, &self.store.snapshot());
                }
            }
            ShellCommand::Cart => print_cart(self.ctx, &self.store.snapshot()),
            ShellCommand::Checkout => {
                if self.store.snapshot().is_empty() {
                    out.info("Your cart is empty");
                } else if let Err(e) = submit(&self.reconciler, self.ctx).await {
                    out.error(&format!("{:#}", e));
                }
            }
            ShellCommand::Help => {
                for (usage, about) in HELP {
                    out.kv(usage, about);
                }
            }
            ShellCommand::Quit | ShellCommand::Nothing => {}
        }
    }

    async fn search_term(&self, term: &str) {
        self.search.set_term(term);
        let state = self.settle(|s| s.term == term && !s.loading).await;
        self.show(&state);
    }

    async fn show_after_page_change(&self) {
        let state = self.settle(|s| !s.loading).await;
        self.show(&state);
    }

    /// Wait until the search state satisfies `ready`, or give up and return
    /// whatever is current.
    async fn settle(&self, ready: impl FnMut(&SearchState) -> bool) -> SearchState {
        let mut rx = self.search.subscribe();
        let state = match tokio::time::timeout(self.wait_limit, rx.wait_for(ready)).await {
            Ok(Ok(state)) => state.clone(),
            _ => self.search.state(),
        };
        state
    }

    fn show(&self, state: &SearchState) {
        match state.page {
            Some(ref page) => {
                if !state.term.is_empty() {
                    self.ctx
                        .output
                        .header(&format!("Results for \"{}\"", state.term));
                }
                print_product_page(self.ctx, page);
            }
            None if state.loading => self.ctx.output.info("Still loading..."),
            None => self.ctx.output.warn("Could not load products"),
        }
    }

    fn add(&self, product_id: ProductId, quantity: u32) {
        let out = &self.ctx.output;
        let state = self.search.state();

        let Some(product) = state.products().iter().find(|p| p.id == product_id) else {
            let where_ = state
                .page
                .as_ref()
                .map(|p| page_label(p.number, p.total_pages))
                .unwrap_or_else(|| "the current page".to_string());
            out.warn(&format!("Product #{} is not on {}", product_id, where_.to_lowercase()));
            return;
        };

        if !product.is_purchasable() {
            out.warn(&format!("{} is out of stock", product.name));
            return;
        }

        self.store.add_item(product.clone(), quantity);
        out.success(&format!(
            "Added {} x{} ({})",
            product.name,
            quantity,
            cart_badge(self.store.item_count())
        ));
    }

    fn in_cart(&self, product_id: ProductId) -> bool {
        let present = self.store.snapshot().get_item(product_id).is_some();
        if !present {
            self.ctx
                .output
                .warn(&format!("Product #{} is not in the cart", product_id));
        }
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_limit_saturates() {
        let search = SearchConfig {
            quiescence: Duration::from_millis(300),
            page_size: 10,
        };
        assert_eq!(
            wait_limit(&search, Duration::from_secs(10)),
            Duration::from_millis(10_400)
        );

        let search = SearchConfig {
            quiescence: Duration::MAX,
            page_size: 10,
        };
        assert_eq!(wait_limit(&search, Duration::from_secs(10)), Duration::MAX);
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(parse_command("next").unwrap(), ShellCommand::Next);
        assert_eq!(parse_command("  prev ").unwrap(), ShellCommand::Prev);
        assert_eq!(parse_command("page 3").unwrap(), ShellCommand::Page(2));
        assert!(parse_command("page 0").is_err());
        assert_eq!(parse_command("").unwrap(), ShellCommand::Nothing);
    }

    #[test]
    fn test_parse_search_keeps_spaces() {
        assert_eq!(
            parse_command("search gaming mouse").unwrap(),
            ShellCommand::Search("gaming mouse".to_string())
        );
        assert_eq!(
            parse_command("search").unwrap(),
            ShellCommand::Search(String::new())
        );
    }

    #[test]
    fn test_parse_cart_commands() {
        assert_eq!(
            parse_command("add 4").unwrap(),
            ShellCommand::Add {
                product_id: ProductId::new(4),
                quantity: 1
            }
        );
        assert_eq!(
            parse_command("ADD 4 2").unwrap(),
            ShellCommand::Add {
                product_id: ProductId::new(4),
                quantity: 2
            }
        );
        assert_eq!(
            parse_command("qty 4 -1").unwrap(),
            ShellCommand::Qty {
                product_id: ProductId::new(4),
                quantity: -1
            }
        );
        assert_eq!(parse_command("dec 9").unwrap(), ShellCommand::Dec(ProductId::new(9)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("add x").unwrap_err().contains("invalid product id"));
        assert!(parse_command("add 1 0").is_err());
        assert!(parse_command("remove").unwrap_err().contains("wrong arguments"));
        assert!(parse_command("dec").unwrap_err().contains("wrong arguments"));
        assert!(parse_command("fly").unwrap_err().contains("unknown command"));
    }
}
